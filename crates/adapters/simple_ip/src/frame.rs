//! Simple IP frame codec.
//!
//! Pure functions over fixed 24-byte buffers, no IO.
//!
//! | Offset | Field | Content |
//! |--------|-------|---------|
//! | 0–1 | Header | `*S` |
//! | 2 | Kind | `C` control, `E` enquiry, `A` answer, `N` notify |
//! | 3–6 | Function | four ASCII letters, e.g. `POWR` |
//! | 7–22 | Parameter | 16 ASCII bytes |
//! | 23 | Terminator | `\n` |

use crate::error::FrameError;

/// Total frame length in bytes.
pub const FRAME_LEN: usize = 24;

/// Power function code.
pub const POWER: [u8; 4] = *b"POWR";

const HEADER: [u8; 2] = *b"*S";
const TERMINATOR: u8 = b'\n';
const PARAM_LEN: usize = 16;
const ENQUIRY_PARAM: [u8; PARAM_LEN] = [b'#'; PARAM_LEN];

/// Message kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Control,
    Enquiry,
    Answer,
    Notify,
}

impl MessageKind {
    fn to_byte(self) -> u8 {
        match self {
            Self::Control => b'C',
            Self::Enquiry => b'E',
            Self::Answer => b'A',
            Self::Notify => b'N',
        }
    }

    fn from_byte(byte: u8) -> Result<Self, FrameError> {
        match byte {
            b'C' => Ok(Self::Control),
            b'E' => Ok(Self::Enquiry),
            b'A' => Ok(Self::Answer),
            b'N' => Ok(Self::Notify),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub kind: MessageKind,
    pub function: [u8; 4],
    pub parameter: [u8; PARAM_LEN],
}

impl Frame {
    /// `*SCPOWR000000000000000{0|1}`: switch the display on or off.
    #[must_use]
    pub fn power_control(on: bool) -> Self {
        let mut parameter = [b'0'; PARAM_LEN];
        if on {
            parameter[PARAM_LEN - 1] = b'1';
        }
        Self {
            kind: MessageKind::Control,
            function: POWER,
            parameter,
        }
    }

    /// `*SEPOWR################`: ask for the current power state.
    #[must_use]
    pub fn power_enquiry() -> Self {
        Self {
            kind: MessageKind::Enquiry,
            function: POWER,
            parameter: ENQUIRY_PARAM,
        }
    }

    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0..2].copy_from_slice(&HEADER);
        buf[2] = self.kind.to_byte();
        buf[3..7].copy_from_slice(&self.function);
        buf[7..23].copy_from_slice(&self.parameter);
        buf[23] = TERMINATOR;
        buf
    }

    /// Decode exactly one frame.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the length, header, kind byte,
    /// terminator or character set is wrong.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() != FRAME_LEN {
            return Err(FrameError::WrongLength { actual: data.len() });
        }
        if data[0..2] != HEADER {
            return Err(FrameError::BadHeader([data[0], data[1]]));
        }
        let kind = MessageKind::from_byte(data[2])?;
        if data[23] != TERMINATOR {
            return Err(FrameError::BadTerminator(data[23]));
        }
        if !data[3..23].is_ascii() {
            return Err(FrameError::NonAscii);
        }

        let mut function = [0u8; 4];
        function.copy_from_slice(&data[3..7]);
        let mut parameter = [0u8; PARAM_LEN];
        parameter.copy_from_slice(&data[7..23]);
        Ok(Self {
            kind,
            function,
            parameter,
        })
    }

    /// The device signalled failure (`F…`, `N…` or NUL-filled parameter).
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.parameter[0], b'F' | b'N' | 0)
    }

    /// Parameter read as a zero-padded decimal power flag.
    #[must_use]
    pub fn power_flag(&self) -> Option<bool> {
        let text = std::str::from_utf8(&self.parameter).ok()?;
        match text.parse::<u64>().ok()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Parameter as text, for diagnostics.
    #[must_use]
    pub fn parameter_text(&self) -> String {
        String::from_utf8_lossy(&self.parameter).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf.copy_from_slice(text.as_bytes());
        buf
    }

    // ── Encoding ──

    #[test]
    fn should_encode_power_on_control() {
        assert_eq!(
            &Frame::power_control(true).encode(),
            b"*SCPOWR0000000000000001\n"
        );
    }

    #[test]
    fn should_encode_power_off_control() {
        assert_eq!(
            &Frame::power_control(false).encode(),
            b"*SCPOWR0000000000000000\n"
        );
    }

    #[test]
    fn should_encode_enquiry_with_hash_parameter() {
        assert_eq!(
            &Frame::power_enquiry().encode(),
            b"*SEPOWR################\n"
        );
    }

    // ── Decoding ──

    #[test]
    fn should_decode_answer_with_power_flag() {
        let decoded = Frame::decode(&frame("*SAPOWR0000000000000001\n")).unwrap();

        assert_eq!(decoded.kind, MessageKind::Answer);
        assert_eq!(decoded.function, POWER);
        assert_eq!(decoded.power_flag(), Some(true));
        assert!(!decoded.is_error());
    }

    #[test]
    fn should_decode_notify_frame() {
        let decoded = Frame::decode(&frame("*SNPOWR0000000000000000\n")).unwrap();
        assert_eq!(decoded.kind, MessageKind::Notify);
        assert_eq!(decoded.power_flag(), Some(false));
    }

    #[test]
    fn should_flag_error_sentinels() {
        for text in ["*SAPOWRFFFFFFFFFFFFFFFF\n", "*SAPOWRNNNNNNNNNNNNNNNN\n"] {
            assert!(Frame::decode(&frame(text)).unwrap().is_error(), "{text}");
        }
        let mut nul = frame("*SAPOWR0000000000000000\n");
        nul[7..23].fill(0);
        assert!(Frame::decode(&nul).unwrap().is_error());
    }

    #[test]
    fn should_reject_short_buffer() {
        assert_eq!(
            Frame::decode(b"*SAPOWR"),
            Err(FrameError::WrongLength { actual: 7 })
        );
    }

    #[test]
    fn should_reject_bad_header() {
        assert_eq!(
            Frame::decode(&frame("#SAPOWR0000000000000001\n")),
            Err(FrameError::BadHeader(*b"#S"))
        );
    }

    #[test]
    fn should_reject_unknown_kind() {
        assert_eq!(
            Frame::decode(&frame("*SXPOWR0000000000000001\n")),
            Err(FrameError::UnknownKind(b'X'))
        );
    }

    #[test]
    fn should_reject_missing_terminator() {
        assert_eq!(
            Frame::decode(&frame("*SAPOWR00000000000000011")),
            Err(FrameError::BadTerminator(b'1'))
        );
    }

    #[test]
    fn should_not_read_power_flag_from_enquiry_parameter() {
        assert_eq!(Frame::power_enquiry().power_flag(), None);
    }
}
