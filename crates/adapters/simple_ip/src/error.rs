//! Simple IP adapter error types.

use ldpm_app::ports::ProtocolError;

/// Why a 24-byte frame could not be decoded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer is not exactly one frame long.
    #[error("frame must be 24 bytes, got {actual}")]
    WrongLength {
        /// The actual length received.
        actual: usize,
    },

    /// The frame does not start with `*S`.
    #[error("bad frame header {0:?}")]
    BadHeader([u8; 2]),

    /// The message kind byte is not one of `C`, `E`, `A`, `N`.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),

    /// The frame does not end with a line feed.
    #[error("bad frame terminator {0:#04x}")]
    BadTerminator(u8),

    /// Function code or parameter holds non-ASCII bytes.
    #[error("frame body is not ASCII")]
    NonAscii,
}

impl From<FrameError> for ProtocolError {
    fn from(err: FrameError) -> Self {
        ProtocolError::Device(format!("malformed reply: {err}"))
    }
}

pub(crate) fn network(err: std::io::Error) -> ProtocolError {
    ProtocolError::Network(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldpm_domain::outcome::ErrorKind;

    #[test]
    fn should_display_wrong_length() {
        let err = FrameError::WrongLength { actual: 10 };
        assert_eq!(err.to_string(), "frame must be 24 bytes, got 10");
    }

    #[test]
    fn should_display_unknown_kind_as_hex() {
        assert_eq!(
            FrameError::UnknownKind(b'X').to_string(),
            "unknown message kind 0x58"
        );
    }

    #[test]
    fn should_convert_frame_error_to_device_error() {
        let err: ProtocolError = FrameError::NonAscii.into();
        assert_eq!(err.kind(), ErrorKind::Device);
        assert_eq!(err.to_string(), "device error: malformed reply: frame body is not ASCII");
    }
}
