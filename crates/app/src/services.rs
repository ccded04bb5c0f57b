//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod bulk_dispatcher;
pub mod command_service;
pub mod device_adapter;
pub mod status_tracker;
