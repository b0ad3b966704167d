//! Shared configuration, constants and error types for the courier download gateway.

pub mod config;
pub mod constants;
pub mod error;
pub mod util;
