//! Courier download gateway - integration test support.
//!
//! This crate re-exports the workspace crates to support integration tests
//! that use `courier_test::` paths.

pub mod component {
    pub use courier_core::{config, constants, util};
    pub use courier_service::{crypto, error, gateway, proxy, request};
}

pub mod app {
    pub use courier_app::*;
}
