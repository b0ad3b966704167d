pub mod app;
pub mod error;
pub mod gateway_handler;
pub mod middleware;
