//! # Observability Infrastructure
//!
//! Structured logging for the extender. The extender itself only emits
//! `tracing` events; hosts that do not install their own subscriber can use
//! [`init_logging`].

pub mod logging;

pub use logging::init_logging;
