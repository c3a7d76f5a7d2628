//! Structured logging facility
//!
//! - Single initialization point via `init(settings)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Optional file mirror of the console output
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use projector_core::logging_facility::{init, LogSettings, Profile};
//!
//! init(&LogSettings::new(Profile::Development)).unwrap();
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, LogSettings, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
