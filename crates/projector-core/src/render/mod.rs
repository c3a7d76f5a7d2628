//! Rendering context builder

pub mod context;

pub use context::{build_bindings, Bindings};
