//! Core types, formatting, sanitization and validation for Meteora Nexus.

pub mod error;
pub mod events;
pub mod format;
pub mod headers;
pub mod limits;
pub mod mode;
pub mod sanitize;
pub mod validation;

pub use error::{Error, Result};
pub use events::*;
pub use format::*;
pub use headers::*;
pub use mode::RuntimeMode;
pub use sanitize::*;
pub use validation::*;
