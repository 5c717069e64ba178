//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types to make it easier to
//! get started with the library.

pub use crate::connection::Connection;
pub use crate::error::{ConstraintKind, Error};
pub use crate::params::Params;
pub use crate::row::{Row, RunResult};
pub use crate::statement::Statement;
pub use crate::value::Value;
