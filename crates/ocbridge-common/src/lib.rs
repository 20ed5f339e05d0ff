//! Ocbridge-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across ocbridge:
//!
//! - **Typed IDs**: the well-known configuration key
//! - **Core Types**: service kinds, the recognized-kind allow-list, and
//!   user-facing status messages
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use ocbridge_common::{ConfigId, Error, Result, ServiceKind};
//!
//! let id = ConfigId::SINGLETON;
//! assert_eq!(id.get(), 1);
//!
//! assert!(ServiceKind::new("Ingest").is_recognized());
//!
//! fn example() -> Result<()> {
//!     Err(Error::configuration("mediapackage"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
