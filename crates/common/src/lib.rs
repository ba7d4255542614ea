//! Common crate
//!
//! Shared types, configuration, and error handling for Chainql.
//!
//! # Example
//! ```rust
//! use chainql_common::{Error, Value};
//! let err = Error::UnknownTable("receipts".to_string());
//! assert_eq!(err.to_string(), "Table receipts does not exist");
//! assert!(Value::Null.is_null());
//! ```

pub mod config;
pub mod error;
pub mod value;

pub use config::Settings;
pub use error::{BoxError, Error, Result};
pub use value::Value;
