//! Core value types shared by the runtime components.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of settlement payloads
//!
//! # Examples
//!
//! ```
//! use core_types::Value;
//!
//! let num = Value::from(42);
//! assert_eq!(num, Value::Smi(42));
//! assert_eq!(Value::from("ok").to_string(), "ok");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod value;

pub use value::Value;
