//! Search module.
//!
//! This module contains the boolean condition tree used to query the
//! local store, and the compiler turning it into a parameterized SQL
//! predicate.

pub mod compiler;
pub mod condition;
pub mod error;
pub mod field;

pub use self::compiler::*;
pub use self::condition::*;
pub use self::error::{Error, Result};
pub use self::field::*;
