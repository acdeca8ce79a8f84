//! Shared foundational types used across the Tessera placement engine.
//!
//! This crate currently provides the internal error type and the result alias
//! every other crate uses for logic-bug failures.

#![warn(missing_docs)]

pub mod result;

pub use result::{InternalError, TesseraResult};
