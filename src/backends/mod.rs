//!
//! Built-in platform backends.
//!

pub mod dummy;
