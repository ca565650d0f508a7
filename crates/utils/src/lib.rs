//! Common utility for extended `std` types
//!
//! These are left public for convenience.
//!
//! For example, checking a tabulated time mesh is strictly increasing or
//! transposing a dense square block of group-to-group data are useful
//! everywhere.

// Alias for the format! macro
pub use std::format as f;

// Modules
mod error;
mod slice_ext;

// Flatten
pub use error::{Error, Result};
pub use slice_ext::SliceExt;
