//! Common utilities module
//!
//! This module contains shared utilities used across the sorting engine.

pub mod error;

pub use error::{Result, SortError};
