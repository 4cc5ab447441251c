//! Structured database advice from free-form model output.
//!
//! The [`advisory`] engine turns a raw response into a canonical
//! [`advisory::AdvisoryDocument`] without ever failing; the remaining
//! modules cover configuration and the error types of the outer surfaces.

pub mod advisory;
pub mod error;
pub mod state;
pub mod types;
