//! Shared helpers: cooperative cancellation and input validation.

pub mod cancel;
pub mod validation;
