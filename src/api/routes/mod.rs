//! API route modules.

pub mod token;
