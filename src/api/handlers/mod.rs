//! HTTP endpoint handlers.

pub mod info;
pub mod system;
