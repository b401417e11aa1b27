//! Command handlers.

pub mod compare;
pub mod config;
pub mod hash;
