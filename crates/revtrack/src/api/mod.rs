//! API route handlers

pub mod error;
pub mod phonehome;
pub mod system;
