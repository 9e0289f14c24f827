//! Actor implementations

pub mod client;

pub use client::{ClientActor, ClientActorArgs};
