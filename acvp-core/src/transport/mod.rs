//! Authenticated transport loop: §4.G/H/J.

pub mod auth;
pub mod client;
pub mod coordinator;

pub use client::{HttpTransport, Transport};
pub use coordinator::Coordinator;
