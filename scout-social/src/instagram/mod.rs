//! Instagram private-API integration: login and hashtag top posts.
//!
//! The client talks to the mobile endpoints, authenticates with a username and
//! password, and reuses the bearer issued at login for later calls.
pub mod client;
pub mod types;

pub use client::{DeviceIdentity, InstagramClient, Session};
