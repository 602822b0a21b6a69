//! Core business logic for yatube-rs.
//!
//! Services sit between the web layer and the repositories: they validate
//! input, enforce who may change what, and assemble the feeds.

pub mod services;

pub use services::*;
