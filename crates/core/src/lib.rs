//! Attire Core - Shared domain types.
//!
//! This crate provides common types used across the Attire backend:
//! type-safe entity IDs, validated email addresses, and the order
//! status state machine.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
