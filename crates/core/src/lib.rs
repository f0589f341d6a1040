//! Storecraft Core - Shared types library.
//!
//! This crate provides common types used across all Storecraft components:
//! - `server` - Builder dashboard API and public storefront renderer
//! - `cli` - Command-line tools for migrations, seeding and CSV transfer
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, slugs, colors, categories and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
