//! Storecraft server library.
//!
//! The builder API, the public storefront renderer and everything they share
//! (repositories, services, middleware), exposed as a library so the CLI and
//! the integration tests can use it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod retry;
pub mod routes;
pub mod services;
pub mod state;
