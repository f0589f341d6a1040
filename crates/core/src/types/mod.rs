//! Core types for Storecraft.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod color;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use category::Categories;
pub use color::{ColorError, HexColor, Rgb};
pub use id::*;
pub use price::{Price, PriceError};
pub use slug::{Slug, SlugError};
pub use status::*;
