//! Business logic services.
//!
//! # Services
//!
//! - `access` - Membership and role checks for dashboard routes
//! - `auth` - Builder sign-in and password recovery via the auth service
//! - `bulk` - All-or-nothing bulk delete and duplicate
//! - `catalog` - Filter, sort and paginate a storefront's products
//! - `gate` - Age/password verification state machine
//! - `manifest` - Web app manifest assembly, icons and publishing
//! - `palette` - Theme colors from a logo image
//! - `preview` - Page state for the public storefront and the live preview
//! - `product_cache` - Cached active products per storefront
//! - `product_csv` - Product CSV export and import

pub mod access;
pub mod auth;
pub mod bulk;
pub mod catalog;
pub mod gate;
pub mod manifest;
pub mod palette;
pub mod preview;
pub mod product_cache;
pub mod product_csv;
