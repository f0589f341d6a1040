//! Domain models for the storefront builder.
//!
//! Repositories convert database rows into these types; route handlers and
//! services only ever see the validated forms.

pub mod business;
pub mod product;
pub mod pwa;
pub mod session;
pub mod storefront;

pub use business::{Business, Member};
pub use product::{MediaItem, MediaKind, NewProduct, Product};
pub use pwa::{ICON_SIZES, IconSet, PwaSettings};
pub use session::CurrentUser;
pub use storefront::{Instructions, Storefront, ThemeConfig, VerificationConfig};
