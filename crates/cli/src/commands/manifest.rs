//! Inspect a storefront's web app manifest.

use std::io::Write;

use tracing::{info, warn};

use storecraft_server::services::manifest::{self, Manifest};

use super::{CommandError, connect, storefront_by_slug};

/// Print the manifest that publishing would upload.
///
/// # Errors
///
/// Returns an error if the storefront is unknown.
pub async fn show(slug: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let storefront = storefront_by_slug(&pool, slug).await?;
    let settings = manifest::settings_or_default(&pool, &storefront).await?;

    let json = serde_json::to_string_pretty(&Manifest::build(&storefront, &settings))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;

    let missing = manifest::missing_fields(&settings);
    if missing.is_empty() {
        info!("Manifest is complete");
    } else {
        warn!("Manifest cannot be published yet, missing: {}", missing.join(", "));
    }
    match &settings.manifest_url {
        Some(url) => info!(url = %url, "Last published"),
        None => info!("Never published"),
    }
    Ok(())
}
