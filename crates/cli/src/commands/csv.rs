//! Product CSV commands.
//!
//! Same file shape as the dashboard's export and import. Media is not
//! carried in CSV.

use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use storecraft_server::db::ProductRepository;
use storecraft_server::services::product_csv;

use super::{CommandError, connect, storefront_by_slug};

/// Export every product of a storefront.
///
/// # Errors
///
/// Returns an error if the storefront is unknown or the output cannot be
/// written.
pub async fn export(slug: &str, output: Option<&Path>) -> Result<(), CommandError> {
    let pool = connect().await?;
    let storefront = storefront_by_slug(&pool, slug).await?;
    let products = ProductRepository::new(&pool).list(storefront.id).await?;
    let csv = product_csv::export(&products)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, csv).await?;
            info!(path = %path.display(), products = products.len(), "Exported products");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Import a CSV file as new products. Bad rows are reported and skipped.
///
/// # Errors
///
/// Returns an error if the storefront is unknown, the file cannot be read
/// or its header is invalid.
pub async fn import(slug: &str, file: &Path) -> Result<(), CommandError> {
    let data = tokio::fs::read(file).await?;
    let pool = connect().await?;
    let storefront = storefront_by_slug(&pool, slug).await?;

    let report =
        product_csv::import(&ProductRepository::new(&pool), storefront.id, &data).await?;

    for row in &report.errors {
        warn!(line = row.line, "Skipped row: {}", row.messages.join("; "));
    }
    info!(
        imported = report.imported,
        skipped = report.errors.len(),
        "Import complete"
    );
    Ok(())
}
