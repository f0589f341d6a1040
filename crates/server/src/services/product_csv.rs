//! Product CSV export and import.
//!
//! The file shape is fixed:
//!
//! ```text
//! name,description,in_town_price,shipping_price,category,status,stock_number
//! ```
//!
//! `category` holds a comma-joined list. On import the header is checked
//! before any row is read; rows are then validated one by one through
//! [`ProductForm`] and invalid rows are skipped and reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use storecraft_core::{Categories, StorefrontId};

use crate::db::{ProductRepository, RepositoryError};
use crate::forms::{PriceField, ProductForm};
use crate::models::{NewProduct, Product};

/// Columns written on export, in order.
pub const COLUMNS: [&str; 7] = [
    "name",
    "description",
    "in_town_price",
    "shipping_price",
    "category",
    "status",
    "stock_number",
];

/// Columns an import file must have.
pub const REQUIRED: [&str; 5] = [
    "name",
    "description",
    "in_town_price",
    "shipping_price",
    "category",
];

/// Errors that reject a whole import or export.
#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("file is empty")]
    Empty,

    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A skipped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based line in the file; the header is line 1.
    pub line: u64,
    pub messages: Vec<String>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<RowError>,
}

/// Rows of a parsed file, split into valid products and rejected lines.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub products: Vec<NewProduct>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    name: String,
    description: String,
    in_town_price: String,
    shipping_price: String,
    category: String,
    status: Option<String>,
    stock_number: Option<String>,
}

impl From<&Product> for CsvRow {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            in_town_price: product.in_town_price.to_string(),
            shipping_price: product.shipping_price.to_string(),
            category: product.categories.joined(),
            status: Some(product.status.as_str().to_owned()),
            stock_number: product.stock_number.clone(),
        }
    }
}

impl CsvRow {
    fn into_form(self) -> ProductForm {
        ProductForm {
            name: self.name,
            description: self.description,
            in_town_price: PriceField::Text(self.in_town_price),
            shipping_price: PriceField::Text(self.shipping_price),
            categories: Categories::parse_joined(&self.category),
            media_urls: Vec::new(),
            status: self.status,
            sort_order: 0,
            stock_number: self.stock_number,
        }
    }
}

/// Serialize products to CSV.
///
/// # Errors
///
/// Returns `CsvImportError::Malformed` if writing fails.
pub fn export(products: &[Product]) -> Result<String, CsvImportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for product in products {
        writer.serialize(CsvRow::from(product))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CsvImportError::Malformed(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse and validate an import file without touching the database.
///
/// # Errors
///
/// Returns `CsvImportError::MissingColumns` naming every absent required
/// column, or `CsvImportError::Empty` when there's no header row.
pub fn parse(data: &[u8]) -> Result<ParsedFile, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_ascii_lowercase())
        .collect();
    if headers.iter().all(str::is_empty) {
        return Err(CsvImportError::Empty);
    }

    let missing: Vec<String> = REQUIRED
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| (*column).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(CsvImportError::MissingColumns(missing));
    }

    let mut parsed = ParsedFile::default();
    for (index, record) in reader.records().enumerate() {
        let fallback_line = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(2);
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, csv::Position::line);
                parsed.errors.push(RowError {
                    line,
                    messages: vec![e.to_string()],
                });
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, csv::Position::line);

        let row = match record.deserialize::<CsvRow>(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                parsed.errors.push(RowError {
                    line,
                    messages: vec![e.to_string()],
                });
                continue;
            }
        };

        match row.into_form().validate() {
            Ok(product) => parsed.products.push(product),
            Err(errors) => parsed.errors.push(RowError {
                line,
                messages: errors.messages(),
            }),
        }
    }

    Ok(parsed)
}

/// Import a file into a storefront.
///
/// Valid rows are inserted in one batch; if the batch insert fails, nothing
/// is imported.
///
/// # Errors
///
/// Returns header errors from [`parse`] or `CsvImportError::Repository` if
/// the batch insert fails.
#[instrument(skip(products, data), fields(bytes = data.len()))]
pub async fn import(
    products: &ProductRepository<'_>,
    storefront_id: StorefrontId,
    data: &[u8],
) -> Result<ImportReport, CsvImportError> {
    let parsed = parse(data)?;

    let imported = if parsed.products.is_empty() {
        0
    } else {
        products
            .create_many(storefront_id, &parsed.products)
            .await?
            .len()
    };

    info!(
        imported,
        skipped = parsed.errors.len(),
        "Product CSV import finished"
    );

    Ok(ImportReport {
        imported,
        errors: parsed.errors,
    })
}
