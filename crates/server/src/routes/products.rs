//! Dashboard product handlers: editor, bulk actions, CSV and media.
//!
//! Every mutation drops the storefront's cached active-product list.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{info, instrument};

use storecraft_core::{ProductId, StorefrontId};

use crate::backend::{UploadFile, UploadOutcome, storage};
use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::forms::ProductForm;
use crate::middleware::RequireUser;
use crate::models::Product;
use crate::services::access::{Need, require_storefront};
use crate::services::bulk::{BulkService, Deleted, Selection};
use crate::services::catalog::{self, CatalogPage, CatalogQuery};
use crate::services::product_csv::{self, ImportReport};
use crate::state::AppState;

use super::multipart;

/// Dashboard list: one grid page plus the category filter options.
#[derive(Debug, Serialize)]
pub struct ProductList<'a> {
    #[serde(flatten)]
    pub page: CatalogPage<'a>,
    pub categories: Vec<String>,
}

/// Products of every status, through the grid pipeline.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    require_storefront(state.pool(), &user, id, Need::View).await?;
    let repo = ProductRepository::new(state.pool());
    let products = state
        .retry()
        .run("list_products", || repo.list(id))
        .await?;

    let list = ProductList {
        page: catalog::paginate(&products, &query),
        categories: catalog::distinct_categories(&products),
    };
    Ok(Json(list).into_response())
}

/// Create a product.
#[instrument(skip(state, user, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let product = form.validate()?;
    let created = ProductRepository::new(state.pool())
        .create(id, &product)
        .await?;
    state.products().invalidate(id).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a product's fields.
#[instrument(skip(state, user, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((id, product_id)): Path<(StorefrontId, ProductId)>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let product = form.validate()?;
    let updated = ProductRepository::new(state.pool())
        .update(id, product_id, &product)
        .await?;
    state.products().invalidate(id).await;
    Ok(Json(updated))
}

/// Delete one product.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((id, product_id)): Path<(StorefrontId, ProductId)>,
) -> Result<StatusCode> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    ProductRepository::new(state.pool())
        .delete(id, product_id)
        .await?;
    state.products().invalidate(id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the selected products, all or nothing.
#[instrument(skip(state, user, selection))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(selection): Json<Selection>,
) -> Result<Json<Deleted>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let deleted = BulkService::new(state.pool(), state.products())
        .delete(id, &selection)
        .await?;
    add_breadcrumb("products", "Bulk delete", None);
    Ok(Json(deleted))
}

/// Duplicate the selected products, all or nothing.
#[instrument(skip(state, user, selection))]
pub async fn bulk_duplicate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(selection): Json<Selection>,
) -> Result<(StatusCode, Json<Vec<Product>>)> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let copies = BulkService::new(state.pool(), state.products())
        .duplicate(id, &selection)
        .await?;
    add_breadcrumb("products", "Bulk duplicate", None);
    Ok((StatusCode::CREATED, Json(copies)))
}

/// Download every product as CSV.
#[instrument(skip(state, user))]
pub async fn export_csv(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Response> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::View).await?;
    let repo = ProductRepository::new(state.pool());
    let products = state
        .retry()
        .run("export_products", || repo.list(id))
        .await?;
    let body = product_csv::export(&products)?;

    let disposition = format!("attachment; filename=\"{}-products.csv\"", storefront.slug);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Import products from an uploaded CSV file.
///
/// Invalid rows are reported and skipped; a file missing required columns is
/// rejected whole.
#[instrument(skip(state, user, body))]
pub async fn import_csv(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    body: Multipart,
) -> Result<Json<ImportReport>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let file = multipart::read_one(body).await?;

    let repo = ProductRepository::new(state.pool());
    let report = product_csv::import(&repo, id, &file.bytes).await?;
    if report.imported > 0 {
        state.products().invalidate(id).await;
    }
    Ok(Json(report))
}

/// Per-file results of a media upload.
#[derive(Debug, Serialize)]
pub struct MediaUploaded {
    pub files: Vec<UploadOutcome>,
}

/// Upload product images and videos.
///
/// Each file succeeds or fails on its own; the response lists every outcome.
#[instrument(skip(state, user, body))]
pub async fn upload_media(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    body: Multipart,
) -> Result<Json<MediaUploaded>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let parts = multipart::read_files(body).await?;
    if parts.is_empty() {
        return Err(AppError::BadRequest("no files uploaded".to_string()));
    }

    let uploads = parts
        .into_iter()
        .map(|part| UploadFile {
            path: storage::product_media(id, &part.file_name),
            file_name: part.file_name,
            content_type: part.content_type,
            bytes: part.bytes,
        })
        .collect();
    let files = state.backend().upload_many(uploads).await;

    let uploaded = files.iter().filter(|f| f.url().is_some()).count();
    info!(uploaded, failed = files.len() - uploaded, "Media upload finished");
    Ok(Json(MediaUploaded { files }))
}
