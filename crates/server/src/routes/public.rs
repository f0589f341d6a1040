//! Public storefront pages.
//!
//! Gate progress lives in the visitor's session, one entry per storefront.
//! Gate actions answer with a 303 back to the page so a reload never
//! resubmits the form.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{OriginalUri, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use storecraft_core::StatusFilter;

use crate::db::StorefrontRepository;
use crate::error::{AppError, ErrorSummary, Result};
use crate::models::{MediaItem, Storefront};
use crate::models::session::keys;
use crate::services::catalog::{ALL_CATEGORIES, CatalogQuery, SortOrder};
use crate::services::gate::{Argon2Check, Gate, GateState, StoredGate, Submission};
use crate::services::preview::{GridDensity, LockedView, PageBody, PreviewPage, ViewOptions};
use crate::state::AppState;

use super::pwa;

// =============================================================================
// View models
// =============================================================================

/// An `<option>` of a select control.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A product tile.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub name: String,
    pub description: String,
    pub price: String,
    pub shipping_price: String,
    pub cover: Option<MediaItem>,
    pub categories: String,
}

#[derive(Debug, Clone)]
pub struct ContentView {
    pub search: String,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
    pub densities: Vec<SelectOption>,
    pub density: &'static str,
    pub text_placement: &'static str,
    pub products: Vec<ProductCard>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    pub legal_text: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "storefront.html")]
pub struct StorefrontTemplate {
    pub name: String,
    pub css_variables: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub page_path: String,
    pub locked: Option<LockedView>,
    pub instructions: Option<String>,
    pub content: Option<ContentView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

/// Error panel with a way back to the storefront page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub heading: &'static str,
    pub message: String,
    pub retry_path: String,
}

impl ErrorTemplate {
    fn new(status: StatusCode, summary: ErrorSummary, retry_path: String) -> Self {
        if status.is_server_error() {
            Self {
                heading: "Something went wrong",
                message: "This storefront could not be loaded right now. Please try again."
                    .to_owned(),
                retry_path,
            }
        } else {
            Self {
                heading: "Request not completed",
                message: summary.message,
                retry_path,
            }
        }
    }
}

/// `/s/{slug}` for any path below a storefront.
fn storefront_path(path: &str) -> String {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some(prefix), Some(slug)) if !prefix.is_empty() && !slug.is_empty() => {
            format!("/{prefix}/{slug}")
        }
        _ => "/".to_owned(),
    }
}

/// Render `AppError` responses of public pages as an HTML panel.
pub async fn html_errors(
    OriginalUri(uri): OriginalUri,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    let Some(summary) = response.extensions().get::<ErrorSummary>().cloned() else {
        return response;
    };
    let template = ErrorTemplate::new(status, summary, storefront_path(uri.path()));
    (status, template).into_response()
}

impl StorefrontTemplate {
    fn new(storefront: &Storefront, page: PreviewPage<'_>, view: ViewOptions) -> Self {
        let page_path = storefront.public_path();
        let mut template = Self {
            name: page.branding.name.clone(),
            css_variables: page.branding.css_variables(),
            logo_url: page.branding.logo_url.clone(),
            favicon_url: page.branding.favicon_url.clone(),
            page_path,
            locked: None,
            instructions: None,
            content: None,
        };

        match page.body {
            PageBody::Locked(locked) => template.locked = Some(locked),
            PageBody::Instructions { text } => template.instructions = Some(text),
            PageBody::Content {
                header,
                grid,
                legal_text,
                ..
            } => {
                let query = CatalogQuery {
                    search: Some(header.search.clone()).filter(|s| !s.is_empty()),
                    category: header.category.clone(),
                    sort: header.sort,
                    ..CatalogQuery::default()
                };
                let link = |page: usize| page_url(&template.page_path, &query, view, page);

                let selected_category = header.category.as_deref().unwrap_or(ALL_CATEGORIES);
                let categories = std::iter::once(SelectOption {
                    value: ALL_CATEGORIES.to_owned(),
                    label: "All categories".to_owned(),
                    selected: selected_category.eq_ignore_ascii_case(ALL_CATEGORIES),
                })
                .chain(header.categories.iter().map(|c| SelectOption {
                    value: c.clone(),
                    label: c.clone(),
                    selected: c == selected_category,
                }))
                .collect();

                let content = ContentView {
                    categories,
                    sorts: SortOrder::ALL
                        .iter()
                        .map(|s| SelectOption {
                            value: s.as_str().to_owned(),
                            label: s.label().to_owned(),
                            selected: *s == header.sort,
                        })
                        .collect(),
                    densities: GridDensity::ALL
                        .iter()
                        .map(|d| SelectOption {
                            value: d.as_str().to_owned(),
                            label: d.as_str().to_owned(),
                            selected: *d == view.density,
                        })
                        .collect(),
                    density: view.density.as_str(),
                    text_placement: view.text.as_str(),
                    products: grid
                        .products
                        .iter()
                        .map(|p| ProductCard {
                            name: p.name.clone(),
                            description: p.description.clone(),
                            price: p.in_town_price.display(),
                            shipping_price: p.shipping_price.display(),
                            cover: p.cover(),
                            categories: p.categories.joined(),
                        })
                        .collect(),
                    page: grid.page,
                    total_pages: grid.total_pages,
                    total_items: grid.total_items,
                    previous_url: grid.has_previous().then(|| link(grid.page - 1)),
                    next_url: grid.has_next().then(|| link(grid.page + 1)),
                    search: header.search,
                    legal_text,
                };
                template.content = Some(content);
            }
        }
        template
    }
}

/// Link to a grid page keeping the current filters and view.
fn page_url(path: &str, query: &CatalogQuery, view: ViewOptions, page: usize) -> String {
    let mut params = vec![format!("page={page}")];
    if let Some(search) = &query.search {
        params.push(format!("q={}", urlencoding::encode(search)));
    }
    if let Some(category) = &query.category {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if query.sort != SortOrder::default() {
        params.push(format!("sort={}", query.sort.as_str()));
    }
    if view != ViewOptions::default() {
        params.push(format!("density={}", view.density.as_str()));
        params.push(format!("text={}", view.text.as_str()));
    }
    format!("{path}?{}", params.join("&"))
}

// =============================================================================
// Handlers
// =============================================================================

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NotFoundTemplate).into_response()
}

/// A published storefront by slug. Drafts are invisible here.
async fn published(state: &AppState, slug: &str) -> Result<Option<Storefront>> {
    let repo = StorefrontRepository::new(state.pool());
    Ok(state
        .retry()
        .run("get_storefront_by_slug", || repo.get_by_slug(slug))
        .await?
        .filter(|s| s.is_published))
}

async fn load_gate(session: &Session, storefront: &Storefront) -> Result<Gate> {
    let stored = session
        .get::<StoredGate>(&keys::gate(storefront.id))
        .await?;
    Ok(Gate::resume(
        storefront.verification.verification_type,
        storefront.instructions.enabled,
        stored,
    ))
}

async fn save_gate(session: &Session, storefront: &Storefront, gate: &Gate) -> Result<()> {
    session
        .insert(&keys::gate(storefront.id), gate.to_stored())
        .await?;
    Ok(())
}

async fn render(
    state: &AppState,
    storefront: &Storefront,
    gate_state: GateState,
    query: &CatalogQuery,
    view: ViewOptions,
    error: Option<String>,
) -> Result<StorefrontTemplate> {
    let products = if gate_state == GateState::Unlocked {
        state.products().active(state.pool(), storefront.id).await?
    } else {
        Arc::default()
    };
    let mut page = PreviewPage::derive(storefront, gate_state, &products, query, view);
    if let Some(message) = error {
        page = page.with_error(message);
    }
    Ok(StorefrontTemplate::new(storefront, page, view))
}

/// The storefront page in whatever state the visitor's gate is in.
#[instrument(skip(state, session, query, view))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    Query(query): Query<CatalogQuery>,
    Query(view): Query<ViewOptions>,
) -> Result<Response> {
    let Some(storefront) = published(&state, &slug).await? else {
        return Ok(not_found());
    };
    let gate = load_gate(&session, &storefront).await?;
    // The public grid only ever lists active products.
    let query = CatalogQuery {
        status: StatusFilter::Active,
        ..query
    };
    let template = render(&state, &storefront, gate.state(), &query, view, None).await?;
    Ok(template.into_response())
}

#[instrument(skip(state))]
pub async fn manifest(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let Some(storefront) = published(&state, &slug).await? else {
        return Ok(not_found());
    };
    pwa::manifest_response(&state, &storefront).await
}

/// Check the gate form. A wrong answer re-renders the prompt with the error.
#[instrument(skip(state, session, submission))]
pub async fn verify(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    Form(submission): Form<Submission>,
) -> Result<Response> {
    let Some(storefront) = published(&state, &slug).await? else {
        return Ok(not_found());
    };
    let mut gate = load_gate(&session, &storefront).await?;

    let hash = storefront.password_hash.clone();
    let (gate, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = gate.submit(&submission, &Argon2Check::new(hash.as_deref()));
        (gate, outcome)
    })
    .await
    .map_err(|e| AppError::Internal(format!("gate check task failed: {e}")))?;

    match outcome {
        Ok(next) => {
            info!(storefront_id = %storefront.id, state = ?next, "Gate passed");
            save_gate(&session, &storefront, &gate).await?;
            Ok(Redirect::to(&storefront.public_path()).into_response())
        }
        Err(e) => {
            warn!(storefront_id = %storefront.id, error = %e, "Gate submission rejected");
            let template = render(
                &state,
                &storefront,
                gate.state(),
                &CatalogQuery::default(),
                ViewOptions::default(),
                Some(e.to_string()),
            )
            .await?;
            Ok((StatusCode::FORBIDDEN, template).into_response())
        }
    }
}

#[instrument(skip(state, session))]
pub async fn continue_to_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<Response> {
    let Some(storefront) = published(&state, &slug).await? else {
        return Ok(not_found());
    };
    let mut gate = load_gate(&session, &storefront).await?;
    gate.continue_to_content();
    save_gate(&session, &storefront, &gate).await?;
    Ok(Redirect::to(&storefront.public_path()).into_response())
}

#[instrument(skip(state, session))]
pub async fn restart(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<Response> {
    let Some(storefront) = published(&state, &slug).await? else {
        return Ok(not_found());
    };
    let mut gate = load_gate(&session, &storefront).await?;
    gate.restart();
    save_gate(&session, &storefront, &gate).await?;
    Ok(Redirect::to(&storefront.public_path()).into_response())
}
