use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error};

use crate::config::SiteConfig;
use crate::error::{RenderError, RepositoryError};
use crate::models::PostMetadata;
use crate::pages;
use crate::state::AppState;

/// Body of `GET /api/posts`.
#[derive(Serialize, Debug)]
pub struct PostsDocument {
    #[serde(rename = "postInfo")]
    pub post_info: Vec<PostMetadata>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("cannot render post `{slug}`: {source}")]
    Render {
        slug: String,
        #[source]
        source: RenderError,
    },
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Repository(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An error rendered as an HTML page with a matching status code.
pub struct ErrorPage {
    status: StatusCode,
    html: String,
}

impl ErrorPage {
    fn new(site: &SiteConfig, error: ServerError) -> Self {
        let status = error.status();
        let html = match &error {
            ServerError::Repository(RepositoryError::PostNotFound(slug)) => {
                debug!(slug, "Post not found");
                pages::render_not_found(site, Some(slug))
            }
            ServerError::Render { .. } => {
                error!("{}", error);
                pages::render_error(site, "This post could not be rendered.")
            }
            ServerError::Repository(_) => {
                error!("{}", error);
                pages::render_error(site, "Posts are unavailable right now.")
            }
        };
        Self { status, html }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/", get(homepage))
        .route("/blogs", get(listing))
        .route("/blogs/{slug}", get(render_post))
        .route("/api/posts", get(api_posts).fallback(api_not_found))
        .fallback(not_found);

    if let Some(dir) = static_dir {
        app = app.nest_service("/static", get_service(ServeDir::new(dir)));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn sorted_posts(state: &AppState) -> Result<Vec<PostMetadata>, ServerError> {
    let mut posts = state.repository.list_posts().await?;
    pages::sort_posts(&mut posts, state.listing_order);
    Ok(posts)
}

async fn homepage(State(state): State<Arc<AppState>>) -> Result<Html<String>, ErrorPage> {
    let posts = sorted_posts(&state)
        .await
        .map_err(|e| ErrorPage::new(&state.site, e))?;
    Ok(Html(pages::render_home(&state.site, &posts)))
}

async fn listing(State(state): State<Arc<AppState>>) -> Result<Html<String>, ErrorPage> {
    let posts = sorted_posts(&state)
        .await
        .map_err(|e| ErrorPage::new(&state.site, e))?;
    Ok(Html(pages::render_listing(&state.site, &posts)))
}

async fn render_post(
    UrlPath(slug): UrlPath<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ErrorPage> {
    let page = async {
        let post = state.repository.get_post_by_slug(&slug).await?;
        let rendered = state
            .renderer
            .render(&post.body)
            .map_err(|source| ServerError::Render {
                slug: slug.clone(),
                source,
            })?;
        Ok::<_, ServerError>(pages::render_article(&state.site, &post.metadata, &rendered))
    };

    page.await
        .map(Html)
        .map_err(|e| ErrorPage::new(&state.site, e))
}

async fn api_posts(State(state): State<Arc<AppState>>) -> Response {
    match state.repository.list_posts().await {
        Ok(post_info) => Json(PostsDocument { post_info }).into_response(),
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn not_found(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(pages::render_not_found(&state.site, None)))
}
