use std::sync::Arc;

use crate::config::{Config, SiteConfig};
use crate::markdown::ContentRenderer;
use crate::pages::ListingOrder;
use crate::repository::PostRepository;

/// Shared by every request. Holds configuration only: posts are read from
/// the repository on each request.
pub struct AppState {
    pub repository: PostRepository,
    pub renderer: Arc<dyn ContentRenderer>,
    pub site: SiteConfig,
    pub listing_order: ListingOrder,
}

impl AppState {
    pub fn new(config: &Config, renderer: Arc<dyn ContentRenderer>) -> Self {
        Self {
            repository: PostRepository::new(&config.content_dir).with_lookup(config.slug_lookup),
            renderer,
            site: config.site.clone(),
            listing_order: config.listing_order,
        }
    }
}
