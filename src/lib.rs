//! A markdown blog: posts with YAML front matter are read from a content
//! directory, listed, and rendered either by an HTTP server or into a static
//! site.

pub mod config;
pub mod error;
pub mod front_matter;
pub mod generate;
pub mod markdown;
pub mod models;
pub mod pages;
pub mod repository;
pub mod server;
pub mod state;

pub use error::{ConfigError, RenderError, RepositoryError};
pub use markdown::{ContentRenderer, MarkdownRenderer, RenderedContent};
pub use models::{Post, PostMetadata};
pub use repository::{PostCollection, PostListing, PostRepository, RejectedPost, SlugLookup};
