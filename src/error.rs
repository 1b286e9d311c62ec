use std::path::PathBuf;

use crate::front_matter::FrontMatterError;

/// Failures of the post repository.
///
/// `DirectoryRead` is fatal to every operation. `PostRead`, `MalformedMetadata`
/// and `DuplicateSlug` concern a single file and are collected per post by
/// [`crate::repository::PostRepository::scan`]. `PostNotFound` is the expected
/// outcome of asking for an unknown slug.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("cannot read content directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read post {}: {source}", path.display())]
    PostRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed front matter in {}: {source}", path.display())]
    MalformedMetadata {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("slug `{slug}` in {} is already claimed by {}", path.display(), first.display())]
    DuplicateSlug {
        slug: String,
        path: PathBuf,
        first: PathBuf,
    },

    #[error("no post with slug `{0}`")]
    PostNotFound(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::PostNotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot render math `{expression}`: {message}")]
    Math { expression: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidOverride { key: &'static str, value: String },
}
