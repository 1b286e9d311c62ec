use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::RepositoryError;
use crate::front_matter;
use crate::models::{is_valid_slug, Post, PostMetadata};

const POST_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdx"];

/// How `get_post_by_slug` finds the file declaring a slug.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlugLookup {
    /// Scan every post and match on the declared slug.
    #[default]
    Scan,
    /// Try `<slug>.<ext>` first, falling back to a scan. Relies on file stems
    /// matching slugs.
    FileName,
}

/// Result of scanning the content directory: the posts that made it into the
/// listing and the files that were left out.
#[derive(Debug, Default)]
pub struct PostListing {
    pub posts: Vec<PostMetadata>,
    pub rejected: Vec<RejectedPost>,
}

/// Full posts from one scan, bodies included.
#[derive(Debug, Default)]
pub struct PostCollection {
    pub posts: Vec<Post>,
    pub rejected: Vec<RejectedPost>,
}

#[derive(Debug)]
pub struct RejectedPost {
    pub path: PathBuf,
    pub error: RepositoryError,
}

struct LoadedPost {
    path: PathBuf,
    post: Post,
}

/// Read-only access to the posts in one content directory.
///
/// Nothing is cached: every call lists the directory and reads the files
/// again.
#[derive(Debug, Clone)]
pub struct PostRepository {
    content_dir: PathBuf,
    lookup: SlugLookup,
}

impl PostRepository {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            lookup: SlugLookup::default(),
        }
    }

    pub fn with_lookup(mut self, lookup: SlugLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Metadata of every valid post, ordered by file name.
    pub async fn list_posts(&self) -> Result<Vec<PostMetadata>, RepositoryError> {
        Ok(self.scan().await?.posts)
    }

    /// Every slug that resolves through [`Self::get_post_by_slug`].
    pub async fn slugs(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .list_posts()
            .await?
            .into_iter()
            .map(|metadata| metadata.slug)
            .collect())
    }

    /// Like [`Self::list_posts`], but also reports the files that were
    /// skipped and why.
    pub async fn scan(&self) -> Result<PostListing, RepositoryError> {
        let collection = self.load_posts().await?;
        Ok(PostListing {
            posts: collection.posts.into_iter().map(|p| p.metadata).collect(),
            rejected: collection.rejected,
        })
    }

    /// One scan returning whole posts, for callers that render every post.
    pub async fn load_posts(&self) -> Result<PostCollection, RepositoryError> {
        let (loaded, rejected) = self.load_all().await?;
        Ok(PostCollection {
            posts: loaded.into_iter().map(|l| l.post).collect(),
            rejected,
        })
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RepositoryError> {
        if self.lookup == SlugLookup::FileName {
            if let Some(post) = self.find_by_file_name(slug).await {
                return Ok(post);
            }
            debug!(slug, "no file named after slug, falling back to a full scan");
        }

        let (loaded, _) = self.load_all().await?;
        loaded
            .into_iter()
            .find(|l| l.post.metadata.slug == slug)
            .map(|l| l.post)
            .ok_or_else(|| RepositoryError::PostNotFound(slug.to_string()))
    }

    async fn find_by_file_name(&self, slug: &str) -> Option<Post> {
        if !is_valid_slug(slug) {
            return None;
        }

        for ext in POST_EXTENSIONS {
            let path = self.content_dir.join(format!("{slug}.{ext}"));
            let raw = match fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    debug!(path = %path.display(), "cannot read file named after slug: {}", e);
                    continue;
                }
            };

            match load_post(&path, &raw) {
                Ok(post) if post.metadata.slug == slug => return Some(post),
                Ok(post) => debug!(
                    path = %path.display(),
                    declared = %post.metadata.slug,
                    "file name does not match declared slug"
                ),
                Err(e) => warn!("{}", e),
            }
        }

        None
    }

    async fn load_all(&self) -> Result<(Vec<LoadedPost>, Vec<RejectedPost>), RepositoryError> {
        let paths = self.post_paths().await?;

        let reads = paths.into_iter().map(|path| async move {
            let result = match fs::read_to_string(&path).await {
                Ok(raw) => load_post(&path, &raw),
                Err(source) => Err(RepositoryError::PostRead {
                    path: path.clone(),
                    source,
                }),
            };
            (path, result)
        });

        let mut loaded: Vec<LoadedPost> = Vec::new();
        let mut rejected = Vec::new();
        let mut owners: HashMap<String, PathBuf> = HashMap::new();

        for (path, result) in join_all(reads).await {
            let outcome = result.and_then(|post| match owners.get(&post.metadata.slug) {
                Some(first) => Err(RepositoryError::DuplicateSlug {
                    slug: post.metadata.slug.clone(),
                    path: path.clone(),
                    first: first.clone(),
                }),
                None => Ok(post),
            });

            match outcome {
                Ok(post) => {
                    owners.insert(post.metadata.slug.clone(), path.clone());
                    loaded.push(LoadedPost { path, post });
                }
                Err(error) => {
                    warn!("Skipping post: {}", error);
                    rejected.push(RejectedPost { path, error });
                }
            }
        }

        info!(
            dir = %self.content_dir.display(),
            posts = loaded.len(),
            rejected = rejected.len(),
            "Scanned content directory"
        );
        debug!(paths = ?loaded.iter().map(|l| l.path.display().to_string()).collect::<Vec<_>>());

        Ok((loaded, rejected))
    }

    /// Post files in the content directory, sorted by file name.
    async fn post_paths(&self) -> Result<Vec<PathBuf>, RepositoryError> {
        let dir_error = |source| RepositoryError::DirectoryRead {
            path: self.content_dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.content_dir).await.map_err(dir_error)?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let path = entry.path();
            // Follows symlinks; dangling links fail here and are skipped.
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);

            if is_file && is_post_file(&path) {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "Ignoring non-post entry");
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}

fn load_post(path: &Path, raw: &str) -> Result<Post, RepositoryError> {
    let malformed = |source| RepositoryError::MalformedMetadata {
        path: path.to_path_buf(),
        source,
    };

    let parsed = front_matter::parse(raw).map_err(malformed)?;
    let metadata = PostMetadata::from_fields(parsed.fields).map_err(malformed)?;

    Ok(Post {
        metadata,
        body: parsed.body,
    })
}

/// Markdown files, minus hidden files and editor leftovers (`.#*`, `*~`).
fn is_post_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') || name.ends_with('~') {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| POST_EXTENSIONS.contains(&ext))
}
