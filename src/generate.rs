//! Static generation: writes every page the server would answer with into an
//! output directory. Only slugs known at build time get an article page.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::config::Config;
use crate::error::{RenderError, RepositoryError};
use crate::markdown::ContentRenderer;
use crate::models::PostMetadata;
use crate::pages;
use crate::repository::PostRepository;
use crate::server::PostsDocument;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("cannot render post `{slug}`: {source}")]
    Render {
        slug: String,
        #[source]
        source: RenderError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize post listing: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub articles: usize,
    pub rejected: usize,
}

pub async fn build_site(
    config: &Config,
    renderer: &dyn ContentRenderer,
) -> Result<BuildReport, BuildError> {
    let repository = PostRepository::new(&config.content_dir);
    let out = config.output_dir.as_path();
    let site = &config.site;

    let collection = repository.load_posts().await?;
    let listed: Vec<PostMetadata> = collection.posts.iter().map(|p| p.metadata.clone()).collect();
    let mut posts = listed.clone();
    pages::sort_posts(&mut posts, config.listing_order);

    write_page(&out.join("index.html"), &pages::render_home(site, &posts)).await?;
    write_page(
        &out.join("blogs").join("index.html"),
        &pages::render_listing(site, &posts),
    )
    .await?;
    write_page(&out.join("404.html"), &pages::render_not_found(site, None)).await?;

    let document = PostsDocument {
        post_info: listed,
    };
    write_page(
        &out.join("api").join("posts.json"),
        &serde_json::to_string_pretty(&document)?,
    )
    .await?;

    for post in &collection.posts {
        let slug = &post.metadata.slug;
        let rendered = renderer
            .render(&post.body)
            .map_err(|source| BuildError::Render {
                slug: slug.clone(),
                source,
            })?;

        let path = out.join("blogs").join(slug).join("index.html");
        write_page(&path, &pages::render_article(site, &post.metadata, &rendered)).await?;
    }

    let report = BuildReport {
        articles: collection.posts.len(),
        rejected: collection.rejected.len(),
    };
    info!(
        out = %out.display(),
        articles = report.articles,
        rejected = report.rejected,
        "Site generated"
    );
    Ok(report)
}

async fn write_page(path: &Path, contents: &str) -> Result<(), BuildError> {
    let write_error = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    fs::write(path, contents).await.map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownRenderer;
    use tempfile::TempDir;

    fn config(root: &Path) -> Config {
        Config {
            content_dir: root.join("posts"),
            output_dir: root.join("dist"),
            ..Config::default()
        }
    }

    fn write_post(root: &Path, name: &str, content: &str) {
        let dir = root.join("posts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[tokio::test]
    async fn writes_listing_articles_and_api() {
        let root = TempDir::new().unwrap();
        write_post(root.path(), "one.md", "---\ntitle: One\nslug: one\n---\nFirst *post*.\n");
        write_post(root.path(), "two.md", "---\ntitle: Two\nslug: two\nmeta: Second\n---\nSecond.\n");
        write_post(root.path(), "bad.md", "---\ntitle: [nope\n---\n");
        let config = config(root.path());

        let report = build_site(&config, &MarkdownRenderer).await.unwrap();

        assert_eq!(report, BuildReport { articles: 2, rejected: 1 });

        let dist = root.path().join("dist");
        for page in ["index.html", "blogs/index.html", "404.html", "api/posts.json"] {
            assert!(dist.join(page).is_file(), "{page} missing");
        }

        let one = std::fs::read_to_string(dist.join("blogs/one/index.html")).unwrap();
        assert!(one.contains("<em>post</em>"));
        assert!(dist.join("blogs/two/index.html").is_file());

        let api: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dist.join("api/posts.json")).unwrap())
                .unwrap();
        assert_eq!(api["postInfo"].as_array().unwrap().len(), 2);
        assert_eq!(api["postInfo"][1]["summary"], "Second");
    }

    #[tokio::test]
    async fn render_failure_aborts_the_build() {
        let root = TempDir::new().unwrap();
        write_post(root.path(), "math.md", "---\ntitle: Math\nslug: math\n---\n$\\nosuchmacro$\n");

        let err = build_site(&config(root.path()), &MarkdownRenderer)
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Render { ref slug, .. } if slug == "math"));
    }

    #[tokio::test]
    async fn missing_content_directory_aborts_the_build() {
        let root = TempDir::new().unwrap();

        let err = build_site(&config(root.path()), &MarkdownRenderer)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::Repository(RepositoryError::DirectoryRead { .. })
        ));
    }
}
