use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pages::ListingOrder;
use crate::repository::SlugLookup;

pub const DEFAULT_CONFIG_FILE: &str = "blog.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding one markdown file per post.
    pub content_dir: PathBuf,
    /// Served under `/static` when set.
    pub static_dir: Option<PathBuf>,
    /// Where `build` writes the generated site.
    pub output_dir: PathBuf,
    pub port: u16,
    pub slug_lookup: SlugLookup,
    pub listing_order: ListingOrder,
    pub site: SiteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("posts"),
            static_dir: None,
            output_dir: PathBuf::from("dist"),
            port: 8080,
            slug_lookup: SlugLookup::default(),
            listing_order: ListingOrder::default(),
            site: SiteConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub author: Option<String>,
    pub links: Vec<SiteLink>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "DevBlogs".to_string(),
            author: None,
            links: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SiteLink {
    pub label: String,
    pub url: String,
}

impl Config {
    /// Load `path`, or defaults when no file is given. Relative paths inside
    /// the file are resolved against the file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Apply `PORT` and `CONTENT_DIR` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { key: "PORT", value: port })?;
        }
        if let Some(dir) = lookup("CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.content_dir);
        resolve(&mut self.output_dir);
        if let Some(dir) = self.static_dir.as_mut() {
            resolve(dir);
        }
    }
}
