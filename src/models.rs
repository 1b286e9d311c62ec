use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::front_matter::{Fields, FrontMatterError};

/// Listing-level view of a post, built from its front matter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostMetadata {
    #[serde(deserialize_with = "scalar_string")]
    pub title: String,
    #[serde(deserialize_with = "scalar_string")]
    pub slug: String,
    #[serde(
        default,
        alias = "meta",
        alias = "description",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
    /// Any other authored field, passed through untouched.
    #[serde(flatten)]
    pub extra: Fields,
}

impl PostMetadata {
    /// Build metadata from parsed front matter fields. `title` and `slug` are
    /// required and the slug must be valid.
    pub fn from_fields(fields: Fields) -> Result<Self, FrontMatterError> {
        let metadata: PostMetadata = serde_json::from_value(Value::Object(fields))
            .map_err(|e| FrontMatterError::InvalidFields(e.to_string()))?;

        if !is_valid_slug(&metadata.slug) {
            return Err(FrontMatterError::InvalidSlug(metadata.slug));
        }

        Ok(metadata)
    }

    /// The authored `date` field as a calendar date, accepting `YYYY-MM-DD`
    /// or RFC 3339 timestamps.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.extra.get("date")?.as_str()?.trim();

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

/// A full post, ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub metadata: PostMetadata,
    pub body: String,
}

/// YAML reads `title: 2023` as a number; keep it as the authored text.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string, found {other}"
        ))),
    }
}

/// Slugs appear in URLs and file names: non-empty, alphanumerics plus `-`,
/// `_` and `.`, never starting with a dot.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
