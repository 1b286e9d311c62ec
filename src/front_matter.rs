//! Front matter extraction.
//!
//! A post starts with a YAML block fenced by `---` lines, followed by the
//! markdown body. Parsing is pure: no file system access happens here.

use gray_matter::{engine::YAML, Matter};
use serde_json::{Map, Value};

const FENCE: &str = "---";

/// Front matter fields as authored, keyed by field name.
pub type Fields = Map<String, Value>;

/// The two halves of a post source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost {
    pub fields: Fields,
    pub body: String,
}

/// Malformed front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("front matter block is missing its closing `---`")]
    Unterminated,

    #[error("invalid YAML in front matter: {0}")]
    InvalidYaml(String),

    #[error("front matter must be a mapping of fields")]
    NotAMapping,

    #[error("invalid front matter fields: {0}")]
    InvalidFields(String),

    #[error("invalid slug `{0}`")]
    InvalidSlug(String),
}

/// Split `raw` into its front matter fields and body.
///
/// Text without an opening fence is all body and yields no fields.
pub fn parse(raw: &str) -> Result<ParsedPost, FrontMatterError> {
    let Some(block_end) = find_block_end(raw)? else {
        return Ok(ParsedPost {
            fields: Fields::new(),
            body: raw.to_string(),
        });
    };

    let block = raw[..block_end].replace("\r\n", "\n");
    if block.lines().all(|line| is_fence(line) || line.trim().is_empty()) {
        return Ok(ParsedPost {
            fields: Fields::new(),
            body: raw[block_end..].to_string(),
        });
    }

    let matter = Matter::<YAML>::new();
    let parsed = matter
        .parse::<Value>(&block)
        .map_err(|e| FrontMatterError::InvalidYaml(e.to_string()))?;

    let fields = match parsed.data {
        None | Some(Value::Null) => Fields::new(),
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err(FrontMatterError::NotAMapping),
    };

    Ok(ParsedPost {
        fields,
        body: raw[block_end..].to_string(),
    })
}

/// Byte offset just past the closing fence line, or `None` when the text does
/// not open with a fence.
fn find_block_end(raw: &str) -> Result<Option<usize>, FrontMatterError> {
    let mut lines = raw.split_inclusive('\n');

    let mut offset = match lines.next() {
        Some(first) if is_fence(first) => first.len(),
        _ => return Ok(None),
    };
    for line in lines {
        offset += line.len();
        if is_fence(line) {
            return Ok(Some(offset));
        }
    }

    Err(FrontMatterError::Unterminated)
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}
