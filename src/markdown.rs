use pulldown_cmark::{html, CowStr, Event, Options, Parser};

use crate::error::RenderError;

/// Renderable output of a post body.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedContent {
    pub html: String,
}

/// Turns a post body into renderable content. Implementations must fail
/// rather than emit partial output.
pub trait ContentRenderer: Send + Sync {
    fn render(&self, body: &str) -> Result<RenderedContent, RenderError>;
}

/// CommonMark with tables, strikethrough and KaTeX math.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ContentRenderer for MarkdownRenderer {
    fn render(&self, body: &str) -> Result<RenderedContent, RenderError> {
        render_markdown_to_html(body).map(|html| RenderedContent { html })
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    options
}

pub fn render_markdown_to_html(markdown: &str) -> Result<String, RenderError> {
    let normalized_markdown = normalize_latex_delimiters(markdown);

    let mut events = Vec::new();
    for event in Parser::new_ext(&normalized_markdown, markdown_options()) {
        let event = match event {
            Event::InlineMath(math) => {
                Event::Html(CowStr::Boxed(render_math_html(&math, false)?.into_boxed_str()))
            }
            Event::DisplayMath(math) => {
                Event::Html(CowStr::Boxed(render_math_html(&math, true)?.into_boxed_str()))
            }
            other => other,
        };
        events.push(event);
    }

    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());
    Ok(html_out)
}

fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if let Some((open, close, display_mode)) = delimiter_at(input, i) {
            let content_start = i + open.len();
            if let Some(close_at) = input[content_start..].find(close) {
                let content_end = content_start + close_at;
                let content = &input[content_start..content_end];
                if display_mode || content.contains('\n') {
                    out.push_str("$$");
                    out.push_str(content);
                    out.push_str("$$");
                } else {
                    out.push('$');
                    out.push_str(content);
                    out.push('$');
                }
                i = content_end + close.len();
                continue;
            }
        }

        if let Some(ch) = input[i..].chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }

    out
}

fn delimiter_at(input: &str, index: usize) -> Option<(&'static str, &'static str, bool)> {
    let tail = &input[index..];
    if tail.starts_with("\\(") {
        Some(("\\(", "\\)", false))
    } else if tail.starts_with("\\[") {
        Some(("\\[", "\\]", true))
    } else {
        None
    }
}

fn render_math_html(source: &str, display_mode: bool) -> Result<String, RenderError> {
    let math_error = |message: String| RenderError::Math {
        expression: source.to_string(),
        message,
    };

    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);
    opts.throw_on_error(true);

    let opts = opts.build().map_err(|e| math_error(e.to_string()))?;
    katex::render_with_opts(source, opts).map_err(|e| math_error(e.to_string()))
}
