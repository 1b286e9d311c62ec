//! HTML presentation of listings and articles.
//!
//! Pages are assembled with plain placeholder substitution on a single
//! layout. Every authored string is escaped before it is placed in markup.

use std::cmp::Ordering;

use htmlescape::{encode_attribute, encode_minimal};
use serde::Deserialize;

use crate::config::SiteConfig;
use crate::markdown::RenderedContent;
use crate::models::PostMetadata;

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{{ title }}</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16/dist/katex.min.css">
</head>
<body>
    <nav class="site-nav"><a href="/">{{ site }}</a> <a href="/blogs">Posts</a></nav>
    <main class="max-w-3xl mx-auto p-5">
{{ content }}
    </main>
</body>
</html>
"#;

/// Order applied to listings before they are shown.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrder {
    /// Repository order, by file name.
    #[default]
    FileName,
    /// By `date`, newest first. Undated posts go last.
    NewestFirst,
    Title,
}

pub fn sort_posts(posts: &mut [PostMetadata], order: ListingOrder) {
    match order {
        ListingOrder::FileName => {}
        ListingOrder::NewestFirst => posts.sort_by(|a, b| match (a.date(), b.date()) {
            (Some(a_date), Some(b_date)) => b_date.cmp(&a_date).then_with(|| a.title.cmp(&b.title)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.title.cmp(&b.title),
        }),
        ListingOrder::Title => posts.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

fn render_with_layout(site: &SiteConfig, title: &str, content: &str) -> String {
    let page_title = if title == site.title {
        encode_minimal(title)
    } else {
        format!("{} | {}", encode_minimal(title), encode_minimal(&site.title))
    };

    LAYOUT_HTML
        .replace("{{ title }}", &page_title)
        .replace("{{ site }}", &encode_minimal(&site.title))
        .replace("{{ content }}", content)
}

fn blog_card(post: &PostMetadata) -> String {
    format!(
        "<a href=\"/blogs/{}\" class=\"blog-card\"><div class=\"border-x-4 border-y-2 p-2 rounded block mb-2\"><h1 class=\"text-3xl font-semibold\">{}</h1><p class=\"text-gray-500\">{}</p></div></a>",
        encode_minimal(&post.slug),
        encode_minimal(&post.title),
        encode_minimal(post.summary.as_deref().unwrap_or_default()),
    )
}

fn cards(posts: &[PostMetadata]) -> String {
    let mut list_items = String::new();
    for post in posts {
        list_items.push_str(&blog_card(post));
        list_items.push('\n');
    }
    list_items
}

/// Home page: site header, author, profile links, then every post.
pub fn render_home(site: &SiteConfig, posts: &[PostMetadata]) -> String {
    let mut content = format!(
        "<h1 class=\"text-4xl text-center mb-2 font-semibold\">{}</h1>\n",
        encode_minimal(&site.title)
    );
    if let Some(author) = &site.author {
        content.push_str(&format!(
            "<p class=\"text-center\">By {}</p>\n",
            encode_minimal(author)
        ));
    }
    if !site.links.is_empty() {
        content.push_str("<div class=\"flex justify-between mx-16\">");
        for link in &site.links {
            content.push_str(&format!(
                "<a target=\"_blank\" href=\"{}\">{}</a>",
                encode_attribute(&link.url),
                encode_minimal(&link.label)
            ));
        }
        content.push_str("</div>\n");
    }
    content.push_str(&cards(posts));

    render_with_layout(site, &site.title, &content)
}

pub fn render_listing(site: &SiteConfig, posts: &[PostMetadata]) -> String {
    render_with_layout(site, "Posts", &cards(posts))
}

pub fn render_article(site: &SiteConfig, metadata: &PostMetadata, rendered: &RenderedContent) -> String {
    let mut content = format!(
        "<article>\n<h1 class=\"font-semibold text-2xl py-5\">{}</h1>\n",
        encode_minimal(&metadata.title)
    );
    if let Some(date) = metadata.date() {
        content.push_str(&format!(
            "<p style=\"font-size: smaller; color: #888;\">{}</p>\n",
            date.format("%Y-%m-%d")
        ));
    }
    content.push_str("<div class=\"prose pb-20\">\n");
    content.push_str(&rendered.html);
    content.push_str("</div>\n</article>");

    render_with_layout(site, &metadata.title, &content)
}

pub fn render_not_found(site: &SiteConfig, slug: Option<&str>) -> String {
    let detail = match slug {
        Some(slug) => format!("No post is published under <code>{}</code>.", encode_minimal(slug)),
        None => "This page does not exist.".to_string(),
    };
    let content = format!("<h1>Not Found</h1>\n<p>{detail}</p>\n<p><a href=\"/blogs\">All posts</a></p>");

    render_with_layout(site, "Not Found", &content)
}

pub fn render_error(site: &SiteConfig, message: &str) -> String {
    let content = format!(
        "<h1>Something went wrong</h1>\n<p>{}</p>",
        encode_minimal(message)
    );

    render_with_layout(site, "Error", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteLink;
    use scraper::{Html, Selector};
    use serde_json::{json, Value};

    fn metadata(title: &str, slug: &str, date: Option<&str>) -> PostMetadata {
        let mut fields = json!({ "title": title, "slug": slug, "summary": format!("About {title}") });
        if let Some(date) = date {
            fields["date"] = Value::from(date);
        }
        serde_json::from_value(fields).unwrap()
    }

    fn select_text(html: &str, selector: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect()
    }

    #[test]
    fn listing_renders_one_card_per_post() {
        let posts = vec![metadata("First", "first", None), metadata("Second", "second", None)];

        let page = render_listing(&SiteConfig::default(), &posts);

        let document = Html::parse_document(&page);
        let links = Selector::parse("a.blog-card").unwrap();
        let hrefs: Vec<_> = document
            .select(&links)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, ["/blogs/first", "/blogs/second"]);
        assert_eq!(select_text(&page, "a.blog-card p"), ["About First", "About Second"]);
    }

    #[test]
    fn home_shows_author_and_links() {
        let site = SiteConfig {
            title: "DevBlogs".to_string(),
            author: Some("Jane".to_string()),
            links: vec![SiteLink {
                label: "GitHub".to_string(),
                url: "https://github.com/jane".to_string(),
            }],
        };

        let page = render_home(&site, &[metadata("Only", "only", None)]);

        assert_eq!(select_text(&page, "title"), ["DevBlogs"]);
        assert_eq!(select_text(&page, "p.text-center"), ["By Jane"]);
        assert_eq!(select_text(&page, "a[target=_blank]"), ["GitHub"]);
        assert_eq!(select_text(&page, "a.blog-card h1"), ["Only"]);
    }

    #[test]
    fn article_escapes_title_and_keeps_rendered_html() {
        let post = metadata("Tags <b> & more", "tags", Some("2023-01-02"));
        let rendered = RenderedContent {
            html: "<p>Hello <em>there</em></p>\n".to_string(),
        };

        let page = render_article(&SiteConfig::default(), &post, &rendered);

        assert_eq!(select_text(&page, "article h1"), ["Tags <b> & more"]);
        assert_eq!(select_text(&page, "div.prose em"), ["there"]);
        assert!(page.contains("2023-01-02"));
        assert!(page.contains("<title>Tags &lt;b&gt; &amp; more | DevBlogs</title>"));
    }

    #[test]
    fn not_found_names_the_slug() {
        let page = render_not_found(&SiteConfig::default(), Some("missing-post"));

        assert_eq!(select_text(&page, "code"), ["missing-post"]);
    }

    #[test]
    fn newest_first_puts_undated_posts_last() {
        let mut posts = vec![
            metadata("Undated", "undated", None),
            metadata("Old", "old", Some("2021-05-01")),
            metadata("New", "new", Some("2023-05-01")),
        ];

        sort_posts(&mut posts, ListingOrder::NewestFirst);

        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "old", "undated"]);
    }

    #[test]
    fn title_order_and_file_name_order() {
        let mut posts = vec![metadata("Beta", "b", None), metadata("Alpha", "a", None)];

        sort_posts(&mut posts, ListingOrder::FileName);
        assert_eq!(posts[0].title, "Beta");

        sort_posts(&mut posts, ListingOrder::Title);
        assert_eq!(posts[0].title, "Alpha");
    }
}
