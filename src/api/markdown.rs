//! Markdown to HTML for assistant replies
//!
//! Raw HTML in the source is emitted as escaped text, and links or images
//! with script-capable schemes lose their target.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Render a reply for display in the thread
pub fn render_markdown(text: &str) -> String {
    let options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;

    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lowered = url.trim_start().to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        CowStr::Borrowed("")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_and_lists() {
        assert_eq!(
            render_markdown("**Warm** palette"),
            "<p><strong>Warm</strong> palette</p>\n"
        );

        let html = render_markdown("- olive\n- sage\n");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>olive</li>"));
        assert!(html.contains("<li>sage</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("Look <script>alert(1)</script> here");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let block = render_markdown("<div onclick=\"x()\">hi</div>\n");
        assert!(!block.contains("<div"));
        assert!(block.contains("&lt;div"));
    }

    #[test]
    fn test_script_links_are_neutralized() {
        let html = render_markdown("[click](javascript:alert(1)) and [ok](https://example.com)");
        assert!(!html.to_ascii_lowercase().contains("javascript:"));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_plain_text_is_a_paragraph() {
        assert_eq!(render_markdown("It is green."), "<p>It is green.</p>\n");
    }
}
