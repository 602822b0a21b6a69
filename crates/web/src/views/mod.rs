//! HTML rendering.
//!
//! Pages are plain strings. Every value that came from a user goes through
//! [`html_escape`] before it is written out.

mod auth;
mod posts;

use std::fmt::Write as _;

use axum::http::StatusCode;
use yatube_common::{FormErrors, StorageBackend};
use yatube_db::{Page, entities::user};
use yatube_core::FeedPost;

pub use auth::{login_page, signup_page};
pub use posts::{
    PostFormView, follow_page, group_page, index_page, post_detail_page, post_form_page,
    profile_page,
};

/// What every page needs besides its own content.
#[derive(Clone, Copy)]
pub struct PageContext<'a> {
    /// The signed-in user, if any.
    pub viewer: Option<&'a user::Model>,
    /// Resolves image storage keys to URLs.
    pub media: &'a dyn StorageBackend,
}

/// Escape text for HTML content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape text and keep its line breaks.
fn multiline(s: &str) -> String {
    html_escape(s).replace("\r\n", "\n").replace('\n', "<br>\n")
}

fn nav(viewer: Option<&user::Model>) -> String {
    let mut out = String::from("<nav><a href=\"/\">Yatube</a>");
    match viewer {
        Some(user) => {
            let _ = write!(
                out,
                " <a href=\"/create/\">New post</a> <a href=\"/follow/\">Following</a> \
                 <a href=\"/profile/{u}/\">{name}</a> <a href=\"/auth/logout/\">Log out</a>",
                u = html_escape(&user.username),
                name = html_escape(user.display_name()),
            );
        }
        None => {
            out.push_str(
                " <a href=\"/auth/login/\">Log in</a> <a href=\"/auth/signup/\">Sign up</a>",
            );
        }
    }
    out.push_str("</nav>");
    out
}

/// Wrap page content in the base layout.
fn layout(title: &str, viewer: Option<&user::Model>, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<header>{nav}</header>\n\
         <main>\n{content}</main>\n</body>\n</html>\n",
        title = html_escape(title),
        nav = nav(viewer),
    )
}

fn post_card(ctx: PageContext<'_>, item: &FeedPost, show_group: bool) -> String {
    let post = &item.post;
    let mut out = String::from("<article class=\"post\">\n<ul>");
    let _ = write!(
        out,
        "<li>Author: <a href=\"/profile/{u}/\">{name}</a></li>\
         <li>Date: {date}</li>",
        u = html_escape(&item.author.username),
        name = html_escape(item.author.display_name()),
        date = post.created_at.format("%-d %b %Y"),
    );
    out.push_str("</ul>\n");

    if let Some(image) = &post.image {
        let _ = writeln!(
            out,
            "<img src=\"{}\" alt=\"\">",
            html_escape(&ctx.media.public_url(image))
        );
    }

    let _ = writeln!(out, "<p>{}</p>", multiline(&post.text));
    let _ = write!(
        out,
        "<a href=\"/posts/{}/\">Details</a>",
        html_escape(&post.id)
    );

    if show_group && let Some(group) = &item.group {
        let _ = write!(
            out,
            " <a href=\"/group/{}/\">All posts in {}</a>",
            html_escape(&group.slug),
            html_escape(&group.title)
        );
    }

    out.push_str("\n</article>\n");
    out
}

fn post_list(ctx: PageContext<'_>, page: &Page<FeedPost>, show_group: bool) -> String {
    if page.is_empty() {
        return "<p class=\"empty\">No posts yet.</p>\n".to_string();
    }
    page.items
        .iter()
        .map(|item| post_card(ctx, item, show_group))
        .collect::<Vec<_>>()
        .join("<hr>\n")
}

/// Page links for a listing rooted at `base` (a path without query).
fn paginator<T>(page: &Page<T>, base: &str) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let mut out = String::from("<nav class=\"pagination\">");
    if let Some(prev) = page.previous_page_number() {
        let _ = write!(
            out,
            "<a href=\"{base}?page=1\">First</a> <a href=\"{base}?page={prev}\">Previous</a> "
        );
    }
    let _ = write!(
        out,
        "<span class=\"current\">Page {} of {}</span>",
        page.number, page.num_pages
    );
    if let Some(next) = page.next_page_number() {
        let _ = write!(
            out,
            " <a href=\"{base}?page={next}\">Next</a> <a href=\"{base}?page={last}\">Last</a>",
            last = page.num_pages
        );
    }
    out.push_str("</nav>\n");
    out
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    let messages = errors.get(field);
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", html_escape(m)))
        .collect();
    format!("<ul class=\"errorlist\">{items}</ul>\n")
}

/// The shared not-found page.
#[must_use]
pub fn not_found_page() -> String {
    layout(
        "Page not found",
        None,
        "<h1>404</h1>\n<p>The page you requested does not exist.</p>\n<a href=\"/\">Home</a>\n",
    )
}

/// Generic page for any other error status.
#[must_use]
pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    layout(
        reason,
        None,
        &format!(
            "<h1>{}</h1>\n<p>{}</p>\n<a href=\"/\">Home</a>\n",
            status.as_u16(),
            html_escape(reason)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_multiline_keeps_breaks() {
        assert_eq!(multiline("a<b\r\nc"), "a&lt;b<br>\nc");
    }

    #[test]
    fn test_paginator_links() {
        let page: Page<()> = Page {
            items: vec![(); 4],
            number: 2,
            num_pages: 3,
            total: 24,
            page_size: 10,
        };
        let html = paginator(&page, "/");
        assert!(html.contains("href=\"/?page=1\""));
        assert!(html.contains("href=\"/?page=3\""));
        assert!(html.contains("Page 2 of 3"));

        assert!(paginator(&Page::<()>::empty(10), "/").is_empty());
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FormErrors::default();
        errors.add("text", "This field is required.");
        assert!(field_errors(&errors, "text").contains("This field is required."));
        assert!(field_errors(&errors, "group").is_empty());
    }

    #[test]
    fn test_error_pages() {
        assert!(not_found_page().contains("404"));
        assert!(error_page(StatusCode::FORBIDDEN).contains("Forbidden"));
    }
}
