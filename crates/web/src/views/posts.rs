//! Feed, profile, post and post form pages.

use std::fmt::Write as _;

use yatube_common::FormErrors;
use yatube_core::{FeedPost, GroupFeed, PostDetails, ProfileFeed};
use yatube_db::{Page, entities::group};

use super::{PageContext, field_errors, html_escape, layout, multiline, paginator, post_list};

/// Home feed.
#[must_use]
pub fn index_page(ctx: PageContext<'_>, page: &Page<FeedPost>) -> String {
    let mut content = String::from("<h1>Latest posts</h1>\n");
    content.push_str(&post_list(ctx, page, true));
    content.push_str(&paginator(page, "/"));
    layout("Yatube", ctx.viewer, &content)
}

/// Posts of one group.
#[must_use]
pub fn group_page(ctx: PageContext<'_>, feed: &GroupFeed) -> String {
    let group = &feed.group;
    let mut content = format!(
        "<h1>{}</h1>\n<p>{}</p>\n",
        html_escape(&group.title),
        multiline(&group.description)
    );
    content.push_str(&post_list(ctx, &feed.page, false));
    content.push_str(&paginator(
        &feed.page,
        &format!("/group/{}/", html_escape(&group.slug)),
    ));
    layout(&format!("Group {}", group.title), ctx.viewer, &content)
}

/// Author profile with their posts and the follow toggle.
#[must_use]
pub fn profile_page(ctx: PageContext<'_>, feed: &ProfileFeed) -> String {
    let author = &feed.author;
    let username = html_escape(&author.username);

    let mut content = format!(
        "<h1>All posts by {name}</h1>\n<h3>Posts: {posts}</h3>\n\
         <p>Followers: {followers} &middot; Following: {following}</p>\n",
        name = html_escape(author.display_name()),
        posts = feed.post_count(),
        followers = feed.followers_count,
        following = feed.following_count,
    );

    // Only other signed-in users get the toggle
    if let Some(viewer) = ctx.viewer
        && viewer.id != author.id
    {
        if feed.following {
            let _ = writeln!(
                content,
                "<a class=\"unfollow\" href=\"/profile/{username}/unfollow/\">Unfollow</a>"
            );
        } else {
            let _ = writeln!(
                content,
                "<a class=\"follow\" href=\"/profile/{username}/follow/\">Follow</a>"
            );
        }
    }

    content.push_str(&post_list(ctx, &feed.page, true));
    content.push_str(&paginator(&feed.page, &format!("/profile/{username}/")));
    layout(
        &format!("Profile of {}", author.display_name()),
        ctx.viewer,
        &content,
    )
}

/// Posts by followed authors.
#[must_use]
pub fn follow_page(ctx: PageContext<'_>, page: &Page<FeedPost>) -> String {
    let mut content = String::from("<h1>Posts by authors you follow</h1>\n");
    content.push_str(&post_list(ctx, page, true));
    content.push_str(&paginator(page, "/follow/"));
    layout("Following", ctx.viewer, &content)
}

/// A single post with its comments.
#[must_use]
pub fn post_detail_page(ctx: PageContext<'_>, details: &PostDetails) -> String {
    let post = &details.post;
    let post_id = html_escape(&post.id);
    let mut content = String::from("<aside>\n<ul>");

    let _ = write!(
        content,
        "<li>Date: {}</li>",
        post.created_at.format("%-d %b %Y")
    );
    if let Some(group) = &details.group {
        let _ = write!(
            content,
            "<li>Group: <a href=\"/group/{}/\">{}</a></li>",
            html_escape(&group.slug),
            html_escape(&group.title)
        );
    }
    let _ = write!(
        content,
        "<li>Author: <a href=\"/profile/{u}/\">{name}</a></li>\
         <li>Posts by this author: {count}</li>",
        u = html_escape(&details.author.username),
        name = html_escape(details.author.display_name()),
        count = details.author_post_count,
    );
    content.push_str("</ul>\n</aside>\n<article>\n");

    if let Some(image) = &post.image {
        let _ = writeln!(
            content,
            "<img src=\"{}\" alt=\"\">",
            html_escape(&ctx.media.public_url(image))
        );
    }
    let _ = writeln!(content, "<p>{}</p>", multiline(&post.text));

    if ctx.viewer.is_some_and(|v| v.id == post.author_id) {
        let _ = writeln!(
            content,
            "<a href=\"/posts/{post_id}/edit/\">Edit</a>\n\
             <form method=\"post\" action=\"/posts/{post_id}/delete/\">\
             <button type=\"submit\">Delete</button></form>"
        );
    }
    content.push_str("</article>\n<section class=\"comments\">\n");

    if ctx.viewer.is_some() {
        let _ = writeln!(
            content,
            "<form method=\"post\" action=\"/posts/{post_id}/comment/\">\n\
             <label for=\"id_text\">Add a comment:</label>\n\
             <textarea name=\"text\" id=\"id_text\" required></textarea>\n\
             <button type=\"submit\">Send</button>\n</form>"
        );
    }

    for item in &details.comments {
        let _ = writeln!(
            content,
            "<div class=\"comment\"><a href=\"/profile/{u}/\">{name}</a>\
             <p>{text}</p></div>",
            u = html_escape(&item.author.username),
            name = html_escape(item.author.display_name()),
            text = multiline(&item.comment.text),
        );
    }
    content.push_str("</section>\n");

    layout(&format!("Post {}", post.short_text()), ctx.viewer, &content)
}

/// State of the create/edit form.
#[derive(Debug)]
pub struct PostFormView<'a> {
    /// Submitted or current text.
    pub text: &'a str,
    /// Selected group ID.
    pub group_id: Option<&'a str>,
    /// Errors from the last submission.
    pub errors: &'a FormErrors,
    /// Set when editing; the post's ID.
    pub post_id: Option<&'a str>,
}

impl PostFormView<'_> {
    /// Whether the form edits an existing post.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.post_id.is_some()
    }
}

/// Create or edit form.
#[must_use]
pub fn post_form_page(
    ctx: PageContext<'_>,
    form: &PostFormView<'_>,
    groups: &[group::Model],
) -> String {
    let (title, action, button) = match form.post_id {
        Some(id) => (
            "Edit post",
            format!("/posts/{}/edit/", html_escape(id)),
            "Save",
        ),
        None => ("New post", "/create/".to_string(), "Publish"),
    };

    let mut options = String::from("<option value=\"\">---------</option>");
    for group in groups {
        let selected = if form.group_id == Some(group.id.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            "<option value=\"{}\"{selected}>{}</option>",
            html_escape(&group.id),
            html_escape(&group.title)
        );
    }

    let content = format!(
        "<h1>{title}</h1>\n\
         <form method=\"post\" action=\"{action}\" enctype=\"multipart/form-data\">\n\
         {text_errors}<label for=\"id_text\">Text</label>\n\
         <textarea name=\"text\" id=\"id_text\" required>{text}</textarea>\n\
         {group_errors}<label for=\"id_group\">Group</label>\n\
         <select name=\"group\" id=\"id_group\">{options}</select>\n\
         {image_errors}<label for=\"id_image\">Image</label>\n\
         <input type=\"file\" name=\"image\" id=\"id_image\" accept=\"image/*\">\n\
         <button type=\"submit\">{button}</button>\n</form>\n",
        text_errors = field_errors(form.errors, "text"),
        text = html_escape(form.text),
        group_errors = field_errors(form.errors, "group"),
        image_errors = field_errors(form.errors, "image"),
    );

    layout(title, ctx.viewer, &content)
}
