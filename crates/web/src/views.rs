//! Typed page models.
//!
//! Each page handler fills one of these and calls `render()`. Every piece of
//! user-supplied text goes through [`render::escape`] on the way out.

#![allow(missing_docs)]

use std::fmt::Write;

use yatube_common::FieldErrors;
use yatube_core::{CommentView, Page, PostView};
use yatube_db::entities::{group, user};

use crate::render::{self, escape, field_errors, layout, linebreaks, paginator};

/// A post as shown in listings and on its own page.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: String,
    pub text: String,
    pub created: String,
    pub author_username: String,
    pub author_name: String,
    pub group: Option<(String, String)>,
    pub image_url: Option<String>,
}

impl PostCard {
    /// Build a card; `image_url` is the public URL of the post image.
    #[must_use]
    pub fn new(view: &PostView, image_url: Option<String>) -> Self {
        Self {
            id: view.post.id.clone(),
            text: view.post.text.clone(),
            created: render::created_date(&view.post),
            author_username: view.author.username.clone(),
            author_name: view.author.display_name().to_string(),
            group: view
                .group
                .as_ref()
                .map(|g| (g.slug.clone(), g.title.clone())),
            image_url,
        }
    }

    fn render(&self, full: bool) -> String {
        let mut html = String::from("<article class=\"post\">\n<ul class=\"meta\">\n");
        let _ = writeln!(
            html,
            "<li>Author: <a href=\"/profile/{}/\">{}</a></li>",
            urlencoding::encode(&self.author_username),
            escape(&self.author_name)
        );
        let _ = writeln!(html, "<li>Date: {}</li>", self.created);
        html.push_str("</ul>\n");

        if let Some(url) = &self.image_url {
            let _ = writeln!(html, "<img class=\"post-image\" src=\"{}\" alt=\"\">", escape(url));
        }
        let _ = writeln!(html, "<p>{}</p>", linebreaks(&self.text));

        if !full {
            let _ = writeln!(html, "<a href=\"/posts/{}/\">details</a>", escape(&self.id));
        }
        if let Some((slug, title)) = &self.group {
            let _ = writeln!(
                html,
                "<a class=\"group\" href=\"/group/{}/\">#{}</a>",
                escape(slug),
                escape(title)
            );
        }
        html.push_str("</article>\n");
        html
    }
}

fn post_list(posts: &Page<PostCard>, base: &str) -> String {
    let mut html = String::new();
    if posts.items.is_empty() {
        html.push_str("<p class=\"empty\">No posts yet.</p>\n");
    }
    for (i, card) in posts.items.iter().enumerate() {
        if i > 0 {
            html.push_str("<hr>\n");
        }
        html.push_str(&card.render(false));
    }
    html.push_str(&paginator(base, posts.number, posts.num_pages));
    html
}

/// Main page: every post.
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub viewer: Option<String>,
    pub posts: Page<PostCard>,
}

impl IndexPage {
    #[must_use]
    pub fn render(&self) -> String {
        let body = format!(
            "<h1>Latest updates</h1>\n{}",
            post_list(&self.posts, "/")
        );
        layout("Main page", self.viewer.as_deref(), &body)
    }
}

/// Posts of one group.
#[derive(Debug, Clone)]
pub struct GroupPage {
    pub viewer: Option<String>,
    pub group: group::Model,
    pub posts: Page<PostCard>,
}

impl GroupPage {
    #[must_use]
    pub fn render(&self) -> String {
        let base = format!("/group/{}/", escape(&self.group.slug));
        let body = format!(
            "<h1>{}</h1>\n<p>{}</p>\n{}",
            escape(&self.group.title),
            linebreaks(&self.group.description),
            post_list(&self.posts, &base)
        );
        layout(&format!("Group {}", self.group.title), self.viewer.as_deref(), &body)
    }
}

/// A user's profile with their posts.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub viewer: Option<String>,
    pub author: user::Model,
    /// Whether the viewer follows the author.
    pub following: bool,
    pub followers: u64,
    pub follows: u64,
    pub posts: Page<PostCard>,
}

impl ProfilePage {
    #[must_use]
    pub fn render(&self) -> String {
        let username = urlencoding::encode(&self.author.username);
        let mut body = format!(
            "<h1>All posts by {}</h1>\n<h3>Posts: {}</h3>\n\
             <p class=\"follow-counts\">Followers: {} | Following: {}</p>\n",
            escape(self.author.display_name()),
            self.posts.total,
            self.followers,
            self.follows
        );

        let is_self = self.viewer.as_deref() == Some(self.author.username.as_str());
        if self.viewer.is_some() && !is_self {
            if self.following {
                let _ = writeln!(
                    body,
                    "<a class=\"btn unfollow\" href=\"/profile/{username}/unfollow/\">Unfollow</a>"
                );
            } else {
                let _ = writeln!(
                    body,
                    "<a class=\"btn follow\" href=\"/profile/{username}/follow/\">Follow</a>"
                );
            }
        }

        body.push_str(&post_list(&self.posts, &format!("/profile/{username}/")));
        layout(
            &format!("Profile of {}", self.author.display_name()),
            self.viewer.as_deref(),
            &body,
        )
    }
}

/// A single post with its comments.
#[derive(Debug, Clone)]
pub struct PostDetailPage {
    pub viewer: Option<String>,
    pub post: PostCard,
    /// Number of posts by the same author.
    pub author_posts: u64,
    pub comments: Vec<CommentView>,
}

impl PostDetailPage {
    #[must_use]
    pub fn render(&self) -> String {
        let post_id = escape(&self.post.id);
        let mut body = self.post.render(true);
        let _ = writeln!(
            body,
            "<p class=\"author-posts\">Posts by this author: {}</p>",
            self.author_posts
        );

        if self.viewer.as_deref() == Some(self.post.author_username.as_str()) {
            let _ = writeln!(body, "<a class=\"btn\" href=\"/posts/{post_id}/edit/\">Edit post</a>");
        }

        if self.viewer.is_some() {
            let _ = write!(
                body,
                "<form method=\"post\" action=\"/posts/{post_id}/comment/\">\n\
                 <label for=\"id_text\">Add a comment</label>\n\
                 <textarea name=\"text\" id=\"id_text\" required></textarea>\n\
                 <button type=\"submit\">Send</button>\n</form>\n"
            );
        }

        body.push_str("<section class=\"comments\">\n");
        for view in &self.comments {
            let _ = write!(
                body,
                "<div class=\"comment\">\n<h5><a href=\"/profile/{}/\">{}</a> {}</h5>\n<p>{}</p>\n</div>\n",
                urlencoding::encode(&view.author.username),
                escape(view.author.display_name()),
                render::created_date(&view.comment),
                linebreaks(&view.comment.text)
            );
        }
        body.push_str("</section>\n");

        let title: String = self.post.text.chars().take(30).collect();
        layout(&format!("Post {title}"), self.viewer.as_deref(), &body)
    }
}

/// The create or edit form.
#[derive(Debug, Clone, Default)]
pub struct PostFormPage {
    pub viewer: Option<String>,
    /// Set when editing an existing post.
    pub post_id: Option<String>,
    pub text: String,
    /// Selected group ID.
    pub group: Option<String>,
    pub groups: Vec<group::Model>,
    pub errors: FieldErrors,
}

impl PostFormPage {
    #[must_use]
    pub fn render(&self) -> String {
        let (heading, action, button) = match &self.post_id {
            Some(id) => ("Edit post", format!("/posts/{}/edit/", escape(id)), "Save"),
            None => ("New post", "/create/".to_string(), "Add"),
        };

        let mut options = String::from("<option value=\"\">---------</option>\n");
        for group in &self.groups {
            let selected = if self.group.as_deref() == Some(group.id.as_str()) {
                " selected"
            } else {
                ""
            };
            let _ = writeln!(
                options,
                "<option value=\"{}\"{selected}>{}</option>",
                escape(&group.id),
                escape(&group.title)
            );
        }

        let body = format!(
            "<h1>{heading}</h1>\n\
             <form method=\"post\" action=\"{action}\" enctype=\"multipart/form-data\">\n\
             <label for=\"id_text\">Text</label>\n{text_errors}\
             <textarea name=\"text\" id=\"id_text\">{text}</textarea>\n\
             <label for=\"id_group\">Group</label>\n{group_errors}\
             <select name=\"group\" id=\"id_group\">\n{options}</select>\n\
             <label for=\"id_image\">Image</label>\n{image_errors}\
             <input type=\"file\" name=\"image\" id=\"id_image\" accept=\"image/*\">\n\
             <button type=\"submit\">{button}</button>\n</form>\n",
            text_errors = field_errors(&self.errors, "text"),
            text = escape(&self.text),
            group_errors = field_errors(&self.errors, "group"),
            image_errors = field_errors(&self.errors, "image"),
        );
        layout(heading, self.viewer.as_deref(), &body)
    }
}

/// Posts by followed authors.
#[derive(Debug, Clone)]
pub struct FollowPage {
    pub viewer: Option<String>,
    pub posts: Page<PostCard>,
}

impl FollowPage {
    #[must_use]
    pub fn render(&self) -> String {
        let body = format!(
            "<h1>Posts by authors you follow</h1>\n{}",
            post_list(&self.posts, "/follow/")
        );
        layout("Following", self.viewer.as_deref(), &body)
    }
}

/// Login form.
#[derive(Debug, Clone, Default)]
pub struct LoginPage {
    pub next: Option<String>,
    pub username: String,
    pub error: Option<String>,
}

impl LoginPage {
    #[must_use]
    pub fn render(&self) -> String {
        let error = self
            .error
            .as_deref()
            .map(|e| format!("<p class=\"errornote\">{}</p>\n", escape(e)))
            .unwrap_or_default();
        let next = self
            .next
            .as_deref()
            .map(|n| format!("<input type=\"hidden\" name=\"next\" value=\"{}\">\n", escape(n)))
            .unwrap_or_default();

        let body = format!(
            "<h1>Log in</h1>\n{error}\
             <form method=\"post\" action=\"/auth/login/\">\n{next}\
             <label for=\"id_username\">Username</label>\n\
             <input type=\"text\" name=\"username\" id=\"id_username\" value=\"{username}\" required>\n\
             <label for=\"id_password\">Password</label>\n\
             <input type=\"password\" name=\"password\" id=\"id_password\" required>\n\
             <button type=\"submit\">Log in</button>\n</form>\n\
             <p>No account? <a href=\"/auth/signup/\">Sign up</a></p>\n",
            username = escape(&self.username),
        );
        layout("Log in", None, &body)
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignupPage {
    pub username: String,
    pub name: String,
    pub errors: FieldErrors,
}

impl SignupPage {
    #[must_use]
    pub fn render(&self) -> String {
        let body = format!(
            "<h1>Sign up</h1>\n<form method=\"post\" action=\"/auth/signup/\">\n\
             <label for=\"id_username\">Username</label>\n{username_errors}\
             <input type=\"text\" name=\"username\" id=\"id_username\" value=\"{username}\" required>\n\
             <label for=\"id_name\">Name</label>\n{name_errors}\
             <input type=\"text\" name=\"name\" id=\"id_name\" value=\"{name}\">\n\
             <label for=\"id_password\">Password</label>\n{password_errors}\
             <input type=\"password\" name=\"password\" id=\"id_password\" required>\n\
             <label for=\"id_password_confirm\">Password confirmation</label>\n{confirm_errors}\
             <input type=\"password\" name=\"password_confirm\" id=\"id_password_confirm\" required>\n\
             <button type=\"submit\">Sign up</button>\n</form>\n",
            username_errors = field_errors(&self.errors, "username"),
            username = escape(&self.username),
            name_errors = field_errors(&self.errors, "name"),
            name = escape(&self.name),
            password_errors = field_errors(&self.errors, "password"),
            confirm_errors = field_errors(&self.errors, "password_confirm"),
        );
        layout("Sign up", None, &body)
    }
}

/// Custom 404 page.
#[derive(Debug, Clone, Default)]
pub struct NotFoundPage {
    pub viewer: Option<String>,
    pub path: String,
}

impl NotFoundPage {
    #[must_use]
    pub fn render(&self) -> String {
        let body = format!(
            "<h1>Page not found</h1>\n<p>There is nothing at <code>{}</code>.</p>\n\
             <a href=\"/\">Back to the main page</a>\n",
            escape(&self.path)
        );
        layout("Page not found", self.viewer.as_deref(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use yatube_db::entities::post;

    fn author(username: &str) -> user::Model {
        user::Model {
            id: format!("id-{username}"),
            username: username.to_string(),
            name: None,
            password: String::new(),
            token: None,
            is_staff: false,
            created_at: Utc::now().into(),
        }
    }

    fn card(text: &str) -> PostCard {
        let view = PostView {
            post: post::Model {
                id: "p1".to_string(),
                text: text.to_string(),
                created_at: Utc::now().into(),
                image: None,
                author_id: "id-leo".to_string(),
                group_id: None,
            },
            author: author("leo"),
            group: None,
        };
        PostCard::new(&view, None)
    }

    #[test]
    fn test_post_text_is_escaped() {
        let page = IndexPage {
            viewer: None,
            posts: Page::new(vec![card("<b>hi</b>")], 1, 1, 10),
        };
        let html = page.render();

        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(!html.contains("<b>hi</b>"));
    }

    #[test]
    fn test_profile_follow_button() {
        let page = |viewer: Option<&str>, following| ProfilePage {
            viewer: viewer.map(str::to_string),
            author: author("leo"),
            following,
            followers: 3,
            follows: 1,
            posts: Page::new(Vec::new(), 1, 0, 10),
        };

        assert!(page(None, false).render().contains("Followers: 3 | Following: 1"));
        assert!(!page(None, false).render().contains("/follow/\">Follow"));
        assert!(!page(Some("leo"), false).render().contains("/profile/leo/follow/"));
        assert!(page(Some("ann"), false).render().contains("/profile/leo/follow/"));
        assert!(page(Some("ann"), true).render().contains("/profile/leo/unfollow/"));
    }

    #[test]
    fn test_detail_edit_link_only_for_author() {
        let page = |viewer: Option<&str>| PostDetailPage {
            viewer: viewer.map(str::to_string),
            post: card("text"),
            author_posts: 1,
            comments: Vec::new(),
        };

        assert!(page(Some("leo")).render().contains("/posts/p1/edit/"));
        assert!(!page(Some("ann")).render().contains("/posts/p1/edit/"));
        assert!(!page(None).render().contains("/posts/p1/comment/"));
    }

    #[test]
    fn test_form_shows_errors_and_selection() {
        let page = PostFormPage {
            text: "draft".to_string(),
            group: Some("g2".to_string()),
            groups: vec![group::Model {
                id: "g2".to_string(),
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            }],
            errors: FieldErrors::single("image", "Upload a valid image."),
            ..Default::default()
        };
        let html = page.render();

        assert!(html.contains("<option value=\"g2\" selected>Cats</option>"));
        assert!(html.contains("Upload a valid image."));
        assert!(html.contains(">draft</textarea>"));
    }
}
