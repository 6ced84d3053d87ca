//! HTML building blocks shared by the page views.

use std::fmt::Write;

use yatube_common::FieldErrors;
use yatube_db::entities::Created;

const SITE_NAME: &str = "Yatube";

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape text and keep its line breaks.
#[must_use]
pub fn linebreaks(s: &str) -> String {
    escape(s).replace("\r\n", "\n").replace('\n', "<br>\n")
}

/// Creation date as shown under posts and comments, e.g. `5 Mar 2026`.
#[must_use]
pub fn created_date(row: &impl Created) -> String {
    row.created().format("%-d %b %Y").to_string()
}

/// Wrap a page body in the site layout.
///
/// `username` is the signed-in user, if any; it picks the navigation links.
#[must_use]
pub fn layout(title: &str, username: Option<&str>, body: &str) -> String {
    let mut nav = String::from("<a href=\"/\">Main page</a>\n");
    match username {
        Some(username) => {
            let _ = write!(
                nav,
                "<a href=\"/create/\">New post</a>\n\
                 <a href=\"/follow/\">Following</a>\n\
                 <a href=\"/profile/{0}/\">{1}</a>\n\
                 <a href=\"/auth/logout/\">Log out</a>\n",
                urlencoding::encode(username),
                escape(username),
            );
        }
        None => {
            nav.push_str(
                "<a href=\"/auth/login/\">Log in</a>\n<a href=\"/auth/signup/\">Sign up</a>\n",
            );
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | {SITE_NAME}</title>\n</head>\n<body>\n\
         <header>\n<nav>\n{nav}</nav>\n</header>\n\
         <main class=\"container\">\n{body}</main>\n\
         <footer><p>&copy; {SITE_NAME}</p></footer>\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Previous/next links for a paginated listing.
///
/// Returns an empty string when the listing fits on one page.
#[must_use]
pub fn paginator(base: &str, number: u64, num_pages: u64) -> String {
    if num_pages <= 1 {
        return String::new();
    }

    let mut html = String::from("<nav class=\"pagination\">\n");
    if number > 1 {
        let _ = writeln!(html, "<a href=\"{base}?page=1\">&laquo; first</a>");
        let _ = writeln!(html, "<a href=\"{base}?page={}\">previous</a>", number - 1);
    }
    let _ = writeln!(html, "<span class=\"current\">Page {number} of {num_pages}</span>");
    if number < num_pages {
        let _ = writeln!(html, "<a href=\"{base}?page={}\">next</a>", number + 1);
        let _ = writeln!(html, "<a href=\"{base}?page={num_pages}\">last &raquo;</a>");
    }
    html.push_str("</nav>\n");
    html
}

/// Error list shown next to a form field.
#[must_use]
pub fn field_errors(errors: &FieldErrors, field: &str) -> String {
    let messages = errors.get(field);
    if messages.is_empty() {
        return String::new();
    }

    let mut html = String::from("<ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(html, "<li>{}</li>", escape(message));
    }
    html.push_str("</ul>\n");
    html
}
