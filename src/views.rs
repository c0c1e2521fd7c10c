// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered HTML pages.

use crate::models::Run;
use crate::time_utils::{format_run_date, format_utc_rfc3339};
use std::fmt::Write as _;

const STYLE: &str = "body{font-family:sans-serif;max-width:40em;margin:2em auto;padding:0 1em}\
table{border-collapse:collapse;width:100%}td,th{padding:.3em;border-bottom:1px solid #ddd;text-align:left}\
form.add input{margin:.2em}";

/// Values shown on the main page.
#[derive(Debug, Default)]
pub struct IndexPage {
    /// Signed-in user's nickname
    pub runner: Option<String>,
    /// Avatar markup (already HTML)
    pub avatar: Option<String>,
    /// Run history, absent until the user has a runner record
    pub runs: Option<Vec<Run>>,
    /// Login or logout link
    pub url: String,
    /// "Login" or "Logout"
    pub url_linktext: String,
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Render the main page.
pub fn render_index(page: &IndexPage) -> String {
    let mut body = String::new();

    body.push_str("<h1>Run Tracker</h1>\n<p>");
    if let Some(avatar) = &page.avatar {
        body.push_str(avatar);
        body.push(' ');
    }
    if let Some(runner) = &page.runner {
        let _ = write!(body, "Hello, {}! ", escape_html(runner));
    }
    let _ = writeln!(
        body,
        "<a href=\"{}\">{}</a></p>",
        escape_html(&page.url),
        escape_html(&page.url_linktext)
    );

    if page.runner.is_some() {
        body.push_str(
            "<form class=\"add\" action=\"/addRun\" method=\"post\">\n\
             <input name=\"name\" placeholder=\"Name\">\n\
             <input name=\"distance\" placeholder=\"Distance\">\n\
             <input name=\"duration\" placeholder=\"Duration\">\n\
             <input type=\"submit\" value=\"Add Run\">\n</form>\n",
        );
    }

    match &page.runs {
        Some(runs) if !runs.is_empty() => {
            body.push_str(
                "<table>\n<tr><th>Name</th><th>Distance</th><th>Duration</th><th>Date</th><th></th></tr>\n",
            );
            for run in runs {
                let _ = writeln!(
                    body,
                    "<tr><td>{}</td><td>{}</td><td>{}</td>\
                     <td><time datetime=\"{}\">{}</time></td>\
                     <td><a href=\"/removeRun?key={}\">Remove</a></td></tr>",
                    escape_html(&run.name),
                    escape_html(&run.distance),
                    escape_html(&run.duration),
                    format_utc_rfc3339(run.date),
                    format_run_date(run.date),
                    urlencoding::encode(&run.id)
                );
            }
            body.push_str("</table>\n");
        }
        _ => {
            if page.runner.is_some() {
                body.push_str("<p>No runs logged yet.</p>\n");
            }
        }
    }

    layout("Run Tracker", &body)
}

/// Render the sign-in form. `continue_to` is where to go after signing in.
pub fn render_login(continue_to: &str) -> String {
    let body = format!(
        "<h1>Sign in</h1>\n\
         <form action=\"/auth/login\" method=\"post\">\n\
         <input type=\"email\" name=\"email\" placeholder=\"Email\" required>\n\
         <input type=\"hidden\" name=\"continue\" value=\"{}\">\n\
         <input type=\"submit\" value=\"Login\">\n</form>\n",
        escape_html(continue_to)
    );
    layout("Sign in - Run Tracker", &body)
}

/// Render an error page. `details` is shown as plain text.
pub fn render_error(title: &str, details: Option<&str>) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(title));
    if let Some(details) = details {
        let _ = writeln!(body, "<p>{}</p>", escape_html(details));
    }
    body.push_str("<p><a href=\"/\">Back to Run Tracker</a></p>\n");
    layout(&format!("{} - Run Tracker", title), &body)
}
