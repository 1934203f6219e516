//! Letter body normalisation.
//!
//! Converts a body in one of the declared [`BodyFormat`]s into a markup fragment ready to be
//! placed inside the letter template. No format fails: the mapping from tag to variant
//! already sends unknown tags to plain text.

use letterpdf_types::BodyFormat;
use pulldown_cmark::{html, Options, Parser};

/// Formats `body` according to `format`.
pub fn format_body(body: &str, format: BodyFormat) -> String {
    match format {
        BodyFormat::Plain => plain_to_html(body),
        BodyFormat::Markdown => markdown_to_html(body),
        BodyFormat::Html => body.to_owned(),
    }
}

/// Wraps blank-line separated paragraphs in `<p>` and turns the remaining newlines into
/// `<br>`. Text is HTML-escaped.
fn plain_to_html(body: &str) -> String {
    let normalised = body.replace("\r\n", "\n").replace('\r', "\n");

    normalised
        .split("\n\n")
        .map(|para| {
            let escaped = htmlize::escape_text(para);
            format!("<p>{}</p>", escaped.replace('\n', "<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn markdown_to_html(body: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(body, options);

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
