//! HTML rendering for the admin views. No template engine; pages are small
//! enough that escaped `format!` fragments stay readable.

use shelfd_store::{Book, BookStatus};

use crate::modules::dashboard::Metrics;

/// Categories offered by the add form. Free text is still accepted by the API.
const CATEGORIES: &[&str] = &["Fiction", "Non-Fiction", "Sci-Fi", "Biography", "Mystery"];

/// A one-shot banner shown at the top of a page.
pub struct Flash {
    message: String,
    is_error: bool,
}

impl Flash {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }

    fn render(&self) -> String {
        let class = if self.is_error { "banner error" } else { "banner" };
        format!(r#"<p class="{class}">{}</p>"#, escape(&self.message))
    }
}

/// Escape text for inclusion in HTML bodies and attribute values.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encode a query-string value.
pub fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn layout(title: &str, active: &str, flash: Option<Flash>, body: &str) -> String {
    let nav = [
        ("/", "Catalog"),
        ("/search", "Search"),
        ("/assistant", "Assistant"),
        ("/dashboard", "Dashboard"),
    ]
    .iter()
    .map(|(href, label)| {
        let class = if *label == active { r#" class="active""# } else { "" };
        format!(r#"<a href="{href}"{class}>{label}</a>"#)
    })
    .collect::<Vec<_>>()
    .join("\n      ");

    let banner = flash.map(|f| f.render()).unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title} - shelfd</title>
    <style>
      body {{ font-family: sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }}
      nav a {{ margin-right: 1rem; text-decoration: none; }}
      nav a.active {{ font-weight: bold; }}
      table {{ border-collapse: collapse; width: 100%; margin-top: 1rem; }}
      th, td {{ border-bottom: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }}
      .banner {{ background: #e7f5e7; border: 1px solid #9c9; padding: 0.5rem 1rem; }}
      .banner.error {{ background: #fdecea; border-color: #c99; }}
      .tiles {{ display: flex; gap: 1rem; }}
      .tile {{ border: 1px solid #ddd; padding: 1rem 1.5rem; }}
      .tile strong {{ display: block; font-size: 1.6rem; }}
      form.inline {{ display: inline; }}
      blockquote {{ border-left: 3px solid #99c; padding-left: 1rem; white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <nav>
      {nav}
    </nav>
    {banner}
    {body}
  </body>
</html>
"#
    )
}

fn book_rows(books: &[Book]) -> String {
    books
        .iter()
        .map(|book| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&book.title),
                escape(&book.author),
                escape(book.isbn.as_deref().unwrap_or("-")),
                escape(&book.category),
                book.status.as_str(),
                book.added_at.date(),
            )
        })
        .collect()
}

/// Catalog view: full listing plus the add form.
pub fn catalog(books: &[Book], flash: Option<Flash>) -> String {
    let rows = if books.is_empty() {
        r#"<tr><td colspan="6">The catalog is empty. Add your first book below.</td></tr>"#
            .to_string()
    } else {
        book_rows(books)
    };

    let options = CATEGORIES
        .iter()
        .map(|category| format!(r#"<option value="{category}">{category}</option>"#))
        .collect::<String>();

    let body = format!(
        r#"<h1>Catalog</h1>
    <table>
      <tr><th>Title</th><th>Author</th><th>ISBN</th><th>Category</th><th>Status</th><th>Added</th></tr>
      {rows}
    </table>
    <h2>Add a book</h2>
    <form method="post" action="/books">
      <p><label>Title <input name="title" required></label></p>
      <p><label>Author <input name="author" required></label></p>
      <p><label>ISBN <input name="isbn"></label></p>
      <p><label>Category <select name="category">{options}</select></label></p>
      <p><button type="submit">Add book</button></p>
    </form>"#
    );

    layout("Catalog", "Catalog", flash, &body)
}

/// Search view: substring search plus per-row manage actions.
pub fn search(query: &str, results: &[Book], flash: Option<Flash>) -> String {
    let escaped_query = escape(query);

    let results_html = if query.trim().is_empty() {
        "<p>Search the catalog by title, author, or category.</p>".to_string()
    } else if results.is_empty() {
        format!("<p>No books match '{escaped_query}'.</p>")
    } else {
        let rows = results
            .iter()
            .map(|book| {
                let actions = format!(
                    r#"<form class="inline" method="post" action="/books/{id}/status">
                  <input type="hidden" name="q" value="{escaped_query}">
                  <input type="hidden" name="status" value="available">
                  <button type="submit">Mark available</button>
                </form>
                <form class="inline" method="post" action="/books/{id}/status">
                  <input type="hidden" name="q" value="{escaped_query}">
                  <input type="hidden" name="status" value="issued">
                  <button type="submit">Mark issued</button>
                </form>
                <form class="inline" method="post" action="/books/{id}/delete">
                  <input type="hidden" name="q" value="{escaped_query}">
                  <button type="submit">Delete</button>
                </form>"#,
                    id = book.id,
                );
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{actions}</td></tr>",
                    escape(&book.title),
                    escape(&book.author),
                    escape(&book.category),
                    book.status.as_str(),
                )
            })
            .collect::<String>();

        format!(
            r#"<table>
      <tr><th>Title</th><th>Author</th><th>Category</th><th>Status</th><th>Actions</th></tr>
      {rows}
    </table>"#
        )
    };

    let body = format!(
        r#"<h1>Search</h1>
    <form method="get" action="/search">
      <input name="q" value="{escaped_query}" placeholder="title, author, category...">
      <button type="submit">Search</button>
    </form>
    {results_html}"#
    );

    layout("Search", "Search", flash, &body)
}

/// Assistant view: free-text prompt and the generated recommendation.
pub fn assistant(query: &str, answer: Option<&str>, flash: Option<Flash>) -> String {
    let answer_html = answer
        .map(|text| {
            format!(
                "<h2>Recommendation</h2>\n    <blockquote>{}</blockquote>",
                escape(text)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Library assistant</h1>
    <form method="post" action="/assistant">
      <p><textarea name="query" rows="4" cols="60" placeholder="I like sci-fi...">{}</textarea></p>
      <p><button type="submit">Get a recommendation</button></p>
    </form>
    {answer_html}"#,
        escape(query)
    );

    layout("Assistant", "Assistant", flash, &body)
}

/// Dashboard view: metric tiles and recent activity.
pub fn dashboard(metrics: &Metrics) -> String {
    let categories = if metrics.by_category.is_empty() {
        "<p>No books yet.</p>".to_string()
    } else {
        let rows = metrics
            .by_category
            .iter()
            .map(|(category, count)| {
                format!("<tr><td>{}</td><td>{count}</td></tr>", escape(category))
            })
            .collect::<String>();
        format!(
            "<table><tr><th>Category</th><th>Books</th></tr>{rows}</table>"
        )
    };

    let recent = if metrics.recently_added.is_empty() {
        String::new()
    } else {
        format!(
            r#"<h2>Recently added</h2>
    <table>
      <tr><th>Title</th><th>Author</th><th>ISBN</th><th>Category</th><th>Status</th><th>Added</th></tr>
      {}
    </table>"#,
            book_rows(&metrics.recently_added)
        )
    };

    let issued = if metrics.recently_issued.is_empty() {
        String::new()
    } else {
        format!(
            r#"<h2>Recently issued</h2>
    <table>
      <tr><th>Title</th><th>Author</th><th>ISBN</th><th>Category</th><th>Status</th><th>Added</th></tr>
      {}
    </table>"#,
            book_rows(&metrics.recently_issued)
        )
    };

    let body = format!(
        r#"<h1>Dashboard</h1>
    <div class="tiles">
      <div class="tile"><strong>{}</strong>Total books</div>
      <div class="tile"><strong>{}</strong>Available</div>
      <div class="tile"><strong>{}</strong>Issued</div>
      <div class="tile"><strong>{:.1}%</strong>Fill rate</div>
    </div>
    <h2>By category</h2>
    {categories}
    {recent}
    {issued}"#,
        metrics.total_books, metrics.available, metrics.issued, metrics.fill_rate,
    );

    layout("Dashboard", "Dashboard", None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<b>"war" & 'peace'</b>"#),
            "&lt;b&gt;&quot;war&quot; &amp; &#39;peace&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn urlencode_handles_spaces_and_reserved_bytes() {
        assert_eq!(urlencode("Dune Messiah"), "Dune+Messiah");
        assert_eq!(urlencode("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(urlencode("plain-text_1.0~"), "plain-text_1.0~");
    }

    #[test]
    fn assistant_page_embeds_escaped_answer() {
        let html = assistant("sci-fi", Some("Try <Dune>"), None);
        assert!(html.contains("Try &lt;Dune&gt;"));
        assert!(!html.contains("Try <Dune>"));
    }
}
