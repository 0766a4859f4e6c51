//! Word-openable HTML documents

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render `text` as an HTML document, one `<p>` per input line.
pub fn render_html(text: &str, title: &str, author: &str) -> String {
    let paragraphs: String = text
        .split('\n')
        .map(|line| format!("    <p>{}</p>\n", escape_html(line.trim_end_matches('\r'))))
        .collect();

    format!(
        "<html>\n  <head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"author\" content=\"{author}\">\n    <title>{title}</title>\n    <style>\n      body {{ font-family: Calibri, Arial, sans-serif; }}\n      p {{ margin: 0; padding: 0; }}\n    </style>\n  </head>\n  <body>\n{paragraphs}  </body>\n</html>\n",
        author = escape_html(author),
        title = escape_html(title),
        paragraphs = paragraphs,
    )
}
