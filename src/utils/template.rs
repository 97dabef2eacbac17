//! Placeholder substitution for welcome and goodbye templates.
//!
//! Supported placeholders: `$username`, `$title` and `$n` (newline).
//! Substitution is a single left-to-right pass; inserted values are never
//! scanned again, so a name like `$title` is printed as-is.

/// Values available to a template.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub username: &'a str,
    pub title: &'a str,
}

/// Render a template with the given values.
pub fn render(template: &str, values: &Placeholders<'_>) -> String {
    let replacements: [(&str, &str); 3] = [
        ("$username", values.username),
        ("$title", values.title),
        ("$n", "\n"),
    ];

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match replacements
            .iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder))
        {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
