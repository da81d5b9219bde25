/*!
style.rs - human output helpers for the CLI (JSON paths never use these).

Color follows NO_COLOR; width follows COLUMNS (clamped), default 100.
*/

use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        Self {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            term_width,
        }
    }

    pub fn plain(term_width: usize) -> Self {
        Self {
            use_color: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Success => "38;5;82",
        Role::Error => "38;5;196",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/// One-line boxed title with an optional dimmed subtitle.
pub fn box_header(title: &str, subtitle: Option<&str>, role: Role, style: &StyleOptions) -> String {
    let inner = match subtitle {
        Some(sub) => format!("{title}  {sub}"),
        None => title.to_string(),
    };
    let inner = truncate_ellipsis(&inner, style.term_width.saturating_sub(4).max(10));
    let width = inner.chars().count() + 2;
    let body = match subtitle {
        Some(sub) if inner.ends_with(sub) => format!(
            "{}  {}",
            color(role, title, style),
            color(Role::Secondary, sub, style)
        ),
        _ => color(role, &inner, style),
    };
    format!(
        "┌{h}┐\n│ {body} │\n└{h}┘",
        h = "─".repeat(width)
    )
}

/// Left-aligned columns separated by two spaces; the last column is
/// truncated to fit the terminal width.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let fixed: usize = widths[..cols - 1].iter().sum::<usize>() + (cols - 1) * 2;
    widths[cols - 1] = widths[cols - 1].min(style.term_width.saturating_sub(fixed).max(8));

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(color(
        Role::Accent,
        render_row(headers.iter().copied(), &widths),
        style,
    ));
    lines.push(color(
        Role::Dim,
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "),
        style,
    ));
    for row in rows {
        let cells = (0..cols).map(|i| row.get(i).map_or("", String::as_str));
        lines.push(render_row(cells, &widths));
    }
    lines.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, w)| pad(&truncate_ellipsis(c, *w), *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_chars {
        return Cow::Borrowed(s);
    }
    if max_chars <= 1 {
        return Cow::Borrowed("…");
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    Cow::Owned(out)
}
