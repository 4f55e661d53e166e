//! Summary HTML rendering.
//!
//! Turns a `StructuredSummary` into a standalone UTF-8 HTML document
//! written beside the source recording as `<stem>_summary.html`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::StructuredSummary;

/// Summary output path for a recording: `<stem>_summary.html` in the
/// same directory.
pub fn summary_path_for(video: &Path) -> PathBuf {
    let stem = video.file_stem().unwrap_or_default().to_string_lossy();
    video.with_file_name(format!("{stem}_summary.html"))
}

/// Render the full summary document.
///
/// All model-provided text is escaped before it reaches the markup.
pub fn render_document(
    source_name: &str,
    summary: &StructuredSummary,
    generated_at: DateTime<Local>,
) -> String {
    let mut html = String::new();
    let title = escape_html(source_name);

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>Meeting Summary: {title}</title>");
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>Meeting Summary: {title}</h1>");
    let _ = writeln!(
        html,
        "<p><strong>Generated:</strong> {}</p>",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let _ = writeln!(html, "<h2>Meeting Overview</h2>");
    if summary.overview.trim().is_empty() {
        let _ = writeln!(html, "<p>None recorded.</p>");
    } else {
        let _ = writeln!(html, "<p>{}</p>", escape_html(summary.overview.trim()));
    }

    render_list_section(&mut html, "Key Topics Discussed", &summary.key_topics);
    render_list_section(&mut html, "Decisions Made", &summary.decisions);
    render_list_section(&mut html, "Action Items / Next Steps", &summary.action_items);

    let _ = writeln!(html, "<h2>Participant Contributions</h2>");
    if summary.participants.is_empty() {
        let _ = writeln!(html, "<p>None recorded.</p>");
    } else {
        let _ = writeln!(html, "<ul>");
        for participant in &summary.participants {
            let _ = writeln!(
                html,
                "<li><strong>{}</strong>: {}</li>",
                escape_html(&participant.name),
                escape_html(&participant.contribution)
            );
        }
        let _ = writeln!(html, "</ul>");
    }

    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");

    html
}

fn render_list_section(html: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(html, "<h2>{heading}</h2>");

    if items.is_empty() {
        let _ = writeln!(html, "<p>None recorded.</p>");
        return;
    }

    let _ = writeln!(html, "<ul>");
    for item in items {
        let _ = writeln!(html, "<li>{}</li>", escape_html(item));
    }
    let _ = writeln!(html, "</ul>");
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
