use chrono::{DateTime, Utc};

use recall_lib::notes::{EditSummary, Field, NoteWithFields, ReviewableWithFields, Side};
use recall_lib::review::{format_interval, DueReviewable, Rating};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Cut `text` to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn render_side(label: &str, fields: &[Field], use_color: bool) -> Vec<String> {
    let mut lines = vec![paint(label, Color::BOLD, use_color)];
    for field in fields {
        lines.push(format!("  {}. {}", field.position + 1, field.value));
    }
    lines
}

/// Header line plus both sides of a note
pub fn render_note(note: &NoteWithFields, use_color: bool) -> String {
    let mut flags = Vec::new();
    if note.note.reversible {
        flags.push("reversible");
    }
    if note.note.separable {
        flags.push("separable");
    }

    let mut header = paint(&format!("Note {}", note.note.id), Color::BOLD, use_color);
    let collections = note.collections.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
    header.push_str(&paint(&format!("  collections: {}", collections), Color::DIM, use_color));
    if !flags.is_empty() {
        header.push_str(&paint(&format!("  [{}]", flags.join(", ")), Color::CYAN, use_color));
    }

    let mut lines = vec![header];
    for side in Side::ALL {
        let label = if side == Side::Front { "Front" } else { "Back" };
        lines.extend(render_side(label, &note.fields[side.index()], use_color));
    }
    lines.join("\n")
}

/// One line per reviewable, listing which fields it prompts with and asks for
pub fn render_reviewables(
    note: &NoteWithFields,
    reviewables: &[ReviewableWithFields],
    use_color: bool,
) -> String {
    let label = |id: i64| -> String {
        Side::ALL
            .iter()
            .flat_map(|&side| note.fields[side.index()].iter().map(move |f| (side, f)))
            .find(|(_, f)| f.id == id)
            .map(|(side, f)| {
                let letter = if side == Side::Front { 'F' } else { 'B' };
                format!("{}{}", letter, f.position + 1)
            })
            .unwrap_or_else(|| format!("#{}", id))
    };

    let mut lines = vec![paint("Reviewables", Color::BOLD, use_color)];
    for entry in reviewables {
        let spec = entry.spec();
        let prompt = spec.fields_on(Side::Front).into_iter().map(label).collect::<Vec<_>>().join("+");
        let answer = spec.fields_on(Side::Back).into_iter().map(label).collect::<Vec<_>>().join("+");
        let mut line = format!("  {:>5}  {} -> {}", entry.reviewable.id, prompt, answer);
        if entry.reviewable.archived {
            line = paint(&format!("{} (archived)", line), Color::GRAY, use_color);
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn render_summary(summary: &EditSummary, use_color: bool) -> String {
    if summary.is_empty() {
        return paint("No changes", Color::DIM, use_color);
    }

    let parts = [
        ("field(s) added", summary.fields_inserted),
        ("field(s) updated", summary.fields_updated),
        ("field(s) archived", summary.fields_archived),
        ("reviewable(s) added", summary.reviewables_inserted),
        ("reviewable(s) archived", summary.reviewables_archived),
        ("reviewable(s) restored", summary.reviewables_unarchived),
    ];
    parts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt and answer of a due reviewable, with the interval each answer would give
pub fn render_due(
    due: &DueReviewable,
    preview: &[(Rating, DateTime<Utc>)],
    now: DateTime<Utc>,
    use_color: bool,
) -> String {
    let status = match &due.snapshot {
        None => paint("new", Color::GREEN, use_color),
        Some(snapshot) if snapshot.due <= now => paint(
            &format!("due {} ago", format_interval(now - snapshot.due)),
            Color::RED,
            use_color,
        ),
        Some(snapshot) => paint(
            &format!("due in {}", format_interval(snapshot.due - now)),
            Color::YELLOW,
            use_color,
        ),
    };

    let mut lines = vec![format!(
        "{}  {}",
        paint(&format!("Reviewable {} (note {})", due.reviewable.id, due.reviewable.note), Color::BOLD, use_color),
        status
    )];
    lines.extend(render_side("Prompt", &due.fields[Side::Front.index()], use_color));
    lines.extend(render_side("Answer", &due.fields[Side::Back.index()], use_color));

    let buttons = preview
        .iter()
        .map(|(rating, at)| format!("{:?}: {}", rating, format_interval(*at - now)))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(paint(&buttons, Color::DIM, use_color));
    lines.join("\n")
}
