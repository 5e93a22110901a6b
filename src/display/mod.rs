use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::collection::Phase;
use crate::events::ControllerEvent;
use crate::types::{DraftEdit, NAME_FIELD, Row, SortDirection};
use crate::view::CollectionView;

pub fn format_phase_colored(phase: Phase) -> String {
    let badge = match phase {
        Phase::Idle => "[idle]",
        Phase::Loading => "[loading]",
        Phase::Searching => "[searching]",
        Phase::SearchIdle => "[search]",
    };
    match phase {
        Phase::Idle => badge.dimmed().to_string(),
        Phase::Loading => badge.yellow().to_string(),
        Phase::Searching => badge.magenta().to_string(),
        Phase::SearchIdle => badge.cyan().to_string(),
    }
}

/// One line per outcome event: green for success, red for failure.
pub fn format_event(event: &ControllerEvent) -> String {
    let message = event.message();
    match event {
        e if e.is_failure() => format!("{} {}", "✗".red(), message.red()),
        ControllerEvent::NothingToSave { .. } => format!("{} {}", "•".yellow(), message),
        _ => format!("{} {}", "✓".green(), message),
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Column order: `name` first, then every other field in key order.
fn columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for field in row.fields.keys() {
            if field != NAME_FIELD && !columns.contains(field) {
                columns.push(field.clone());
            }
        }
    }
    columns.sort();
    if rows.iter().any(|row| row.field(NAME_FIELD).is_some()) {
        columns.insert(0, NAME_FIELD.to_string());
    }
    columns
}

/// Render a collection as a heading plus a table of its visible rows.
///
/// Pending draft values are shown in place of the stored ones and the row is
/// marked with `*`.
pub fn render_view(view: &CollectionView, drafts: &[DraftEdit]) -> String {
    let mut heading = format!("{} {}", view.title().bold(), format_phase_colored(view.phase));
    if let Some(sort) = &view.sort {
        let arrow = match sort.direction {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        };
        heading.push_str(&format!(" sorted by {}{}", sort.field, arrow));
    }
    if view.draft_count > 0 {
        heading.push_str(&format!(" {}", format!("{} unsaved", view.draft_count).yellow()));
    }
    if let Some(error) = view.error {
        heading.push_str(&format!(" {}", format!("({error})").red()));
    }

    if view.rows.is_empty() {
        let empty = if view.phase.is_search() {
            "No matching records"
        } else {
            "No records"
        };
        return format!("{heading}\n  {}", empty.dimmed());
    }

    let columns = columns(&view.rows);
    let mut builder = Builder::default();
    let mut header = vec![String::new(), "ID".to_string()];
    header.extend(columns.iter().cloned());
    header.push("Link".to_string());
    builder.push_record(header);

    for row in &view.rows {
        let draft = drafts.iter().find(|d| d.id == row.id);
        let mut shown = row.clone();
        if let Some(draft) = draft {
            shown.apply(draft);
        }

        let mut record = vec![
            if draft.is_some() { "*" } else { "" }.to_string(),
            row.id.to_string(),
        ];
        record.extend(columns.iter().map(|c| cell(shown.field(c))));
        record.push(row.link.clone().unwrap_or_default());
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    let mut out = format!("{heading}\n{table}");
    if view.has_more && !view.phase.is_search() {
        out.push_str(&format!("\n{}", "more rows available".dimmed()));
    }
    out
}
