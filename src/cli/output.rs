use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::category::CategorySet;
use crate::model::config::ActivityWindow;
use crate::model::todo::{TodoItem, TodoList};
use crate::ops::stats::ProgressReport;
use crate::util::unicode::{display_width, pad_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub category: String,
    /// RFC 3339, UTC
    pub created: String,
}

#[derive(Serialize)]
pub struct CategoryJson {
    pub label: String,
    pub default: bool,
    pub todos: usize,
}

#[derive(Serialize)]
pub struct RecoveryEntryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub fn todo_to_json(item: &TodoItem) -> TodoJson {
    TodoJson {
        id: item.id.clone(),
        text: item.text.clone(),
        completed: item.completed,
        category: item.category.clone(),
        created: item.created().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

pub fn recovery_entry_to_json(entry: &RecoveryEntry) -> RecoveryEntryJson {
    RecoveryEntryJson {
        timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        category: entry.category.to_string(),
        description: entry.description.clone(),
        fields: entry.fields.clone(),
        body: entry.body.clone(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per todo: checkbox, id, text column, category.
pub fn format_todo_line(item: &TodoItem, text_width: usize) -> String {
    let check = if item.completed { 'x' } else { ' ' };
    format!(
        "[{}] {}  {}  {}",
        check,
        item.id,
        pad_to_width(&item.text, text_width),
        item.category
    )
    .trim_end()
    .to_string()
}

pub fn format_todo_list(list: &TodoList, text_width: usize) -> Vec<String> {
    if list.is_empty() {
        return vec!["no todos".to_string()];
    }
    list.iter()
        .map(|item| format_todo_line(item, text_width))
        .collect()
}

/// Category labels with the default marked and per-label todo counts.
pub fn format_categories(categories: &CategorySet, default: &str, list: &TodoList) -> Vec<String> {
    let width = categories.iter().map(display_width).max().unwrap_or(0);
    categories
        .iter()
        .map(|label| {
            let count = list.iter().filter(|t| t.category == label).count();
            let marker = if label == default { "*" } else { " " };
            format!("{} {}  {}", marker, pad_to_width(label, width), count)
        })
        .collect()
}

fn window_name(window: ActivityWindow) -> &'static str {
    match window {
        ActivityWindow::Month => "month",
        ActivityWindow::Rolling => "rolling",
    }
}

/// The progress view: daily activity table, category rates, month summary.
pub fn format_progress(report: &ProgressReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Progress for {} ({} window)",
            report.date,
            window_name(report.window)
        ),
        String::new(),
    ];

    let row = |label: &str, cells: Vec<String>| {
        let mut line = format!("{:<10}", label);
        for cell in cells {
            line.push_str(&format!("{:>4}", cell));
        }
        line
    };
    let activity = &report.activity;
    lines.push(row("Day", activity.labels.iter().map(u32::to_string).collect()));
    lines.push(row(
        "Created",
        activity.created.iter().map(usize::to_string).collect(),
    ));
    lines.push(row(
        "Completed",
        activity.completed.iter().map(usize::to_string).collect(),
    ));
    lines.push(String::new());

    lines.push("By category".to_string());
    let width = report
        .categories
        .iter()
        .map(|c| display_width(&c.category))
        .max()
        .unwrap_or(0);
    for rate in &report.categories {
        lines.push(format!(
            "  {}{:>5}%",
            pad_to_width(&rate.category, width),
            rate.rate
        ));
    }
    lines.push(String::new());

    let month = &report.month;
    let noun = if month.total == 1 { "task" } else { "tasks" };
    lines.push(format!(
        "This month: {} {}, {} completed ({}%)",
        month.total, noun, month.completed, month.percent
    ));
    lines
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let local: DateTime<Local> = entry.timestamp.with_timezone(&Local);
    let mut lines = vec![format!(
        "{} [{}] {}",
        local.format("%Y-%m-%d %H:%M:%S"),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("    {}", body_line));
    }
    lines
}
