//! Plain-text rendering of a session snapshot.

use crate::state::{Mark, Notification, NotificationLevel, Phase, Row, State, StatsView};
use crate::store::{Area, Article, HealthStatus};

/// Carryover count from which a task is flagged as lingering.
///
pub const CARRYOVER_WARNING: u32 = 3;

/// Label for a task carried over from previous days, e.g. `day 3` for a
/// task carried over twice. Returns `None` for tasks created today. The flag
/// is set once the task has been carried over `CARRYOVER_WARNING` times.
///
pub fn carryover_label(carryover_count: u32) -> Option<(String, bool)> {
    if carryover_count == 0 {
        return None;
    }
    Some((
        format!("day {}", carryover_count + 1),
        carryover_count >= CARRYOVER_WARNING,
    ))
}

/// Short tag shown next to tasks outside the work area.
///
pub fn area_tag(area: &Area) -> Option<&str> {
    if *area == Area::work() {
        None
    } else if *area == Area::side_project() {
        Some("side")
    } else {
        Some(area.as_str())
    }
}

pub fn task_line(row: &Row) -> String {
    let cursor = if row.selected { ">" } else { " " };
    let checkbox = match row.mark {
        Some(Mark::Completing) => "[x]",
        Some(Mark::Deleting) => "[-]",
        None => "[ ]",
    };
    let id = row.task.id.to_string();
    let mut line = format!("{} {} {:>8}  {}", cursor, checkbox, id, row.task.text);
    if let Some(tag) = area_tag(&row.task.area) {
        line.push_str(&format!("  #{}", tag));
    }
    if let Some((label, warn)) = carryover_label(row.task.carryover_count) {
        line.push_str(&format!("  ({}{})", label, if warn { "!" } else { "" }));
    }
    line
}

pub fn stats_line(state: &State) -> String {
    let source = match state.stats_view() {
        StatsView::Remote(_) => "",
        StatsView::Local { .. } => " (local)",
    };
    format!(
        "{} pending, {} completed today{}",
        state.pending_count(),
        state.completed_today(),
        source
    )
}

pub fn article_line(article: &Article) -> String {
    if article.description.is_empty() {
        format!("Read: {} <{}>", article.title, article.url)
    } else {
        format!(
            "Read: {} <{}>\n      {}",
            article.title, article.url, article.description
        )
    }
}

pub fn notification_line(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Info => notification.message.clone(),
        NotificationLevel::Error => format!("error: {}", notification.message),
    }
}

pub fn health_line(status: &HealthStatus) -> String {
    if status.is_healthy() {
        format!("ok: {}", status)
    } else {
        format!("error: {}", status)
    }
}

pub const SETUP_HINT: &str =
    "Not configured. Run `focus configure --endpoint <url> --token <token>`.";

/// Render the whole session for the terminal.
///
pub fn render(state: &State) -> String {
    match state.phase() {
        Phase::NeedsSetup => return SETUP_HINT.to_string(),
        Phase::Loading => return "Loading...".to_string(),
        Phase::Failed(message) => return format!("Could not load tasks: {}", message),
        Phase::Ready => (),
    }

    let mut lines = Vec::new();
    let rows = state.visible_rows();
    if rows.is_empty() {
        lines.push(format!("No tasks in {}.", state.tasks().filter()));
    } else {
        lines.extend(rows.iter().map(task_line));
    }
    lines.push(String::new());
    lines.push(stats_line(state));
    if let Some(article) = state.article() {
        lines.push(article_line(article));
    }
    lines.join("\n")
}
