use std::fmt::Write;

use crate::metrics::MetricsSnapshot;
use crate::view::{Projection, ViewParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

const BAR_WIDTH: usize = 32;

pub fn render_users_text(projection: &Projection, params: &ViewParams) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        ":: users : {} filtered, sort {} {}",
        projection.total_filtered,
        params.sort_field.as_str(),
        params.sort_order.as_str(),
    );
    let _ = writeln!(out);

    let name_width = column_width(projection.visible.iter().map(|r| r.name.len()), 4);
    let email_width = column_width(projection.visible.iter().map(|r| r.email.len()), 5);

    let _ = writeln!(
        out,
        "  {:<8} {:<name_width$} {:<email_width$} {}",
        "ID", "NAME", "EMAIL", "CREATED"
    );
    for record in projection.visible.iter() {
        let _ = writeln!(
            out,
            "  {:<8} {:<name_width$} {:<email_width$} {}",
            format!("#{}", record.id),
            record.name,
            record.email,
            record.created_at.format("%d %b %Y"),
        );
    }

    if projection.visible.is_empty() {
        let _ = writeln!(out, "  no users match the current view");
    }

    let _ = writeln!(out);
    let shown_from = if projection.visible.is_empty() {
        0
    } else {
        (params.page - 1) * params.page_size + 1
    };
    let shown_to = if projection.visible.is_empty() {
        0
    } else {
        shown_from + projection.visible.len() - 1
    };
    let _ = writeln!(
        out,
        "  showing {}-{} of {} :: page {} / {}",
        shown_from, shown_to, projection.total_filtered, params.page, projection.total_pages
    );

    out
}

pub fn render_users_json(projection: &Projection) -> Vec<u8> {
    serde_json::to_vec_pretty(projection).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_dashboard_text(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, ":: {:<14}: {}", "Total users", snapshot.total_count);
    let _ = writeln!(out, ":: {:<14}: {}", "New this week", snapshot.recent_count);
    let _ = writeln!(
        out,
        ":: {:<14}: +{:.1}%",
        "Growth rate", snapshot.growth_rate
    );
    let _ = writeln!(out);

    let _ = writeln!(out, ":: New signups (last 7 days)");
    let histogram_max = snapshot
        .daily_histogram
        .iter()
        .map(|b| b.new_records as u64)
        .max()
        .unwrap_or(0);
    for bucket in snapshot.daily_histogram.iter() {
        let _ = writeln!(
            out,
            "  {:<8} |{}| {}",
            bucket.label,
            bar(bucket.new_records as u64, histogram_max),
            bucket.new_records
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, ":: API activity (estimated from directory size)");
    let activity_max = snapshot
        .endpoint_activity
        .iter()
        .map(|a| a.requests)
        .max()
        .unwrap_or(0);
    for activity in snapshot.endpoint_activity.iter() {
        let _ = writeln!(
            out,
            "  {:<14} |{}| {}",
            activity.endpoint,
            bar(activity.requests, activity_max),
            activity.requests
        );
    }

    out
}

pub fn render_dashboard_json(snapshot: &MetricsSnapshot) -> Vec<u8> {
    serde_json::to_vec_pretty(snapshot).unwrap_or_else(|_| b"{}\n".to_vec())
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return " ".repeat(BAR_WIDTH);
    }
    let filled = ((value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

fn column_width<I>(lengths: I, minimum: usize) -> usize
where
    I: Iterator<Item = usize>,
{
    lengths.max().unwrap_or(minimum).max(minimum)
}
