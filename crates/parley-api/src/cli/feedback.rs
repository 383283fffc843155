//! Feedback CLI commands: list and stats.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_core::repository::feedback::FeedbackFilter;
use parley_types::feedback::{FeedbackMetrics, FeedbackOrigin};
use parley_types::user::normalize_phone;

use crate::state::AppState;

/// List recent feedback, newest first.
pub async fn list_feedback(
    state: &AppState,
    phone: Option<String>,
    min_rating: Option<u8>,
    max_rating: Option<u8>,
    origin: Option<String>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let origin = origin
        .map(|o| o.parse::<FeedbackOrigin>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()?;

    let filter = FeedbackFilter {
        phone_number: phone.as_deref().map(normalize_phone),
        min_rating,
        max_rating,
        origin,
        limit: Some(limit),
        offset: None,
    };
    let (items, total) = state.feedback_service.list(&filter).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "items": items,
                "total": total,
            }))?
        );
        return Ok(());
    }

    if items.is_empty() {
        println!();
        println!("  {} No feedback recorded yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("When").fg(Color::White),
        Cell::new("Phone").fg(Color::White),
        Cell::new("Rating").fg(Color::White),
        Cell::new("Comment").fg(Color::White),
        Cell::new("Origin").fg(Color::White),
    ]);

    for fb in &items {
        let rating = fb.rating.value();
        let rating_color = match rating {
            4..=5 => Color::Green,
            3 => Color::Yellow,
            _ => Color::Red,
        };
        let origin_cell = match fb.origin {
            FeedbackOrigin::User => Cell::new("user"),
            FeedbackOrigin::Auto => Cell::new("auto").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(fb.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
            Cell::new(&fb.phone_number),
            Cell::new(stars(rating)).fg(rating_color),
            Cell::new(fb.comment.as_deref().unwrap_or("-")),
            origin_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {}",
        style(format!("Showing {} of {} entries", items.len(), total)).dim()
    );
    println!();

    Ok(())
}

/// Show satisfaction metrics and the daily average over the last `days` days.
pub async fn feedback_stats(state: &AppState, days: u32, json: bool) -> Result<()> {
    let metrics = state.feedback_service.metrics().await?;
    let trend = state.feedback_service.trend(days).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "metrics": metrics,
                "trend": trend,
            }))?
        );
        return Ok(());
    }

    println!();
    print_metrics(&metrics);

    println!("  {}", style(format!("── Last {days} days ──")).dim());
    if trend.is_empty() {
        println!("  {}", style("No feedback in this period.").dim());
    } else {
        for point in &trend {
            println!(
                "  {}  {:>4.2}  {}",
                point.date.format("%Y-%m-%d"),
                point.average_rating,
                style(format!("({} responses)", point.count)).dim()
            );
        }
    }
    println!();

    Ok(())
}

pub(crate) fn print_metrics(metrics: &FeedbackMetrics) {
    println!("  {}", style("── Feedback ──").dim());
    println!("  Total:        {}", style(metrics.total).bold());
    println!("  Average:      {:.2} / 5", metrics.average_rating);
    println!(
        "  Satisfaction: {}",
        style(format!("{:.1}%", metrics.satisfaction_score)).green()
    );
    if metrics.auto_submitted > 0 {
        println!(
            "  Auto-rated:   {}",
            style(metrics.auto_submitted).yellow()
        );
    }
    for bucket in &metrics.distribution {
        println!(
            "  {}  {}",
            stars(bucket.rating),
            style(bucket.count).dim()
        );
    }
    println!();
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_render_five_slots() {
        assert_eq!(stars(5), "★★★★★");
        assert_eq!(stars(2), "★★☆☆☆");
        assert_eq!(stars(9), "★★★★★");
    }
}
