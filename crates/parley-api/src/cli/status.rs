//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::cli::feedback::print_metrics;
use crate::state::AppState;

/// Display system status: registered users, feedback totals, hot topics and
/// wiring.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.metrics().await?;
    let hot_topics = state.topic_service.hot_topics().await?;
    let metrics = state.feedback_service.metrics().await?;
    let gateway_token_set = state.gateway_token.is_some();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "feedback": metrics,
            "hot_topics": hot_topics,
            "ai_configured": state.ai_configured,
            "ai_base_url": state.config.ai.base_url,
            "gateway_url": state.config.transport.gateway_url,
            "gateway_token_set": gateway_token_set,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let check_mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!(
        "  {} Parley v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Users ──").dim());
    println!("  Registered: {}", style(users.total_users).bold());
    println!("  New (30d):  {}", style(users.new_users).dim());
    println!();

    print_metrics(&metrics);

    if !hot_topics.is_empty() {
        println!("  {}", style("── Hot topics (30d) ──").dim());
        for topic in &hot_topics {
            println!("  {:>5}  {}", style(topic.count).bold(), topic.title);
        }
        println!();
    }

    println!("  {}", style("── Integrations ──").dim());
    println!(
        "  {} AI backend  {}",
        check_mark(state.ai_configured),
        style(&state.config.ai.base_url).dim()
    );
    println!(
        "  {} Gateway     {}",
        check_mark(gateway_token_set),
        style(&state.config.transport.gateway_url).dim()
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
