//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the server (REST API,
//! inbound webhook and expiry sweeper).

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use parley_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};

use cli::{Cli, Commands, FeedbackCommand, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let result = run(cli, state.clone()).await;

    state.db_pool.close().await;
    shutdown_tracing();

    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::User { action } => match action {
            UserCommand::Add {
                phone,
                name,
                job,
                gender,
                dob,
            } => {
                cli::user::add_user(&state, phone, name, job, gender, dob, cli.json).await?;
            }
            UserCommand::List { search, limit } => {
                cli::user::list_users(&state, search, limit, cli.json).await?;
            }
            UserCommand::Show { id_or_phone } => {
                cli::user::show_user(&state, &id_or_phone, cli.json).await?;
            }
            UserCommand::Remove { id_or_phone, force } => {
                cli::user::remove_user(&state, &id_or_phone, force, cli.json).await?;
            }
            UserCommand::Import { file } => {
                cli::user::import_users(&state, &file, cli.json).await?;
            }
        },

        Commands::Feedback { action } => match action {
            FeedbackCommand::List {
                phone,
                min_rating,
                max_rating,
                origin,
                limit,
            } => {
                cli::feedback::list_feedback(
                    &state, phone, min_rating, max_rating, origin, limit, cli.json,
                )
                .await?;
            }
            FeedbackCommand::Stats { days } => {
                cli::feedback::feedback_stats(&state, days, cli.json).await?;
            }
        },

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            serve(state, &host, port, cli.quiet).await?;
        }

        Commands::Completions { .. } => unreachable!("handled before state init"),
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16, quiet: bool) -> anyhow::Result<()> {
    // Ensure an API key exists, print it if new
    if let Some(api_key) = http::extractors::auth::ensure_api_key(&state).await? {
        println!();
        println!(
            "  {} API key generated (save this -- it won't be shown again):",
            console::style("🔑").bold()
        );
        println!();
        println!("  {}", console::style(&api_key).yellow().bold());
        println!();
    }

    if !state.ai_configured {
        tracing::warn!(
            "{} is not set; the AI backend will reject requests",
            parley_infra::config::AI_API_KEY_ENV
        );
    }
    if state.gateway_token.is_none() {
        tracing::warn!(
            "{} is not set; the inbound webhook accepts unauthenticated requests",
            parley_infra::config::GATEWAY_TOKEN_ENV
        );
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let cancel = CancellationToken::new();
    let sweeper = state.engine.sweeper();
    let sweeper_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { sweeper.run(cancel).await }
    });

    if !quiet {
        println!(
            "  {} Parley listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, "server started");

    let router = http::router::build_router(state);
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if let Err(e) = sweeper_task.await {
        tracing::error!(error = %e, "expiry sweeper task failed");
    }

    served?;

    if !quiet {
        println!("\n  Server stopped.");
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
