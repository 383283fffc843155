//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! resource (e.g., `parley user add`, `parley feedback stats`).

pub mod feedback;
pub mod status;
pub mod user;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Parley - chat-bot front end that collects satisfaction feedback.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output as JSON instead of human-readable format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API, inbound webhook and expiry sweeper.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage the users allowed to talk to the bot.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Inspect collected feedback.
    Feedback {
        #[command(subcommand)]
        action: FeedbackCommand,
    },

    /// Show system status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user.
    Add {
        /// Phone number in international format (with or without '+').
        phone: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Job title, shown in the greeting.
        #[arg(long)]
        job: Option<String>,

        /// Gender (male or female), used for the salutation.
        #[arg(long)]
        gender: Option<String>,

        /// Date of birth (YYYY-MM-DD).
        #[arg(long)]
        dob: Option<NaiveDate>,
    },

    /// List users.
    #[command(alias = "ls")]
    List {
        /// Substring match on name or phone.
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of users to show.
        #[arg(long, default_value = "50")]
        limit: i64,
    },

    /// Show a user by id or phone number.
    Show { id_or_phone: String },

    /// Remove a user and their feedback.
    #[command(alias = "rm")]
    Remove {
        id_or_phone: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Register users from a CSV file.
    ///
    /// The header must name `phone_number` and `name`; `job_title`, `gender`
    /// and `date_of_birth` are optional.
    Import {
        /// Path to the CSV file.
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum FeedbackCommand {
    /// List recent feedback.
    #[command(alias = "ls")]
    List {
        /// Only feedback from this phone number.
        #[arg(long)]
        phone: Option<String>,

        /// Minimum rating (1-5).
        #[arg(long)]
        min_rating: Option<u8>,

        /// Maximum rating (1-5).
        #[arg(long)]
        max_rating: Option<u8>,

        /// Only feedback of this origin (user or auto).
        #[arg(long)]
        origin: Option<String>,

        /// Maximum number of entries.
        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// Show satisfaction metrics and the daily trend.
    Stats {
        /// Days covered by the trend.
        #[arg(long, default_value = "30")]
        days: u32,
    },
}
