//! User management CLI commands: add, list, show, remove, import.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use parley_core::repository::SortOrder;
use parley_core::repository::user::UserFilter;
use parley_infra::user_csv;
use parley_types::user::{CreateUserRequest, Gender, UserProfile};

use crate::state::AppState;

/// Register a user so the bot will answer them.
///
/// ```bash
/// parley user add +628123456789 --name "Sarah" --job "Engineer" --gender female
/// ```
pub async fn add_user(
    state: &AppState,
    phone: String,
    name: String,
    job_title: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let gender = gender.map(|g| g.parse::<Gender>()).transpose()?;

    let user = state
        .user_service
        .create_user(CreateUserRequest {
            phone_number: phone,
            name,
            job_title,
            gender,
            date_of_birth,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!("  {} User registered.", style("✓").green().bold());
    println!();
    print_profile(&user);
    println!();

    Ok(())
}

/// List users in a table, newest first.
pub async fn list_users(
    state: &AppState,
    search: Option<String>,
    limit: i64,
    json: bool,
) -> Result<()> {
    let filter = UserFilter {
        search,
        sort_order: Some(SortOrder::Desc),
        limit: Some(limit),
        offset: None,
    };
    let (users, total) = state.user_service.list_users(&filter).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "items": users,
                "total": total,
            }))?
        );
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users found. Register one with: {}",
            style("i").blue().bold(),
            style("parley user add <phone> --name <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Phone").fg(Color::White),
        Cell::new("Job").fg(Color::White),
        Cell::new("Gender").fg(Color::White),
        Cell::new("Registered").fg(Color::White),
    ]);

    for user in &users {
        table.add_row(vec![
            Cell::new(&user.name).fg(Color::Cyan),
            Cell::new(&user.phone_number),
            Cell::new(user.job_title.as_deref().unwrap_or("-")),
            Cell::new(user.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".into()))
                .fg(Color::DarkGrey),
            Cell::new(user.created_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {}",
        style(format!("Showing {} of {} users", users.len(), total)).dim()
    );
    println!();

    Ok(())
}

/// Show a single user by id or phone number.
pub async fn show_user(state: &AppState, id_or_phone: &str, json: bool) -> Result<()> {
    let user = state.user_service.resolve(id_or_phone).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    print_profile(&user);
    println!();

    Ok(())
}

/// Remove a user. Their feedback is deleted with them.
pub async fn remove_user(
    state: &AppState,
    id_or_phone: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let user = state.user_service.resolve(id_or_phone).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove user '{}' ({}) and all of their feedback?",
                style(&user.name).red().bold(),
                user.phone_number
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.user_service.delete_user(&user.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": user.id.to_string()})
        );
    } else {
        println!(
            "  {} User '{}' removed.",
            style("✓").red().bold(),
            user.name
        );
    }

    Ok(())
}

/// Register every row of a CSV file, reporting rows that were skipped.
///
/// ```bash
/// parley user import staff.csv
/// ```
pub async fn import_users(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let rows = user_csv::read_users(bytes.as_slice())?;
    let report = state.user_service.import_users(rows).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Imported {} of {} rows from {}.",
        style("✓").green().bold(),
        style(report.imported).bold(),
        report.total_rows,
        style(file.display()).dim()
    );

    if !report.failures.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Line").fg(Color::White),
            Cell::new("Phone").fg(Color::White),
            Cell::new("Reason").fg(Color::White),
        ]);
        for failure in &report.failures {
            table.add_row(vec![
                Cell::new(failure.line),
                Cell::new(failure.phone_number.as_deref().unwrap_or("-")),
                Cell::new(&failure.reason).fg(Color::Red),
            ]);
        }
        println!();
        println!("{table}");
        println!(
            "  {}",
            style(format!("{} rows skipped", report.failures.len())).yellow()
        );
    }
    println!();

    Ok(())
}

fn print_profile(user: &UserProfile) {
    println!("  {}    {}", style("Name:").bold(), style(&user.name).cyan());
    println!("  {}   {}", style("Phone:").bold(), user.phone_number);
    if let Some(job) = &user.job_title {
        println!("  {}     {}", style("Job:").bold(), job);
    }
    if let Some(gender) = user.gender {
        println!("  {}  {}", style("Gender:").bold(), gender);
    }
    if let Some(dob) = user.date_of_birth {
        println!("  {}     {}", style("DOB:").bold(), dob.format("%Y-%m-%d"));
    }
    println!(
        "  {}      {}",
        style("ID:").bold(),
        style(user.id.to_string()).dim()
    );
}
