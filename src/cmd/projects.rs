//! Project listing, creation, board and statistics commands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use console::style;
use taskboard::board::analytics::{DashboardSummary, ProjectStats};
use taskboard::board::models::{ImageUpload, NewProject, Priority, Task, TaskStatus};
use taskboard::config::ClientConfig;

use super::Client;

async fn loaded_client(config: &ClientConfig) -> Result<Client> {
    let client = Client::connect(config)?;
    client.require_user().await?;
    client
        .store
        .load_projects()
        .await
        .context("Failed to load projects")?;
    Ok(client)
}

pub async fn cmd_projects(config: &ClientConfig) -> Result<()> {
    let client = loaded_client(config).await?;
    let projects = client.store.projects()?;
    if projects.is_empty() {
        println!("No projects yet. Create one with `taskboard create-project <name>`.");
        return Ok(());
    }
    for project in projects {
        println!(
            "  {:<12} {}  {}",
            style(&project.id).dim(),
            style(&project.name).bold(),
            style(format!(
                "{} tasks, {} members",
                project.tasks.len(),
                project.project_members.len()
            ))
            .dim()
        );
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Image path has no file name: {}", path.display()))?;
    Ok(ImageUpload { file_name, bytes })
}

pub async fn cmd_create_project(
    config: &ClientConfig,
    name: &str,
    description: Option<&str>,
    members: &[String],
    image: Option<&Path>,
) -> Result<()> {
    let client = Client::connect(config)?;
    let user = client.require_user().await?;

    let mut new = NewProject::new(name);
    new.description = description.map(str::to_string);
    new.member_ids = members.to_vec();
    if !new.member_ids.contains(&user.id) {
        new.member_ids.push(user.id.clone());
    }
    new.image = image.map(read_image).transpose()?;

    let project = client
        .store
        .add_project(new)
        .await
        .context("Failed to create project")?;
    println!(
        "{} Created project {} ({})",
        style("✓").green(),
        style(&project.name).bold(),
        project.id
    );
    Ok(())
}

fn priority_badge(priority: Priority) -> String {
    let label = format!("[{}]", priority);
    match priority {
        Priority::High => style(label).red().to_string(),
        Priority::Medium => style(label).yellow().to_string(),
        Priority::Low => style(label).dim().to_string(),
    }
}

fn task_line(task: &Task) -> String {
    let today = Utc::now().date_naive();
    let mut line = format!("{} {}", priority_badge(task.priority), task.title);
    if let Some(due) = task.due_date {
        let due = format!(" due {}", due);
        if task.is_overdue(today) {
            line.push_str(&style(due).red().to_string());
        } else {
            line.push_str(&style(due).dim().to_string());
        }
    }
    if !task.assignees.is_empty() {
        let names: Vec<&str> = task.assignees.iter().map(|u| u.name.as_str()).collect();
        line.push_str(&style(format!(" @{}", names.join(", @"))).cyan().to_string());
    }
    line
}

pub async fn cmd_board(config: &ClientConfig, project_id: &str) -> Result<()> {
    let client = loaded_client(config).await?;
    let Some(board) = client.store.board(project_id)? else {
        bail!("Project {} not found", project_id);
    };

    println!("{}", style(&board.project_name).bold().cyan());
    for column in &board.columns {
        println!();
        println!(
            "{} {}",
            style(column.status.label()).bold(),
            style(format!("({})", column.tasks.len())).dim()
        );
        if column.tasks.is_empty() {
            println!("  {}", style("-").dim());
        }
        for task in &column.tasks {
            println!("  {}", task_line(task));
        }
    }
    Ok(())
}

fn print_status_counts(get: impl Fn(&TaskStatus) -> usize) {
    for status in TaskStatus::COLUMNS.iter() {
        println!("  {:<12} {}", status.label(), get(status));
    }
}

pub async fn cmd_stats(config: &ClientConfig, project_id: Option<&str>) -> Result<()> {
    let client = loaded_client(config).await?;
    let today = Utc::now().date_naive();

    match project_id {
        Some(id) => {
            let Some(project) = client.store.project(id)? else {
                bail!("Project {} not found", id);
            };
            let stats = ProjectStats::compute(&project, today);
            println!("{}", style(&project.name).bold().cyan());
            print_status_counts(|s| stats.by_status.get(s));
            println!(
                "  {:.0}% complete, {} overdue, {} unassigned, {} members",
                stats.completion() * 100.0,
                stats.overdue,
                stats.unassigned,
                stats.members
            );
        }
        None => {
            let summary = DashboardSummary::compute(&client.store.projects()?, today);
            println!(
                "{}",
                style(format!(
                    "{} projects, {} tasks",
                    summary.projects, summary.total_tasks
                ))
                .bold()
                .cyan()
            );
            print_status_counts(|s| summary.by_status.get(s));
            println!(
                "  {:.0}% complete, {} overdue",
                summary.completion() * 100.0,
                summary.overdue
            );
            if !summary.open_by_assignee.is_empty() {
                println!();
                println!("{}", style("Open tasks by assignee").bold());
                for (user_id, count) in &summary.open_by_assignee {
                    println!("  {:<12} {}", user_id, count);
                }
            }
        }
    }
    Ok(())
}
