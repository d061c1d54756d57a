//! Authentication and roster commands.

use std::io::BufRead;

use anyhow::{Context, Result};
use console::style;
use taskboard::config::ClientConfig;

use super::Client;

fn read_password(given: Option<&str>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn cmd_login(config: &ClientConfig, email: &str, password: Option<&str>) -> Result<()> {
    let password = read_password(password)?;
    let client = Client::connect(config)?;
    let user = client
        .session
        .login(email, &password)
        .await
        .context("Login failed")?;
    println!(
        "{} Logged in as {} <{}>",
        style("✓").green(),
        style(&user.name).bold(),
        user.email
    );
    Ok(())
}

pub async fn cmd_signup(
    config: &ClientConfig,
    name: &str,
    email: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = read_password(password)?;
    let client = Client::connect(config)?;
    let user = client
        .session
        .signup(name, email, &password)
        .await
        .context("Signup failed")?;
    println!(
        "{} Account created for {} <{}>",
        style("✓").green(),
        style(&user.name).bold(),
        user.email
    );
    Ok(())
}

pub fn cmd_logout(config: &ClientConfig) -> Result<()> {
    let client = Client::connect(config)?;
    client.session.logout().context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

pub async fn cmd_whoami(config: &ClientConfig) -> Result<()> {
    let client = Client::connect(config)?;
    match client
        .session
        .restore()
        .await
        .context("Failed to restore session")?
    {
        Some(user) => {
            println!("{} <{}>", style(&user.name).bold(), user.email);
            println!("  id: {}", user.id);
            if let Some(role) = &user.role {
                println!("  role: {}", role);
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

pub async fn cmd_users(config: &ClientConfig, all: bool) -> Result<()> {
    let client = Client::connect(config)?;
    client.require_user().await?;
    client
        .session
        .refresh_roster()
        .await
        .context("Failed to load users")?;
    let users = if all {
        client.session.roster()?
    } else {
        client.session.active_roster()?
    };

    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }
    for user in users {
        let marker = if user.suspended {
            style(" (suspended)").red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<12} {} <{}>{}",
            style(&user.id).dim(),
            user.name,
            user.email,
            marker
        );
    }
    Ok(())
}
