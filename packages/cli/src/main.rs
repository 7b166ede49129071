use anyhow::{Context, Result, bail};
use blog_server::admin::{AdminUsers, MIN_PASSWORD_LENGTH};
use blog_server::config::AppConfig;
use blog_server::database::{connect_db, sync_schema};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Password};
use sea_orm::DatabaseConnection;

#[derive(Parser)]
#[command(name = "blog-admin", version, about = "Blog operator commands")]
struct Cli {
    /// Database URL. Falls back to the server configuration.
    #[arg(long, env = "BLOG__DATABASE__URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the database schema
    CreateDb,
    /// Create an admin account
    CreateUser {
        /// Email address; prompted for when omitted
        email: Option<String>,
    },
    /// Allow an admin to sign in again
    ActivateUser { email: String },
    /// Block an admin from signing in and revoke their tokens
    DeactivateUser { email: String },
    /// Remove an admin account
    DeleteUser {
        email: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Set a new password and revoke issued tokens
    ResetUserPassword { email: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = match cli.database_url {
        Some(url) => url,
        None => {
            AppConfig::load()
                .context("No --database-url given and configuration could not be loaded")?
                .database
                .url
        }
    };
    let db = connect_db(&database_url)
        .await
        .context("Failed to connect to database")?;

    run(cli.command, &db).await
}

async fn run(command: Command, db: &DatabaseConnection) -> Result<()> {
    let users = AdminUsers::new(db);
    match command {
        Command::CreateDb => {
            sync_schema(db).await.context("Schema sync failed")?;
            println!("Database schema is up to date.");
        }
        Command::CreateUser { email } => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email address").interact_text()?,
            };
            let password = prompt_new_password()?;
            let user = users.create(&email, &password).await?;
            println!("Created admin {} (id {}).", user.email_address, user.id);
        }
        Command::ActivateUser { email } => {
            let user = users.set_active(&email, true).await?;
            println!("Activated {}.", user.email_address);
        }
        Command::DeactivateUser { email } => {
            let user = users.set_active(&email, false).await?;
            println!("Deactivated {}.", user.email_address);
        }
        Command::DeleteUser { email, yes } => {
            let user = users.find(&email).await?;
            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Delete admin {}?", user.email_address))
                    .default(false)
                    .interact()?
            {
                bail!("Aborted");
            }
            users.delete(&user.email_address).await?;
            println!("Deleted {}.", user.email_address);
        }
        Command::ResetUserPassword { email } => {
            users.find(&email).await?;
            let password = prompt_new_password()?;
            let user = users.reset_password(&email, &password).await?;
            println!("Password reset for {}. Existing sessions are signed out.", user.email_address);
        }
    }
    Ok(())
}

fn prompt_new_password() -> Result<String> {
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .validate_with(|input: &String| {
            if input.chars().count() >= MIN_PASSWORD_LENGTH {
                Ok(())
            } else {
                Err(format!("Use at least {MIN_PASSWORD_LENGTH} characters"))
            }
        })
        .interact()?;
    Ok(password)
}
