//! Strive CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! strive migrate
//!
//! # Create a staff account
//! strive user create -e ops@strive.shop -p 'long-password' --first-name Ada --last-name Ops -r admin
//!
//! # Seed the default category tree (or one from a YAML file)
//! strive seed categories
//! strive seed categories --file categories.yaml
//! ```
//!
//! All commands read `STRIVE_DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "strive")]
#[command(author, version, about = "Strive back office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account, staff by default
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// Role (`admin`, `manager`, `customer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create the category tree when no categories exist yet
    Categories {
        /// YAML file with the tree; the built-in tree when absent
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                first_name,
                last_name,
                role,
            } => {
                commands::user::create(&email, &password, &first_name, &last_name, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Categories { file } => {
                commands::seed::categories(file.as_deref()).await?;
            }
        },
    }
    Ok(())
}
