//! Music For Funerals CLI - migrations, admin accounts and content seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mff-cli migrate
//!
//! # Create an admin account
//! MFF_ADMIN_PASSWORD='...' mff-cli admin create -e admin@example.com -n "Admin Name"
//!
//! # List admin accounts
//! mff-cli admin list
//!
//! # Load CMS content, replacing what is there
//! mff-cli seed content crates/cli/seed/content.yaml --replace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mff-cli")]
#[command(author, version, about = "Music For Funerals CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin password (min 8 characters)
        #[arg(short, long, env = "MFF_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List admin accounts
    List,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load CMS content from a YAML file
    Content {
        /// Path to the YAML file
        file: String,

        /// Empty each seeded collection first
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create(&email, &name, &password).await?;
            }
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Content { file, replace } => {
                commands::seed::content(&file, replace).await?;
            }
        },
    }
    Ok(())
}
