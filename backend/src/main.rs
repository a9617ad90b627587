//! Sendtrack CLI - bulk application mailer with live progress
//!
//! # Commands
//!
//! ```bash
//! sendtrack serve                          # Start HTTP server (port 3000)
//! sendtrack recipients recipients.csv      # Check a recipients file
//! sendtrack preview recipients.csv 12      # Show the email for one company
//! ```
//!
//! Settings are read from the environment (and `.env`); flags win.

use clap::{Parser, Subcommand};
use sendtrack::{compose_application, is_valid_email, MailerConfig, RecipientDirectory, ServerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sendtrack")]
#[command(about = "Send application emails in bulk and stream progress to the browser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Recipients CSV file (id, company, email)
        #[arg(short, long)]
        recipients: Option<PathBuf>,

        /// HTTP mail relay URL (dry-run when absent)
        #[arg(long)]
        relay_url: Option<String>,

        /// Pause between two emails, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Parse a recipients file and report invalid addresses
    Recipients {
        /// Recipients CSV file
        input: PathBuf,
    },

    /// Print the email that would be sent to one recipient
    Preview {
        /// Recipients CSV file
        input: PathBuf,

        /// Recipient id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            recipients,
            relay_url,
            delay_ms,
        } => cmd_serve(port, recipients, relay_url, delay_ms).await,

        Commands::Recipients { input } => cmd_recipients(&input),

        Commands::Preview { input, id } => cmd_preview(&input, &id),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    port: Option<u16>,
    recipients: Option<PathBuf>,
    relay_url: Option<String>,
    delay_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(path) = recipients {
        config.recipients_path = path;
    }
    if let Some(url) = relay_url {
        let token = match config.mailer {
            MailerConfig::Relay { token, .. } => token,
            MailerConfig::DryRun => None,
        };
        config.mailer = MailerConfig::Relay { url, token };
    }
    if let Some(ms) = delay_ms {
        config.send_delay = Duration::from_millis(ms);
    }

    sendtrack::server::start_server(config).await?;
    Ok(())
}

fn cmd_recipients(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading recipients: {}", input.display());

    let directory = RecipientDirectory::load(input)?;
    eprintln!("   Encoding: {}", directory.encoding);

    let mut invalid = 0;
    for r in directory.all() {
        let mark = if is_valid_email(&r.email) {
            "✓"
        } else {
            invalid += 1;
            "✗"
        };
        println!("  {} {:<8} {:<30} {}", mark, r.id, r.company, r.email);
    }

    eprintln!("\n📊 {} recipients, {} invalid addresses", directory.len(), invalid);
    Ok(())
}

fn cmd_preview(input: &Path, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let directory = RecipientDirectory::load(input)?;
    let recipient = directory
        .get(id)
        .ok_or_else(|| format!("Recipient not found: {}", id))?;

    let email = compose_application(&config.sender, recipient);
    println!("From:    {}", email.from);
    println!("To:      {}", email.to);
    println!("Subject: {}", email.subject);
    println!();
    println!("{}", email.body);
    Ok(())
}
