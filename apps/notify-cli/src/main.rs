//! Notify CLI
//!
//! Sends push notifications through the church API and inspects member inboxes.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_cli_tracing, install_color_eyre};
use domain_notifications::{NotificationFilter, NotificationType, SendNotificationRequest};
use domain_users::DevicePlatform;
use eyre::{Result, WrapErr};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

mod client;

use client::ApiClient;

#[derive(Parser)]
#[command(name = "notify-cli")]
#[command(about = "Send church push notifications and inspect inboxes")]
struct Cli {
    /// Base URL of the church API
    #[arg(long, env = "CHURCH_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// API key sent as X-API-Key
    #[arg(long, env = "CHURCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds; dispatch alone may take up to 30
    #[arg(long, default_value_t = 45)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a notification; broadcasts to all active users unless --user-id is given
    Send {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: String,

        /// announcement, prayer, service, event, reminder, general, welcome
        #[arg(short = 'k', long = "type", default_value = "general")]
        notification_type: NotificationType,

        /// Target user; repeat or comma-separate for several
        #[arg(short, long = "user-id", value_delimiter = ',')]
        user_ids: Vec<Uuid>,

        /// Only devices on this platform (android, ios, web)
        #[arg(short, long)]
        platform: Option<DevicePlatform>,

        /// JSON object forwarded to the device
        #[arg(short, long)]
        data: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List a user's stored notifications
    Inbox {
        user_id: Uuid,

        #[arg(long)]
        unread_only: bool,

        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },

    /// Show how many notifications a user has not read
    Unread { user_id: Uuid },

    /// Mark every notification of a user as read
    ReadAll { user_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    init_cli_tracing("warn");

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api_url, cli.api_key, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Send {
            title,
            body,
            notification_type,
            user_ids,
            platform,
            data,
            json,
        } => {
            let mut request = SendNotificationRequest::new(title, body, notification_type);
            if !user_ids.is_empty() {
                request = request.to_users(user_ids);
            }
            request.platform = platform;
            request.data = data
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .wrap_err("--data must be valid JSON")?;

            info!(audience = ?request.audience().selector, "sending notification");
            let response = client.send(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.message);
                for line in &response.breakdown {
                    println!("  {line}");
                }
                println!(
                    "  stored {}, cleaned {} tokens",
                    response.stats.stored_in_db, response.stats.cleaned_tokens
                );
            }
        }

        Commands::Inbox {
            user_id,
            unread_only,
            limit,
        } => {
            let filter = NotificationFilter {
                unread_only,
                limit,
                ..NotificationFilter::default()
            };
            let records = client.inbox(user_id, &filter).await?;
            if records.is_empty() {
                println!("no notifications");
            }
            for record in records {
                let marker = if record.read { " " } else { "*" };
                println!(
                    "{marker} {} [{}] {}: {}",
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.notification_type,
                    record.title,
                    record.body
                );
            }
        }

        Commands::Unread { user_id } => {
            let count = client.unread_count(user_id).await?;
            println!("{}", count.unread);
        }

        Commands::ReadAll { user_id } => {
            let result = client.mark_all_read(user_id).await?;
            println!("marked {} notifications as read", result.marked);
        }
    }

    Ok(())
}
