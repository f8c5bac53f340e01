//! Twitch Chatbot - Main Entry Point
//!
//! Wires configuration, logging, the command registry and the moderation
//! backend, then feeds chat lines read from stdin to the bot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use twitch_chatbot::announcer::{Announcer, AnnouncerMessage};
use twitch_chatbot::chat::{
    ChatClient, ChatListener, ConsoleChat, MessageHistory, badges, parse_console_line,
};
use twitch_chatbot::commands::{
    ArgumentValidator, CommandRegistry, CooldownFilter, ElapsedTime, NukeCommand, Ping, RoleFilter,
};
use twitch_chatbot::config::{BotSettings, TwitchConfig};
use twitch_chatbot::twitch::{DryRunModeration, HelixClient, ModerationApi};

/// Twitch chat bot with a keyword nuke command.
#[derive(Parser, Debug)]
#[command(name = "twitch_chatbot")]
#[command(about = "Moderation chat bot for Twitch")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log timeouts instead of sending them to Twitch.
    #[arg(long)]
    dry_run: bool,

    /// Channel name to use in dry-run mode.
    #[arg(long, default_value = "dev")]
    channel: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let settings = BotSettings::from_env_with_defaults();

    let (moderation, channel): (Arc<dyn ModerationApi>, String) = if args.dry_run {
        info!("Dry run: timeouts will only be logged");
        (Arc::new(DryRunModeration), args.channel.clone())
    } else {
        let twitch = TwitchConfig::from_env()
            .context("Failed to load Twitch configuration from environment")?;
        (Arc::new(HelixClient::new(&twitch)), twitch.channel_name)
    };
    let channel = format!("#{}", channel.trim_start_matches('#'));

    let history = MessageHistory::shared(settings.history_capacity)
        .context("Invalid message history capacity")?;

    let chat: Arc<dyn ChatClient> = Arc::new(ConsoleChat::new("bot"));

    let controller = CommandRegistry::new(settings.command_prefix.clone())
        .use_middleware(ElapsedTime)
        .register(
            "ping",
            Arc::new(Ping),
            vec![Box::new(CooldownFilter::from_secs(settings.ping_cooldown_secs))],
        )
        .register(
            "nuke",
            Arc::new(NukeCommand::new(
                Arc::clone(&history),
                moderation,
                settings.nuke_settings(),
            )),
            vec![
                Box::new(RoleFilter::new([badges::BROADCASTER, badges::MODERATOR])),
                Box::new(ArgumentValidator),
                Box::new(CooldownFilter::from_secs(settings.nuke_cooldown_secs)),
            ],
        )
        .build(Arc::clone(&chat));

    info!("Commands: {}", controller.triggers().join(", "));

    let listener = ChatListener::new(channel.clone(), history, Arc::new(controller));

    // Spawn announcer task
    let (announcer_tx, announcer_rx) = mpsc::channel::<AnnouncerMessage>(8);
    let announcer = Announcer::new(
        Arc::clone(&chat),
        channel.clone(),
        settings.announcements.clone(),
        Duration::from_secs(settings.announce_interval_secs),
    );
    let announcer_handle = tokio::spawn(async move {
        announcer.run(announcer_rx).await;
    });

    info!("Bot is running in {}. Type `login[badges]: message`, Ctrl+C to stop.", channel);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            line = lines.next_line() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) => match parse_console_line(&line) {
                        Some(message) => {
                            let listener = listener.clone();
                            tokio::spawn(async move { listener.on_message(message).await });
                        }
                        None => warn!("Ignoring malformed line: {}", line),
                    },
                    None => {
                        info!("Input closed, shutting down...");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    let _ = announcer_tx.send(AnnouncerMessage::Shutdown).await;
    let _ = announcer_handle.await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
