use clap::{Parser, Subcommand};
use colored::Colorize;
use huddle_core::{CliErrorDisplay, ConnectionState, HuddleError, MeetingRoom, RouteStyle};
use std::process::ExitCode;

mod commands;
mod config;

use commands::{
    handle_agents_command, handle_discuss_command, handle_meetings_command, handle_send_command,
    handle_watch_command, MeetingsCommand,
};
use config::CliOverrides;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "huddle")]
#[command(version = VERSION)]
#[command(about = "Huddle - multi-agent meeting rooms from the terminal")]
#[command(long_about = r#"
Huddle talks to a meeting server where a human and a roster of automated
agents share one ordered conversation per meeting. Meetings move through
draft, in progress and ended.

Use 'huddle meetings create' to open a meeting, 'huddle meetings start' to
begin it, then 'huddle send' and 'huddle discuss' to talk with the agents.
'huddle watch' follows a meeting live.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, help = "Meeting server base URL")]
    url: Option<String>,

    #[arg(long, global = true, help = "Route layout of the server (direct, bridge)")]
    routes: Option<RouteStyle>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check whether the meeting server is reachable")]
    Status {
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    #[command(about = "List the agent roster")]
    Agents {
        #[arg(long, help = "Include hidden agents")]
        show_hidden: bool,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Create, start, end and inspect meetings")]
    Meetings {
        #[command(subcommand)]
        action: Option<MeetingsCommand>,
    },

    #[command(about = "Post a chat message to a meeting")]
    Send {
        #[arg(help = "Meeting ID")]
        meeting_id: String,

        #[arg(help = "Message content")]
        content: String,

        #[arg(long = "as", help = "Agent ID to speak as (defaults to chat.default_sender)")]
        sender: Option<String>,
    },

    #[command(about = "Ask the agents to discuss a topic")]
    Discuss {
        #[arg(help = "Meeting ID")]
        meeting_id: String,

        #[arg(short, long, help = "Topic (defaults to the agenda, then the title)")]
        topic: Option<String>,

        #[arg(short, long, value_delimiter = ',', help = "Comma-separated agent IDs")]
        agents: Option<Vec<String>>,
    },

    #[command(about = "Follow a meeting's messages as they arrive")]
    Watch {
        #[arg(help = "Meeting ID")]
        meeting_id: String,

        #[arg(short, long, help = "Stop after this many seconds (default: until Ctrl-C)")]
        seconds: Option<u64>,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version { detailed } = cli.command {
        cmd_version(detailed);
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<HuddleError>() {
                Some(err) => eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(err)),
                None => eprintln!("{}: {:#}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = CliOverrides {
        url: cli.url,
        routes: cli.routes,
    };
    let config = config::load(&overrides)?;
    huddle_core::logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Status { format } => cmd_status(&config, &format).await,
        Commands::Agents {
            show_hidden,
            format,
        } => handle_agents_command(&config, show_hidden, &format).await,
        Commands::Meetings { action } => handle_meetings_command(&config, action).await,
        Commands::Send {
            meeting_id,
            content,
            sender,
        } => handle_send_command(&config, &meeting_id, &content, sender.as_deref()).await,
        Commands::Discuss {
            meeting_id,
            topic,
            agents,
        } => handle_discuss_command(&config, &meeting_id, topic.as_deref(), agents).await,
        Commands::Watch {
            meeting_id,
            seconds,
        } => handle_watch_command(&config, &meeting_id, seconds).await,
        Commands::Version { detailed } => {
            cmd_version(detailed);
            Ok(())
        }
    }
}

async fn cmd_status(config: &huddle_core::HuddleConfig, format: &str) -> anyhow::Result<()> {
    let room = MeetingRoom::from_config(config)?;
    let connectivity = room.check_status().await;

    if format == "json" {
        let output = serde_json::json!({
            "gateway": config.base_url(),
            "routes": config.gateway.routes.to_string(),
            "state": connectivity.state.to_string(),
            "detail": connectivity.detail,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Huddle Gateway Status".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();
    println!("  {:<12} {}", "Gateway:".bold(), config.base_url());
    println!("  {:<12} {}", "Routes:".bold(), config.gateway.routes);

    let state = match connectivity.state {
        ConnectionState::Online => "Online".green(),
        ConnectionState::Offline => "Offline".red(),
        ConnectionState::Unknown => "Unknown".yellow(),
    };
    println!("  {:<12} {}", "State:".bold(), state);

    if let Some(detail) = &connectivity.detail {
        println!("  {:<12} {}", "Detail:".bold(), detail.dimmed());
    }

    Ok(())
}

fn cmd_version(detailed: bool) {
    if detailed {
        println!("{}", "Huddle Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("huddle {}", VERSION);
    }
}
