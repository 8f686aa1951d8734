use clap::Subcommand;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use huddle_core::{
    CamelImport, HuddleConfig, Meeting, MeetingRoom, MeetingStatus, MeetingType, NewMeeting,
};

use super::chat::print_message;

#[derive(Subcommand)]
pub enum MeetingsCommand {
    #[command(about = "List all meetings")]
    List {
        #[arg(short, long, help = "Filter by status (draft, in_progress, ended)")]
        status: Option<String>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Create a draft meeting")]
    Create {
        #[arg(short, long, help = "Meeting title")]
        title: String,

        #[arg(short, long, default_value = "", help = "Meeting agenda")]
        agenda: String,

        #[arg(
            short = 'y',
            long = "type",
            default_value = "standup",
            help = "Meeting type (standup, architecture, sprint-planning, retrospective, emergency)"
        )]
        meeting_type: MeetingType,

        #[arg(short, long, value_delimiter = ',', help = "Comma-separated agent IDs to invite")]
        invite: Vec<String>,
    },

    #[command(about = "Show a meeting and its messages")]
    Show {
        #[arg(help = "Meeting ID")]
        id: String,
    },

    #[command(about = "Start a draft meeting")]
    Start {
        #[arg(help = "Meeting ID")]
        id: String,
    },

    #[command(about = "End a meeting")]
    End {
        #[arg(help = "Meeting ID")]
        id: String,
    },

    #[command(about = "Turn a two-role CAMEL session into a meeting")]
    ImportCamel {
        #[arg(long, help = "CAMEL session ID")]
        session: Option<i64>,

        #[arg(long, help = "First role")]
        role1: String,

        #[arg(long, help = "Second role")]
        role2: String,

        #[arg(long, help = "Task the roles worked on")]
        task: String,
    },
}

pub async fn handle_meetings_command(
    config: &HuddleConfig,
    cmd: Option<MeetingsCommand>,
) -> anyhow::Result<()> {
    let room = MeetingRoom::from_config(config)?;

    match cmd.unwrap_or(MeetingsCommand::List {
        status: None,
        format: "text".to_string(),
    }) {
        MeetingsCommand::List { status, format } => {
            cmd_meetings_list(&room, status.as_deref(), &format).await
        }
        MeetingsCommand::Create {
            title,
            agenda,
            meeting_type,
            invite,
        } => cmd_meetings_create(&room, title, agenda, meeting_type, invite).await,
        MeetingsCommand::Show { id } => cmd_meetings_show(&room, &id).await,
        MeetingsCommand::Start { id } => cmd_meetings_start(&room, &id).await,
        MeetingsCommand::End { id } => cmd_meetings_end(&room, &id).await,
        MeetingsCommand::ImportCamel {
            session,
            role1,
            role2,
            task,
        } => {
            let request = CamelImport {
                session_id: session,
                role1,
                role2,
                task,
            };
            cmd_meetings_import(&room, request).await
        }
    }
}

async fn cmd_meetings_list(
    room: &MeetingRoom,
    status_filter: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    let meetings = room.refresh_meetings().await?;

    let status_filter = status_filter.map(parse_status).transpose()?;
    let filtered: Vec<&Meeting> = meetings
        .iter()
        .filter(|m| status_filter.map_or(true, |s| m.status == s))
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
        return Ok(());
    }

    if filtered.is_empty() {
        println!("{}", "No meetings found.".yellow());
        println!(
            "{}",
            "Run 'huddle meetings create --title <TITLE>' to open one.".dimmed()
        );
        return Ok(());
    }

    println!("{}", "Meetings".cyan().bold());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("ID").fg(Color::White),
            Cell::new("Title").fg(Color::White),
            Cell::new("Type").fg(Color::White),
            Cell::new("Status").fg(Color::White),
            Cell::new("Created").fg(Color::White),
        ]);

    for meeting in &filtered {
        let created = meeting
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&meeting.id),
            Cell::new(&meeting.title),
            Cell::new(meeting.meeting_type.label()),
            status_cell(meeting.status),
            Cell::new(created),
        ]);
    }

    println!("{table}");
    println!();
    println!("  Total: {} meetings", filtered.len());

    Ok(())
}

async fn cmd_meetings_create(
    room: &MeetingRoom,
    title: String,
    agenda: String,
    meeting_type: MeetingType,
    invite: Vec<String>,
) -> anyhow::Result<()> {
    let request = NewMeeting::new(title, agenda, meeting_type).with_agents(invite);
    let meeting = room.create_meeting(request).await?;

    println!(
        "{} Created meeting {} ({})",
        "✓".green().bold(),
        meeting.title.bold(),
        meeting.id.dimmed()
    );
    print_meeting_summary(&meeting);
    println!();
    println!(
        "{}",
        format!("Run 'huddle meetings start {}' to begin.", meeting.id).dimmed()
    );

    Ok(())
}

async fn cmd_meetings_show(room: &MeetingRoom, id: &str) -> anyhow::Result<()> {
    let meeting = room.select_meeting_by_id(id).await?;
    let snapshot = room.snapshot();

    println!("{}", meeting.title.cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    print_meeting_summary(&meeting);
    if let Some(secs) = meeting.duration_seconds() {
        println!("  {:<10} {}m {}s", "Duration:".bold(), secs / 60, secs % 60);
    }
    println!();

    if snapshot.messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
    } else {
        for message in &snapshot.messages {
            print_message(message);
        }
    }

    Ok(())
}

async fn cmd_meetings_start(room: &MeetingRoom, id: &str) -> anyhow::Result<()> {
    room.select_meeting_by_id(id).await?;
    let meeting = room.start_meeting(id).await?;

    println!(
        "{} Meeting {} is {}",
        "✓".green().bold(),
        meeting.title.bold(),
        meeting.status.to_string().green()
    );

    let snapshot = room.snapshot();
    for message in &snapshot.messages {
        print_message(message);
    }

    Ok(())
}

async fn cmd_meetings_end(room: &MeetingRoom, id: &str) -> anyhow::Result<()> {
    room.end_meeting(id).await?;

    let title = room
        .snapshot()
        .find_meeting(id)
        .map(|m| m.title.clone())
        .unwrap_or_else(|| id.to_string());

    println!("{} Meeting {} ended", "✓".green().bold(), title.bold());
    Ok(())
}

async fn cmd_meetings_import(room: &MeetingRoom, request: CamelImport) -> anyhow::Result<()> {
    let meeting = room.import_camel(request).await?;

    println!(
        "{} Imported CAMEL session as meeting {} ({})",
        "✓".green().bold(),
        meeting.title.bold(),
        meeting.id.dimmed()
    );
    print_meeting_summary(&meeting);

    Ok(())
}

fn print_meeting_summary(meeting: &Meeting) {
    println!("  {:<10} {}", "Type:".bold(), meeting.meeting_type.label());
    println!("  {:<10} {}", "Status:".bold(), meeting.status);
    if !meeting.agenda.trim().is_empty() {
        println!("  {:<10} {}", "Agenda:".bold(), meeting.agenda);
    }
    if !meeting.invited_agents.is_empty() {
        println!(
            "  {:<10} {}",
            "Invited:".bold(),
            meeting.invited_agents.join(", ")
        );
    }
}

fn status_cell(status: MeetingStatus) -> Cell {
    match status {
        MeetingStatus::Draft => Cell::new("Draft").fg(Color::Yellow),
        MeetingStatus::InProgress => Cell::new("In progress").fg(Color::Green),
        MeetingStatus::Ended => Cell::new("Ended").fg(Color::DarkGrey),
    }
}

fn parse_status(s: &str) -> anyhow::Result<MeetingStatus> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
        "draft" => Ok(MeetingStatus::Draft),
        "in_progress" | "active" => Ok(MeetingStatus::InProgress),
        "ended" => Ok(MeetingStatus::Ended),
        other => anyhow::bail!(
            "Unknown meeting status '{}'. Valid statuses: draft, in_progress, ended",
            other
        ),
    }
}
