use colored::Colorize;
use huddle_core::{HuddleConfig, HuddleError, MeetingRoom, Message};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub async fn handle_send_command(
    config: &HuddleConfig,
    meeting_id: &str,
    content: &str,
    sender: Option<&str>,
) -> anyhow::Result<()> {
    // Reject before selecting the meeting, which already talks to the server.
    if content.trim().is_empty() {
        return Err(HuddleError::EmptyContent.into());
    }

    let sender = sender.unwrap_or(&config.chat.default_sender);
    let room = MeetingRoom::from_config(config)?;
    room.select_meeting_by_id(meeting_id).await?;

    let before: HashSet<String> = room.snapshot().messages.into_iter().map(|m| m.id).collect();
    room.send_message(meeting_id, sender, content).await?;

    println!("{} Sent as {}", "✓".green().bold(), sender.bold());
    for message in room.snapshot().messages.iter().filter(|m| !before.contains(&m.id)) {
        print_message(message);
    }

    Ok(())
}

pub async fn handle_discuss_command(
    config: &HuddleConfig,
    meeting_id: &str,
    topic: Option<&str>,
    agents: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let room = MeetingRoom::from_config(config)?;
    let meeting = room.select_meeting_by_id(meeting_id).await?;

    let shown_topic = topic
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| meeting.default_topic());
    println!(
        "{} Agents are discussing {}...",
        "→".blue(),
        shown_topic.bold()
    );

    let before: HashSet<String> = room.snapshot().messages.into_iter().map(|m| m.id).collect();
    let result = room.trigger_discussion(meeting_id, topic, agents).await;

    // The round may have partially landed before failing.
    for message in room.snapshot().messages.iter().filter(|m| !before.contains(&m.id)) {
        print_message(message);
    }

    let outcome = result?;
    println!();
    println!(
        "{} {} agent responses",
        "✓".green().bold(),
        outcome.count
    );

    Ok(())
}

pub async fn handle_watch_command(
    config: &HuddleConfig,
    meeting_id: &str,
    seconds: Option<u64>,
) -> anyhow::Result<()> {
    let room = MeetingRoom::from_config(config)?;
    let mut rx = room.subscribe();
    let meeting = room.select_meeting_by_id(meeting_id).await?;

    println!(
        "{} {} ({}) every {} ms. {}",
        "Watching".cyan().bold(),
        meeting.title.bold(),
        meeting.status,
        config.polling.interval_ms,
        "Ctrl-C to stop.".dimmed()
    );
    println!();

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let mut seen = HashSet::new();
    print_new(&rx.borrow_and_update().messages, &mut seen);

    loop {
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.active_meeting_id() != Some(meeting_id) {
                    println!("{}", "Meeting is no longer active.".yellow());
                    break;
                }
                print_new(&snapshot.messages, &mut seen);
            }
            _ = expired => {
                debug!(meeting_id = %meeting_id, "Watch window elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    room.shutdown();
    Ok(())
}

fn print_new(messages: &[Message], seen: &mut HashSet<String>) {
    for message in messages {
        if seen.insert(message.id.clone()) {
            print_message(message);
        }
    }
}

pub fn print_message(message: &Message) {
    let time = message
        .timestamp
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    if message.is_system() {
        println!("{} {}", time.dimmed(), message.content.dimmed().italic());
    } else {
        println!(
            "{} {} {}",
            time.dimmed(),
            format!("{}:", message.sender_label()).cyan().bold(),
            message.content
        );
    }
}
