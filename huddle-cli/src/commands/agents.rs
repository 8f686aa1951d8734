use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use huddle_core::{AgentStatus, HuddleConfig, MeetingRoom};

pub async fn handle_agents_command(
    config: &HuddleConfig,
    show_hidden: bool,
    format: &str,
) -> anyhow::Result<()> {
    let room = MeetingRoom::from_config(config)?;
    let agents = room
        .refresh_agents(show_hidden || config.gateway.show_hidden_agents)
        .await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    if agents.is_empty() {
        println!("{}", "No agents on the roster.".yellow());
        return Ok(());
    }

    println!("{}", "Agent Roster".cyan().bold());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("").fg(Color::White),
            Cell::new("ID").fg(Color::White),
            Cell::new("Name").fg(Color::White),
            Cell::new("Codename").fg(Color::White),
            Cell::new("Role").fg(Color::White),
            Cell::new("Status").fg(Color::White),
        ]);

    for agent in &agents {
        let status_cell = match agent.status {
            AgentStatus::Online => Cell::new("● Online").fg(Color::Green),
            AgentStatus::Standby => Cell::new("◐ Standby").fg(Color::Yellow),
            AgentStatus::Hidden => Cell::new("◌ Hidden").fg(Color::DarkGrey),
            AgentStatus::Offline => Cell::new("○ Offline").fg(Color::Red),
        };

        table.add_row(vec![
            Cell::new(agent.display_letter()),
            Cell::new(&agent.id),
            Cell::new(&agent.name),
            Cell::new(&agent.codename),
            Cell::new(&agent.role),
            status_cell,
        ]);
    }

    let available = agents.iter().filter(|a| a.is_available()).count();

    println!("{table}");
    println!();
    println!("  Total: {} agents ({} available)", agents.len(), available);

    Ok(())
}
