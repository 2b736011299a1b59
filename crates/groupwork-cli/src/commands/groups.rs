use groupwork_core::models::{ContributionReport, Group, GroupId};

use crate::cli::GroupCommands;
use crate::commands::common::{normalize_identifier, open_signed_in_workspace, print_json};
use crate::error::CliError;

pub async fn run_groups(command: GroupCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_signed_in_workspace(global_profile)?;

    match command {
        GroupCommands::List { json } => {
            let groups = workspace.api.list_groups().await?;
            if json {
                return print_json(&groups);
            }
            if groups.is_empty() {
                println!("You are not a member of any group.");
                return Ok(());
            }
            for line in format_group_lines(&groups) {
                println!("{line}");
            }
            Ok(())
        }
        GroupCommands::Contributions { group, json } => {
            let group_id = GroupId::new(normalize_identifier(&group, "Group ID")?);
            let report = workspace.api.contributions(&group_id).await?;
            if json {
                return print_json(&report);
            }
            for line in format_contribution_lines(&report) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

pub fn format_group_lines(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .map(|group| {
            let project = group
                .project_name
                .as_deref()
                .map(|project| format!(" ({project})"))
                .unwrap_or_default();
            format!(
                "{:<8} {}{}  {} member(s)",
                group.id,
                group.name,
                project,
                group.members.len()
            )
        })
        .collect()
}

pub fn format_contribution_lines(report: &ContributionReport) -> Vec<String> {
    let mut members: Vec<_> = report.members.iter().collect();
    members.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut lines: Vec<String> = members
        .iter()
        .map(|member| {
            let flag = if member.free_rider { "  [free rider]" } else { "" };
            format!(
                "{:<24} score {:>5.1}  tasks {}/{}{}",
                member.user.display_name(),
                member.score,
                member.tasks_completed,
                member.tasks_assigned,
                flag
            )
        })
        .collect();

    let flagged = report.free_riders().count();
    if flagged > 0 {
        lines.push(format!("{flagged} member(s) flagged as free riders"));
    }
    lines
}
