use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use groupwork_core::api::{ApiClient, TaskResource};
use groupwork_core::board::{BoardColumn, BoardMove, DropLocation, TaskBoard};
use groupwork_core::models::{GroupId, NewTask, TaskId, TaskStatus};

use crate::cli::TaskCommands;
use crate::commands::common::{
    format_task_line, format_task_lines, normalize_identifier, open_signed_in_workspace,
    parse_due_date, parse_status, print_json, settle, TaskListItem,
};
use crate::error::CliError;

pub async fn run_tasks(command: TaskCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_signed_in_workspace(global_profile)?;
    let api = Arc::clone(&workspace.api);

    match command {
        TaskCommands::List {
            group,
            status,
            json,
        } => {
            let board = load_board(&group, api).await?;
            let status = status.as_deref().map(parse_status).transpose()?;
            let tasks: Vec<_> = board
                .tasks()
                .into_iter()
                .filter(|task| status.map_or(true, |status| task.status == status))
                .collect();
            let now = Utc::now();

            if json {
                let items: Vec<_> = tasks
                    .iter()
                    .map(|task| TaskListItem::from_task(task, now))
                    .collect();
                return print_json(&items);
            }
            if tasks.is_empty() {
                println!("No tasks found.");
                return Ok(());
            }
            for line in format_task_lines(&tasks, now) {
                println!("{line}");
            }
            Ok(())
        }
        TaskCommands::Show { id, json } => {
            let id = TaskId::new(normalize_identifier(&id, "Task ID")?);
            let task = api.get_task(&id).await?;
            if json {
                return print_json(&task);
            }

            println!("{}", format_task_line(&task, Utc::now()));
            println!("Status: {}", task.status.label());
            if let Some(group_id) = &task.group_id {
                println!("Group: {group_id}");
            }
            if !task.description.trim().is_empty() {
                println!();
                println!("{}", task.description.trim());
            }
            Ok(())
        }
        TaskCommands::Create {
            group,
            title,
            description,
            status,
            assignee,
            due,
        } => {
            let title = title.join(" ");
            let title = title.trim();
            if title.is_empty() {
                return Err(CliError::InvalidInput("Task title cannot be empty".to_string()));
            }

            let group_id = GroupId::new(normalize_identifier(&group, "Group ID")?);
            let mut new_task = NewTask::new(group_id.clone(), title);
            if let Some(description) = description {
                new_task.description = description.trim().to_string();
            }
            if let Some(status) = status.as_deref() {
                new_task.status = parse_status(status)?;
            }
            new_task.assignee_id = assignee
                .as_deref()
                .map(|assignee| normalize_identifier(assignee, "Assignee ID"))
                .transpose()?;
            new_task.due_date = due.as_deref().map(parse_due_date).transpose()?;

            let board = TaskBoard::new(group_id, api);
            let created = board.create(&new_task).await?;
            println!("Created task {}: {}", created.id, created.title);
            Ok(())
        }
        TaskCommands::Move { group, id, status } => {
            let board = load_board(&group, api).await?;
            let task_id = TaskId::new(normalize_identifier(&id, "Task ID")?);
            let target = parse_status(&status)?;
            let gesture = plan_move(&board, &task_id, target)?;

            let moved = settle(board.apply_move(&gesture).await, "move task")?;
            if moved {
                println!("Moved task {task_id} to {}", target.label());
            } else {
                println!("Task {task_id} is already in {}", target.label());
            }
            Ok(())
        }
        TaskCommands::Board { group, json } => {
            let board = load_board(&group, api).await?;
            let columns = board.columns();
            let now = Utc::now();
            if json {
                return print_json(&board_json(&columns, now));
            }
            for line in render_board(&columns, now) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

async fn load_board(group: &str, api: Arc<ApiClient>) -> Result<TaskBoard<ApiClient>, CliError> {
    let group_id = GroupId::new(normalize_identifier(group, "Group ID")?);
    let board = TaskBoard::new(group_id, api);
    board.load().await?;
    Ok(board)
}

/// Build the board gesture for moving a task to the end of another column.
pub fn plan_move<R: TaskResource>(
    board: &TaskBoard<R>,
    task_id: &TaskId,
    target: TaskStatus,
) -> Result<BoardMove, CliError> {
    let source = board
        .location_of(task_id)
        .ok_or_else(|| CliError::NotFound(format!("task {task_id} on this board")))?;
    if source.status == target {
        return Ok(BoardMove {
            task_id: task_id.clone(),
            source,
            destination: Some(source),
        });
    }

    let index = board
        .tasks()
        .iter()
        .filter(|task| task.status == target)
        .count();
    Ok(BoardMove {
        task_id: task_id.clone(),
        source,
        destination: Some(DropLocation {
            status: target,
            index,
        }),
    })
}

pub fn render_board(columns: &[BoardColumn], now: DateTime<Utc>) -> Vec<String> {
    let mut lines = Vec::new();
    for (position, column) in columns.iter().enumerate() {
        if position > 0 {
            lines.push(String::new());
        }
        lines.push(format!("== {} ({}) ==", column.status.label(), column.tasks.len()));
        if column.tasks.is_empty() {
            lines.push("  (empty)".to_string());
        }
        lines.extend(
            format_task_lines(&column.tasks, now)
                .into_iter()
                .map(|line| format!("  {line}")),
        );
    }
    lines
}

pub fn board_json(
    columns: &[BoardColumn],
    now: DateTime<Utc>,
) -> BTreeMap<&'static str, Vec<TaskListItem>> {
    columns
        .iter()
        .map(|column| {
            (
                column.status.column_id(),
                column
                    .tasks
                    .iter()
                    .map(|task| TaskListItem::from_task(task, now))
                    .collect(),
            )
        })
        .collect()
}
