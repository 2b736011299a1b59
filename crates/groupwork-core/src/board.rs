//! Kanban task board for one group.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiResult, TaskResource};
use crate::models::{GroupId, NewTask, Task, TaskId, TaskStatus};
use crate::sync::{Entity, Field, MutationOutcome, OptimisticCollection};

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &TaskId {
        &self.id
    }
}

fn status_field() -> Field<Task, TaskStatus> {
    Field::new(
        "status",
        |task: &Task| task.status,
        |task: &mut Task, status| task.status = status,
    )
}

/// A position on the board: column plus index inside the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLocation {
    pub status: TaskStatus,
    pub index: usize,
}

/// A drag-and-drop gesture. `destination` is `None` when the card was
/// dropped outside every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardMove {
    pub task_id: TaskId,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

pub struct TaskBoard<R> {
    group_id: GroupId,
    resource: Arc<R>,
    tasks: OptimisticCollection<Task>,
}

impl<R> Clone for TaskBoard<R> {
    fn clone(&self) -> Self {
        Self {
            group_id: self.group_id.clone(),
            resource: Arc::clone(&self.resource),
            tasks: self.tasks.clone(),
        }
    }
}

impl<R: TaskResource> TaskBoard<R> {
    pub fn new(group_id: GroupId, resource: Arc<R>) -> Self {
        Self {
            group_id,
            resource,
            tasks: OptimisticCollection::default(),
        }
    }

    pub const fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Fetch the group's tasks, replacing the local view.
    pub async fn load(&self) -> ApiResult<usize> {
        let tasks = self.resource.list_by_group(&self.group_id).await?;
        tracing::debug!("Loaded {} tasks for group {}", tasks.len(), self.group_id);
        let count = tasks.len();
        self.tasks.replace_all(tasks);
        Ok(count)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.snapshot()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.tasks.subscribe()
    }

    /// Tasks grouped by status in board order; fetch order is kept inside a column.
    pub fn columns(&self) -> Vec<BoardColumn> {
        let tasks = self.tasks.snapshot();
        TaskStatus::ALL
            .iter()
            .map(|&status| BoardColumn {
                status,
                tasks: tasks
                    .iter()
                    .filter(|task| task.status == status)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Where a task currently sits on the board.
    pub fn location_of(&self, id: &TaskId) -> Option<DropLocation> {
        let tasks = self.tasks.snapshot();
        let task = tasks.iter().find(|task| &task.id == id)?;
        let index = tasks
            .iter()
            .filter(|other| other.status == task.status)
            .position(|other| &other.id == id)?;
        Some(DropLocation {
            status: task.status,
            index,
        })
    }

    /// Apply a drag-and-drop gesture.
    ///
    /// Drops outside a column and drops back onto the source position are
    /// no-ops. Intra-column order is not persisted by the backend, so only
    /// the status travels.
    pub async fn apply_move(&self, gesture: &BoardMove) -> MutationOutcome<Task> {
        let Some(destination) = gesture.destination else {
            tracing::debug!("Task {} dropped outside the board", gesture.task_id);
            return MutationOutcome::Skipped;
        };
        if destination == gesture.source {
            return MutationOutcome::Skipped;
        }
        self.move_task(&gesture.task_id, destination.status).await
    }

    /// Move a task to another column.
    pub async fn move_task(&self, id: &TaskId, status: TaskStatus) -> MutationOutcome<Task> {
        let resource = Arc::clone(&self.resource);
        let task_id = id.clone();
        self.tasks
            .mutate_one(id, status_field(), status, || async move {
                resource.update_status(&task_id, status).await
            })
            .await
    }

    /// Create a task and add the backend's record to the board.
    pub async fn create(&self, task: &NewTask) -> ApiResult<Task> {
        let created = self.resource.create_task(task).await?;
        if created.group_id.as_ref().map_or(true, |id| id == &self.group_id) {
            self.tasks.push(created.clone());
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::ApiError;
    use crate::models::{UserId, UserRef};

    #[derive(Default)]
    struct FakeTasks {
        tasks: Mutex<Vec<Task>>,
        update_response: Mutex<Option<ApiResult<Option<Task>>>>,
        update_calls: AtomicUsize,
    }

    impl FakeTasks {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }

        fn respond_to_update(&self, response: ApiResult<Option<Task>>) {
            *self.update_response.lock().unwrap() = Some(response);
        }
    }

    impl TaskResource for FakeTasks {
        async fn list_by_group(&self, _group_id: &GroupId) -> ApiResult<Vec<Task>> {
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn get_task(&self, id: &TaskId) -> ApiResult<Task> {
            self.tasks
                .lock()
                .unwrap()
                .iter()
                .find(|task| &task.id == id)
                .cloned()
                .ok_or_else(|| ApiError::Status {
                    status: 404,
                    message: "Task not found".to_string(),
                })
        }

        async fn create_task(&self, task: &NewTask) -> ApiResult<Task> {
            Ok(Task {
                id: TaskId::new("new-1"),
                title: task.title.clone(),
                description: task.description.clone(),
                status: task.status,
                assignee: None,
                due_date: task.due_date,
                record_id: None,
                group_id: Some(task.group_id.clone()),
            })
        }

        async fn update_status(&self, _id: &TaskId, _status: TaskStatus) -> ApiResult<Option<Task>> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            self.update_response.lock().unwrap().take().unwrap_or(Ok(None))
        }
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("Task {id}"),
            description: String::new(),
            status,
            assignee: None,
            due_date: None,
            record_id: None,
            group_id: Some(GroupId::new("g-1")),
        }
    }

    async fn loaded_board(tasks: Vec<Task>) -> (TaskBoard<FakeTasks>, Arc<FakeTasks>) {
        let resource = Arc::new(FakeTasks::with_tasks(tasks));
        let board = TaskBoard::new(GroupId::new("g-1"), Arc::clone(&resource));
        board.load().await.unwrap();
        (board, resource)
    }

    #[tokio::test]
    async fn move_adopts_authoritative_record() {
        let (board, resource) = loaded_board(vec![
            task("41", TaskStatus::NotStarted),
            task("42", TaskStatus::NotStarted),
        ])
        .await;
        let mut server = task("42", TaskStatus::InProgress);
        server.assignee = Some(UserRef {
            id: UserId::new("u-9"),
            name: Some("Alex".to_string()),
            email: None,
        });
        resource.respond_to_update(Ok(Some(server.clone())));

        let gesture = BoardMove {
            task_id: TaskId::new("42"),
            source: board.location_of(&TaskId::new("42")).unwrap(),
            destination: Some(DropLocation {
                status: TaskStatus::InProgress,
                index: 0,
            }),
        };
        let outcome = board.apply_move(&gesture).await;

        assert!(matches!(outcome, MutationOutcome::Reconciled(_)));
        assert_eq!(board.task(&TaskId::new("42")), Some(server));
        assert_eq!(
            board.task(&TaskId::new("41")).unwrap().status,
            TaskStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn drop_outside_board_issues_no_call() {
        let (board, resource) = loaded_board(vec![task("42", TaskStatus::NotStarted)]).await;
        let before = board.tasks();

        let outcome = board
            .apply_move(&BoardMove {
                task_id: TaskId::new("42"),
                source: DropLocation {
                    status: TaskStatus::NotStarted,
                    index: 0,
                },
                destination: None,
            })
            .await;

        assert!(matches!(outcome, MutationOutcome::Skipped));
        assert_eq!(resource.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(board.tasks(), before);
    }

    #[tokio::test]
    async fn drop_on_source_position_is_noop() {
        let (board, resource) = loaded_board(vec![task("42", TaskStatus::InProgress)]).await;
        let here = DropLocation {
            status: TaskStatus::InProgress,
            index: 0,
        };

        let outcome = board
            .apply_move(&BoardMove {
                task_id: TaskId::new("42"),
                source: here,
                destination: Some(here),
            })
            .await;

        assert!(matches!(outcome, MutationOutcome::Skipped));
        assert_eq!(resource.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_move_rolls_back_status() {
        let (board, resource) = loaded_board(vec![
            task("1", TaskStatus::NotStarted),
            task("2", TaskStatus::InProgress),
        ])
        .await;
        let before = board.tasks();
        resource.respond_to_update(Err(ApiError::Rejected("Board is locked".to_string())));

        let outcome = board.move_task(&TaskId::new("1"), TaskStatus::Completed).await;

        assert_eq!(
            outcome.error().map(ApiError::user_message).as_deref(),
            Some("Board is locked")
        );
        assert_eq!(board.tasks(), before);
    }

    #[tokio::test]
    async fn move_without_body_keeps_optimistic_status() {
        let (board, _resource) = loaded_board(vec![task("1", TaskStatus::NotStarted)]).await;

        let outcome = board.move_task(&TaskId::new("1"), TaskStatus::Completed).await;

        assert!(matches!(outcome, MutationOutcome::Confirmed));
        assert_eq!(
            board.task(&TaskId::new("1")).unwrap().status,
            TaskStatus::Completed
        );
    }

    #[tokio::test]
    async fn columns_follow_board_order() {
        let (board, _resource) = loaded_board(vec![
            task("a", TaskStatus::Completed),
            task("b", TaskStatus::NotStarted),
            task("c", TaskStatus::NotStarted),
        ])
        .await;

        let columns = board.columns();
        let layout: Vec<(&str, Vec<&str>)> = columns
            .iter()
            .map(|column| {
                (
                    column.status.column_id(),
                    column.tasks.iter().map(|task| task.id.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            layout,
            vec![
                ("todo", vec!["b", "c"]),
                ("inProgress", vec![]),
                ("done", vec!["a"]),
            ]
        );
        assert_eq!(
            board.location_of(&TaskId::new("c")),
            Some(DropLocation {
                status: TaskStatus::NotStarted,
                index: 1
            })
        );
    }

    #[tokio::test]
    async fn create_appends_backend_record() {
        let (board, _resource) = loaded_board(vec![]).await;

        let created = board
            .create(&NewTask::new(GroupId::new("g-1"), "Draft outline"))
            .await
            .unwrap();

        assert_eq!(board.tasks(), vec![created]);
    }
}
