/*
[INPUT]:  Task Service handle, project id, drag requests
[OUTPUT]: Loaded board, optimistic advances with revert on failure, notices
[POS]:    Board layer - controller between columns and the Task Service
[UPDATE]: When changing load strategy or the commit/revert flow
*/

use std::sync::Arc;

use taskdeck_adapter::{ProjectId, TaskId, TaskService, TaskStatus, TaskdeckError};
use thiserror::Error;
use tracing::{error, info, warn};

use super::{Board, MoveRejection, MoveRequest, Stage};
use crate::notice::Notifier;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Rejected(#[from] MoveRejection),

    #[error("status update failed, move reverted: {0}")]
    Reverted(#[source] TaskdeckError),

    #[error("failed to load board: {0}")]
    Load(#[source] TaskdeckError),
}

/// Board for one project
pub struct BoardSession {
    service: Arc<dyn TaskService>,
    project_id: ProjectId,
    notifier: Notifier,
    board: Board,
}

impl BoardSession {
    pub fn new(service: Arc<dyn TaskService>, project_id: ProjectId, notifier: Notifier) -> Self {
        Self {
            service,
            project_id,
            notifier,
            board: Board::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Fetch all four columns concurrently and replace the board.
    ///
    /// On failure the previous board is kept.
    pub async fn load(&mut self) -> Result<&Board, BoardError> {
        let project = &self.project_id;
        let service = self.service.as_ref();
        let fetched = tokio::try_join!(
            service.tasks_by_status(TaskStatus::Todo, project),
            service.tasks_by_status(TaskStatus::InProgress, project),
            service.tasks_by_status(TaskStatus::Review, project),
            service.tasks_by_status(TaskStatus::Done, project),
        );

        match fetched {
            Ok((todo, in_progress, review, done)) => {
                self.board = Board::from_columns([todo, in_progress, review, done]);
                info!(project_id = %self.project_id, cards = self.board.len(), "board loaded");
                Ok(&self.board)
            }
            Err(err) => {
                error!(project_id = %self.project_id, error = %err, "failed to load board");
                self.notifier.error("Failed to load tasks");
                Err(BoardError::Load(err))
            }
        }
    }

    /// Apply a drag.
    ///
    /// Rejected moves raise a warning and send nothing. Reorders stay local.
    /// Advances update the board first and are reverted if the service
    /// refuses the new status.
    pub async fn move_card(&mut self, request: MoveRequest) -> Result<(), BoardError> {
        let pending = match self.board.apply(&request) {
            Ok(Some(pending)) => pending,
            Ok(None) => return Ok(()),
            Err(rejection) => {
                if !matches!(rejection, MoveRejection::TerminalStage) {
                    self.notifier.warning(rejection.to_string());
                }
                warn!(task_id = %request.task_id, from = %request.from, to = %request.to, %rejection, "move rejected");
                return Err(rejection.into());
            }
        };

        let status = TaskStatus::from(pending.to);
        match self.service.update_status(&pending.task_id, status).await {
            Ok(()) => {
                info!(task_id = %pending.task_id, from = %pending.from, to = %pending.to, "card advanced");
                Ok(())
            }
            Err(err) => {
                self.board.revert(&pending);
                error!(task_id = %pending.task_id, error = %err, "status update failed, move reverted");
                self.notifier.error("Failed to update task status");
                Err(BoardError::Reverted(err))
            }
        }
    }

    /// Convenience for moving a card to the next column by id
    pub async fn advance(&mut self, task_id: &TaskId) -> Result<Stage, BoardError> {
        let from = self
            .board
            .stage_of(task_id)
            .ok_or_else(|| MoveRejection::UnknownCard {
                task_id: task_id.to_string(),
                stage: Stage::Todo,
            })?;
        let to = from.next().ok_or(MoveRejection::TerminalStage)?;
        self.move_card(MoveRequest {
            task_id: task_id.clone(),
            from,
            to,
            to_index: usize::MAX,
        })
        .await?;
        Ok(to)
    }
}
