/*
[INPUT]:  Per-status task lists and validated moves
[OUTPUT]: Ordered board columns, optimistic moves and their reverts
[POS]:    Board layer - local column state (never authoritative)
[UPDATE]: When changing card fields or move/revert placement
*/

use taskdeck_adapter::{Priority, Task, TaskId, UserId};

use super::{MoveKind, MoveRejection, Stage, validate_move};

/// Display copy of a task on the board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardCard {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
}

impl From<Task> for BoardCard {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            assignee_id: task.assignee_id,
        }
    }
}

/// A drag from one column position to another
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub task_id: TaskId,
    pub from: Stage,
    pub to: Stage,
    /// Position in the destination column, clamped to its length
    pub to_index: usize,
}

/// An advance applied locally but not yet confirmed by the service
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub task_id: TaskId,
    pub from: Stage,
    pub from_index: usize,
    pub to: Stage,
}

/// Four ordered columns, rebuilt from every load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    columns: [Vec<BoardCard>; 4],
}

impl Board {
    pub fn from_columns(columns: [Vec<Task>; 4]) -> Self {
        Self {
            columns: columns.map(|tasks| tasks.into_iter().map(BoardCard::from).collect()),
        }
    }

    pub fn column(&self, stage: Stage) -> &[BoardCard] {
        &self.columns[stage.index()]
    }

    pub fn position(&self, stage: Stage, task_id: &TaskId) -> Option<usize> {
        self.column(stage).iter().position(|card| &card.id == task_id)
    }

    /// Stage currently holding a card
    pub fn stage_of(&self, task_id: &TaskId) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| self.position(*stage, task_id).is_some())
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate and apply a move locally.
    ///
    /// Reorders return `None`. Advances return the [`PendingMove`] needed to
    /// undo them. A rejected move leaves the board untouched.
    pub fn apply(&mut self, request: &MoveRequest) -> Result<Option<PendingMove>, MoveRejection> {
        let kind = validate_move(request.from, request.to)?;
        let from_index =
            self.position(request.from, &request.task_id)
                .ok_or_else(|| MoveRejection::UnknownCard {
                    task_id: request.task_id.to_string(),
                    stage: request.from,
                })?;

        let card = self.columns[request.from.index()].remove(from_index);
        let destination = &mut self.columns[request.to.index()];
        destination.insert(request.to_index.min(destination.len()), card);

        Ok(match kind {
            MoveKind::Reorder => None,
            MoveKind::Advance => Some(PendingMove {
                task_id: request.task_id.clone(),
                from: request.from,
                from_index,
                to: request.to,
            }),
        })
    }

    /// Put an unconfirmed advance back where it came from.
    ///
    /// Returns false when the card is no longer in the destination column,
    /// for instance because a reload replaced the board in the meantime.
    pub fn revert(&mut self, pending: &PendingMove) -> bool {
        let Some(index) = self.position(pending.to, &pending.task_id) else {
            return false;
        };
        let card = self.columns[pending.to.index()].remove(index);
        let origin = &mut self.columns[pending.from.index()];
        origin.insert(pending.from_index.min(origin.len()), card);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_adapter::{EntityId, TaskStatus};

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id: EntityId::Number(id),
            title: format!("task {id}"),
            description: None,
            code: None,
            priority: Priority::Medium,
            status,
            assignee_id: None,
            accumulated_seconds: None,
            start_time: None,
            updated_at: None,
        }
    }

    fn ids(board: &Board, stage: Stage) -> Vec<EntityId> {
        board.column(stage).iter().map(|card| card.id.clone()).collect()
    }

    fn sample_board() -> Board {
        Board::from_columns([
            vec![task(1, TaskStatus::Todo), task(2, TaskStatus::Todo), task(3, TaskStatus::Todo)],
            vec![task(4, TaskStatus::InProgress)],
            vec![task(5, TaskStatus::Review)],
            vec![task(6, TaskStatus::Done), task(7, TaskStatus::Done)],
        ])
    }

    #[test]
    fn test_reorder_within_column() {
        let mut board = sample_board();
        let pending = board
            .apply(&MoveRequest {
                task_id: EntityId::Number(1),
                from: Stage::Todo,
                to: Stage::Todo,
                to_index: 2,
            })
            .unwrap();

        assert!(pending.is_none());
        assert_eq!(
            ids(&board, Stage::Todo),
            vec![EntityId::Number(2), EntityId::Number(3), EntityId::Number(1)]
        );
    }

    #[test]
    fn test_advance_then_revert_restores_position() {
        let mut board = sample_board();
        let before = board.clone();

        let pending = board
            .apply(&MoveRequest {
                task_id: EntityId::Number(2),
                from: Stage::Todo,
                to: Stage::InProgress,
                to_index: 0,
            })
            .unwrap()
            .unwrap();

        assert_eq!(pending.from_index, 1);
        assert_eq!(board.stage_of(&EntityId::Number(2)), Some(Stage::InProgress));
        assert_eq!(
            ids(&board, Stage::InProgress),
            vec![EntityId::Number(2), EntityId::Number(4)]
        );

        assert!(board.revert(&pending));
        assert_eq!(board, before);
    }

    #[test]
    fn test_destination_index_is_clamped() {
        let mut board = sample_board();
        board
            .apply(&MoveRequest {
                task_id: EntityId::Number(5),
                from: Stage::Review,
                to: Stage::Done,
                to_index: 99,
            })
            .unwrap();
        assert_eq!(board.column(Stage::Done).last().unwrap().id, EntityId::Number(5));
    }

    #[test]
    fn test_rejections_leave_board_untouched() {
        let mut board = sample_board();
        let before = board.clone();

        let backward = board.apply(&MoveRequest {
            task_id: EntityId::Number(5),
            from: Stage::Review,
            to: Stage::Todo,
            to_index: 0,
        });
        assert!(matches!(backward, Err(MoveRejection::Backward { .. })));

        let done_reorder = board.apply(&MoveRequest {
            task_id: EntityId::Number(6),
            from: Stage::Done,
            to: Stage::Done,
            to_index: 1,
        });
        assert_eq!(done_reorder, Err(MoveRejection::TerminalStage));

        let unknown = board.apply(&MoveRequest {
            task_id: EntityId::Number(4),
            from: Stage::Todo,
            to: Stage::InProgress,
            to_index: 0,
        });
        assert!(matches!(unknown, Err(MoveRejection::UnknownCard { .. })));

        assert_eq!(board, before);
    }

    #[test]
    fn test_revert_after_reload_is_noop() {
        let mut board = sample_board();
        let pending = PendingMove {
            task_id: EntityId::Number(42),
            from: Stage::Todo,
            from_index: 0,
            to: Stage::InProgress,
        };
        assert!(!board.revert(&pending));
        assert_eq!(board.len(), 7);
    }
}
