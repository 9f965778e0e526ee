/*
[INPUT]:  Source and destination stages of a card move
[OUTPUT]: Accepted move kind or a rejection, before any request is issued
[POS]:    Board layer - forward-only workflow rules
[UPDATE]: When adding stages or changing which moves are legal
*/

pub mod columns;
pub mod session;

use std::fmt;
use std::str::FromStr;

use taskdeck_adapter::TaskStatus;
use thiserror::Error;

pub use columns::{Board, BoardCard, MoveRequest, PendingMove};
pub use session::{BoardError, BoardSession};

/// Board stages in workflow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Todo,
    InProgress,
    Review,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Todo, Stage::InProgress, Stage::Review, Stage::Done];

    pub fn index(self) -> usize {
        match self {
            Stage::Todo => 0,
            Stage::InProgress => 1,
            Stage::Review => 2,
            Stage::Done => 3,
        }
    }

    /// The only stage a card may advance to
    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Done
    }

    pub fn status(self) -> TaskStatus {
        self.into()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.status().as_str())
    }
}

impl From<Stage> for TaskStatus {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Todo => TaskStatus::Todo,
            Stage::InProgress => TaskStatus::InProgress,
            Stage::Review => TaskStatus::Review,
            Stage::Done => TaskStatus::Done,
        }
    }
}

impl TryFrom<TaskStatus> for Stage {
    type Error = StageParseError;

    fn try_from(status: TaskStatus) -> Result<Self, Self::Error> {
        match status {
            TaskStatus::Todo => Ok(Stage::Todo),
            TaskStatus::InProgress => Ok(Stage::InProgress),
            TaskStatus::Review => Ok(Stage::Review),
            TaskStatus::Done => Ok(Stage::Done),
            TaskStatus::Backlog => Err(StageParseError(status.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown board stage: {0}")]
pub struct StageParseError(pub String);

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Stage::Todo),
            "in-progress" | "in_progress" | "inprogress" => Ok(Stage::InProgress),
            "review" => Ok(Stage::Review),
            "done" | "completed" => Ok(Stage::Done),
            _ => Err(StageParseError(s.to_string())),
        }
    }
}

/// What an accepted move does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Same column, local only
    Reorder,
    /// Next column, needs a status update on the service
    Advance,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("You can only move tasks forward.")]
    Backward { from: Stage, to: Stage },

    #[error("You can only move tasks to the next stage.")]
    SkipAhead { from: Stage, to: Stage },

    #[error("Tasks in done cannot be moved.")]
    TerminalStage,

    #[error("Task {task_id} is not in the {stage} column.")]
    UnknownCard { task_id: String, stage: Stage },
}

/// Decide whether a card may go from `from` to `to`.
///
/// Backward moves are checked first, then the terminal column, so dragging a
/// done card anywhere is rejected without a request.
pub fn validate_move(from: Stage, to: Stage) -> Result<MoveKind, MoveRejection> {
    if to < from {
        return Err(MoveRejection::Backward { from, to });
    }
    if from.is_terminal() {
        return Err(MoveRejection::TerminalStage);
    }
    if from == to {
        return Ok(MoveKind::Reorder);
    }
    if from.next() == Some(to) {
        Ok(MoveKind::Advance)
    } else {
        Err(MoveRejection::SkipAhead { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Stage::Todo, Stage::Todo, Ok(MoveKind::Reorder))]
    #[case(Stage::Todo, Stage::InProgress, Ok(MoveKind::Advance))]
    #[case(Stage::Todo, Stage::Review, Err(MoveRejection::SkipAhead { from: Stage::Todo, to: Stage::Review }))]
    #[case(Stage::Todo, Stage::Done, Err(MoveRejection::SkipAhead { from: Stage::Todo, to: Stage::Done }))]
    #[case(Stage::InProgress, Stage::Todo, Err(MoveRejection::Backward { from: Stage::InProgress, to: Stage::Todo }))]
    #[case(Stage::InProgress, Stage::InProgress, Ok(MoveKind::Reorder))]
    #[case(Stage::InProgress, Stage::Review, Ok(MoveKind::Advance))]
    #[case(Stage::InProgress, Stage::Done, Err(MoveRejection::SkipAhead { from: Stage::InProgress, to: Stage::Done }))]
    #[case(Stage::Review, Stage::Todo, Err(MoveRejection::Backward { from: Stage::Review, to: Stage::Todo }))]
    #[case(Stage::Review, Stage::InProgress, Err(MoveRejection::Backward { from: Stage::Review, to: Stage::InProgress }))]
    #[case(Stage::Review, Stage::Review, Ok(MoveKind::Reorder))]
    #[case(Stage::Review, Stage::Done, Ok(MoveKind::Advance))]
    #[case(Stage::Done, Stage::Todo, Err(MoveRejection::Backward { from: Stage::Done, to: Stage::Todo }))]
    #[case(Stage::Done, Stage::InProgress, Err(MoveRejection::Backward { from: Stage::Done, to: Stage::InProgress }))]
    #[case(Stage::Done, Stage::Review, Err(MoveRejection::Backward { from: Stage::Done, to: Stage::Review }))]
    #[case(Stage::Done, Stage::Done, Err(MoveRejection::TerminalStage))]
    fn test_validate_move(
        #[case] from: Stage,
        #[case] to: Stage,
        #[case] expected: Result<MoveKind, MoveRejection>,
    ) {
        assert_eq!(validate_move(from, to), expected);
    }

    #[test]
    fn test_accepted_iff_next_or_same_non_terminal() {
        for from in Stage::ALL {
            for to in Stage::ALL {
                let legal = to.index() == from.index() + 1 || (from == to && !from.is_terminal());
                assert_eq!(validate_move(from, to).is_ok(), legal, "{from} -> {to}");
            }
        }
    }

    #[rstest]
    #[case("todo", Stage::Todo)]
    #[case("in-progress", Stage::InProgress)]
    #[case("In_Progress", Stage::InProgress)]
    #[case("review", Stage::Review)]
    #[case("completed", Stage::Done)]
    fn test_stage_from_str(#[case] raw: &str, #[case] expected: Stage) {
        assert_eq!(raw.parse::<Stage>().unwrap(), expected);
    }

    #[test]
    fn test_backlog_is_not_a_board_stage() {
        assert!(Stage::try_from(TaskStatus::Backlog).is_err());
        assert!("backlog".parse::<Stage>().is_err());
        assert_eq!(Stage::Review.status(), TaskStatus::Review);
        assert_eq!(Stage::Done.next(), None);
    }
}
