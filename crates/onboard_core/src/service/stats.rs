//! Pure statistics over task collections.

use crate::model::task::{TaskRecord, TaskStatus};
use serde::Serialize;

/// Task counts per status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub other: usize,
}

impl StatusTally {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.other
    }

    fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Other => self.other += 1,
        }
    }
}

/// Share of completed tasks in percent, rounded half up. Empty input is 0.
pub fn progress_percent(tasks: &[TaskRecord]) -> u32 {
    let total = tasks.len();
    if total == 0 {
        return 0;
    }
    let done = tasks.iter().filter(|task| task.status.is_done()).count();
    let percent = (done * 100 + total / 2) / total;
    u32::try_from(percent).unwrap_or(100)
}

pub fn tally_statuses(tasks: &[TaskRecord]) -> StatusTally {
    tasks.iter().fold(StatusTally::default(), |mut tally, task| {
        tally.record(task.status);
        tally
    })
}
