use log::debug;

use crate::settings::HISTORY_CAP;
use crate::show::Show;

/// Snapshot-based undo/redo over whole shows.
///
/// Every committed edit pushes the pre-edit state onto the undo stack;
/// identical consecutive snapshots are collapsed, and the stack is capped
/// by dropping the oldest entry.
#[derive(Default)]
pub struct History {
    undo: Vec<Show>,
    redo: Vec<Show>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    /// Record the state as it was before a mutation. Any redo trail is
    /// invalidated by the new edit.
    pub fn snapshot(&mut self, before: &Show) {
        if self.undo.last() == Some(before) {
            debug!("skipping duplicate history snapshot");
        } else {
            if self.undo.len() >= HISTORY_CAP {
                self.undo.remove(0);
            }
            self.undo.push(before.clone());
        }
        self.redo.clear();
    }

    /// Swap the current show for the most recent snapshot, keeping the
    /// current state reachable via redo. Returns None when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &Show) -> Option<Show> {
        let previous = self.undo.pop()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    pub fn redo(&mut self, current: &Show) -> Option<Show> {
        let next = self.redo.pop()?;
        self.undo.push(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
