//! Linear undo/redo over whole design snapshots.
//!
//! Restoring a snapshot makes the UI rewrite its state, and those writes come
//! back as `push` calls. While a restore is being applied pushes are ignored;
//! the caller ends the restore with [`History::finish_restore`] once the
//! restored state has settled.

use log::debug;

#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    /// `None` while the history is empty.
    pointer: Option<usize>,
    restoring: bool,
    additions_blocked: bool,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> History<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pointer: None,
            restoring: false,
            additions_blocked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pointer in the `[-1, len - 1]` convention, `-1` meaning empty.
    pub fn pointer(&self) -> isize {
        self.pointer.map_or(-1, |p| p as isize)
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn block_additions(&mut self) {
        self.additions_blocked = true;
    }

    pub fn unblock_additions(&mut self) {
        self.additions_blocked = false;
    }

    /// Records a snapshot, dropping anything after the pointer. Returns
    /// whether the snapshot was recorded.
    pub fn push(&mut self, snapshot: &T) -> bool {
        if self.restoring || self.additions_blocked {
            debug!("history: push ignored (restoring: {}, blocked: {})", self.restoring, self.additions_blocked);
            return false;
        }
        let keep = self.pointer.map_or(0, |p| p + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot.clone());
        self.pointer = Some(self.entries.len() - 1);
        true
    }

    /// Steps back one entry (clamped at the first) and starts a restore.
    pub fn back(&mut self) -> Option<T> {
        if let Some(p) = self.pointer {
            self.pointer = Some(p.saturating_sub(1));
        }
        self.start_restore()
    }

    /// Steps forward one entry (clamped at the last) and starts a restore.
    pub fn forward(&mut self) -> Option<T> {
        if let Some(p) = self.pointer {
            if p + 1 < self.entries.len() {
                self.pointer = Some(p + 1);
            }
        }
        self.start_restore()
    }

    fn start_restore(&mut self) -> Option<T> {
        let snapshot = self.current()?;
        self.restoring = true;
        Some(snapshot)
    }

    /// Ends the restore started by [`back`](Self::back) or
    /// [`forward`](Self::forward); pushes are accepted again.
    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    /// Like [`back`](Self::back), but the restore ends when the guard drops.
    pub fn restore_back(&mut self) -> Option<RestoreGuard<'_, T>> {
        let snapshot = self.back()?;
        Some(RestoreGuard {
            history: self,
            snapshot,
        })
    }

    /// Like [`forward`](Self::forward), but the restore ends when the guard drops.
    pub fn restore_forward(&mut self) -> Option<RestoreGuard<'_, T>> {
        let snapshot = self.forward()?;
        Some(RestoreGuard {
            history: self,
            snapshot,
        })
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.pointer, Some(p) if p > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.pointer, Some(p) if p + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<T> {
        self.pointer.and_then(|p| self.entries.get(p)).cloned()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.pointer = None;
        self.restoring = false;
    }
}

/// A snapshot being restored. Pushes made through [`RestoreGuard::history`]
/// while the guard lives are ignored.
pub struct RestoreGuard<'a, T: Clone> {
    history: &'a mut History<T>,
    snapshot: T,
}

impl<T: Clone> RestoreGuard<'_, T> {
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    pub fn history(&mut self) -> &mut History<T> {
        self.history
    }
}

impl<T: Clone> Drop for RestoreGuard<'_, T> {
    fn drop(&mut self) {
        self.history.finish_restore();
    }
}
