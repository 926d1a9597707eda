//! Merge-join diff iterator.
//!
//! Both inputs must yield keys in non-decreasing byte order. At the top of
//! every step each side's cursor points at its first not-yet-consumed record;
//! a step consumes from exactly the side(s) it compares, so the join is
//! O(L + R) and never backtracks.

use std::cmp::Ordering;

use crate::errors::{ExError, ExErrorKind};
use crate::inventory::{EmptyInventoryIterator, InventoryIterator};
use crate::model::{DiffObj, DiffSide};

/// Position of the merge-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffState {
    /// Inspect both heads and pick the next transition
    Compare,
    /// Left head sorts first (or right is exhausted): a deletion
    EmitLeftDeleted,
    /// Right head sorts first (or left is exhausted): an addition
    EmitRightAdded,
    /// Heads share a key: a modification, or nothing if checksums match
    CompareEqualKeys,
    Done,
    Failed,
}

/// Per-kind counts of what a diff has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub added: u64,
    pub changed: u64,
    pub deleted: u64,
    pub unchanged: u64,
}

/// Pull-based diff between a previous (left) and current (right) inventory.
///
/// Follows the same `next`/`get`/`err` protocol as [`InventoryIterator`].
/// A failure on either input is fatal to the whole diff.
pub struct DiffIterator<'a> {
    left: Box<dyn InventoryIterator + 'a>,
    right: Box<dyn InventoryIterator + 'a>,
    left_has: bool,
    right_has: bool,
    state: DiffState,
    value: Option<DiffObj>,
    summary: DiffSummary,
    err: Option<ExError>,
}

impl<'a> DiffIterator<'a> {
    /// Create a diff and prime both sides.
    ///
    /// A missing left side behaves as an empty inventory, so every right
    /// record is an addition (first import).
    pub fn new(
        left: Option<Box<dyn InventoryIterator + 'a>>,
        right: Box<dyn InventoryIterator + 'a>,
    ) -> Self {
        let mut left = left.unwrap_or_else(|| Box::new(EmptyInventoryIterator));
        let mut right = right;
        let left_has = left.next();
        let right_has = right.next();
        Self {
            left,
            right,
            left_has,
            right_has,
            state: DiffState::Compare,
            value: None,
            summary: DiffSummary::default(),
            err: None,
        }
    }

    /// Advance to the next difference. Returns `false` when both sides are
    /// exhausted or either side failed; check [`DiffIterator::err`] to tell
    /// which.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.value = None;
        loop {
            match self.state {
                DiffState::Done | DiffState::Failed => return false,
                DiffState::Compare => self.state = self.compare(),
                DiffState::EmitLeftDeleted => {
                    // Copy before advancing: the source may reuse its buffer.
                    let obj = self.left.get().cloned();
                    self.left_has = self.left.next();
                    self.state = DiffState::Compare;
                    if let Some(obj) = obj {
                        self.summary.deleted += 1;
                        self.value = Some(DiffObj::deleted(obj));
                        return true;
                    }
                }
                DiffState::EmitRightAdded => {
                    let obj = self.right.get().cloned();
                    self.right_has = self.right.next();
                    self.state = DiffState::Compare;
                    if let Some(obj) = obj {
                        self.summary.added += 1;
                        self.value = Some(DiffObj::added_or_changed(obj));
                        return true;
                    }
                }
                DiffState::CompareEqualKeys => {
                    let changed = match (self.left.get(), self.right.get()) {
                        (Some(l), Some(r)) if l.checksum != r.checksum => Some(r.clone()),
                        _ => None,
                    };
                    self.left_has = self.left.next();
                    self.right_has = self.right.next();
                    self.state = DiffState::Compare;
                    match changed {
                        Some(obj) => {
                            self.summary.changed += 1;
                            self.value = Some(DiffObj::added_or_changed(obj));
                            return true;
                        }
                        // Unchanged: both sides advanced but nothing is
                        // emitted, so keep looping until a difference or the end.
                        None => self.summary.unchanged += 1,
                    }
                }
            }
        }
    }

    /// The current difference; valid after a `next` that returned `true`
    pub fn get(&self) -> Option<&DiffObj> {
        self.value.as_ref()
    }

    /// Take ownership of the current difference
    pub fn take(&mut self) -> Option<DiffObj> {
        self.value.take()
    }

    /// The sticky error, naming the side that failed
    pub fn err(&self) -> Option<&ExError> {
        self.err.as_ref()
    }

    pub fn summary(&self) -> DiffSummary {
        self.summary
    }

    fn compare(&mut self) -> DiffState {
        for side in [DiffSide::Left, DiffSide::Right] {
            let source_err = match side {
                DiffSide::Left => self.left.err(),
                DiffSide::Right => self.right.err(),
            };
            if let Some(source_err) = source_err {
                let err = ExError::new(ExErrorKind::InventorySourceFailed)
                    .with_op("diff_next")
                    .with_side(side)
                    .with_message(format!("failed to get value from {} inventory", side))
                    .with_source(source_err.clone());
                tracing::warn!(side = %side, error = %err, "inventory diff aborted");
                self.err = Some(err);
                return DiffState::Failed;
            }
        }

        let left = if self.left_has { self.left.get() } else { None };
        let right = if self.right_has { self.right.get() } else { None };
        match (left, right) {
            (None, None) => {
                tracing::debug!(
                    added = self.summary.added,
                    changed = self.summary.changed,
                    deleted = self.summary.deleted,
                    unchanged = self.summary.unchanged,
                    "inventory diff complete"
                );
                DiffState::Done
            }
            (Some(_), None) => DiffState::EmitLeftDeleted,
            (None, Some(_)) => DiffState::EmitRightAdded,
            (Some(l), Some(r)) => match l.key.as_bytes().cmp(r.key.as_bytes()) {
                Ordering::Less => DiffState::EmitLeftDeleted,
                Ordering::Greater => DiffState::EmitRightAdded,
                Ordering::Equal => DiffState::CompareEqualKeys,
            },
        }
    }
}
