//! Optimistic list reconciliation.
//!
//! Screens keep a displayed `Vec<Resource>` responsive across mutation
//! latency by applying the edit locally first, then resolving it when the
//! server answers. [`ListReconciler`] is that pattern factored into one
//! place: `stage_*` applies the local edit and returns an
//! [`OptimisticEdit`] ticket; [`ListReconciler::commit`] swaps in the
//! authoritative server record; [`ListReconciler::rollback`] restores the
//! exact pre-edit state.
//!
//! Only the targeted entry ever moves. Unrelated entries keep their order,
//! and list length changes only through the staged insert/remove itself.
//!
//! Rapid repeat edits on one record can resolve out of order (responses
//! are independent requests). Each staged edit therefore carries a
//! per-target sequence number; resolving an edit older than the last one
//! applied for that id is refused as [`ReconcileError::Stale`] and leaves
//! the list untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::resource::{Resource, ResourceId};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a staged edit does to the displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Create,
    Update,
    Delete,
}

/// Where a provisional create lands in the displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Prepend,
    Append,
}

/// Errors from resolving a staged edit.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The targeted entry is no longer in the list.
    #[error("No list entry with id {0}")]
    TargetNotFound(ResourceId),

    /// A newer edit for the same id has already been applied.
    #[error("Edit for id {0} superseded by a newer edit")]
    Stale(ResourceId),

    /// Create and update commits need the server's record to reconcile.
    #[error("Server data required to resolve this edit")]
    MissingServerData,
}

/// A pending local mutation, returned by `stage_*` and consumed by
/// [`ListReconciler::commit`] or [`ListReconciler::rollback`].
#[derive(Debug, Clone)]
pub struct OptimisticEdit {
    pub kind: EditKind,
    /// The edited entry's id; for creates, the provisional sentinel id.
    pub target_id: ResourceId,
    /// Pre-edit snapshot. `None` for creates (there was no entry).
    pub previous: Option<Resource>,
    /// Index the entry occupied before a delete removed it.
    pub original_index: Option<usize>,
    pub applied_at: DateTime<Utc>,
    seq: u64,
}

impl OptimisticEdit {
    /// Per-target sequence number assigned at stage time.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

// ---------------------------------------------------------------------------
// ListReconciler
// ---------------------------------------------------------------------------

/// Stage/commit/rollback bookkeeping for one displayed list.
///
/// Owns the provisional-id counter and the per-target sequence state; the
/// list itself stays with the caller. All operations are synchronous and
/// in-memory.
#[derive(Debug, Default)]
pub struct ListReconciler {
    minted_ids: i64,
    next_seq: HashMap<ResourceId, u64>,
    last_applied: HashMap<ResourceId, u64>,
}

impl ListReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a create locally: a provisional entry with a sentinel id is
    /// inserted so the screen renders it immediately.
    pub fn stage_create(
        &mut self,
        list: &mut Vec<Resource>,
        draft: Map<String, Value>,
        position: InsertPosition,
    ) -> OptimisticEdit {
        let id = self.mint_provisional_id();
        let provisional = Resource::with_fields(id, draft);
        match position {
            InsertPosition::Prepend => list.insert(0, provisional),
            InsertPosition::Append => list.push(provisional),
        }
        tracing::debug!(target_id = id, "Staged optimistic create");
        self.edit(EditKind::Create, id, None, None)
    }

    /// Apply an update locally: the entry is snapshotted, then replaced in
    /// place with the edited fields.
    pub fn stage_update(
        &mut self,
        list: &mut [Resource],
        id: ResourceId,
        new_fields: Map<String, Value>,
    ) -> Result<OptimisticEdit, ReconcileError> {
        let pos = position_of(list, id).ok_or(ReconcileError::TargetNotFound(id))?;
        let snapshot = list[pos].clone();
        list[pos] = Resource::with_fields(id, new_fields);
        tracing::debug!(target_id = id, "Staged optimistic update");
        Ok(self.edit(EditKind::Update, id, Some(snapshot), Some(pos)))
    }

    /// Apply a delete locally: the entry is snapshotted and removed, its
    /// index remembered for a possible rollback.
    pub fn stage_delete(
        &mut self,
        list: &mut Vec<Resource>,
        id: ResourceId,
    ) -> Result<OptimisticEdit, ReconcileError> {
        let pos = position_of(list, id).ok_or(ReconcileError::TargetNotFound(id))?;
        let snapshot = list.remove(pos);
        tracing::debug!(target_id = id, index = pos, "Staged optimistic delete");
        Ok(self.edit(EditKind::Delete, id, Some(snapshot), Some(pos)))
    }

    /// Resolve a staged edit with the server's answer.
    ///
    /// Create and update replace the staged entry with `server` (the
    /// authoritative record: real id, server-computed fields). Delete needs
    /// no list work. The edit is consumed; a stale edit is refused without
    /// touching the list.
    pub fn commit(
        &mut self,
        list: &mut [Resource],
        edit: OptimisticEdit,
        server: Option<Resource>,
    ) -> Result<(), ReconcileError> {
        self.check_fresh(&edit)?;

        match edit.kind {
            EditKind::Create | EditKind::Update => {
                let server = server.ok_or(ReconcileError::MissingServerData)?;
                let pos = position_of(list, edit.target_id)
                    .ok_or(ReconcileError::TargetNotFound(edit.target_id))?;
                list[pos] = server;
            }
            EditKind::Delete => {}
        }

        self.mark_applied(&edit);
        Ok(())
    }

    /// Revert a staged edit after a server failure.
    ///
    /// The list returns to its exact pre-edit state: a provisional create
    /// is removed, an update's snapshot is restored in place, a deleted
    /// entry is reinserted at its original index (clamped if the list
    /// shrank meanwhile). A stale edit is refused without touching the
    /// list.
    pub fn rollback(
        &mut self,
        list: &mut Vec<Resource>,
        edit: OptimisticEdit,
    ) -> Result<(), ReconcileError> {
        self.check_fresh(&edit)?;

        match edit.kind {
            EditKind::Create => {
                if let Some(pos) = position_of(list, edit.target_id) {
                    list.remove(pos);
                } else {
                    tracing::warn!(
                        target_id = edit.target_id,
                        "Provisional entry already gone during create rollback"
                    );
                }
            }
            EditKind::Update => match (position_of(list, edit.target_id), edit.previous.clone()) {
                (Some(pos), Some(snapshot)) => list[pos] = snapshot,
                _ => {
                    tracing::warn!(
                        target_id = edit.target_id,
                        "Entry missing during update rollback"
                    );
                }
            },
            EditKind::Delete => {
                if let Some(snapshot) = edit.previous.clone() {
                    let pos = edit.original_index.unwrap_or(list.len()).min(list.len());
                    list.insert(pos, snapshot);
                }
            }
        }

        tracing::warn!(target_id = edit.target_id, kind = ?edit.kind, "Rolled back optimistic edit");
        self.mark_applied(&edit);
        Ok(())
    }

    // ---- internal ----

    fn mint_provisional_id(&mut self) -> ResourceId {
        self.minted_ids += 1;
        -self.minted_ids
    }

    fn edit(
        &mut self,
        kind: EditKind,
        target_id: ResourceId,
        previous: Option<Resource>,
        original_index: Option<usize>,
    ) -> OptimisticEdit {
        let counter = self.next_seq.entry(target_id).or_insert(0);
        *counter += 1;
        OptimisticEdit {
            kind,
            target_id,
            previous,
            original_index,
            applied_at: Utc::now(),
            seq: *counter,
        }
    }

    fn check_fresh(&self, edit: &OptimisticEdit) -> Result<(), ReconcileError> {
        match self.last_applied.get(&edit.target_id) {
            Some(last) if *last >= edit.seq => Err(ReconcileError::Stale(edit.target_id)),
            _ => Ok(()),
        }
    }

    fn mark_applied(&mut self, edit: &OptimisticEdit) {
        self.last_applied.insert(edit.target_id, edit.seq);
    }
}

/// Index of the entry with `id`, if present.
fn position_of(list: &[Resource], id: ResourceId) -> Option<usize> {
    list.iter().position(|r| r.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
