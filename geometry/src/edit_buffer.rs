//! Local shapes waiting to be sent to the collaboration server.
//!
//! Deletes are soft: a shape marked for deletion stays restorable for the
//! undo window and is only handed to the sync layer after it elapses.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use nics_shared::SendStatus;

use crate::{
    config::GeometryConfig,
    markup::{MarkupError, MarkupShape},
};

#[derive(Debug, thiserror::Error)]
pub enum EditBufferError {
    #[error("no shape with feature id {0}")]
    UnknownFeature(String),
    #[error("shape {0} is already marked for deletion")]
    AlreadyDeleted(String),
    #[error("shape {0} is not marked for deletion")]
    NotDeleted(String),
    #[error("undo window for {0} has elapsed")]
    UndoWindowElapsed(String),
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

#[derive(Debug, Clone)]
struct Entry {
    shape: MarkupShape,
    deleted_at: Option<DateTime<Utc>>,
    /// Status to restore when a delete is undone.
    status_before_delete: SendStatus,
}

#[derive(Debug, Clone)]
pub struct MarkupEditBuffer {
    entries: HashMap<String, Entry>,
    undo_window: Duration,
}

impl Default for MarkupEditBuffer {
    fn default() -> Self {
        Self::from_config(&GeometryConfig::default())
    }
}

impl MarkupEditBuffer {
    pub fn new(undo_window: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            undo_window,
        }
    }

    pub fn from_config(config: &GeometryConfig) -> Self {
        Self::new(config.undo_window())
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    /// Number of shapes held, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or replace a shape. Replacing clears a pending soft delete.
    pub fn insert(&mut self, shape: MarkupShape) -> Option<MarkupShape> {
        let status = shape.status;
        self.entries
            .insert(
                shape.feature_id.clone(),
                Entry {
                    shape,
                    deleted_at: None,
                    status_before_delete: status,
                },
            )
            .map(|entry| entry.shape)
    }

    /// Visible shape by id; soft-deleted shapes are hidden.
    pub fn get(&self, feature_id: &str) -> Option<&MarkupShape> {
        self.entries
            .get(feature_id)
            .filter(|entry| entry.deleted_at.is_none())
            .map(|entry| &entry.shape)
    }

    /// Shapes to draw, in feature id order.
    pub fn visible(&self) -> Vec<&MarkupShape> {
        let mut shapes: Vec<&MarkupShape> = self
            .entries
            .values()
            .filter(|entry| entry.deleted_at.is_none())
            .map(|entry| &entry.shape)
            .collect();
        shapes.sort_by(|a, b| a.feature_id.cmp(&b.feature_id));
        shapes
    }

    pub fn is_marked_for_deletion(&self, feature_id: &str) -> bool {
        self.entries
            .get(feature_id)
            .is_some_and(|entry| entry.deleted_at.is_some())
    }

    /// Run `edit` against a visible shape. A failed edit leaves the shape
    /// untouched.
    pub fn edit<F>(&mut self, feature_id: &str, edit: F) -> Result<(), EditBufferError>
    where
        F: FnOnce(&mut MarkupShape) -> Result<(), MarkupError>,
    {
        let entry = self.visible_entry_mut(feature_id)?;
        let mut draft = entry.shape.clone();
        edit(&mut draft)?;
        entry.shape = draft;
        Ok(())
    }

    pub fn mark_for_deletion(&mut self, feature_id: &str, now: DateTime<Utc>) -> Result<(), EditBufferError> {
        let entry = self
            .entries
            .get_mut(feature_id)
            .ok_or_else(|| EditBufferError::UnknownFeature(feature_id.to_string()))?;
        if entry.deleted_at.is_some() {
            return Err(EditBufferError::AlreadyDeleted(feature_id.to_string()));
        }
        entry.status_before_delete = entry.shape.status;
        entry.shape.status = SendStatus::Delete;
        entry.deleted_at = Some(now);
        tracing::debug!("marked {feature_id} for deletion");
        Ok(())
    }

    /// Restore a soft-deleted shape while the undo window is still open.
    pub fn undo_delete(&mut self, feature_id: &str, now: DateTime<Utc>) -> Result<&MarkupShape, EditBufferError> {
        let undo_window = self.undo_window;
        let entry = self
            .entries
            .get_mut(feature_id)
            .ok_or_else(|| EditBufferError::UnknownFeature(feature_id.to_string()))?;
        let deleted_at = entry
            .deleted_at
            .ok_or_else(|| EditBufferError::NotDeleted(feature_id.to_string()))?;
        if now - deleted_at > undo_window {
            return Err(EditBufferError::UndoWindowElapsed(feature_id.to_string()));
        }
        entry.deleted_at = None;
        entry.shape.status = entry.status_before_delete;
        tracing::debug!("restored {feature_id}");
        Ok(&entry.shape)
    }

    /// Drain everything the sync layer should act on at `now`.
    ///
    /// New and updated shapes go out immediately. Soft deletes go out once
    /// their undo window has elapsed; a shape that never reached the server
    /// is simply dropped. Sent shapes stay in the buffer.
    pub fn take_pending(&mut self, now: DateTime<Utc>) -> Vec<MarkupShape> {
        let undo_window = self.undo_window;
        let ready: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| match entry.deleted_at {
                Some(deleted_at) => now - deleted_at > undo_window,
                None => matches!(entry.shape.status, SendStatus::New | SendStatus::Update),
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut pending = Vec::with_capacity(ready.len());
        for id in ready {
            let Some(entry) = self.entries.remove(&id) else {
                continue;
            };
            if entry.deleted_at.is_some() && entry.status_before_delete == SendStatus::New {
                tracing::debug!("dropping {id}: deleted before it was ever sent");
                continue;
            }
            pending.push(entry.shape);
        }
        pending.sort_by(|a, b| {
            a.last_update
                .cmp(&b.last_update)
                .then_with(|| a.feature_id.cmp(&b.feature_id))
        });
        if !pending.is_empty() {
            tracing::info!("{} markup change(s) ready to send", pending.len());
        }
        pending
    }

    fn visible_entry_mut(&mut self, feature_id: &str) -> Result<&mut Entry, EditBufferError> {
        match self.entries.get_mut(feature_id) {
            Some(entry) if entry.deleted_at.is_none() => Ok(entry),
            Some(_) => Err(EditBufferError::AlreadyDeleted(feature_id.to_string())),
            None => Err(EditBufferError::UnknownFeature(feature_id.to_string())),
        }
    }
}
