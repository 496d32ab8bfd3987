//! Inbound change events and outbound grid notifications.
//!
//! Inbound: `ChangeEvent`, the wire shape the transport pushes at the grid
//! (and the NDJSON event-file shape). Outbound: `GridEvent`, delivered
//! through a registered callback so shells can re-render on refresh and
//! surface edit failures without polling.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::row::RowId;

/// What a change event does to its row.
///
/// `Terminated` and `Unterminated` carry domain meaning for shells but are
/// identical to `Updated` at the data layer: a full-row replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Terminated,
    Unterminated,
    Deleted,
}

impl ChangeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Terminated => "terminated",
            ChangeKind::Unterminated => "unterminated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// One server-pushed change, as it arrives off the wire.
///
/// `row_id` and `row` are optional at the serde level so malformed events
/// deserialize instead of erroring; the reconciler validates and drops them.
/// The timestamp is carried for display and never used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    #[serde(default)]
    pub row_id: Option<RowId>,
    /// Full row payload, keyed by column key. Absent for deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, row_id: RowId) -> Self {
        Self { kind, row_id: Some(row_id), row: None, at: None }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.row.get_or_insert_with(Map::new).insert(key.into(), value);
        self
    }
}

/// Events the grid emits to its shell.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The display snapshot was rebuilt. Shells re-render when the
    /// revision moves.
    SnapshotRefreshed { revision: u64 },
    /// An edit commit resolved with a failure; the cell has reverted.
    EditFailed { row_id: RowId, column_key: String, reason: String },
    /// An inbound change event was dropped instead of applied.
    EventDropped { reason: String },
    /// Column width, visibility, or order changed; persist the layout.
    LayoutChanged,
}

/// Callback type for receiving grid events. The engine is single-threaded,
/// so callbacks run synchronously inside the mutating call.
pub type EventCallback = Box<dyn FnMut(&GridEvent)>;

/// Event collector for tests: clones share storage, so one half can be
/// registered as the grid's callback while the other half asserts.
#[derive(Debug, Default, Clone)]
pub struct EventCollector {
    events: Rc<RefCell<Vec<GridEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records into this collector's storage.
    pub fn callback(&self) -> EventCallback {
        let events = Rc::clone(&self.events);
        Box::new(move |event| events.borrow_mut().push(event.clone()))
    }

    pub fn events(&self) -> Vec<GridEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Revisions carried by SnapshotRefreshed events, in emission order.
    pub fn refreshed_revisions(&self) -> Vec<u64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GridEvent::SnapshotRefreshed { revision } => Some(*revision),
                _ => None,
            })
            .collect()
    }

    /// Only the EditFailed events, as `(row_id, column_key, reason)`.
    pub fn edit_failures(&self) -> Vec<(RowId, String, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GridEvent::EditFailed { row_id, column_key, reason } => {
                    Some((*row_id, column_key.clone(), reason.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Only the EventDropped reasons.
    pub fn dropped_reasons(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                GridEvent::EventDropped { reason } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn layout_changes(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, GridEvent::LayoutChanged))
            .count()
    }
}
