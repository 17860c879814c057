//! Cyclic tab navigation.
//!
//! Computes the next or previous editor relative to the most recently
//! visited tab, wrapping at both ends of the tab order.

use crate::ids::EditorId;
use crate::store::Store;

/// Navigation direction for tab cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Returns the editor to select when cycling in `direction`.
///
/// The reference point is the most recently visited editor; with a single
/// editor the wraparound lands back on it. Returns `None` when no editors
/// exist.
pub fn switch_target(store: &Store, direction: Direction) -> Option<EditorId> {
    let order = store.editor_order();
    if order.is_empty() {
        return None;
    }

    let current = store
        .last_visited()
        .and_then(|id| order.iter().position(|e| e == id))
        .unwrap_or(0);

    let target = match direction {
        Direction::Next => (current + 1) % order.len(),
        Direction::Previous => (current + order.len() - 1) % order.len(),
    };

    Some(order[target].clone())
}
