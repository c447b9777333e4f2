/// Drag-and-drop between board columns
///
/// `on_drag_start` only records which card is being dragged (for the drag
/// overlay). `on_drag_end` decides what the drop means:
///
/// | Situation                         | Outcome          | Store      |
/// |-----------------------------------|------------------|------------|
/// | released outside any drop zone    | `NoTarget`       | unchanged  |
/// | card id not in the store          | `UnknownEntity`  | unchanged  |
/// | target not one of the board's ids | `InvalidTarget`  | unchanged  |
/// | target is the card's own column   | `SameColumn`     | unchanged  |
/// | otherwise                         | `Moved`          | status set |
///
/// Dropping never fails; every rejected drop leaves the store untouched.
///
/// # Example
///
/// ```
/// use pulsehq_shared::board::drag::{DragController, DropOutcome};
/// use pulsehq_shared::models::task::{Task, TaskStatus};
/// use pulsehq_shared::store::EntityStore;
///
/// let mut store = EntityStore::new();
/// store.add(Task::new("1", "Ship release"));
///
/// let mut drag = DragController::<Task>::new();
/// drag.on_drag_start("1");
/// let outcome = drag.on_drag_end(&mut store, "1", Some("done"));
///
/// assert_eq!(outcome, DropOutcome::Moved { from: TaskStatus::Todo, to: TaskStatus::Done });
/// ```

use std::marker::PhantomData;

use super::columns::{BoardEntity, ColumnStatus};
use crate::store::EntityStore;

/// What a drop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome<S> {
    /// Released outside any drop zone
    NoTarget,

    /// The dragged id doesn't exist (deleted mid-drag)
    UnknownEntity,

    /// Dropped on the column it was already in
    SameColumn,

    /// Drop zone id outside the board's column set
    InvalidTarget(String),

    /// Status changed
    Moved { from: S, to: S },
}

impl<S> DropOutcome<S> {
    /// Whether the store was mutated
    pub fn is_move(&self) -> bool {
        matches!(self, DropOutcome::Moved { .. })
    }
}

/// Tracks the active drag on one board
#[derive(Debug)]
pub struct DragController<T: BoardEntity> {
    active: Option<String>,
    _board: PhantomData<fn() -> T>,
}

impl<T: BoardEntity> Default for DragController<T> {
    fn default() -> Self {
        Self {
            active: None,
            _board: PhantomData,
        }
    }
}

impl<T: BoardEntity> DragController<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as the card being dragged
    pub fn on_drag_start(&mut self, id: &str) {
        self.active = Some(id.to_string());
    }

    /// Id of the card being dragged
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The card being dragged, for rendering the overlay
    pub fn active<'a>(&self, store: &'a EntityStore) -> Option<&'a T> {
        self.active.as_deref().and_then(|id| store.get::<T>(id))
    }

    /// Abandons the drag without a drop
    pub fn on_drag_cancel(&mut self) {
        self.active = None;
    }

    /// Finishes the drag of `id` over `target`
    pub fn on_drag_end(&mut self, store: &mut EntityStore, id: &str, target: Option<&str>) -> DropOutcome<T::Status> {
        self.active = None;

        let Some(target) = target else {
            tracing::debug!(kind = %T::KIND, id, "Drop without target");
            return DropOutcome::NoTarget;
        };

        let Some(current) = store.get::<T>(id).map(T::status) else {
            tracing::debug!(kind = %T::KIND, id, "Dropped entity no longer exists");
            return DropOutcome::UnknownEntity;
        };

        let Some(to) = T::Status::parse_column(target) else {
            tracing::warn!(kind = %T::KIND, id, column = target, "Invalid drop target");
            return DropOutcome::InvalidTarget(target.to_string());
        };

        if to == current {
            return DropOutcome::SameColumn;
        }

        store.update(id, T::status_patch(to));
        tracing::debug!(kind = %T::KIND, id, from = %current, to = %to, "Moved card");
        DropOutcome::Moved { from: current, to }
    }
}
