/// Board/List Interaction Layer
///
/// Sits between raw UI events (drag gestures, form submissions, search
/// input) and the [`EntityStore`](crate::store::EntityStore). Nothing in this
/// layer returns an error for a bad gesture: invalid drops and empty queries
/// degrade to no-ops and empty results. Only form submissions report
/// [`FormError`](forms::FormError)s, and they do so before touching the store.
///
/// # Modules
///
/// - [`columns`]: Fixed column sets and per-column grouping
/// - [`drag`]: Drag-and-drop status transitions
/// - [`search`]: Local and global free-text search
/// - [`forms`]: Form validation and save/delete flows
/// - [`timeline`]: Chat messages, notes and author grouping
/// - [`markup`]: Inline markup parsing for bodies

pub mod columns;
pub mod drag;
pub mod forms;
pub mod markup;
pub mod search;
pub mod timeline;

pub use columns::{BoardEntity, Column, ColumnStatus};
pub use drag::{DragController, DropOutcome};
pub use forms::{FieldError, Form, FormError};
pub use search::{global_search, SearchHit, SearchHitKind, StatusFilter};
