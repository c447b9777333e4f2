/// Board columns
///
/// Both boards (tasks and contacts) are a fixed ordered set of status
/// columns. [`ColumnStatus`] describes such a status set and [`BoardEntity`]
/// ties an entity to its status field so drag handling, filtering and column
/// grouping can be written once.

use std::fmt;

use crate::models::contact::{Contact, ContactPatch, ContactStatus};
use crate::models::task::{Task, TaskPatch, TaskStatus};
use crate::store::{EntityStore, Patch, StoredEntity};

/// Fixed status set of one board
pub trait ColumnStatus: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Columns in display order
    const COLUMNS: &'static [Self];

    /// Stable column id, also the serialized status
    fn column_id(&self) -> &'static str;

    /// Column heading
    fn column_title(&self) -> &'static str;

    /// Parses a drop-target id; `None` for ids outside the set
    fn parse_column(id: &str) -> Option<Self>;
}

impl ColumnStatus for TaskStatus {
    const COLUMNS: &'static [Self] = &TaskStatus::ALL;

    fn column_id(&self) -> &'static str {
        self.as_str()
    }

    fn column_title(&self) -> &'static str {
        self.title()
    }

    fn parse_column(id: &str) -> Option<Self> {
        TaskStatus::from_column_id(id)
    }
}

impl ColumnStatus for ContactStatus {
    const COLUMNS: &'static [Self] = &ContactStatus::ALL;

    fn column_id(&self) -> &'static str {
        self.as_str()
    }

    fn column_title(&self) -> &'static str {
        self.title()
    }

    fn parse_column(id: &str) -> Option<Self> {
        ContactStatus::from_column_id(id)
    }
}

/// Entity shown as a card on a board
pub trait BoardEntity: StoredEntity {
    type Status: ColumnStatus;
    type StatusPatch: Patch<Target = Self>;

    fn status(&self) -> Self::Status;

    /// Patch that only changes the status
    fn status_patch(status: Self::Status) -> Self::StatusPatch;
}

impl BoardEntity for Task {
    type Status = TaskStatus;
    type StatusPatch = TaskPatch;

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn status_patch(status: TaskStatus) -> TaskPatch {
        TaskPatch::status(status)
    }
}

impl BoardEntity for Contact {
    type Status = ContactStatus;
    type StatusPatch = ContactPatch;

    fn status(&self) -> ContactStatus {
        self.status
    }

    fn status_patch(status: ContactStatus) -> ContactPatch {
        ContactPatch::status(status)
    }
}

/// One column with its cards, in store order
#[derive(Debug)]
pub struct Column<'a, T: BoardEntity> {
    pub status: T::Status,
    pub cards: Vec<&'a T>,
}

impl<'a, T: BoardEntity> Column<'a, T> {
    pub fn id(&self) -> &'static str {
        self.status.column_id()
    }

    pub fn title(&self) -> &'static str {
        self.status.column_title()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Groups `items` into the board's columns
///
/// Every column is present even when empty.
pub fn group_by_column<'a, T, I>(items: I) -> Vec<Column<'a, T>>
where
    T: BoardEntity,
    I: IntoIterator<Item = &'a T>,
{
    let mut columns: Vec<Column<'a, T>> = T::Status::COLUMNS
        .iter()
        .map(|&status| Column {
            status,
            cards: Vec::new(),
        })
        .collect();

    for item in items {
        if let Some(column) = columns.iter_mut().find(|c| c.status == item.status()) {
            column.cards.push(item);
        }
    }

    columns
}

/// All columns of the board for `T`
pub fn board<T: BoardEntity>(store: &EntityStore) -> Vec<Column<'_, T>> {
    group_by_column(store.collection::<T>().iter())
}
