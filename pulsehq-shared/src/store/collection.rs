/// Snapshot-replace entity collection
///
/// A [`Collection`] holds its records behind an `Arc<Vec<T>>`. Every effective
/// mutation builds a new vector and swaps the `Arc`, so a snapshot taken before
/// the mutation keeps seeing the old records and readers never observe a
/// half-applied change. A no-op (update or delete of an unknown id) leaves the
/// same `Arc` in place, which makes "nothing changed" checkable with
/// [`Arc::ptr_eq`].

use std::fmt;
use std::sync::Arc;

/// Kind tag for every entity the store manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Contact,
    Message,
    Note,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Contact => "contact",
            EntityKind::Message => "message",
            EntityKind::Note => "note",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record with a caller-assigned string id
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind tag used in logs and search hits
    const KIND: EntityKind;

    /// Record id
    fn id(&self) -> &str;
}

/// A partial update for one entity type
pub trait Patch: fmt::Debug {
    /// Entity this patch applies to
    type Target: Entity;

    /// Shallow-merges the patch into `target`
    fn apply_to(&self, target: &mut Self::Target);
}

/// Ordered collection of one entity type
#[derive(Clone)]
pub struct Collection<T> {
    items: Arc<Vec<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T: Entity> Collection<T> {
    /// Wraps an existing vector
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First record with the given id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn push(&mut self, item: T) {
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.extend(self.items.iter().cloned());
        next.push(item);
        self.items = Arc::new(next);
    }

    /// Applies `patch` to every record with `id`; returns the first updated
    /// record, or `None` (and leaves the snapshot untouched) if none matched.
    pub(crate) fn update<P>(&mut self, id: &str, patch: &P) -> Option<T>
    where
        P: Patch<Target = T>,
    {
        if !self.contains(id) {
            return None;
        }

        let mut first = None;
        let next: Vec<T> = self
            .items
            .iter()
            .map(|item| {
                if item.id() != id {
                    return item.clone();
                }
                let mut updated = item.clone();
                patch.apply_to(&mut updated);
                if first.is_none() {
                    first = Some(updated.clone());
                }
                updated
            })
            .collect();

        self.items = Arc::new(next);
        first
    }

    /// Removes every record with `id`; returns how many were removed
    pub(crate) fn remove(&mut self, id: &str) -> usize {
        if !self.contains(id) {
            return 0;
        }

        let before = self.items.len();
        let next: Vec<T> = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();
        let removed = before - next.len();
        self.items = Arc::new(next);
        removed
    }

    pub(crate) fn replace_all(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
    }
}
