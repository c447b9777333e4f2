/// Free-text search
///
/// Matching is a case-insensitive substring test against a fixed field set
/// per entity type. There is no tokenization and no ranking.
///
/// | Entity  | Fields                  |
/// |---------|-------------------------|
/// | Task    | title, description      |
/// | Contact | name, company, email    |
/// | Message | body                    |
///
/// - **Local search** filters one board's list and is ANDed with a
///   [`StatusFilter`]. An empty query keeps everything the filter keeps.
/// - **Global search** runs across tasks, contacts and messages (in that
///   order) and returns at most [`MAX_GLOBAL_RESULTS`] hits. A blank query
///   returns nothing.

use serde::{Deserialize, Serialize};

use super::columns::{BoardEntity, ColumnStatus};
use crate::models::{
    contact::{Contact, ContactStatus},
    message::Message,
    task::{Task, TaskStatus},
};
use crate::store::{EntityKind, EntityStore, View};

/// Global search result cap
pub const MAX_GLOBAL_RESULTS: usize = 10;

const MESSAGE_TITLE_CHARS: usize = 50;

/// Entity with a searchable field set
pub trait Searchable {
    /// Fields the query is matched against; absent fields are skipped
    fn search_fields(&self) -> Vec<&str>;

    /// Whether any field contains `needle`, which must already be lowercase
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    /// Case-insensitive substring match
    fn matches(&self, query: &str) -> bool {
        self.matches_lowercase(&query.to_lowercase())
    }
}

impl Searchable for Task {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

impl Searchable for Contact {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.company.as_deref());
        fields.extend(self.email.as_deref());
        fields
    }
}

impl Searchable for Message {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.body.as_str()]
    }
}

/// Status filter of a board list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: ColumnStatus> StatusFilter<S> {
    pub fn allows(&self, status: S) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(only) => *only == status,
        }
    }

    /// Parses a filter dropdown value: `"all"` or a column id
    pub fn parse(value: &str) -> Option<Self> {
        if value == "all" {
            return Some(StatusFilter::All);
        }
        S::parse_column(value).map(StatusFilter::Only)
    }
}

/// Filters `items` by `query` and `filter`, keeping their order
pub fn filter_local<'a, T>(items: &'a [T], query: &str, filter: StatusFilter<T::Status>) -> Vec<&'a T>
where
    T: BoardEntity + Searchable,
{
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| filter.allows(item.status()))
        .filter(|item| needle.is_empty() || item.matches_lowercase(&needle))
        .collect()
}

/// Local search over the task list
pub fn filter_tasks<'a>(store: &'a EntityStore, query: &str, filter: StatusFilter<TaskStatus>) -> Vec<&'a Task> {
    filter_local(store.tasks().as_slice(), query, filter)
}

/// Local search over the contact list
pub fn filter_contacts<'a>(store: &'a EntityStore, query: &str, filter: StatusFilter<ContactStatus>) -> Vec<&'a Contact> {
    filter_local(store.contacts().as_slice(), query, filter)
}

/// Origin of a global search hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchHitKind {
    Task,
    Contact,
    Message,
}

impl SearchHitKind {
    /// View that shows this kind of entity
    pub fn view(&self) -> View {
        match self {
            SearchHitKind::Task => View::Tasks,
            SearchHitKind::Contact => View::Crm,
            SearchHitKind::Message => View::Chat,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            SearchHitKind::Task => EntityKind::Task,
            SearchHitKind::Contact => EntityKind::Contact,
            SearchHitKind::Message => EntityKind::Message,
        }
    }
}

/// One global search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub kind: SearchHitKind,
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
}

impl SearchHit {
    fn task(task: &Task) -> Self {
        Self {
            kind: SearchHitKind::Task,
            id: task.id.clone(),
            title: task.title.clone(),
            subtitle: task.description.clone(),
        }
    }

    fn contact(contact: &Contact) -> Self {
        Self {
            kind: SearchHitKind::Contact,
            id: contact.id.clone(),
            title: contact.name.clone(),
            subtitle: contact.company.clone().or_else(|| contact.email.clone()),
        }
    }

    fn message(message: &Message) -> Self {
        let mut title: String = message.body.chars().take(MESSAGE_TITLE_CHARS).collect();
        if message.body.chars().count() > MESSAGE_TITLE_CHARS {
            title.push_str("...");
        }
        Self {
            kind: SearchHitKind::Message,
            id: message.id.clone(),
            title,
            subtitle: Some("in #general".to_string()),
        }
    }
}

/// Searches tasks, contacts and messages
pub fn global_search(store: &EntityStore, query: &str) -> Vec<SearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    let tasks = store
        .tasks()
        .iter()
        .filter(|t| t.matches_lowercase(&needle))
        .map(SearchHit::task);
    let contacts = store
        .contacts()
        .iter()
        .filter(|c| c.matches_lowercase(&needle))
        .map(SearchHit::contact);
    let messages = store
        .messages()
        .iter()
        .filter(|m| m.matches_lowercase(&needle))
        .map(SearchHit::message);

    tasks.chain(contacts).chain(messages).take(MAX_GLOBAL_RESULTS).collect()
}

/// Navigates to a hit: switches view and, for tasks and contacts, selects
/// the record
///
/// Returns `false` when the record no longer exists; the view still changes.
pub fn open_hit(store: &mut EntityStore, hit: &SearchHit) -> bool {
    store.set_current_view(hit.kind.view());
    match hit.kind {
        SearchHitKind::Task => store.select_task(&hit.id),
        SearchHitKind::Contact => store.select_contact(&hit.id),
        SearchHitKind::Message => store.messages().contains(&hit.id),
    }
}
