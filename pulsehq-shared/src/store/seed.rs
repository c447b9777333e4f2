/// Demo workspace loaded after sign-in
///
/// Replaces tasks, contacts, messages and team members with a small fixed
/// data set so a fresh account has something on every board.

use chrono::{NaiveDate, Utc};

use super::{Collection, EntityStore};
use crate::models::{
    contact::{Contact, ContactStatus},
    message::Message,
    task::{Task, TaskPriority, TaskStatus},
    user::{User, UserRole},
};

fn team() -> Vec<User> {
    vec![
        User::new("1", "John Doe", "john@company.com", UserRole::Owner),
        User::new("2", "Jane Smith", "jane@company.com", UserRole::Admin),
        User::new("3", "Bob Johnson", "bob@company.com", UserRole::Member),
    ]
}

fn task(
    id: &str,
    title: &str,
    description: &str,
    status: TaskStatus,
    priority: TaskPriority,
    assignee: &User,
    due: (i32, u32, u32),
) -> Task {
    Task {
        description: Some(description.to_string()),
        status,
        priority,
        assignee_id: Some(assignee.id.clone()),
        assignee_name: Some(assignee.name.clone()),
        due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2),
        ..Task::new(id, title)
    }
}

impl EntityStore {
    /// Loads the demo workspace, replacing the persisted collections
    pub fn seed_sample_data(&mut self) {
        let team = team();
        let (john, jane, bob) = (&team[0], &team[1], &team[2]);

        let tasks = vec![
            task(
                "1",
                "Design landing page",
                "Create mockups for new product page",
                TaskStatus::Todo,
                TaskPriority::High,
                john,
                (2024, 1, 20),
            ),
            task(
                "2",
                "Client meeting prep",
                "Prepare slides for quarterly review",
                TaskStatus::Doing,
                TaskPriority::Medium,
                jane,
                (2024, 1, 18),
            ),
            task(
                "3",
                "Update documentation",
                "Refresh API documentation",
                TaskStatus::Done,
                TaskPriority::Low,
                bob,
                (2024, 1, 15),
            ),
        ];

        let contacts = vec![
            Contact {
                email: Some("contact@acme.com".to_string()),
                phone: Some("+1 (555) 123-4567".to_string()),
                company: Some("Acme Corporation".to_string()),
                status: ContactStatus::Client,
                assigned_to: Some(john.name.clone()),
                ..Contact::new("1", "Acme Corp")
            },
            Contact {
                email: Some("jane@techstart.com".to_string()),
                phone: Some("+1 (555) 987-6543".to_string()),
                company: Some("Tech Startup".to_string()),
                status: ContactStatus::Lead,
                assigned_to: Some(jane.name.clone()),
                ..Contact::new("2", "Jane Wilson")
            },
        ];

        let now = Utc::now();
        let messages = vec![
            Message {
                created_at: now,
                ..Message::new("1", john.id.clone(), "Great work on the project everyone! 🎉")
            },
            Message {
                created_at: now,
                ..Message::new("2", jane.id.clone(), "Thanks! Ready for the next phase.")
            },
        ];

        self.tasks = Collection::from_vec(tasks);
        self.contacts = Collection::from_vec(contacts);
        self.messages = Collection::from_vec(messages);
        self.users = Collection::from_vec(team);
        self.ui.select(None);
        self.bump();

        tracing::debug!("Loaded sample workspace data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_every_board() {
        let mut store = EntityStore::new();
        store.seed_sample_data();

        assert_eq!(store.tasks().len(), 3);
        assert_eq!(store.contacts().len(), 2);
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.users().len(), 3);

        for status in TaskStatus::ALL {
            assert_eq!(store.tasks().iter().filter(|t| t.status == status).count(), 1);
        }
    }

    #[test]
    fn test_seed_clears_selection() {
        let mut store = EntityStore::new();
        store.add(Task::new("x", "Old"));
        store.select_task("x");

        store.seed_sample_data();

        assert!(store.selected_task().is_none());
        assert!(!store.inspector_open());
        assert!(store.get::<Task>("x").is_none());
    }
}
