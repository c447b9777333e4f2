/// Form validation and save flows
///
/// The store accepts anything; validation happens here, before any store
/// call. Each form is a plain struct deriving [`validator::Validate`] and
/// implementing [`Form`], which turns validator's error map into an ordered
/// list of [`FieldError`]s.
///
/// # Example
///
/// ```
/// use pulsehq_shared::board::forms::{save_task, Form, TaskForm};
/// use pulsehq_shared::store::EntityStore;
///
/// let mut store = EntityStore::new();
///
/// let blank = TaskForm::default();
/// assert!(blank.check().is_err());
///
/// let form = TaskForm { title: "Ship release".to_string(), ..Default::default() };
/// let id = save_task(&mut store, None, &form).unwrap();
/// assert_eq!(store.tasks().len(), 1);
/// # let _ = id;
/// ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::models::{
    contact::{Contact, ContactPatch, ContactStatus},
    generate_id,
    task::{Task, TaskPatch, TaskPriority, TaskStatus},
};
use crate::store::{EntityKind, EntityStore};

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// One failed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Message shown next to the field
    pub message: String,
}

/// Error type for form submission
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// One or more fields are invalid
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// The record being edited no longer exists
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },
}

impl FormError {
    /// Message of the first failed field, in form order
    pub fn first_message(&self) -> Option<&str> {
        match self {
            FormError::Validation(errors) => errors.first().map(|e| e.message.as_str()),
            FormError::NotFound { .. } => None,
        }
    }

    /// Message for `field`, if it failed
    pub fn message_for(&self, field: &str) -> Option<&str> {
        match self {
            FormError::Validation(errors) => errors
                .iter()
                .find(|e| e.field == field)
                .map(|e| e.message.as_str()),
            FormError::NotFound { .. } => None,
        }
    }
}

/// A validated form
pub trait Form: Validate {
    /// Field names in display order; errors are reported in this order
    const FIELDS: &'static [&'static str];

    /// Validates the form
    ///
    /// # Errors
    ///
    /// `FormError::Validation` listing every failed field
    fn check(&self) -> Result<(), FormError> {
        self.validate().map_err(|e| into_form_error(e, Self::FIELDS))
    }
}

fn into_form_error(errors: ValidationErrors, order: &[&str]) -> FormError {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string()),
            })
        })
        .collect();

    let rank = |field: &str| order.iter().position(|f| *f == field).unwrap_or(order.len());
    details.sort_by(|a, b| rank(&a.field).cmp(&rank(&b.field)).then_with(|| a.field.cmp(&b.field)));

    FormError::Validation(details)
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn present(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", message));
    }
    Ok(())
}

fn task_title(value: &str) -> Result<(), ValidationError> {
    present(value, "Task title is required")
}

fn contact_name(value: &str) -> Result<(), ValidationError> {
    present(value, "Name is required")
}

fn full_name(value: &str) -> Result<(), ValidationError> {
    present(value, "Full name is required")
}

fn body(value: &str) -> Result<(), ValidationError> {
    present(value, "Message cannot be empty")
}

fn sign_in_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("required", "Password is required"));
    }
    Ok(())
}

fn new_password(value: &str) -> Result<(), ValidationError> {
    sign_in_password(value)?;
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(error("length", "Password must be at least 6 characters long"));
    }
    Ok(())
}

fn required_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", "Email is required"));
    }
    optional_email(value)
}

fn optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if !value.is_empty() && !value.validate_email() {
        return Err(error("email", "Please enter a valid email address"));
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// ----------------------------------------------------------------------
// Task and contact forms
// ----------------------------------------------------------------------

/// Task create/edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaskForm {
    #[validate(custom(function = "task_title"))]
    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Selected team member; `None` for unassigned
    pub assignee_id: Option<String>,

    pub due_date: Option<NaiveDate>,
}

impl Form for TaskForm {
    const FIELDS: &'static [&'static str] = &["title", "description", "status", "priority", "assignee_id", "due_date"];
}

impl TaskForm {
    /// Form prefilled from an existing task
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id.clone(),
            due_date: task.due_date,
        }
    }
}

/// Contact create/edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(custom(function = "contact_name"))]
    pub name: String,

    pub company: String,

    #[validate(custom(function = "optional_email"))]
    pub email: String,

    pub phone: String,

    pub website: String,

    /// Display name of the owning team member
    pub assigned_to: String,

    pub status: ContactStatus,
}

impl Form for ContactForm {
    const FIELDS: &'static [&'static str] = &["name", "company", "email", "phone", "website", "assigned_to", "status"];
}

impl ContactForm {
    /// Form prefilled from an existing contact
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            company: contact.company.clone().unwrap_or_default(),
            email: contact.email.clone().unwrap_or_default(),
            phone: contact.phone.clone().unwrap_or_default(),
            website: contact.website.clone().unwrap_or_default(),
            assigned_to: contact.assigned_to.clone().unwrap_or_default(),
            status: contact.status,
        }
    }
}

/// Creates (`id == None`) or updates a task from a submitted form
///
/// New tasks get a fresh id and the form's status (`todo` by default). The
/// assignee name is resolved from the team list; an unknown assignee id is
/// kept with no name.
///
/// # Errors
///
/// - `FormError::Validation` if the form is invalid (store untouched)
/// - `FormError::NotFound` if `id` names a task that no longer exists
pub fn save_task(store: &mut EntityStore, id: Option<&str>, form: &TaskForm) -> Result<String, FormError> {
    form.check()?;

    let assignee_id = form.assignee_id.as_deref().and_then(non_empty);
    let assignee_name = assignee_id
        .as_deref()
        .and_then(|id| store.users().get(id))
        .map(|user| user.name.clone());

    match id {
        Some(id) => {
            let patch = TaskPatch {
                title: Some(form.title.trim().to_string()),
                description: Some(non_empty(&form.description)),
                status: Some(form.status),
                priority: Some(form.priority),
                assignee_id: Some(assignee_id),
                assignee_name: Some(assignee_name),
                due_date: Some(form.due_date),
            };
            if !store.update(id, patch) {
                return Err(FormError::NotFound {
                    kind: EntityKind::Task,
                    id: id.to_string(),
                });
            }
            Ok(id.to_string())
        }
        None => {
            let task = Task {
                id: generate_id(),
                title: form.title.trim().to_string(),
                description: non_empty(&form.description),
                status: form.status,
                priority: form.priority,
                assignee_id,
                assignee_name,
                due_date: form.due_date,
                created_at: Utc::now(),
            };
            let id = task.id.clone();
            store.add(task);
            Ok(id)
        }
    }
}

/// Creates (`id == None`) or updates a contact from a submitted form
///
/// New contacts start in the form's stage (`lead` by default).
pub fn save_contact(store: &mut EntityStore, id: Option<&str>, form: &ContactForm) -> Result<String, FormError> {
    form.check()?;

    match id {
        Some(id) => {
            let patch = ContactPatch {
                name: Some(form.name.trim().to_string()),
                company: Some(non_empty(&form.company)),
                email: Some(non_empty(&form.email)),
                phone: Some(non_empty(&form.phone)),
                website: Some(non_empty(&form.website)),
                assigned_to: Some(non_empty(&form.assigned_to)),
                status: Some(form.status),
            };
            if !store.update(id, patch) {
                return Err(FormError::NotFound {
                    kind: EntityKind::Contact,
                    id: id.to_string(),
                });
            }
            Ok(id.to_string())
        }
        None => {
            let contact = Contact {
                company: non_empty(&form.company),
                email: non_empty(&form.email),
                phone: non_empty(&form.phone),
                website: non_empty(&form.website),
                assigned_to: non_empty(&form.assigned_to),
                status: form.status,
                ..Contact::new(generate_id(), form.name.trim())
            };
            let id = contact.id.clone();
            store.add(contact);
            Ok(id)
        }
    }
}

/// Deletes a task once the user confirmed; returns whether it was deleted
pub fn delete_task(store: &mut EntityStore, id: &str, confirmed: bool) -> bool {
    if !confirmed {
        tracing::debug!(id, "Task delete not confirmed");
        return false;
    }
    store.delete::<Task>(id)
}

/// Deletes a contact once the user confirmed; returns whether it was deleted
pub fn delete_contact(store: &mut EntityStore, id: &str, confirmed: bool) -> bool {
    if !confirmed {
        tracing::debug!(id, "Contact delete not confirmed");
        return false;
    }
    store.delete::<Contact>(id)
}

// ----------------------------------------------------------------------
// Auth forms
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SignInForm {
    #[validate(custom(function = "required_email"))]
    pub email: String,

    #[validate(custom(function = "sign_in_password"))]
    pub password: String,
}

impl Form for SignInForm {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(custom(function = "full_name"))]
    pub name: String,

    #[validate(custom(function = "required_email"))]
    pub email: String,

    #[validate(custom(function = "new_password"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

impl Form for SignUpForm {
    const FIELDS: &'static [&'static str] = &["email", "password", "name", "confirm_password"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PasswordResetForm {
    #[validate(custom(function = "required_email"))]
    pub email: String,
}

impl Form for PasswordResetForm {
    const FIELDS: &'static [&'static str] = &["email"];
}

/// Chat message or timeline note body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BodyForm {
    #[validate(custom(function = "body"))]
    pub body: String,
}

impl Form for BodyForm {
    const FIELDS: &'static [&'static str] = &["body"];
}

impl BodyForm {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Validated, trimmed body
    pub fn into_body(self) -> Result<String, FormError> {
        self.check()?;
        Ok(self.body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{User, UserRole};

    #[test]
    fn test_blank_task_title_rejected() {
        let mut store = EntityStore::new();
        let form = TaskForm {
            title: "   ".to_string(),
            ..Default::default()
        };

        let err = save_task(&mut store, None, &form).unwrap_err();

        assert_eq!(err.message_for("title"), Some("Task title is required"));
        assert!(store.tasks().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_create_task() {
        let mut store = EntityStore::new();
        store.replace_users(vec![User::new("u2", "Jane Smith", "jane@x.com", UserRole::Admin)]);
        let form = TaskForm {
            title: "  Ship release ".to_string(),
            description: " ".to_string(),
            assignee_id: Some("u2".to_string()),
            ..Default::default()
        };

        let id = save_task(&mut store, None, &form).unwrap();

        let task = store.get::<Task>(&id).unwrap();
        assert_eq!(task.title, "Ship release");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.description, None);
        assert_eq!(task.assignee_name.as_deref(), Some("Jane Smith"));
    }

    #[test]
    fn test_edit_task_clears_assignee() {
        let mut store = EntityStore::new();
        store.add(Task {
            assignee_id: Some("u2".to_string()),
            assignee_name: Some("Jane Smith".to_string()),
            ..Task::new("1", "Ship release")
        });

        let mut form = TaskForm::from_task(store.get::<Task>("1").unwrap());
        form.assignee_id = None;
        form.priority = TaskPriority::Urgent;
        save_task(&mut store, Some("1"), &form).unwrap();

        let task = store.get::<Task>("1").unwrap();
        assert!(task.is_unassigned());
        assert_eq!(task.assignee_name, None);
        assert_eq!(task.priority, TaskPriority::Urgent);
    }

    #[test]
    fn test_edit_missing_task() {
        let mut store = EntityStore::new();
        let form = TaskForm {
            title: "Ship release".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            save_task(&mut store, Some("gone"), &form),
            Err(FormError::NotFound { kind: EntityKind::Task, .. })
        ));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_contact_form() {
        let mut store = EntityStore::new();
        let bad = ContactForm {
            name: "Acme Corp".to_string(),
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        let err = save_contact(&mut store, None, &bad).unwrap_err();
        assert_eq!(err.first_message(), Some("Please enter a valid email address"));

        let good = ContactForm {
            email: "contact@acme.com".to_string(),
            ..bad
        };
        let id = save_contact(&mut store, None, &good).unwrap();
        let contact = store.get::<Contact>(&id).unwrap();
        assert_eq!(contact.status, ContactStatus::Lead);
        assert_eq!(contact.company, None);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut store = EntityStore::new();
        store.add(Task::new("1", "Ship release"));
        store.add(Contact::new("1", "Acme Corp"));

        assert!(!delete_task(&mut store, "1", false));
        assert_eq!(store.tasks().len(), 1);
        assert!(delete_task(&mut store, "1", true));
        assert!(store.tasks().is_empty());
        assert_eq!(store.contacts().len(), 1);

        assert!(delete_contact(&mut store, "1", true));
        assert!(store.contacts().is_empty());
    }

    #[test]
    fn test_sign_in_form_messages() {
        let form = SignInForm::default();
        let err = form.check().unwrap_err();
        assert_eq!(err.first_message(), Some("Email is required"));
        assert_eq!(err.message_for("password"), Some("Password is required"));

        let form = SignInForm {
            email: "alice@".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(form.check().unwrap_err().first_message(), Some("Please enter a valid email address"));
    }

    #[test]
    fn test_sign_up_form_messages() {
        let mut form = SignUpForm {
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "12345".to_string(),
            confirm_password: "12345".to_string(),
        };
        assert_eq!(
            form.check().unwrap_err().first_message(),
            Some("Password must be at least 6 characters long")
        );

        form.password = "123456".to_string();
        assert_eq!(form.check().unwrap_err().first_message(), Some("Passwords do not match"));

        form.confirm_password = "123456".to_string();
        form.name = String::new();
        assert_eq!(form.check().unwrap_err().first_message(), Some("Full name is required"));

        form.name = "Alice".to_string();
        assert!(form.check().is_ok());
    }

    #[test]
    fn test_body_form() {
        assert_eq!(BodyForm::new("  hi  ").into_body(), Ok("hi".to_string()));
        assert_eq!(
            BodyForm::new("\n ").into_body().unwrap_err().first_message(),
            Some("Message cannot be empty")
        );
    }
}
