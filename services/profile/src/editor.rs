//! Profile editor view-model
//!
//! Holds an editable copy of the authenticated user's profile plus the
//! transient password fields. The UI drives it through explicit setters and
//! calls [`ProfileEditor::save`]; after each mutation the view is marked dirty
//! and the caller re-renders through [`ProfileEditor::render`].
//!
//! A save either applies the whole update and queues the `updated` and dialog
//! events, or fails validation and leaves both the store and the working copy
//! untouched.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::{Dialog, UiEvent};
use crate::models::{EditableUser, ProfileChanges, UserResponse};
use crate::password::{PasswordError, PasswordService};
use crate::repositories::UserStore;
use crate::validation::{
    FieldError, PasswordPolicy, Rule, ValidationErrors, validate_confirmation, validate_email,
    validate_name,
};

/// Field path of the user's name
pub const NAME_FIELD: &str = "user.name";
/// Field path of the user's email
pub const EMAIL_FIELD: &str = "user.email";
/// Field path of the new password
pub const PASSWORD_FIELD: &str = "password";

/// Errors raised by the profile editor
#[derive(Error, Debug)]
pub enum ProfileError {
    /// One or more fields failed validation; nothing was persisted
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The user record does not exist
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The store failed
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Observable editor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    /// No pending errors; reflects persisted data after a save
    Clean,
    /// The last save produced field errors
    Invalid,
}

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub user: EditableUser,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub errors: ValidationErrors,
    pub state: EditorState,
}

/// Profile editor bound to one user
#[derive(Debug, Clone)]
pub struct ProfileEditor {
    user: EditableUser,
    password: Option<String>,
    password_confirmation: Option<String>,
    errors: ValidationErrors,
    events: Vec<UiEvent>,
    policy: PasswordPolicy,
    dirty: bool,
}

impl ProfileEditor {
    /// Load the authenticated user's record into a fresh editor
    pub async fn mount(
        store: &dyn UserStore,
        user_id: Uuid,
        policy: PasswordPolicy,
    ) -> Result<Self, ProfileError> {
        let user = store
            .find_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound(user_id))?;

        Ok(Self {
            user: EditableUser::from(&user),
            password: None,
            password_confirmation: None,
            errors: ValidationErrors::new(),
            events: Vec::new(),
            policy,
            dirty: true,
        })
    }

    pub fn user(&self) -> &EditableUser {
        &self.user
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn password_confirmation(&self) -> Option<&str> {
        self.password_confirmation.as_deref()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn state(&self) -> EditorState {
        if self.errors.is_empty() {
            EditorState::Clean
        } else {
            EditorState::Invalid
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.user.name = name.into();
        self.dirty = true;
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.user.email = email.into();
        self.dirty = true;
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
        self.dirty = true;
    }

    pub fn set_password_confirmation(&mut self, confirmation: Option<String>) {
        self.password_confirmation = confirmation;
        self.dirty = true;
    }

    /// Whether state changed since the last render
    pub fn needs_render(&self) -> bool {
        self.dirty
    }

    /// Snapshot the current state and clear the dirty flag
    pub fn render(&mut self) -> ProfileView {
        self.dirty = false;
        ProfileView {
            user: self.user.clone(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
            errors: self.errors.clone(),
            state: self.state(),
        }
    }

    /// Drain the events queued by successful saves
    pub fn take_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    async fn validate(&self, store: &dyn UserStore) -> Result<ValidationErrors, ProfileError> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_name(&self.user.name) {
            errors.add(NAME_FIELD, e);
        }

        match validate_email(&self.user.email) {
            Ok(()) => {
                if store.email_taken(&self.user.email, Some(self.user.id)).await? {
                    errors.add(
                        EMAIL_FIELD,
                        FieldError::new(Rule::Unique, "The email has already been taken."),
                    );
                }
            }
            Err(e) => errors.add(EMAIL_FIELD, e),
        }

        if let Some(password) = self.new_password() {
            if let Err(e) = self.policy.validate(password) {
                errors.add(PASSWORD_FIELD, e);
            }
            if let Err(e) = validate_confirmation(password, self.password_confirmation.as_deref())
            {
                errors.add(PASSWORD_FIELD, e);
            }
        }

        Ok(errors)
    }

    /// Validate and persist the working copy
    ///
    /// On validation failure the errors are kept on the editor and returned;
    /// nothing is written and no events are queued. On success the public
    /// representation of the persisted record is returned.
    pub async fn save(
        &mut self,
        store: &dyn UserStore,
        passwords: &PasswordService,
    ) -> Result<UserResponse, ProfileError> {
        let errors = self.validate(store).await?;
        if !errors.is_empty() {
            warn!(
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Profile validation failed for user {}: {}", self.user.id, errors
            );
            self.errors = errors.clone();
            self.dirty = true;
            return Err(ProfileError::Validation(errors));
        }

        let password = self
            .new_password()
            .map(|p| passwords.hash(p))
            .transpose()?;
        let password_changed = password.is_some();

        let changes = ProfileChanges {
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            password,
        };

        let user = store
            .update_profile(self.user.id, &changes)
            .await?
            .ok_or(ProfileError::NotFound(self.user.id))?;

        self.user = EditableUser::from(&user);
        self.password = None;
        self.password_confirmation = None;
        self.errors = ValidationErrors::new();
        self.events.push(UiEvent::Updated);
        self.events.push(UiEvent::Dialog(Dialog::task_completed()));
        self.dirty = true;

        info!(
            "Profile saved for user {} (password changed: {})",
            user.id, password_changed
        );
        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DialogType;
    use crate::models::{NewUser, User};
    use crate::repositories::InMemoryUserStore;
    use anyhow::Result;

    struct Fixture {
        store: InMemoryUserStore,
        passwords: PasswordService,
        user: User,
    }

    async fn fixture() -> Result<Fixture> {
        let passwords = PasswordService::new();
        let store = InMemoryUserStore::new(passwords.clone());
        let user = store
            .create(&NewUser {
                name: "Original Name".to_string(),
                email: "original@example.com".to_string(),
                password: "password".to_string(),
            })
            .await?;

        Ok(Fixture {
            store,
            passwords,
            user,
        })
    }

    async fn mount(fx: &Fixture) -> ProfileEditor {
        ProfileEditor::mount(&fx.store, fx.user.id, PasswordPolicy::default())
            .await
            .expect("mount failed")
    }

    async fn stored(fx: &Fixture) -> User {
        fx.store.find_by_id(fx.user.id).await.unwrap().unwrap()
    }

    fn validation_errors(result: Result<UserResponse, ProfileError>) -> ValidationErrors {
        match result {
            Err(ProfileError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    /// Store whose writes fail as if a concurrent insert took the email
    struct ConflictingStore {
        inner: InMemoryUserStore,
    }

    #[async_trait::async_trait]
    impl UserStore for ConflictingStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn email_taken(&self, _email: &str, _except: Option<Uuid>) -> Result<bool> {
            Ok(false)
        }

        async fn create(&self, new_user: &NewUser) -> Result<User> {
            self.inner.create(new_user).await
        }

        async fn update_profile(&self, _id: Uuid, _changes: &ProfileChanges) -> Result<Option<User>> {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_lower_key\"")
        }
    }

    #[tokio::test]
    async fn test_mounts_with_authenticated_user_data() -> Result<()> {
        let fx = fixture().await?;
        let editor = mount(&fx).await;

        assert_eq!(editor.user().id, fx.user.id);
        assert_eq!(editor.user().name, fx.user.name);
        assert_eq!(editor.user().email, fx.user.email);
        assert_eq!(editor.password(), None);
        assert_eq!(editor.password_confirmation(), None);
        assert_eq!(editor.state(), EditorState::Clean);
        Ok(())
    }

    #[tokio::test]
    async fn test_mount_unknown_user() -> Result<()> {
        let fx = fixture().await?;
        let result = ProfileEditor::mount(&fx.store, Uuid::new_v4(), PasswordPolicy::default()).await;

        assert!(matches!(result, Err(ProfileError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_validates_required_name() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("");

        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(NAME_FIELD, Rule::Required));
        assert_eq!(editor.state(), EditorState::Invalid);
        assert!(editor.take_events().is_empty());
        assert_eq!(stored(&fx).await.name, "Original Name");
        Ok(())
    }

    #[tokio::test]
    async fn test_validates_maximum_length_of_name() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("a".repeat(256));

        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(NAME_FIELD, Rule::Max));
        assert_eq!(stored(&fx).await.name, "Original Name");
        Ok(())
    }

    #[tokio::test]
    async fn test_saves_any_valid_name() -> Result<()> {
        let fx = fixture().await?;
        let names = [
            "a".to_string(),
            "Updated Name".to_string(),
            "José Ñúñez".to_string(),
            "a".repeat(255),
        ];

        for name in names {
            let mut editor = mount(&fx).await;
            editor.set_name(name.clone());
            editor.save(&fx.store, &fx.passwords).await?;

            assert_eq!(stored(&fx).await.name, name);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_validates_password_confirmation() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("Changed But Not Saved");
        editor.set_password(Some("newpassword".to_string()));
        editor.set_password_confirmation(Some("wrongconfirmation".to_string()));

        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(PASSWORD_FIELD, Rule::Confirmed));

        let user = stored(&fx).await;
        assert_eq!(user.name, "Original Name");
        assert_eq!(user.password, fx.user.password);
        // Input is kept so the user can correct it
        assert_eq!(editor.password(), Some("newpassword"));
        Ok(())
    }

    #[tokio::test]
    async fn test_validates_password_strength() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_password(Some("short".to_string()));
        editor.set_password_confirmation(Some("short".to_string()));

        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(PASSWORD_FIELD, Rule::Min));
        assert_eq!(stored(&fx).await.password, fx.user.password);
        Ok(())
    }

    #[tokio::test]
    async fn test_validates_email_format_and_uniqueness() -> Result<()> {
        let fx = fixture().await?;
        fx.store
            .create(&NewUser {
                name: "Someone Else".to_string(),
                email: "taken@example.com".to_string(),
                password: "password".to_string(),
            })
            .await?;

        let mut editor = mount(&fx).await;
        editor.set_email("not-an-email");
        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(EMAIL_FIELD, Rule::Email));

        editor.set_email("taken@example.com");
        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(EMAIL_FIELD, Rule::Unique));

        editor.set_email("TAKEN@Example.com");
        let errors = validation_errors(editor.save(&fx.store, &fx.passwords).await);
        assert!(errors.has(EMAIL_FIELD, Rule::Unique));

        editor.set_email("Original@Example.com");
        editor.save(&fx.store, &fx.passwords).await?;
        assert_eq!(editor.user().email, "Original@Example.com");

        editor.set_email("original@example.com");
        editor.save(&fx.store, &fx.passwords).await?;
        assert_eq!(editor.state(), EditorState::Clean);
        Ok(())
    }

    #[tokio::test]
    async fn test_allows_updating_name_without_changing_password() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("Updated Name");

        editor.save(&fx.store, &fx.passwords).await?;

        let user = stored(&fx).await;
        assert_eq!(user.name, "Updated Name");
        assert_eq!(user.password, fx.user.password);
        assert!(editor.errors().is_empty());
        assert!(editor.take_events().contains(&UiEvent::Updated));
        Ok(())
    }

    #[tokio::test]
    async fn test_updates_password_when_provided() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_password(Some("newpassword".to_string()));
        editor.set_password_confirmation(Some("newpassword".to_string()));

        editor.save(&fx.store, &fx.passwords).await?;

        let user = stored(&fx).await;
        assert_ne!(user.password, fx.user.password);
        assert_ne!(user.password, "newpassword");
        assert!(fx.passwords.verify("newpassword", &user.password)?);
        assert!(!fx.passwords.verify("password", &user.password)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_does_not_update_password_when_null_or_empty() -> Result<()> {
        let fx = fixture().await?;

        let mut editor = mount(&fx).await;
        editor.set_password(None);
        editor.save(&fx.store, &fx.passwords).await?;
        assert_eq!(stored(&fx).await.password, fx.user.password);

        editor.set_password(Some(String::new()));
        editor.set_password_confirmation(Some("ignored when password is empty".to_string()));
        editor.save(&fx.store, &fx.passwords).await?;
        assert_eq!(stored(&fx).await.password, fx.user.password);
        assert_eq!(editor.password_confirmation(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatches_success_alert_after_saving() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("Updated Again");

        editor.save(&fx.store, &fx.passwords).await?;

        let events = editor.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], UiEvent::Updated);
        match &events[1] {
            UiEvent::Dialog(dialog) => {
                assert_eq!(dialog.kind, DialogType::Success);
                assert_eq!(dialog.title, "Done!");
                assert_eq!(dialog.description, "Task completed successfully.");
            }
            other => panic!("expected dialog event, got {:?}", other),
        }
        assert!(editor.take_events().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_resets_password_fields_after_saving() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_password(Some("newpassword".to_string()));
        editor.set_password_confirmation(Some("newpassword".to_string()));

        editor.save(&fx.store, &fx.passwords).await?;

        assert_eq!(editor.password(), None);
        assert_eq!(editor.password_confirmation(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_propagates_without_events() -> Result<()> {
        let fx = fixture().await?;
        let store = ConflictingStore {
            inner: fx.store.clone(),
        };
        let mut editor = ProfileEditor::mount(&store, fx.user.id, PasswordPolicy::default()).await?;
        editor.set_name("Racing Update");
        editor.set_password(Some("newpassword".to_string()));
        editor.set_password_confirmation(Some("newpassword".to_string()));

        let result = editor.save(&store, &fx.passwords).await;
        assert!(matches!(result, Err(ProfileError::Storage(_))));
        assert!(editor.take_events().is_empty());
        assert_eq!(editor.password(), Some("newpassword"));

        let user = stored(&fx).await;
        assert_eq!(user.name, "Original Name");
        assert_eq!(user.password, fx.user.password);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_save_is_idempotent() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        editor.set_name("Stable Name");

        editor.save(&fx.store, &fx.passwords).await?;
        let first_events = editor.take_events();
        let first = stored(&fx).await;

        editor.save(&fx.store, &fx.passwords).await?;
        let second_events = editor.take_events();
        let second = stored(&fx).await;

        assert_eq!(first_events, second_events);
        assert_eq!(first.name, second.name);
        assert_eq!(first.email, second.email);
        assert_eq!(first.password, second.password);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_then_valid_save_returns_to_clean() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;

        editor.set_name("");
        assert!(editor.save(&fx.store, &fx.passwords).await.is_err());
        assert_eq!(editor.render().state, EditorState::Invalid);

        editor.set_name("Fixed Name");
        editor.save(&fx.store, &fx.passwords).await?;

        let view = editor.render();
        assert_eq!(view.state, EditorState::Clean);
        assert!(view.errors.is_empty());
        assert_eq!(view.user.name, "Fixed Name");
        Ok(())
    }

    #[tokio::test]
    async fn test_setters_mark_view_dirty() -> Result<()> {
        let fx = fixture().await?;
        let mut editor = mount(&fx).await;
        assert!(editor.needs_render());

        editor.render();
        assert!(!editor.needs_render());

        editor.set_email("new@example.com");
        assert!(editor.needs_render());

        let view = editor.render();
        assert_eq!(view.user.email, "new@example.com");
        assert!(!editor.needs_render());
        Ok(())
    }
}
