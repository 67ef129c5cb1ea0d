//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::user::{OnConflict, User, UserId, UserPatch, UserRepository};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    /// Email -> user ID lookup
    email_index: HashMap<String, UserId>,
}

/// In-memory implementation of UserRepository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let mut tables = Tables::default();

        for user in users {
            tables.email_index.insert(user.email().to_string(), *user.id());
            tables.users.insert(*user.id(), user);
        }

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id_or_email(&self, id_or_email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;

        let by_email = tables
            .email_index
            .get(id_or_email)
            .and_then(|id| tables.users.get(id));

        if let Some(user) = by_email {
            return Ok(Some(user.clone()));
        }

        // Only a well-formed id can match the id column
        let by_id = UserId::parse(id_or_email)
            .ok()
            .and_then(|id| tables.users.get(&id));

        Ok(by_id.cloned())
    }

    async fn upsert_by_email(&self, patch: &UserPatch) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        let Tables { users, email_index } = &mut *tables;

        if let Some(id) = email_index.get(patch.email()) {
            if patch.on_conflict() == OnConflict::Reject {
                return Err(DomainError::conflict(format!(
                    "User '{}' already exists",
                    patch.email()
                )));
            }

            let user = users.get_mut(id).ok_or_else(|| {
                DomainError::storage(format!("Email index points at missing user '{}'", id))
            })?;
            user.apply_patch(patch);
            return Ok(user.clone());
        }

        let mut user = User::from_patch(UserId::generate(), patch);
        user.apply_patch(patch);

        email_index.insert(user.email().to_string(), *user.id());
        users.insert(*user.id(), user.clone());

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;

        match tables.users.remove(id) {
            Some(user) => {
                tables.email_index.remove(user.email());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{AuthProvider, Role};

    #[tokio::test]
    async fn test_upsert_creates_with_defaults() {
        let repo = InMemoryUserRepository::new();

        let user = repo
            .upsert_by_email(&UserPatch::new("alice@x.com").with_password_hash("h1"))
            .await
            .unwrap();

        assert_eq!(user.email(), "alice@x.com");
        assert_eq!(user.password_hash(), Some("h1"));
        assert!(user.has_role(Role::User));
        assert!(!user.is_blocked());
        assert_eq!(user.provider(), AuthProvider::Local);
    }

    #[tokio::test]
    async fn test_upsert_updates_only_supplied_fields() {
        let repo = InMemoryUserRepository::new();
        let created = repo
            .upsert_by_email(&UserPatch::new("alice@x.com").with_password_hash("h1"))
            .await
            .unwrap();

        let updated = repo
            .upsert_by_email(&UserPatch::new("alice@x.com").with_provider(AuthProvider::Google))
            .await
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.password_hash(), Some("h1"));
        assert_eq!(updated.provider(), AuthProvider::Google);
    }

    #[tokio::test]
    async fn test_insert_only_rejects_existing() {
        let repo = InMemoryUserRepository::new();
        repo.upsert_by_email(&UserPatch::new("alice@x.com").with_password_hash("h1"))
            .await
            .unwrap();

        let result = repo
            .upsert_by_email(
                &UserPatch::new("alice@x.com")
                    .with_password_hash("h2")
                    .insert_only(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));

        let stored = repo.find_by_id_or_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash(), Some("h1"));
    }

    #[tokio::test]
    async fn test_find_by_id_or_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .upsert_by_email(&UserPatch::new("bob@x.com"))
            .await
            .unwrap();

        let by_id = repo.find_by_id_or_email(&user.id().to_string()).await.unwrap();
        let by_email = repo.find_by_id_or_email("bob@x.com").await.unwrap();

        assert_eq!(by_id.as_ref(), Some(&user));
        assert_eq!(by_email.as_ref(), Some(&user));
        assert!(repo.find_by_id_or_email("nobody@x.com").await.unwrap().is_none());
        assert!(repo.find_by_id_or_email("Bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .upsert_by_email(&UserPatch::new("carol@x.com"))
            .await
            .unwrap();

        assert!(repo.delete(user.id()).await.unwrap());
        assert!(!repo.delete(user.id()).await.unwrap());
        assert!(repo.find_by_id_or_email("carol@x.com").await.unwrap().is_none());

        // The email is free again
        let again = repo
            .upsert_by_email(&UserPatch::new("carol@x.com").insert_only())
            .await
            .unwrap();
        assert_ne!(again.id(), user.id());
    }

    #[tokio::test]
    async fn test_with_users() {
        let user = User::new(UserId::generate(), "dave@x.com");
        let repo = InMemoryUserRepository::with_users(vec![user.clone()]);

        let found = repo.find_by_id_or_email("dave@x.com").await.unwrap();
        assert_eq!(found, Some(user));
    }
}
