use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::PrincipalRepository;

/// In-memory credential store for tests and local development.
///
/// Enforces the same username/email uniqueness the Postgres store gets
/// from its constraints.
#[derive(Default)]
pub struct InMemoryPrincipalRepository {
    principals: RwLock<HashMap<Uuid, Principal>>,
}

impl InMemoryPrincipalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Principal>> {
        self.principals.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Principal>> {
        self.principals.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn create(&self, principal: Principal) -> Result<Principal, AuthError> {
        let mut principals = self.write();

        if principals
            .values()
            .any(|p| p.username == principal.username)
        {
            return Err(AuthError::DuplicateUsername(
                principal.username.as_str().to_string(),
            ));
        }
        if principals.values().any(|p| p.email == principal.email) {
            return Err(AuthError::DuplicateEmail(
                principal.email.as_str().to_string(),
            ));
        }

        principals.insert(principal.id.0, principal.clone());

        Ok(principal)
    }

    async fn find_by_id(&self, id: &PrincipalId) -> Result<Option<Principal>, AuthError> {
        Ok(self.read().get(&id.0).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<Principal>, AuthError> {
        Ok(self
            .read()
            .values()
            .find(|p| p.username == *username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self
            .read()
            .values()
            .find(|p| p.email.as_str() == email)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self
            .read()
            .values()
            .any(|p| p.username.as_str() == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.read().values().any(|p| p.email.as_str() == email))
    }

    async fn update(&self, principal: Principal) -> Result<Principal, AuthError> {
        let mut principals = self.write();

        if !principals.contains_key(&principal.id.0) {
            return Err(AuthError::PrincipalNotFound(principal.id.to_string()));
        }

        principals.insert(principal.id.0, principal.clone());

        Ok(principal)
    }

    async fn list_all(&self) -> Result<Vec<Principal>, AuthError> {
        let mut all: Vec<Principal> = self.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::models::EmailAddress;

    fn principal(username: &str, email: &str) -> Principal {
        Principal::new(
            Username::new(username.to_string()).unwrap(),
            EmailAddress::new(email.to_string()).unwrap(),
            "hash".to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repository = InMemoryPrincipalRepository::new();

        let created = repository
            .create(principal("alice", "alice@example.com"))
            .await
            .unwrap();

        let by_id = repository.find_by_id(&created.id).await.unwrap();
        assert_eq!(by_id.unwrap().username, created.username);

        let by_username = repository
            .find_by_username(&created.username)
            .await
            .unwrap();
        assert_eq!(by_username.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let repository = InMemoryPrincipalRepository::new();

        repository
            .create(principal("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = repository
            .create(principal("alice", "other@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repository = InMemoryPrincipalRepository::new();

        repository
            .create(principal("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = repository.create(principal("bob", "alice@example.com")).await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_update_missing_principal_is_not_found() {
        let repository = InMemoryPrincipalRepository::new();

        let result = repository
            .update(principal("ghost", "ghost@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::PrincipalNotFound(_))));
    }
}
