use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    /// Stores a new user. The name check and the insert happen under one
    /// write lock, so two users can never share a name.
    #[instrument(skip(self, user), fields(user_id = %user.id, name = %user.name))]
    async fn insert_user(&self, user: User) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage.values().any(|u| u.name == user.name) {
            debug!(name = %user.name, "User name already taken");
            return Err(DomainError::Validation(format!("User {} already exists", user.name)).into());
        }
        debug!(
            user_id = %user.id,
            name = %user.name,
            is_lecturer = user.is_lecturer,
            "User saved to memory storage"
        );
        storage.insert(user.id.clone(), user);
        Ok(())
    }

    #[instrument(skip(self), fields(name = name))]
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        trace!("Acquiring read lock for user storage");
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.name == name).cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, name = %u.name, "User found in storage"),
            None => trace!(name = name, "User not found in storage"),
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        trace!("Acquiring read lock for user storage");
        let storage = self.storage.read().await;
        let user = storage.get(id).cloned();
        if user.is_none() {
            trace!(user_id = id, "User not found in storage");
        }
        Ok(user)
    }
}
