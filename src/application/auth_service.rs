use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, LoginRequest, User};
use crate::infrastructure::security::{generate_token, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    jwt_secret: String,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
        }
    }

    #[instrument(skip(self, req), fields(name = %req.username, is_lecturer = req.is_lecturer))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.username,
            is_lecturer: req.is_lecturer,
            password_hash,
        };

        debug!(user_id = %user.id, "Saving user to repository");
        self.user_repository
            .insert_user(user.clone())
            .await
            .inspect_err(|e| warn!(name = %user.name, error = %e, "User already exists"))?;

        info!(
            user_id = %user.id,
            name = %user.name,
            is_lecturer = user.is_lecturer,
            "User registered successfully"
        );

        Ok(user)
    }

    /// Checks the credentials and issues a session token for the user.
    #[instrument(skip(self, req), fields(name = %req.username))]
    pub async fn login(&self, req: LoginRequest) -> Result<(User, String)> {
        trace!("Starting login");

        let user = self
            .user_repository
            .find_user_by_name(&req.username)
            .await?
            .ok_or_else(|| {
                warn!(name = %req.username, "User not found during login");
                DomainError::Unauthorized("Invalid username or password".to_string())
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::Unauthorized("Invalid username or password".to_string()).into());
        }

        let token = generate_token(&user, &self.jwt_secret).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e))
        })?;

        info!(user_id = %user.id, name = %user.name, "Login successful");

        Ok((user, token))
    }

    #[instrument(skip(self))]
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.user_repository.find_user_by_id(id).await
    }
}
