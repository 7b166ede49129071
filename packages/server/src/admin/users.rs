use sea_orm::*;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::entity::admin_user;
use crate::utils::hash;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, thiserror::Error)]
pub enum AdminUserError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("An admin with email address '{0}' already exists")]
    AlreadyExists(String),
    #[error("No admin with email address '{0}'")]
    NotFound(String),
    #[error("Password hash error: {0}")]
    Hash(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Lowercased, trimmed form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fresh token subject: SHA-256 over the email address and 32 random bytes.
pub fn generate_public_id(email: &str) -> String {
    let salt: [u8; 32] = rand::random();
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}

fn validate_email(email: &str) -> Result<(), AdminUserError> {
    let invalid = || AdminUserError::InvalidEmail(email.to_string());
    if email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AdminUserError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminUserError::PasswordTooShort);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AdminUserError> {
    hash::hash_password(password).map_err(|e| AdminUserError::Hash(e.to_string()))
}

/// Admin account operations keyed by email address.
pub struct AdminUsers<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AdminUsers<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find(&self, email: &str) -> Result<admin_user::Model, AdminUserError> {
        let email = normalize_email(email);
        admin_user::Entity::find()
            .filter(admin_user::Column::EmailAddress.eq(&email))
            .one(self.db)
            .await?
            .ok_or(AdminUserError::NotFound(email))
    }

    /// Create an active admin.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
    ) -> Result<admin_user::Model, AdminUserError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let now = chrono::Utc::now();
        let user = admin_user::ActiveModel {
            public_id: Set(generate_public_id(&email)),
            email_address: Set(email.clone()),
            password_hash: Set(hash_password(password)?),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AdminUserError::AlreadyExists(email.clone()),
            _ => AdminUserError::from(e),
        })?;

        info!(user_id = user.id, "Created admin user");
        Ok(user)
    }

    pub async fn set_active(
        &self,
        email: &str,
        active: bool,
    ) -> Result<admin_user::Model, AdminUserError> {
        let user = self.find(email).await?;
        let mut model: admin_user::ActiveModel = user.into();
        model.active = Set(active);
        model.updated_at = Set(chrono::Utc::now());
        let user = model.update(self.db).await?;

        info!(user_id = user.id, active, "Changed admin activation");
        Ok(user)
    }

    pub async fn delete(&self, email: &str) -> Result<(), AdminUserError> {
        let user = self.find(email).await?;
        admin_user::Entity::delete_by_id(user.id).exec(self.db).await?;

        info!(user_id = user.id, "Deleted admin user");
        Ok(())
    }

    /// Set a new password and rotate the public ID, revoking issued tokens.
    pub async fn reset_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<admin_user::Model, AdminUserError> {
        validate_password(password)?;
        let user = self.find(email).await?;

        let public_id = generate_public_id(&user.email_address);
        let mut model: admin_user::ActiveModel = user.into();
        model.password_hash = Set(hash_password(password)?);
        model.public_id = Set(public_id);
        model.updated_at = Set(chrono::Utc::now());
        let user = model.update(self.db).await?;

        info!(user_id = user.id, "Reset admin password");
        Ok(user)
    }
}
