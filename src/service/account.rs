//! Account service
//!
//! Handles sign-up, password sign-in, and profile maintenance.

use std::sync::Arc;

use crate::data::{AuthUser, Database, EntityId, Profile, ProfileRole};
use crate::error::AppError;
use crate::storage::MediaStorage;

const MIN_PASSWORD_CHARS: usize = 8;

#[cfg(test)]
const PASSWORD_HASH_COST: u32 = 4;
#[cfg(not(test))]
const PASSWORD_HASH_COST: u32 = bcrypt::DEFAULT_COST;

fn normalize_optional_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sign-up input
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub username: String,
    pub nickname: Option<String>,
    pub role: ProfileRole,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Profile patch input; omitted fields are left unchanged
#[derive(Default)]
pub struct ProfilePatch {
    pub nickname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Sign up a new user.
    ///
    /// The auth row and the profile row are written in one
    /// transaction: either both land or neither does.
    ///
    /// # Errors
    /// Validation errors for malformed input or a taken email/username.
    pub async fn sign_up(&self, input: SignUp) -> Result<(AuthUser, Profile), AppError> {
        let email = input.email.trim().to_ascii_lowercase();
        if !email.contains('@') || email.len() < 3 {
            return Err(AppError::Validation(
                "a valid email address is required".to_string(),
            ));
        }

        if input.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }

        let nickname = input
            .nickname
            .and_then(normalize_optional_text)
            .unwrap_or_else(|| username.clone());

        // bcrypt is CPU-bound; keep it off the async runtime.
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, PASSWORD_HASH_COST)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))?;

        let now = chrono::Utc::now();
        let user = AuthUser {
            id: EntityId::new().0,
            email,
            password_hash,
            created_at: now,
        };
        let profile = Profile {
            id: user.id.clone(),
            username,
            nickname,
            role: input.role.as_str().to_string(),
            phone: input.phone.and_then(normalize_optional_text),
            address: input.address.and_then(normalize_optional_text),
            avatar_url: None,
            created_at: now,
        };

        self.db.insert_user_with_profile(&user, &profile).await?;

        tracing::info!(user_id = %user.id, username = %profile.username, "User signed up");

        Ok((user, profile))
    }

    /// Sign in with email and password.
    ///
    /// # Returns
    /// The auth user and their profile (None when the profile row is
    /// missing).
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AuthUser, Option<Profile>), AppError> {
        let email = email.trim().to_ascii_lowercase();
        let Some(user) = self.db.get_user_by_email(&email).await? else {
            return Err(AppError::Unauthorized);
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))?;
        if !verified {
            return Err(AppError::Unauthorized);
        }

        let profile = self.db.get_profile(&user.id).await?;
        Ok((user, profile))
    }

    /// Get profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.db.get_profile(user_id).await
    }

    /// Patch profile display fields
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<Profile, AppError> {
        let nickname = patch.nickname.and_then(normalize_optional_text);
        let phone = patch.phone.and_then(normalize_optional_text);
        let address = patch.address.and_then(normalize_optional_text);

        if nickname.is_some() || phone.is_some() || address.is_some() {
            let updated = self
                .db
                .patch_profile(
                    user_id,
                    nickname.as_deref(),
                    phone.as_deref(),
                    address.as_deref(),
                )
                .await?;
            if !updated {
                return Err(AppError::NotFound);
            }
        }

        self.db.get_profile(user_id).await?.ok_or(AppError::NotFound)
    }

    /// Update avatar image
    ///
    /// # Arguments
    /// * `image_data` - WebP image bytes (conversion is not performed here)
    ///
    /// # Returns
    /// Public URL of the new avatar
    pub async fn update_avatar(
        &self,
        user_id: &str,
        image_data: Vec<u8>,
    ) -> Result<String, AppError> {
        if image_data.is_empty() {
            return Err(AppError::Validation(
                "avatar image data is empty".to_string(),
            ));
        }

        self.db
            .get_profile(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let image_id = EntityId::new().0;
        let (avatar_key, avatar_url) = self.storage.upload_avatar(&image_id, image_data).await?;

        let updated = match self.db.update_profile_avatar(user_id, &avatar_url).await {
            Ok(updated) => updated,
            Err(error) => {
                if let Err(cleanup_error) = self.storage.delete_avatar(&avatar_key).await {
                    tracing::warn!(
                        key = %avatar_key,
                        error = %cleanup_error,
                        "failed to cleanup uploaded avatar after database update error"
                    );
                }
                return Err(error);
            }
        };
        if !updated {
            if let Err(cleanup_error) = self.storage.delete_avatar(&avatar_key).await {
                tracing::warn!(
                    key = %avatar_key,
                    error = %cleanup_error,
                    "failed to cleanup uploaded avatar after missing profile row"
                );
            }
            return Err(AppError::NotFound);
        }

        Ok(avatar_url)
    }
}
