//! User service.

use std::borrow::Cow;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

/// User service for sign-up and authentication.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this value has at most 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters."))]
    pub password: String,

    #[validate(length(max = 150))]
    pub name: Option<String>,
}

/// Letters, digits and `@ . + - _` only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username").with_message(Cow::Borrowed(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        )))
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new user with a fresh session token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.username_exists(&input.username).await? {
            return Err(AppError::field(
                "username",
                "A user with that username already exists.",
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            name: Set(input.name.filter(|n| !n.trim().is_empty())),
            password_hash: Set(password_hash),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    ///
    /// Users without a token (logged out everywhere) get a new one so the
    /// caller always has a session to hand out.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.token.is_some() {
            return Ok(user);
        }

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Replace a user's session token, invalidating existing sessions.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }
}

/// Hash a password with argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
///
/// Hashes that do not parse never match.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return Ok(false);
    };

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            name: None,
            password_hash: hash_password(password).unwrap(),
            token: Some("test_token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_unparsable_hash() {
        assert!(!verify_password("anything", "!").unwrap());
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("leo.tolstoy+1@ya").is_ok());
        assert!(validate_username("лев_толстой").is_ok());
        assert!(validate_username("leo tolstoy").is_err());
        assert!(validate_username("leo/../").is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_short_password() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc
            .create(CreateUserInput {
                username: "leo".to_string(),
                password: "short".to_string(),
                name: None,
            })
            .await;

        match result {
            Err(AppError::Validation(errors)) => assert!(!errors.get("password").is_empty()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_taken_username() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            BTreeMap::from([("num_items", Value::BigInt(Some(1)))]),
        ]]);
        let svc = service(db);

        let result = svc
            .create(CreateUserInput {
                username: "Leo".to_string(),
                password: "long enough".to_string(),
                name: None,
            })
            .await;

        match result {
            Err(AppError::Validation(errors)) => assert_eq!(
                errors.get("username"),
                ["A user with that username already exists.".to_string()]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let user = create_test_user("u1", "leo", "correct horse");
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);

        let result = service(db).authenticate("leo", "correct horse").await.unwrap();
        assert_eq!(result.id, "u1");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = create_test_user("u1", "leo", "correct horse");
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);

        let result = service(db).authenticate("leo", "battery staple").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let result = service(db).authenticate("ghost", "whatever").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_by_token_invalid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let result = service(db).authenticate_by_token("bogus").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
