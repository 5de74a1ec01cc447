//! User service: the validation/normalization chain in front of the user
//! store, plus authentication and remember-token rotation.
//!
//! Every record written or looked up goes through an ordered list of
//! [`Step`]s. The runner applies them in order and stops at the first error,
//! so a step that depends on normalization (availability, hashing) always
//! sees canonical input.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::{
    crypto::{keyed_hash::TokenHasher, password, token},
    error::{AppError, Result},
    models::user::User,
    repositories::user::UserStore,
    validation::auth::{normalize_email, validate_email, validate_password},
};

/// A single transformation or check applied to a user record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    RequireEmail,
    NormalizeEmail,
    ValidateEmail,
    AvailableEmail,
    RequirePassword,
    ValidatePassword,
    HashPassword,
    RequirePasswordHash,
    EnsureRemember,
    ValidateRemember,
    HashRemember,
    RequireRememberHash,
    IdGreaterThanZero,
}

const CREATE: &[Step] = &[
    Step::RequireEmail,
    Step::NormalizeEmail,
    Step::ValidateEmail,
    Step::AvailableEmail,
    Step::RequirePassword,
    Step::ValidatePassword,
    Step::HashPassword,
    Step::RequirePasswordHash,
    Step::EnsureRemember,
    Step::ValidateRemember,
    Step::HashRemember,
    Step::RequireRememberHash,
];

const UPDATE: &[Step] = &[
    Step::RequireEmail,
    Step::NormalizeEmail,
    Step::ValidateEmail,
    Step::AvailableEmail,
    Step::ValidatePassword,
    Step::HashPassword,
    Step::RequirePasswordHash,
    Step::ValidateRemember,
    Step::HashRemember,
    Step::RequireRememberHash,
];

const BY_EMAIL: &[Step] = &[Step::NormalizeEmail, Step::RequireEmail, Step::ValidateEmail];

const BY_REMEMBER: &[Step] = &[Step::HashRemember];

const DELETE: &[Step] = &[Step::IdGreaterThanZero];

fn require_email(user: User) -> Result<User> {
    if user.email.is_empty() {
        return Err(AppError::RequiredEmail);
    }
    Ok(user)
}

fn normalize(mut user: User) -> Result<User> {
    user.email = normalize_email(&user.email);
    Ok(user)
}

fn check_email_format(user: User) -> Result<User> {
    validate_email(&user.email)?;
    Ok(user)
}

fn require_password(user: User) -> Result<User> {
    match user.password.as_deref() {
        Some(p) if !p.is_empty() => Ok(user),
        _ => Err(AppError::RequiredPassword),
    }
}

fn check_password_length(user: User) -> Result<User> {
    if let Some(p) = user.password.as_deref().filter(|p| !p.is_empty()) {
        validate_password(p)?;
    }
    Ok(user)
}

fn hash_password(mut user: User) -> Result<User> {
    if let Some(plain) = user.password.take().map(Zeroizing::new) {
        if !plain.is_empty() {
            user.password_hash = password::hash_password(&plain)?;
        }
    }
    Ok(user)
}

fn require_password_hash(user: User) -> Result<User> {
    if user.password_hash.is_empty() {
        return Err(AppError::RequiredPassword);
    }
    Ok(user)
}

fn ensure_remember(mut user: User) -> Result<User> {
    if user.remember.as_deref().is_none_or(str::is_empty) {
        user.remember = Some(token::remember_token()?);
    }
    Ok(user)
}

fn check_remember_entropy(user: User) -> Result<User> {
    if let Some(remember) = user.remember.as_deref().filter(|r| !r.is_empty()) {
        if token::decoded_len(remember)? < token::REMEMBER_TOKEN_BYTES {
            return Err(AppError::ShortRemember);
        }
    }
    Ok(user)
}

fn require_remember_hash(user: User) -> Result<User> {
    if user.remember_hash.is_empty() {
        return Err(AppError::RequiredRemember);
    }
    Ok(user)
}

fn id_greater_than_zero(user: User) -> Result<User> {
    if user.id <= 0 {
        return Err(AppError::InvalidId);
    }
    Ok(user)
}

/// User operations with normalization and validation applied.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: TokenHasher,
}

impl UserService {
    /// Creates a new `UserService`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where user records are persisted.
    /// * `hasher` - The keyed hash applied to remember tokens before storage.
    pub fn new(store: Arc<dyn UserStore>, hasher: TokenHasher) -> Self {
        Self { store, hasher }
    }

    /// Runs `steps` in order, stopping at the first failure.
    async fn run(&self, mut user: User, steps: &[Step]) -> Result<User> {
        for step in steps {
            user = self.apply(*step, user).await?;
        }
        Ok(user)
    }

    async fn apply(&self, step: Step, user: User) -> Result<User> {
        match step {
            Step::RequireEmail => require_email(user),
            Step::NormalizeEmail => normalize(user),
            Step::ValidateEmail => check_email_format(user),
            Step::AvailableEmail => self.available_email(user).await,
            Step::RequirePassword => require_password(user),
            Step::ValidatePassword => check_password_length(user),
            Step::HashPassword => hash_password(user),
            Step::RequirePasswordHash => require_password_hash(user),
            Step::EnsureRemember => ensure_remember(user),
            Step::ValidateRemember => check_remember_entropy(user),
            Step::HashRemember => Ok(self.hash_remember(user)),
            Step::RequireRememberHash => require_remember_hash(user),
            Step::IdGreaterThanZero => id_greater_than_zero(user),
        }
    }

    fn hash_remember(&self, mut user: User) -> User {
        if let Some(remember) = user.remember.take().filter(|r| !r.is_empty()) {
            user.remember_hash = self.hasher.hash(&remember);
        }
        user
    }

    /// The email is free, or already belongs to this same user.
    ///
    /// Queries the store directly: the email is normalized by the time this
    /// step runs.
    async fn available_email(&self, user: User) -> Result<User> {
        match self.store.by_email(&user.email).await? {
            Some(existing) if existing.id != user.id => Err(AppError::EmailTaken),
            _ => Ok(user),
        }
    }

    /// Finds a user by id.
    ///
    /// # Arguments
    ///
    /// * `id` - The user's id.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `NotFound`.
    pub async fn by_id(&self, id: i64) -> Result<User> {
        self.store.by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// Looks a user up by email, normalized the same way it was stored.
    ///
    /// # Arguments
    ///
    /// * `email` - The address as typed; surrounding whitespace and case are
    ///   ignored.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `NotFound`.
    pub async fn by_email(&self, email: &str) -> Result<User> {
        let key = self
            .run(
                User {
                    email: email.to_string(),
                    ..Default::default()
                },
                BY_EMAIL,
            )
            .await?;
        self.store
            .by_email(&key.email)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Looks a user up by the raw remember token from their cookie.
    ///
    /// # Arguments
    ///
    /// * `remember` - The raw token; only its keyed hash reaches the store.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user, or `NotFound` for an empty or unknown
    /// token.
    pub async fn by_remember(&self, remember: &str) -> Result<User> {
        let key = self
            .run(
                User {
                    remember: Some(remember.to_string()),
                    ..Default::default()
                },
                BY_REMEMBER,
            )
            .await?;
        if key.remember_hash.is_empty() {
            return Err(AppError::NotFound);
        }
        self.store
            .by_remember_hash(&key.remember_hash)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Validates, hashes and persists a new user.
    ///
    /// A remember token is generated when the user has none.
    ///
    /// # Arguments
    ///
    /// * `user` - The new user with a plaintext password.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored user, with both plaintexts cleared,
    /// or the first validation error hit.
    pub async fn create(&self, user: User) -> Result<User> {
        let user = self.run(user, CREATE).await?;
        self.store.create(user).await
    }

    /// Validates and persists changes to an existing user. A password or
    /// remember token that is present is validated and hashed; absent ones
    /// leave the stored hash untouched.
    pub async fn update(&self, user: User) -> Result<User> {
        let user = self.run(user, UPDATE).await?;
        self.store.update(user).await
    }

    /// Deletes a user.
    ///
    /// # Arguments
    ///
    /// * `id` - The user's id; must be greater than zero.
    ///
    /// # Returns
    ///
    /// An empty `Result`, `InvalidId` or `NotFound`.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let user = self
            .run(
                User {
                    id,
                    ..Default::default()
                },
                DELETE,
            )
            .await?;
        self.store.delete(user.id).await
    }

    /// Verifies an email and password pair.
    ///
    /// Fails with `NotFound` for an unknown email and `InvalidPassword` for
    /// a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self.by_email(email).await?;
        if !password::verify_password(password, &user.password_hash)? {
            tracing::warn!("❌ Invalid password for user: {}", user.id);
            return Err(AppError::InvalidPassword);
        }
        tracing::info!("✅ User authenticated: {}", user.id);
        Ok(user)
    }

    /// Replaces the user's remember token.
    ///
    /// Any cookie holding the previous token stops authenticating.
    ///
    /// # Arguments
    ///
    /// * `user` - The signed-in user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated user and the new raw token for the
    /// cookie.
    pub async fn rotate_remember(&self, mut user: User) -> Result<(User, String)> {
        let remember = token::remember_token()?;
        user.remember = Some(remember.clone());
        let user = self.update(user).await?;
        Ok((user, remember))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryUserStore;

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryUserStore::new()),
            TokenHasher::new(b"test-hmac-key"),
        )
    }

    #[tokio::test]
    async fn create_normalizes_and_hashes() {
        let users = service();
        let user = users
            .create(User::new("Ann", " ANN@Example.com ", "longenough"))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email, "ann@example.com");
        assert!(user.password.is_none());
        assert!(user.remember.is_none());
        assert_ne!(user.password_hash, "longenough");
        assert!(!user.password_hash.is_empty());
        assert!(!user.remember_hash.is_empty());
    }

    #[test]
    fn hash_step_consumes_the_plaintext() {
        let user = hash_password(User {
            password: Some("longenough".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(user.password.is_none());
        assert!(password::verify_password("longenough", &user.password_hash).unwrap());

        // An empty password is dropped without touching the stored hash.
        let user = hash_password(User {
            password: Some(String::new()),
            password_hash: "kept".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(user.password.is_none());
        assert_eq!(user.password_hash, "kept");
    }

    #[tokio::test]
    async fn authenticate_with_same_plaintext() {
        let users = service();
        users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();

        let user = users.authenticate("Ann@Example.com", "longenough").await.unwrap();
        assert_eq!(user.email, "ann@example.com");

        assert!(matches!(
            users.authenticate("ann@example.com", "wrongpassword").await,
            Err(AppError::InvalidPassword)
        ));
        assert!(matches!(
            users.authenticate("bob@example.com", "longenough").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn emails_differing_in_case_resolve_to_same_user() {
        let users = service();
        let created = users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();

        for variant in ["ANN@EXAMPLE.COM", "  ann@example.com\t", "Ann@Example.Com "] {
            assert_eq!(users.by_email(variant).await.unwrap().id, created.id);
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_taken() {
        let users = service();
        users
            .create(User::new("Ann", " ANN@Example.com ", "longenough"))
            .await
            .unwrap();

        let err = users
            .create(User::new("Other Ann", "ann@example.com", "longenough"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
        assert_eq!(err.to_string(), "email address is already taken");
    }

    #[tokio::test]
    async fn create_fails_fast_in_order() {
        let users = service();
        assert!(matches!(
            users.create(User::new("Ann", "", "")).await,
            Err(AppError::RequiredEmail)
        ));
        assert!(matches!(
            users.create(User::new("Ann", "not-an-email", "")).await,
            Err(AppError::InvalidEmail)
        ));
        assert!(matches!(
            users.create(User::new("Ann", "ann@example.com", "")).await,
            Err(AppError::RequiredPassword)
        ));
        assert!(matches!(
            users.create(User::new("Ann", "ann@example.com", "short")).await,
            Err(AppError::ShortPassword)
        ));
    }

    #[tokio::test]
    async fn short_password_rejected_on_update() {
        let users = service();
        let mut user = users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();
        let hash_before = user.password_hash.clone();

        user.password = Some("short".to_string());
        assert!(matches!(users.update(user.clone()).await, Err(AppError::ShortPassword)));

        let stored = users.by_id(user.id).await.unwrap();
        assert_eq!(stored.password_hash, hash_before);
    }

    #[tokio::test]
    async fn update_without_password_keeps_hash() {
        let users = service();
        let mut user = users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();
        let hash_before = user.password_hash.clone();

        user.name = "Annie".to_string();
        let updated = users.update(user).await.unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.password_hash, hash_before);
    }

    #[tokio::test]
    async fn update_to_another_users_email_is_taken() {
        let users = service();
        users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();
        let mut bob = users
            .create(User::new("Bob", "bob@example.com", "longenough"))
            .await
            .unwrap();

        bob.email = "ANN@example.com".to_string();
        assert!(matches!(users.update(bob).await, Err(AppError::EmailTaken)));
    }

    #[tokio::test]
    async fn low_entropy_remember_token_rejected() {
        let users = service();
        let mut user = User::new("Ann", "ann@example.com", "longenough");
        user.remember = Some(token::random_string(16).unwrap());
        assert!(matches!(users.create(user).await, Err(AppError::ShortRemember)));
    }

    #[tokio::test]
    async fn rotation_invalidates_previous_token() {
        let users = service();
        let user = users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();

        let (user, first) = users.rotate_remember(user).await.unwrap();
        assert_eq!(users.by_remember(&first).await.unwrap().id, user.id);

        let (user, second) = users.rotate_remember(user).await.unwrap();
        assert_eq!(users.by_remember(&second).await.unwrap().id, user.id);
        assert!(matches!(users.by_remember(&first).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_requires_positive_id() {
        let users = service();
        assert!(matches!(users.delete(0).await, Err(AppError::InvalidId)));
        assert!(matches!(users.delete(-3).await, Err(AppError::InvalidId)));

        let user = users
            .create(User::new("Ann", "ann@example.com", "longenough"))
            .await
            .unwrap();
        users.delete(user.id).await.unwrap();
        assert!(matches!(users.by_id(user.id).await, Err(AppError::NotFound)));
    }
}
