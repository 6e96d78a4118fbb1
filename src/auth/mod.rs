//! Authentication gate: account registration, credential checks and the
//! session binding that the login-required guard relies on.

pub mod extractors;
pub mod password;
pub mod session;

use crate::error::AppError;
use crate::forms::RegisterForm;
use crate::models::{NewUser, User};
use crate::repository::Repository;

pub use extractors::{CurrentUser, MaybeUser};
pub use password::{hash_password, verify_password};

/// Creates an account from a registration form.
///
/// The form is fully validated first, including the uniqueness of username and
/// email against persisted users. Only a bcrypt hash of the password is stored.
pub async fn register(
    repo: &dyn Repository,
    form: &RegisterForm,
    bcrypt_cost: u32,
) -> Result<User, AppError> {
    form.check_with(repo).await?;

    let password_hash = hash_password(&form.password, bcrypt_cost)?;
    let user = repo
        .insert_user(NewUser {
            username: form.username.clone(),
            email: form.email.clone(),
            password_hash,
        })
        .await?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Looks up the account for `email` and checks `password` against its hash.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn authenticate(
    repo: &dyn Repository,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = repo
        .find_user_by_email(email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if verify_password(password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BCRYPT_COST;
    use crate::db;
    use crate::repository::SqliteRepository;

    async fn repository() -> SqliteRepository {
        SqliteRepository::new(db::memory_pool().await.unwrap())
    }

    fn form(username: &str, email: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: "Password123!".to_string(),
            password2: "Password123!".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_stores_hash_not_password() {
        let repo = repository().await;
        let user = register(&repo, &form("alice", "alice@example.com"), MIN_BCRYPT_COST)
            .await
            .unwrap();

        let stored = repo.find_user(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Password123!");
        assert!(verify_password("Password123!", &stored.password_hash).unwrap());
        assert!(!verify_password("Password124!", &stored.password_hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_register_rejects_taken_email_and_username() {
        let repo = repository().await;
        register(&repo, &form("alice", "alice@example.com"), MIN_BCRYPT_COST)
            .await
            .unwrap();

        match register(&repo, &form("alice2", "alice@example.com"), MIN_BCRYPT_COST).await {
            Err(AppError::Validation(errors)) => {
                assert_eq!(
                    errors.get("email"),
                    ["Please use a different email address.".to_string()]
                );
                assert!(!errors.has("username"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }

        match register(&repo, &form("alice", "other@example.com"), MIN_BCRYPT_COST).await {
            Err(AppError::Validation(errors)) => assert!(errors.has("username")),
            other => panic!("expected a validation error, got {:?}", other),
        }

        // No duplicate rows were written.
        assert!(repo.find_user_by_username("alice2").await.unwrap().is_none());
        assert!(repo.find_user_by_email("other@example.com").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_authenticate() {
        let repo = repository().await;
        let user = register(&repo, &form("bob", "bob@example.com"), MIN_BCRYPT_COST)
            .await
            .unwrap();

        let authenticated = authenticate(&repo, "bob@example.com", "Password123!")
            .await
            .unwrap();
        assert_eq!(authenticated.id, user.id);

        assert!(matches!(
            authenticate(&repo, "bob@example.com", "wrong password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&repo, "nobody@example.com", "Password123!").await,
            Err(AppError::InvalidCredentials)
        ));
    }
}
