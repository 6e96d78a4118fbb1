use serde::Serialize;
use sqlx::FromRow;

/// A registered account as stored in the `users` table.
///
/// The password hash is loaded so the auth gate can verify credentials, but it
/// is never serialized into a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user ready to be inserted. `password_hash` must already be derived.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
