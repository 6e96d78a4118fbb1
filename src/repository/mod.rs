//! Persistence boundary.
//!
//! Handlers and services only see the [`Repository`] trait; entities are plain
//! records without persistence methods. The application shares a single
//! `Arc<dyn Repository>` as `web::Data<dyn Repository>`.

pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Item, ItemFilter, NewItem, NewUser, User};

pub use sqlite::SqliteRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    // --- Items ---
    async fn find_item(&self, id: i64) -> Result<Option<Item>, AppError>;
    /// Items matching every condition of `filter`, in insertion order.
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, AppError>;
    async fn insert_item(&self, item: NewItem) -> Result<Item, AppError>;
    /// Writes the editable fields of `item`. Only a row still owned by
    /// `item.owner_id` is touched; `None` means no such row exists.
    async fn update_item(&self, item: &Item) -> Result<Option<Item>, AppError>;
    /// Returns whether a row owned by `owner_id` was removed.
    async fn delete_item(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;

    /// Round-trips to the store; used by the health check.
    async fn ping(&self) -> Result<(), AppError>;
}

pub type RepositoryState = Arc<dyn Repository>;
