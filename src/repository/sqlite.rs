use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::Repository;
use crate::error::AppError;
use crate::forms::FormErrors;
use crate::models::{Item, ItemFilter, NewItem, NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash";
const ITEM_COLUMNS: &str =
    "id, title, description, price, category, owner_id, created_at, updated_at";

/// [`Repository`] backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_user_where(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// Escapes `LIKE` wildcards so user text is matched literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A unique-constraint failure on insert means another registration won the
/// race past the form check; report it the same way the form check would.
fn map_user_insert_error(error: sqlx::Error) -> AppError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.is_unique_violation() {
            let mut errors = FormErrors::default();
            if db_error.message().contains("users.email") {
                errors.add("email", "Please use a different email address.");
            } else {
                errors.add("username", "Please use a different username.");
            }
            return AppError::Validation(errors);
        }
    }
    AppError::from(error)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_user_where("email", email).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_user_where("username", username).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_insert_error)
    }

    async fn find_item(&self, id: i64) -> Result<Option<Item>, AppError> {
        let sql = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM items WHERE 1 = 1", ITEM_COLUMNS));

        if let Some(text) = filter.text.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            builder.push(" AND (title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR description LIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category);
        }
        if let Some(owner_id) = filter.owner_id {
            builder.push(" AND owner_id = ");
            builder.push_bind(owner_id);
        }
        builder.push(" ORDER BY id ASC");

        let items = builder
            .build_query_as::<Item>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, AppError> {
        let sql = format!(
            "INSERT INTO items (title, description, price, category, owner_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {}",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item.title)
            .bind(item.description)
            .bind(item.price)
            .bind(item.category)
            .bind(item.owner_id)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    async fn update_item(&self, item: &Item) -> Result<Option<Item>, AppError> {
        let sql = format!(
            "UPDATE items
             SET title = ?, description = ?, price = ?, category = ?, updated_at = ?
             WHERE id = ? AND owner_id = ?
             RETURNING {}",
            ITEM_COLUMNS
        );
        let updated = sqlx::query_as::<_, Item>(&sql)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.price)
            .bind(item.category)
            .bind(item.updated_at)
            .bind(item.id)
            .bind(item.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_item(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
