//! Item catalog: CRUD and search over listings, with ownership checks.
//!
//! Every mutation takes the acting user explicitly. Only the owner of an item
//! may edit or delete it; anyone else gets `AppError::Forbidden` and the item
//! is left untouched.

use std::fmt;

use crate::error::AppError;
use crate::forms::validate_item;
use crate::models::{CategoryFilter, Item, ItemFilter, ItemInput, NewItem, User};
use crate::repository::Repository;

/// Owner-only operations, named in permission messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Edit,
    Delete,
}

impl fmt::Display for ItemAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ItemAction::Edit => f.write_str("edit"),
            ItemAction::Delete => f.write_str("delete"),
        }
    }
}

/// Search criteria as submitted: free text plus a category name or `all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub category: Option<String>,
}

/// Every item, in insertion order.
pub async fn list_all(repo: &dyn Repository) -> Result<Vec<Item>, AppError> {
    repo.find_items(&ItemFilter::default()).await
}

pub async fn owned_by(repo: &dyn Repository, owner: &User) -> Result<Vec<Item>, AppError> {
    repo.find_items(&ItemFilter {
        owner_id: Some(owner.id),
        ..ItemFilter::default()
    })
    .await
}

pub async fn get(repo: &dyn Repository, id: i64) -> Result<Item, AppError> {
    repo.find_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
}

/// Checks that `actor` may perform `action` on `item`.
pub fn authorize(item: &Item, actor: &User, action: ItemAction) -> Result<(), AppError> {
    if item.is_owned_by(actor.id) {
        Ok(())
    } else {
        log::warn!(
            "User {} tried to {} item {} owned by user {}",
            actor.id,
            action,
            item.id,
            item.owner_id
        );
        Err(AppError::Forbidden(format!(
            "You do not have permission to {} this item",
            action
        )))
    }
}

/// Creates an item owned by `owner`, the authenticated user.
pub async fn create(
    repo: &dyn Repository,
    owner: &User,
    input: ItemInput,
) -> Result<Item, AppError> {
    validate_item(&input).map_err(AppError::Validation)?;
    let item = repo.insert_item(NewItem::new(input, owner.id)).await?;
    log::info!("User {} created item {}", owner.id, item.id);
    Ok(item)
}

pub async fn update(
    repo: &dyn Repository,
    id: i64,
    actor: &User,
    input: ItemInput,
) -> Result<Item, AppError> {
    let mut item = get(repo, id).await?;
    authorize(&item, actor, ItemAction::Edit)?;
    validate_item(&input).map_err(AppError::Validation)?;

    item.apply(input);
    // The row may have been deleted since it was read.
    let updated = repo
        .update_item(&item)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;
    log::info!("User {} updated item {}", actor.id, id);
    Ok(updated)
}

pub async fn delete(repo: &dyn Repository, id: i64, actor: &User) -> Result<(), AppError> {
    let item = get(repo, id).await?;
    authorize(&item, actor, ItemAction::Delete)?;

    if !repo.delete_item(id, actor.id).await? {
        return Err(AppError::NotFound(format!("Item {} not found", id)));
    }
    log::info!("User {} deleted item {}", actor.id, id);
    Ok(())
}

/// Items whose title or description contains `query.text` (when non-empty)
/// and whose category equals `query.category` (unless absent or `all`).
pub async fn search(repo: &dyn Repository, query: &SearchQuery) -> Result<Vec<Item>, AppError> {
    let category = match CategoryFilter::from_param(query.category.as_deref()) {
        CategoryFilter::Any => None,
        CategoryFilter::Only(category) => Some(category),
        CategoryFilter::Unknown => return Ok(Vec::new()),
    };
    let text = Some(query.text.clone()).filter(|t| !t.is_empty());

    repo.find_items(&ItemFilter {
        text,
        category,
        owner_id: None,
    })
    .await
}
