use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// The fixed set of listing categories.
/// Stored as lowercase text in the `items.category` column.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
    Toys,
    Sports,
    Other,
}

impl Category {
    /// Every category, in the order the item form offers them.
    pub const ALL: [Category; 7] = [
        Category::Electronics,
        Category::Clothing,
        Category::Books,
        Category::Home,
        Category::Toys,
        Category::Sports,
        Category::Other,
    ];

    /// The value submitted by forms and stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
            Category::Books => "books",
            Category::Home => "home",
            Category::Toys => "toys",
            Category::Sports => "sports",
            Category::Other => "other",
        }
    }

    /// Human readable label shown in the category picker.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Books => "Books",
            Category::Home => "Home & Garden",
            Category::Toys => "Toys & Games",
            Category::Sports => "Sports & Outdoors",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| format!("unknown category '{}'", value))
    }
}

/// Category constraint of a catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    /// No constraint: the parameter was empty or the `all` sentinel.
    Any,
    Only(Category),
    /// A value outside the fixed set; nothing can match it.
    Unknown,
}

impl CategoryFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => CategoryFilter::Any,
            Some(other) => other
                .parse()
                .map(CategoryFilter::Only)
                .unwrap_or(CategoryFilter::Unknown),
        }
    }
}

/// Validated field values for creating or editing an item.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ItemInput {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Field must be between 3 and 100 characters long."
    ))]
    pub title: String,

    #[validate(length(max = 500, message = "Field cannot be longer than 500 characters."))]
    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Number must be at least 0."))]
    pub price: f64,

    pub category: Category,
}

/// A listing as stored in the `items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Category,
    /// Identifier of the user who created, and alone may change, the item.
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// Replaces the editable fields and moves `updated_at` forward.
    pub fn apply(&mut self, input: ItemInput) {
        self.title = input.title;
        self.description = input.description;
        self.price = input.price;
        self.category = input.category;
        self.updated_at = next_update_time(self.updated_at, Utc::now());
    }
}

/// The clock may not have advanced since the previous write; an edit must
/// still land strictly after it.
fn next_update_time(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// An item ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Category,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewItem {
    /// Stamps `created_at` and `updated_at` with the same instant.
    pub fn new(input: ItemInput, owner_id: i64) -> Self {
        let now = Utc::now();
        Self {
            title: input.title,
            description: input.description,
            price: input.price,
            category: input.category,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Conditions for listing items. All present conditions must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    /// Substring matched against title or description.
    pub text: Option<String>,
    pub category: Option<Category>,
    pub owner_id: Option<i64>,
}
