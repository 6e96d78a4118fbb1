//! Form payloads and their validation.
//!
//! Shape rules live on the structs as `validator` attributes. Each form has a
//! `check` function that adds the required-field rule and folds everything into
//! a [`FormErrors`] map keyed by field name, which the routes re-render next to
//! the submitted input.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;
use crate::models::{Category, Item, ItemInput};
use crate::repository::Repository;

const REQUIRED: &str = "This field is required.";

/// Field-scoped validation messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records `REQUIRED` when `value` is blank. Returns whether it was present.
    fn require(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
            false
        } else {
            true
        }
    }

    /// Adds the messages of `other` for fields that have none yet, so a
    /// missing field reports only that it is required.
    fn merge_new_fields(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                form_errors.add(field, message);
            }
        }
        form_errors
    }
}

/// HTML checkboxes submit an arbitrary value ("y", "on") when ticked and
/// nothing at all otherwise.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value.as_deref().map(str::trim) {
        None | Some("") | Some("false") | Some("0") => false,
        Some(_) => true,
    })
}

/// Payload of `POST /login`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember_me: bool,
}

impl LoginForm {
    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("email", &self.email);
        errors.require("password", &self.password);
        if let Err(e) = self.validate() {
            errors.merge_new_fields(e.into());
        }
        errors.into_result()
    }
}

/// Payload of `POST /register`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(
        min = 3,
        max = 64,
        message = "Field must be between 3 and 64 characters long."
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "Field must be at least 8 characters long."))]
    pub password: String,

    /// Confirmation of `password`.
    #[serde(default, skip_serializing)]
    #[validate(must_match(other = "password", message = "Field must be equal to password."))]
    pub password2: String,
}

impl RegisterForm {
    /// Input-shape rules only; see [`RegisterForm::check_with`] for uniqueness.
    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.require("username", &self.username);
        errors.require("email", &self.email);
        errors.require("password", &self.password);
        errors.require("password2", &self.password2);
        if let Err(e) = self.validate() {
            errors.merge_new_fields(e.into());
        }
        errors.into_result()
    }

    /// Full registration check: shape rules, then whether the username and
    /// email are still free among persisted users.
    pub async fn check_with(&self, repo: &dyn Repository) -> Result<(), AppError> {
        let mut errors = match self.check() {
            Ok(()) => FormErrors::default(),
            Err(errors) => errors,
        };

        if !errors.has("username") && repo.find_user_by_username(&self.username).await?.is_some()
        {
            errors.add("username", "Please use a different username.");
        }
        if !errors.has("email") && repo.find_user_by_email(&self.email).await?.is_some() {
            errors.add("email", "Please use a different email address.");
        }

        errors.into_result().map_err(AppError::Validation)
    }
}

/// Validation applied to every item write, whichever route it comes from.
pub fn validate_item(input: &ItemInput) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    if let Err(e) = input.validate() {
        errors.merge_new_fields(e.into());
    }
    if !input.price.is_finite() && !errors.has("price") {
        errors.add("price", "Not a valid float value.");
    }
    errors.into_result()
}

/// Payload of the item create/edit form. Fields stay as submitted text so an
/// invalid submission can be shown back unchanged.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
}

impl ItemForm {
    /// Parses and validates the submission into an [`ItemInput`].
    pub fn clean(&self) -> Result<ItemInput, FormErrors> {
        let mut errors = FormErrors::default();

        errors.require("title", &self.title);

        let price = if errors.require("price", &self.price) {
            match self.price.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => {
                    errors.add("price", "Not a valid float value.");
                    None
                }
            }
        } else {
            None
        };

        let category = match self.category.trim().parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                errors.add("category", "Not a valid choice.");
                None
            }
        };

        let description = match self.description.trim() {
            "" => None,
            _ => Some(self.description.clone()),
        };

        let input = ItemInput {
            title: self.title.clone(),
            description,
            price: price.unwrap_or_default(),
            category: category.unwrap_or(Category::Other),
        };
        if let Err(e) = validate_item(&input) {
            errors.merge_new_fields(e);
        }

        errors.into_result().map(|()| input)
    }
}

impl From<&Item> for ItemForm {
    fn from(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item.price.to_string(),
            category: item.category.as_str().to_string(),
        }
    }
}

/// Query of `/search`, from the query string (GET) or the form body (POST).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: String,
}
