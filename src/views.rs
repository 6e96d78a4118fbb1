//! Page rendering.
//!
//! Templates are rendered outside this service; a page is answered with its
//! template name and the context the template needs, as JSON.

use actix_session::Session;
use actix_web::{http::header, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::session::{self, Flash};
use crate::error::AppError;
use crate::models::{Category, User};

#[derive(Debug, Serialize)]
pub struct Page<'a, T: Serialize> {
    pub template: &'a str,
    pub current_user: Option<&'a User>,
    /// Pending flashes, consumed by this render.
    pub flashes: Vec<Flash>,
    pub context: T,
}

pub fn render<T: Serialize>(
    session: &Session,
    current_user: Option<&User>,
    template: &str,
    context: T,
) -> Result<HttpResponse, AppError> {
    render_with_status(StatusCode::OK, session, current_user, template, context)
}

pub fn render_with_status<T: Serialize>(
    status: StatusCode,
    session: &Session,
    current_user: Option<&User>,
    template: &str,
    context: T,
) -> Result<HttpResponse, AppError> {
    let page = Page {
        template,
        current_user,
        flashes: session::take_flashes(session)?,
        context,
    };
    Ok(HttpResponse::build(status).json(page))
}

/// `303 See Other` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Options of the category picker on the item form.
pub fn category_choices() -> Value {
    Value::Array(
        Category::ALL
            .iter()
            .map(|c| json!({ "value": c.as_str(), "label": c.label() }))
            .collect(),
    )
}
