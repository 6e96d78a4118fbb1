pub mod auth;
pub mod health;
pub mod items;
pub mod pages;

use actix_session::Session;
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::auth::MaybeUser;
use crate::error::AppError;
use crate::views;

/// Route table. `/item/new` is registered ahead of `/item/{id}`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Malformed form submission: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Malformed query string: {}", err)).into()
    }))
    .service(health::health)
    .service(pages::index)
    .service(pages::about)
    .service(pages::contact)
    .service(pages::search)
    .service(pages::search_form)
    .service(pages::my_items)
    .service(auth::login_form)
    .service(auth::login)
    .service(auth::register_form)
    .service(auth::register)
    .service(auth::logout)
    .service(items::new_item_form)
    .service(items::create_item)
    .service(items::view_item)
    .service(items::edit_item_form)
    .service(items::update_item)
    .service(items::delete_item);
}

/// Default service: the 404 page for any unmatched route.
pub async fn not_found(
    req: HttpRequest,
    session: Session,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    views::render_with_status(
        StatusCode::NOT_FOUND,
        &session,
        user.user(),
        "404",
        json!({ "error": format!("No page at {}", req.path()) }),
    )
}
