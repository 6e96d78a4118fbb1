use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::{
    auth::{CurrentUser, MaybeUser},
    catalog::{self, SearchQuery},
    error::AppError,
    forms::SearchForm,
    models::User,
    repository::Repository,
    views::{category_choices, render},
};

/// Home: every listing.
#[get("/")]
pub async fn index(
    repo: web::Data<dyn Repository>,
    session: Session,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    let items = catalog::list_all(repo.get_ref()).await?;
    render(&session, user.user(), "index", json!({ "items": items }))
}

#[get("/about")]
pub async fn about(session: Session, user: MaybeUser) -> Result<HttpResponse, AppError> {
    render(&session, user.user(), "about", json!({}))
}

#[get("/contact")]
pub async fn contact(session: Session, user: MaybeUser) -> Result<HttpResponse, AppError> {
    render(&session, user.user(), "contact", json!({}))
}

async fn search_page(
    repo: &dyn Repository,
    session: &Session,
    user: Option<&User>,
    form: SearchForm,
) -> Result<HttpResponse, AppError> {
    let query = SearchQuery {
        text: form.query.trim().to_string(),
        category: Some(form.category).filter(|c| !c.is_empty()),
    };
    let items = catalog::search(repo, &query).await?;

    render(
        session,
        user,
        "search",
        json!({
            "items": items,
            "query": query.text,
            "category": query.category.as_deref().unwrap_or("all"),
            "categories": category_choices(),
        }),
    )
}

/// Search listings by text and category, e.g. `/search?query=bike&category=sports`.
/// With no criteria every item is listed.
#[get("/search")]
pub async fn search(
    repo: web::Data<dyn Repository>,
    session: Session,
    user: MaybeUser,
    form: web::Query<SearchForm>,
) -> Result<HttpResponse, AppError> {
    search_page(repo.get_ref(), &session, user.user(), form.into_inner()).await
}

#[post("/search")]
pub async fn search_form(
    repo: web::Data<dyn Repository>,
    session: Session,
    user: MaybeUser,
    form: web::Form<SearchForm>,
) -> Result<HttpResponse, AppError> {
    search_page(repo.get_ref(), &session, user.user(), form.into_inner()).await
}

/// Listings of the logged-in user.
#[get("/my_items")]
pub async fn my_items(
    user: CurrentUser,
    repo: web::Data<dyn Repository>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let items = catalog::owned_by(repo.get_ref(), &user).await?;
    render(&session, Some(&user.0), "my_items", json!({ "items": items }))
}
