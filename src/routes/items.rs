use actix_session::Session;
use actix_web::{get, http::StatusCode, post, web, HttpResponse};
use serde_json::json;

use crate::{
    auth::{session, session::FlashLevel, CurrentUser, MaybeUser},
    catalog::{self, ItemAction},
    error::AppError,
    forms::{FormErrors, ItemForm},
    models::User,
    repository::Repository,
    views::{category_choices, redirect, render, render_with_status},
};

fn item_form_page(
    status: StatusCode,
    session: &Session,
    user: &User,
    heading: &str,
    action: &str,
    form: &ItemForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    render_with_status(
        status,
        session,
        Some(user),
        "item_form",
        json!({
            "title": heading,
            "action": action,
            "form": form,
            "errors": errors,
            "categories": category_choices(),
        }),
    )
}

/// Ownership violations are not an error page: the actor is sent back to the
/// listing with a warning.
fn forbidden(session: &Session, message: &str) -> Result<HttpResponse, AppError> {
    session::flash(session, FlashLevel::Warning, message)?;
    Ok(redirect("/"))
}

#[get("/item/new")]
pub async fn new_item_form(user: CurrentUser, session: Session) -> Result<HttpResponse, AppError> {
    item_form_page(
        StatusCode::OK,
        &session,
        &user,
        "New Item",
        "/item/new",
        &ItemForm::default(),
        &FormErrors::default(),
    )
}

/// Creates an item owned by the logged-in user.
///
/// ## Responses:
/// - `303 See Other` to `/` with a success flash.
/// - `303 See Other` to `/login?next=/item/new` without a session.
/// - `422 Unprocessable Entity`: the form re-rendered with field errors.
#[post("/item/new")]
pub async fn create_item(
    user: CurrentUser,
    repo: web::Data<dyn Repository>,
    session: Session,
    form: web::Form<ItemForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let rerender = |errors: &FormErrors| {
        item_form_page(
            StatusCode::UNPROCESSABLE_ENTITY,
            &session,
            &user,
            "New Item",
            "/item/new",
            &form,
            errors,
        )
    };

    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return rerender(&errors),
    };

    match catalog::create(repo.get_ref(), &user, input).await {
        Ok(_) => {
            session::flash(&session, FlashLevel::Success, "Item created successfully!")?;
            Ok(redirect("/"))
        }
        Err(AppError::Validation(errors)) => rerender(&errors),
        Err(e) => Err(e),
    }
}

/// Shows a single item with its owner. Public.
#[get("/item/{id:\\d+}")]
pub async fn view_item(
    repo: web::Data<dyn Repository>,
    session: Session,
    user: MaybeUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let item = catalog::get(repo.get_ref(), path.into_inner()).await?;
    let owner = repo.find_user(item.owner_id).await?;
    let can_edit = user.user().is_some_and(|u| item.is_owned_by(u.id));

    render(
        &session,
        user.user(),
        "item_detail",
        json!({ "item": item, "owner": owner, "can_edit": can_edit }),
    )
}

#[get("/item/{id:\\d+}/edit")]
pub async fn edit_item_form(
    user: CurrentUser,
    repo: web::Data<dyn Repository>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let item = catalog::get(repo.get_ref(), path.into_inner()).await?;
    if let Err(AppError::Forbidden(message)) = catalog::authorize(&item, &user, ItemAction::Edit) {
        return forbidden(&session, &message);
    }

    item_form_page(
        StatusCode::OK,
        &session,
        &user,
        "Edit Item",
        &format!("/item/{}/edit", item.id),
        &ItemForm::from(&item),
        &FormErrors::default(),
    )
}

/// Updates an item. Only its owner may do so.
///
/// ## Responses:
/// - `303 See Other` to `/item/{id}` with a success flash.
/// - `303 See Other` to `/` with a warning flash when the user is not the owner.
/// - `404 Not Found`: no such item.
/// - `422 Unprocessable Entity`: the form re-rendered with field errors.
#[post("/item/{id:\\d+}/edit")]
pub async fn update_item(
    user: CurrentUser,
    repo: web::Data<dyn Repository>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<ItemForm>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let form = form.into_inner();
    let action = format!("/item/{}/edit", id);
    let rerender = |errors: &FormErrors| {
        item_form_page(
            StatusCode::UNPROCESSABLE_ENTITY,
            &session,
            &user,
            "Edit Item",
            &action,
            &form,
            errors,
        )
    };

    // Ownership is settled before the submission is looked at.
    let item = catalog::get(repo.get_ref(), id).await?;
    if let Err(AppError::Forbidden(message)) = catalog::authorize(&item, &user, ItemAction::Edit) {
        return forbidden(&session, &message);
    }

    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return rerender(&errors),
    };

    match catalog::update(repo.get_ref(), id, &user, input).await {
        Ok(item) => {
            session::flash(&session, FlashLevel::Success, "Item updated successfully!")?;
            Ok(redirect(&format!("/item/{}", item.id)))
        }
        Err(AppError::Forbidden(message)) => forbidden(&session, &message),
        Err(AppError::Validation(errors)) => rerender(&errors),
        Err(e) => Err(e),
    }
}

/// Permanently deletes an item. Only its owner may do so.
#[post("/item/{id:\\d+}/delete")]
pub async fn delete_item(
    user: CurrentUser,
    repo: web::Data<dyn Repository>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match catalog::delete(repo.get_ref(), path.into_inner(), &user).await {
        Ok(()) => {
            session::flash(&session, FlashLevel::Success, "Item deleted successfully!")?;
            Ok(redirect("/"))
        }
        Err(AppError::Forbidden(message)) => forbidden(&session, &message),
        Err(e) => Err(e),
    }
}
