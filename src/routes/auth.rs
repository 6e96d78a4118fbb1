use actix_session::Session;
use actix_web::{get, http::StatusCode, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{self, session, session::FlashLevel, MaybeUser},
    config::AuthSettings,
    error::AppError,
    forms::{FormErrors, LoginForm, RegisterForm},
    repository::Repository,
    views::{redirect, render_with_status},
};

/// `?next=` carried from the login-required redirect through the login form.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn login_page(
    status: StatusCode,
    session: &Session,
    form: &LoginForm,
    errors: &FormErrors,
    next: Option<&str>,
) -> Result<HttpResponse, AppError> {
    render_with_status(
        status,
        session,
        None,
        "login",
        json!({ "form": form, "errors": errors, "next": next }),
    )
}

fn register_page(
    status: StatusCode,
    session: &Session,
    form: &RegisterForm,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    render_with_status(
        status,
        session,
        None,
        "register",
        json!({ "form": form, "errors": errors }),
    )
}

/// Show the login form.
#[get("/login")]
pub async fn login_form(
    session: Session,
    user: MaybeUser,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    if user.user().is_some() {
        return Ok(redirect("/"));
    }
    login_page(
        StatusCode::OK,
        &session,
        &LoginForm::default(),
        &FormErrors::default(),
        query.next.as_deref(),
    )
}

/// Log a user in
///
/// Establishes a session for valid credentials and redirects to `next` (when
/// it is a local path) or home. Invalid credentials re-render the form with a
/// flash; the response does not reveal whether the email exists.
#[post("/login")]
pub async fn login(
    repo: web::Data<dyn Repository>,
    settings: web::Data<AuthSettings>,
    session: Session,
    user: MaybeUser,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    if user.user().is_some() {
        return Ok(redirect("/"));
    }
    let form = form.into_inner();
    let next = query.next.as_deref();

    if let Err(errors) = form.check() {
        return login_page(StatusCode::UNPROCESSABLE_ENTITY, &session, &form, &errors, next);
    }

    match auth::authenticate(repo.get_ref(), &form.email, &form.password).await {
        Ok(user) => {
            session::establish(&session, &user, form.remember_me, &settings)?;
            log::info!("User {} logged in", user.id);
            Ok(redirect(&session::redirect_target(next)))
        }
        Err(AppError::InvalidCredentials) => {
            log::warn!("Failed login attempt for {}", form.email);
            session::flash(&session, FlashLevel::Danger, "Invalid email or password")?;
            login_page(
                StatusCode::UNAUTHORIZED,
                &session,
                &form,
                &FormErrors::default(),
                next,
            )
        }
        Err(e) => Err(e),
    }
}

/// Show the registration form.
#[get("/register")]
pub async fn register_form(session: Session, user: MaybeUser) -> Result<HttpResponse, AppError> {
    if user.user().is_some() {
        return Ok(redirect("/"));
    }
    register_page(
        StatusCode::OK,
        &session,
        &RegisterForm::default(),
        &FormErrors::default(),
    )
}

/// Register a new user
///
/// On success the visitor is sent to the login page; field errors (including
/// a taken username or email) re-render the form with the submitted values.
#[post("/register")]
pub async fn register(
    repo: web::Data<dyn Repository>,
    settings: web::Data<AuthSettings>,
    session: Session,
    user: MaybeUser,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    if user.user().is_some() {
        return Ok(redirect("/"));
    }
    let form = form.into_inner();

    match auth::register(repo.get_ref(), &form, settings.bcrypt_cost).await {
        Ok(_) => {
            session::flash(
                &session,
                FlashLevel::Success,
                "Registration successful! Please log in.",
            )?;
            Ok(redirect("/login"))
        }
        Err(AppError::Validation(errors)) => {
            register_page(StatusCode::UNPROCESSABLE_ENTITY, &session, &form, &errors)
        }
        Err(e) => Err(e),
    }
}

#[get("/logout")]
pub async fn logout(session: Session) -> HttpResponse {
    session::end(&session);
    redirect("/")
}
