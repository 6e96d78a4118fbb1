use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::ops::Deref;

use crate::auth::session::{self, FlashLevel};
use crate::error::AppError;
use crate::models::User;
use crate::repository::Repository;

/// The logged-in user; the login-required guard.
///
/// Taking this extractor makes a handler require a session. Without one the
/// request is answered with a redirect to `/login?next=<requested path>` and a
/// flash asking the visitor to log in.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// The logged-in user, if any. Never rejects a request.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Resolves the session binding to a stored user. A binding to a user that
/// no longer exists is dropped.
async fn session_user(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let session = req.get_session();
    let user_id = match session::user_id(&session)? {
        Some(id) => id,
        None => return Ok(None),
    };

    let repo = req
        .app_data::<web::Data<dyn Repository>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Repository is not configured".into()))?;

    let user = repo.find_user(user_id).await?;
    if user.is_none() {
        session::end(&session);
    }
    Ok(user)
}

fn requested_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match session_user(&req).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => {
                    session::flash(
                        &req.get_session(),
                        FlashLevel::Info,
                        "Please log in to access this page.",
                    )?;
                    Err(AppError::Unauthenticated {
                        next: requested_path(&req),
                    })
                }
            }
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { session_user(&req).await.map(MaybeUser) })
    }
}
