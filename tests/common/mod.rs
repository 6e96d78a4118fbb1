#![allow(dead_code)]

//! Shared harness: an in-memory app and a cookie jar carrying the session
//! between requests, the way a browser would.

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::Value;
use std::sync::Arc;

use marketboard::auth::session;
use marketboard::config::{AuthSettings, MIN_BCRYPT_COST};
use marketboard::db;
use marketboard::repository::{RepositoryState, SqliteRepository};
use marketboard::routes;

pub const PASSWORD: &str = "Password123!";

/// Auth settings with the cheapest bcrypt cost.
pub fn test_settings() -> AuthSettings {
    AuthSettings {
        bcrypt_cost: MIN_BCRYPT_COST,
        ..AuthSettings::default()
    }
}

pub async fn test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    test_app_with(test_settings()).await
}

pub async fn test_app_with(
    settings: AuthSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let pool = db::memory_pool().await.expect("in-memory database");
    let repo: RepositoryState = Arc::new(SqliteRepository::new(pool));

    App::new()
        .app_data(web::Data::from(repo))
        .app_data(web::Data::new(settings.clone()))
        .wrap(session::middleware(Key::generate(), &settings))
        .configure(routes::config)
        .default_service(web::to(routes::not_found))
}

/// Holds the latest session cookie handed out by the app.
#[derive(Default)]
pub struct Jar(Option<Cookie<'static>>);

impl Jar {
    pub async fn send<S, B>(&mut self, app: &S, req: test::TestRequest) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = match &self.0 {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        };
        let resp = test::call_service(app, req.to_request()).await;
        if let Some(cookie) = resp.response().cookies().find(|c| c.name() == "session") {
            self.0 = if cookie.value().is_empty() {
                None
            } else {
                Some(cookie.into_owned())
            };
        }
        resp
    }

    pub async fn get<S, B>(&mut self, app: &S, uri: &str) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.send(app, test::TestRequest::get().uri(uri)).await
    }

    pub async fn post<S, B>(&mut self, app: &S, uri: &str, form: &[(&str, &str)]) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.send(app, test::TestRequest::post().uri(uri).set_form(form))
            .await
    }

    pub async fn register<S, B>(&mut self, app: &S, username: &str, email: &str) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.post(
            app,
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await
    }

    pub async fn login<S, B>(&mut self, app: &S, email: &str) -> ServiceResponse<B>
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.post(app, "/login", &[("email", email), ("password", PASSWORD)])
            .await
    }

    /// Registers and logs in `username` (`<username>@example.com`).
    pub async fn sign_up<S, B>(&mut self, app: &S, username: &str)
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let email = format!("{}@example.com", username);
        let resp = self.register(app, username, &email).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "registration of {}", username);
        let resp = self.login(app, &email).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login of {}", username);
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ASCII Location header")
        .to_string()
}

pub async fn page<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "page is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    })
}

pub fn flash_messages(page: &Value) -> Vec<String> {
    page["flashes"]
        .as_array()
        .map(|flashes| {
            flashes
                .iter()
                .filter_map(|f| f["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
