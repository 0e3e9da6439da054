use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use std::sync::Arc;
use course_booking_api::application::schema_service::SchemaService;
use course_booking_api::domain::user::{CreateUser, LoginRequest, User};
use course_booking_api::infrastructure::security::generate_token;
use course_booking_api::presentation::handlers::{AppState, not_found};
use course_booking_api::presentation::middleware::{JwtAuthMiddleware, SESSION_COOKIE};
use course_booking_api::presentation::routes::configure_routes;

const JWT_SECRET: &str = "test-secret-key-for-auth-tests";

macro_rules! setup_auth_test {
    () => {{
        let schemas = Arc::new(SchemaService::bundled().unwrap());
        let state = web::Data::new(AppState::in_memory(JWT_SECRET.to_string(), schemas));

        test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(JwtAuthMiddleware::new(JWT_SECRET))
                .service(web::scope("/api/v1").configure(configure_routes))
                .default_service(web::to(not_found)),
        )
        .await
    }};
}

fn signup(name: &str, is_lecturer: bool) -> CreateUser {
    CreateUser {
        username: name.to_string(),
        password: "password123".to_string(),
        is_lecturer,
    }
}

fn credentials(name: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: name.to_string(),
        password: password.to_string(),
    }
}

#[actix_web::test]
async fn test_full_registration_login_flow() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("002", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let profile: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(profile["name"], "002");
    assert_eq!(profile["isLecturer"], true);
    assert!(profile.get("password_hash").is_none());
    assert!(profile.get("passwordHash").is_none());
    let user_id = profile["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(credentials("002", "password123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie")
        .into_owned();
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.path(), Some("/"));

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], user_id.as_str());
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(cookie.value(), token);

    // The cookie alone authenticates
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .cookie(Cookie::new(SESSION_COOKIE, token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(me["id"], user_id.as_str());

    // And so does the bearer header
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(("Authorization", format!("bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_register_duplicate_username() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("001", false))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("001", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_register_rejects_body_not_matching_schema() {
    let app = setup_auth_test!();

    for body in [
        serde_json::json!({ "username": "001" }),
        serde_json::json!({ "username": "001", "password": "pw" }),
        serde_json::json!({ "username": "001", "password": "password", "admin": true }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[actix_web::test]
async fn test_login_with_wrong_password() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("001", false))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(credentials("001", "wrong"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(credentials("nobody", "password123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_when_already_logged_in() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("001", false))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(credentials("001", "password123"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(credentials("001", "password123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_login_with_stale_cookie_issues_new_session() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(signup("001", false))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .cookie(Cookie::new(SESSION_COOKIE, "expired.or.garbage"))
        .set_json(credentials("001", "password123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_me_requires_valid_token() {
    let app = setup_auth_test!();

    let req = test::TestRequest::get().uri("/api/v1/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let foreign = generate_token(
        &User {
            id: "someone".to_string(),
            name: "someone".to_string(),
            is_lecturer: false,
            password_hash: String::new(),
        },
        "another-secret",
    )
    .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(("Authorization", format!("Bearer {}", foreign)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_me_for_unknown_user_is_unauthorized() {
    let app = setup_auth_test!();

    let token = generate_token(
        &User {
            id: "ghost".to_string(),
            name: "ghost".to_string(),
            is_lecturer: false,
            password_hash: String::new(),
        },
        JWT_SECRET,
    )
    .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_health_and_unknown_route() {
    let app = setup_auth_test!();

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get().uri("/api/v1/nothing-here").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(test::read_body(resp).await.is_empty());
}
