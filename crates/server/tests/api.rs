use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, NewIdentity};
use server::{ServerState, TokenKeys, router};

async fn app_with_engine() -> (Router, Arc<Engine>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let app = router(ServerState {
        engine: engine.clone(),
        tokens: TokenKeys::new("test-secret", 300, 86_400),
    });
    (app, engine)
}

async fn app() -> Router {
    app_with_engine().await.0
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn user(email: &str) -> Value {
    json!({
        "email": email,
        "first_name": "Test",
        "last_name": "Person",
        "password": "password",
    })
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/user/token/",
        None,
        Some(json!({"username": username, "password": "password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access"].as_str().unwrap().to_string()
}

async fn professor_token(app: &Router) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/register/professor/",
        None,
        Some(json!({"user": user("p@esi-sba.dz"), "module": "Math"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, "p").await
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app().await;
    for uri in [
        "/home/students/",
        "/home/courses/?module=Math",
        "/home/attendance/",
        "/admins/",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(
            body,
            json!({"detail": "Authentication credentials were not provided."})
        );
    }

    let (status, _) = send(&app, Method::GET, "/home/groups/", Some("forged.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_are_forbidden_from_staff_routes() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/register/student/",
        None,
        Some(json!({"user": user("s@gmail.com"), "student_group_id": null})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["full_name"], "Test Person");
    let token = login(&app, "s@gmail.com").await;

    let (status, body) = send(&app, Method::GET, "/home/groups/", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["detail"],
        "You do not have permission to perform this action."
    );

    let (status, body) = send(&app, Method::GET, "/admins/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn registration_validates_email() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/register/professor/",
        None,
        Some(json!({"user": user("p@yahoo.com"), "module": "Math"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["email"],
        json!(["Email must end with @esi-sba.dz or @gmail.com"])
    );

    professor_token(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/register/student/",
        None,
        Some(json!({"user": user("p@esi-sba.dz")})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["email"], json!(["This email is already registered."]));
}

#[tokio::test]
async fn token_refresh_issues_a_new_access_token() {
    let app = app().await;
    professor_token(&app).await;
    let (_, pair) = send(
        &app,
        Method::POST,
        "/user/token/",
        None,
        Some(json!({"username": "p", "password": "password"})),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/user/token/refresh/",
        None,
        Some(json!({"refresh": pair["refresh"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap();
    let (status, _) = send(&app, Method::GET, "/home/groups/", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/user/token/refresh/",
        None,
        Some(json!({"refresh": pair["access"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token is invalid or expired");

    let (status, body) = send(
        &app,
        Method::POST,
        "/user/token/",
        None,
        Some(json!({"username": "p", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["detail"],
        "No active account found with the given credentials"
    );
}

#[tokio::test]
async fn course_listing_filters_by_section_and_professor() {
    let app = app().await;
    let token = professor_token(&app).await;
    send(
        &app,
        Method::POST,
        "/register/professor/",
        None,
        Some(json!({"user": user("q@esi-sba.dz"), "module": "Physics"})),
    )
    .await;

    let (_, a) = send(
        &app,
        Method::POST,
        "/home/groups/",
        Some(&token),
        Some(json!({"name": "G1", "section": "A"})),
    )
    .await;
    let (_, b) = send(
        &app,
        Method::POST,
        "/home/groups/",
        Some(&token),
        Some(json!({"name": "G2", "section": "B"})),
    )
    .await;

    for (code, professor_id, group) in [("C1", 1, &a), ("C2", 1, &b), ("C3", 2, &a)] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/home/courses/",
            Some(&token),
            Some(json!({
                "name": format!("Course {code}"),
                "code": code,
                "professor_id": professor_id,
                "group_id": group["id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/home/courses/?section_name=A&professor_email=p@esi-sba.dz",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["C1"]);
    assert_eq!(body[0]["professor"]["user"]["email"], "p@esi-sba.dz");

    let (status, repeated) = send(
        &app,
        Method::GET,
        "/home/courses/?section_name=B&section_name=A&professor_email=p@esi-sba.dz",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{repeated}");
    assert_eq!(repeated, body);
    assert_eq!(body[0]["group"]["section"], "A");

    let (status, body) = send(
        &app,
        Method::POST,
        "/home/courses/",
        Some(&token),
        Some(json!({"name": "Dup", "code": "C1", "professor_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!(["course with this code already exists."]));
    let (_, all) = send(&app, Method::GET, "/home/courses/", Some(&token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn attendance_status_update() {
    let app = app().await;
    let token = professor_token(&app).await;
    let (_, student) = send(
        &app,
        Method::POST,
        "/home/students/",
        Some(&token),
        Some(json!({"user": user("s@gmail.com"), "student_group_id": null})),
    )
    .await;
    let (_, course) = send(
        &app,
        Method::POST,
        "/home/courses/",
        Some(&token),
        Some(json!({"name": "Algebra", "code": "ALG", "professor_id": 1})),
    )
    .await;
    let (status, record) = send(
        &app,
        Method::POST,
        "/home/attendance/",
        Some(&token),
        Some(json!({
            "student_id": student["id"],
            "course_id": course["id"],
            "time": "2025-04-20T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["present_status"], "Absent");
    let uri = format!("/home/attendance/{}/update-status/", record["id"]);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"present_status": "Present"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["present_status"], "Present");
    assert_eq!(updated["time"], record["time"]);
    assert_eq!(updated["student"], record["student"]);
    assert_eq!(updated["course"], record["course"]);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "present_status is required.");
    let (status, _) = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = send(
        &app,
        Method::GET,
        &format!("/home/attendance/{}/", record["id"]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(current["present_status"], "Present");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/home/attendance/999/update-status/",
        Some(&token),
        Some(json!({"present_status": "Present"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::GET,
        "/home/attendance/?course_id=abc",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["course_id"], json!(["Enter a number."]));
}

#[tokio::test]
async fn deleting_a_student_removes_its_account() {
    let app = app().await;
    let token = professor_token(&app).await;
    let (_, student) = send(
        &app,
        Method::POST,
        "/home/students/",
        Some(&token),
        Some(json!({"user": user("s@gmail.com"), "student_group_id": null})),
    )
    .await;
    let uri = format!("/home/students/{}/", student["id"]);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"user": {"last_name": "Renamed"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["user"]["full_name"], "Test Renamed");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/user/token/",
        None,
        Some(json!({"username": "s", "password": "password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn collection_paths_without_trailing_slash_redirect() {
    let app = app().await;
    let token = professor_token(&app).await;
    for (uri, location) in [
        ("/home/students", "/home/students/"),
        ("/home/professors", "/home/professors/"),
        ("/home/courses?module=Math", "/home/courses/?module=Math"),
        ("/home/groups", "/home/groups/"),
        ("/home/attendance", "/home/attendance/"),
    ] {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.status().is_redirection(), "{uri}");
        assert_eq!(response.headers()[header::LOCATION], location);
    }
}

#[tokio::test]
async fn admins_are_listed_with_the_identity_shape() {
    let (app, engine) = app_with_engine().await;
    engine
        .create_admin(NewIdentity {
            email: "root@esi-sba.dz".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Root".to_string(),
            password: Some("password".to_string()),
        })
        .await
        .unwrap();
    let token = login(&app, "root").await;

    let (status, body) = send(&app, Method::GET, "/admins/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "email": "root@esi-sba.dz",
            "first_name": "Ada",
            "last_name": "Root",
            "full_name": "Ada Root",
        }])
    );
}
