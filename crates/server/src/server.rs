use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use axum_extra::routing::RouterExt;
use std::sync::Arc;

use crate::{
    admins, attendance, auth, courses, groups, professors, registration, students,
    auth::TokenKeys,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: TokenKeys,
}

/// Resource routes behind the staff gate. Collection paths without the
/// trailing slash redirect to it.
fn staff_routes(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route_with_tsr(
            "/home/students/",
            get(students::list).post(students::create),
        )
        .route(
            "/home/students/{id}/",
            get(students::retrieve)
                .put(students::replace)
                .patch(students::update)
                .delete(students::destroy),
        )
        .route_with_tsr(
            "/home/professors/",
            get(professors::list).post(professors::create),
        )
        .route(
            "/home/professors/{id}/",
            get(professors::retrieve)
                .put(professors::replace)
                .patch(professors::update)
                .delete(professors::destroy),
        )
        .route_with_tsr("/home/courses/", get(courses::list).post(courses::create))
        .route(
            "/home/courses/{id}/",
            get(courses::retrieve)
                .put(courses::replace)
                .patch(courses::update)
                .delete(courses::destroy),
        )
        .route_with_tsr("/home/groups/", get(groups::list).post(groups::create))
        .route(
            "/home/groups/{id}/",
            get(groups::retrieve)
                .put(groups::replace)
                .patch(groups::update)
                .delete(groups::destroy),
        )
        .route_with_tsr(
            "/home/attendance/",
            get(attendance::list).post(attendance::create),
        )
        .route(
            "/home/attendance/{id}/",
            get(attendance::retrieve)
                .put(attendance::replace)
                .patch(attendance::update)
                .delete(attendance::destroy),
        )
        .route(
            "/home/attendance/{id}/update-status/",
            patch(attendance::update_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_staff,
        ))
}

/// Build the application router.
pub fn router(state: ServerState) -> Router {
    let protected = staff_routes(state.clone())
        .route("/admins/", get(admins::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/register/student/", post(registration::student))
        .route("/register/professor/", post(registration::professor))
        .route("/user/token/", post(auth::obtain))
        .route("/user/token/refresh/", post(auth::refresh))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    tokens: TokenKeys,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        tokens,
    };

    axum::serve(listener, router(state)).await
}
