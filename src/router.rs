use crate::{handlers, state::AppState, middleware};
use axum::{error_handling::HandleErrorLayer, http::StatusCode, middleware as axum_middleware, routing::{get, post, put}, BoxError, Router};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use std::time::Duration;

pub fn create_router(state: AppState) -> Router
{
    let common_layer = ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(HandleErrorLayer::new(|_: BoxError| async {StatusCode::REQUEST_TIMEOUT}))
                .layer(TimeoutLayer::new(Duration::from_secs(state.config.timeout_normal)));

    // Flux SSE : ni timeout ni compression.
    let stream_layer = ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

    let public_routes = Router::new()
        .route("/", get(handlers::page_handler::landing_handler))
        .route("/api/health", get(handlers::health::health_check_handler))
        .route("/api/users", post(handlers::auth_handler::register_handler))
        .route("/api/auth/login", post(handlers::auth_handler::login_handler))
        .route("/api/auth/logout", post(handlers::auth_handler::logout_handler))
        .route_layer(common_layer.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth_handler::get_current_user_handler))
        .route("/api/projects", get(handlers::project_handler::list_projects_handler).post(handlers::project_handler::create_project_handler))
        .route("/api/projects/services", post(handlers::project_handler::project_services_handler))
        .route("/api/projects/{project_id}", get(handlers::project_handler::get_project_handler))
        .route("/api/projects/{project_id}/tokens", put(handlers::project_handler::update_tokens_handler))
        .route("/api/projects/{project_id}/dashboard", get(handlers::project_handler::dashboard_handler))
        .route("/api/projects/{project_id}/open/{variant}/{node_id}", get(handlers::project_handler::open_external_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), middleware::auth))
        .route_layer(common_layer.clone());

    let stream_routes = Router::new()
        .route("/api/projects/{project_id}/events", get(handlers::project_handler::dashboard_events_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), middleware::auth))
        .route_layer(stream_layer);

    let page_routes = Router::new()
        .route("/project/{project_id}", get(handlers::page_handler::project_page_handler))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), middleware::session_gate))
        .route_layer(common_layer);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(stream_routes)
        .merge(page_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use axum::{body::Body, http::{header, Request}};
    use tower::ServiceExt; // for `oneshot`
    use crate::{config::Config, services::jwt, state::InnerState};

    fn test_state() -> AppState
    {
        InnerState::new(Config::for_tests())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value
    {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_answers_ok()
    {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn landing_page_is_public()
    {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Botway"));
    }

    #[tokio::test]
    async fn anonymous_visitor_is_redirected_before_any_fetch()
    {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .oneshot(Request::builder().uri("/project/65f0c0ffee65f0c0ffee65f0").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(!state.store.is_connected());
    }

    #[tokio::test]
    async fn forged_session_cookie_is_redirected_too()
    {
        let state = test_state();
        let app = create_router(state.clone());
        let token = jwt::generate_jwt("another-secret", 60, "65f0c0ffee65f0c0ffee65f0", "eve", "Eve", "eve@example.com", false).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/project/65f0c0ffee65f0c0ffee65f0")
                    .header(header::COOKIE, format!("auth_token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!state.store.is_connected());
    }

    #[tokio::test]
    async fn api_routes_answer_401_without_session()
    {
        for uri in ["/api/projects/65f0c0ffee65f0c0ffee65f0/dashboard", "/api/projects/abc/open/service/n1", "/api/projects/abc/events", "/api/auth/me"]
        {
            let response = create_router(test_state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            assert!(response.headers().get(header::LOCATION).is_none());
            assert!(body_json(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn unknown_node_type_is_rejected_before_any_lookup()
    {
        let state = test_state();
        let token = jwt::generate_jwt("test-secret", 60, "65f0c0ffee65f0c0ffee65f0", "alice", "Alice", "alice@example.com", false).unwrap();

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/projects/65f0c0ffee65f0c0ffee65f0/open/database/n1")
                    .header(header::COOKIE, format!("auth_token={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!state.store.is_connected());
    }

    #[tokio::test]
    async fn logout_clears_the_session_cookie()
    {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, "auth_token=whatever")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("auth_token="));
        assert!(cookie.contains("Max-Age=0"));
    }
}
