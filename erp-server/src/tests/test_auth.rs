use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use shared::models::{RoleCreate, RoleUpdate};
use tower::ServiceExt;

async fn list_users(app: &axum::Router, token: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/users")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

#[tokio::test]
async fn test_live_tokens_follow_account_changes() {
    let Some(state) = test_state().await else { return };
    let Some(config) = test_config() else { return };
    let app = crate::api::router(state.clone(), &config);

    let role = db::roles::create(
        &state.pool,
        &RoleCreate {
            name: unique("clerk"),
            description: None,
            permissions: vec!["reports:view".to_string()],
        },
    )
    .await
    .unwrap();
    let user = user_with_role(&state, role.id).await;
    let token = state.jwt.generate_token(&user).unwrap();

    let (status, body) = list_users(&app, &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["details"]["permission"], "users:manage");

    // Granted without a new login
    db::roles::update(
        &state.pool,
        role.id,
        &RoleUpdate {
            permissions: Some(vec!["users:manage".to_string()]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (status, _) = list_users(&app, &token).await;
    assert_eq!(status, StatusCode::OK);

    // Disabled before the token expires
    db::users::deactivate(&state.pool, user.id).await.unwrap();
    let (status, body) = list_users(&app, &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);
}

#[tokio::test]
async fn test_disabled_role_locks_out_its_users() {
    let Some(state) = test_state().await else { return };
    let Some(config) = test_config() else { return };
    let app = crate::api::router(state.clone(), &config);

    let role = db::roles::create(
        &state.pool,
        &RoleCreate {
            name: unique("temp"),
            description: None,
            permissions: vec!["users:manage".to_string()],
        },
    )
    .await
    .unwrap();
    let user = user_with_role(&state, role.id).await;
    let token = state.jwt.generate_token(&user).unwrap();
    assert_eq!(list_users(&app, &token).await.0, StatusCode::OK);

    db::roles::update(
        &state.pool,
        role.id,
        &RoleUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (status, body) = list_users(&app, &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);
}
