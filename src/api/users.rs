//! User endpoints behind the bearer guard

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, Json, PrincipalResponse, UpdateUserDto, UserResponse, ValidatedJson,
};
use crate::domain::user::UserId;

/// `?fresh=true` bypasses the user cache
#[derive(Debug, Default, Deserialize)]
pub struct FindUserQuery {
    #[serde(default)]
    pub fresh: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub id: String,
}

/// Routes under `/user`, merged at the root
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/user", get(current).put(update))
        .route("/user/{id_or_email}", get(find).delete(remove))
}

/// GET /user
pub async fn current(RequireUser(claims): RequireUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(claims))
}

/// GET /user/{id_or_email}
pub async fn find(
    State(state): State<AppState>,
    RequireUser(_): RequireUser,
    Path(id_or_email): Path<String>,
    Query(query): Query<FindUserQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let users = state.sessions.users();
    let found = if query.fresh {
        users.find_fresh(&id_or_email).await?
    } else {
        users.find_by_id_or_email(&id_or_email).await?
    };

    let user = found
        .ok_or_else(|| ApiError::not_found(format!("User '{}' not found", id_or_email)))?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /user
pub async fn update(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.sessions.update_profile(&claims, dto.into()).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /user/{id}
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedUserResponse>, ApiError> {
    let id = UserId::parse(&id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let deleted = state.sessions.delete_account(&id, &claims).await?;

    Ok(Json(DeletedUserResponse {
        id: deleted.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{TestApp, login, promote, read_json, register_and_login, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn authorized(method: &str, uri: &str, bearer: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer)
            .header(header::CONTENT_TYPE, "application/json");

        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_current_user_requires_bearer() {
        let TestApp { router, .. } = test_app();

        let response = router
            .oneshot(Request::builder().uri("/user").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_returns_claims() {
        let TestApp { router, .. } = test_app();
        let (bearer, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .oneshot(authorized("GET", "/user", &bearer, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["email"], "alice@x.com");
        assert_eq!(body["roles"], json!(["USER"]));
    }

    #[tokio::test]
    async fn test_find_by_email_and_missing() {
        let TestApp { router, .. } = test_app();
        let (bearer, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let found = router
            .clone()
            .oneshot(authorized("GET", "/user/alice@x.com", &bearer, None))
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        let body = read_json(found).await;
        assert_eq!(body["email"], "alice@x.com");
        assert!(body.get("is_blocked").is_none());

        let fresh = router
            .clone()
            .oneshot(authorized("GET", "/user/alice@x.com?fresh=true", &bearer, None))
            .await
            .unwrap();
        assert_eq!(fresh.status(), StatusCode::OK);

        let missing = router
            .oneshot(authorized("GET", "/user/nobody@x.com", &bearer, None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_own_password() {
        let TestApp { router, .. } = test_app();
        let (bearer, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .clone()
            .oneshot(authorized(
                "PUT",
                "/user",
                &bearer,
                Some(json!({"password": "secret2"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (bearer, _) = login(&router, "alice@x.com", "secret2").await;
        assert!(bearer.starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_update_roles_requires_admin() {
        let TestApp { router, .. } = test_app();
        let (bearer, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .oneshot(authorized(
                "PUT",
                "/user",
                &bearer,
                Some(json!({"roles": ["ADMIN"]})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_blocks_user() {
        let TestApp { router, state } = test_app();
        register_and_login(&router, "bob@x.com", "secret1").await;
        register_and_login(&router, "root@x.com", "secret1").await;
        promote(&state, "root@x.com").await;
        let (admin, _) = login(&router, "root@x.com", "secret1").await;

        let response = router
            .clone()
            .oneshot(authorized(
                "PUT",
                "/user",
                &admin,
                Some(json!({"email": "bob@x.com", "is_blocked": true})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let blocked = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": "bob@x.com", "password": "secret1"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(blocked.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_other_account_is_forbidden() {
        let TestApp { router, .. } = test_app();
        let (bob, _) = register_and_login(&router, "bob@x.com", "secret1").await;
        let (alice, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let bob_view = router
            .clone()
            .oneshot(authorized("GET", "/user", &bob, None))
            .await
            .unwrap();
        let bob_id = read_json(bob_view).await["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(authorized("DELETE", &format!("/user/{}", bob_id), &alice, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let still_there = router
            .oneshot(authorized("GET", "/user/bob@x.com", &alice, None))
            .await
            .unwrap();
        assert_eq!(still_there.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_own_account_revokes_sessions() {
        let TestApp { router, .. } = test_app();
        let (bearer, refresh) = register_and_login(&router, "alice@x.com", "secret1").await;

        let me = router
            .clone()
            .oneshot(authorized("GET", "/user", &bearer, None))
            .await
            .unwrap();
        let id = read_json(me).await["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(authorized("DELETE", &format!("/user/{}", id), &bearer, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["id"], id.as_str());

        let refreshed = router
            .oneshot(
                Request::builder()
                    .uri("/auth/refresh-tokens")
                    .header(header::COOKIE, format!("refreshtoken={}", refresh))
                    .header(header::USER_AGENT, "UA1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(refreshed.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_with_malformed_id() {
        let TestApp { router, .. } = test_app();
        let (bearer, _) = register_and_login(&router, "alice@x.com", "secret1").await;

        let response = router
            .oneshot(authorized("DELETE", "/user/not-a-uuid", &bearer, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
