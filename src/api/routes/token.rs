//! Access token endpoint.
//!
//! GET /token mints a room access token for a participant identity. The
//! response pairs the signed credential with the LiveKit server URL so a
//! client can connect without any further configuration.

use crate::api::error::{ApiError, ApiResult};
use crate::token::{IssuedToken, TokenIssuer};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

/// Query parameters for the token endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct TokenQueryParams {
    /// Participant identity the token is issued to (required).
    pub identity: Option<String>,
    /// Room the grant is scoped to (optional).
    pub room: Option<String>,
}

/// Create the token router.
pub fn router(issuer: TokenIssuer) -> Router {
    Router::new()
        .route("/token", get(mint_token))
        .with_state(issuer)
}

/// GET /token - Mint a room access token.
///
/// Responds 400 when the identity query parameter is missing or empty.
async fn mint_token(
    Query(params): Query<TokenQueryParams>,
    State(issuer): State<TokenIssuer>,
) -> ApiResult<Json<IssuedToken>> {
    let identity = match params.identity.as_deref() {
        Some(identity) if !identity.is_empty() => identity,
        _ => return Err(ApiError::bad_request("Missing identity query parameter")),
    };

    let issued = issuer
        .issue(identity, params.room.as_deref())
        .map_err(ApiError::from)?;

    info!(
        "Issued token for {} (room: {})",
        identity,
        params.room.as_deref().unwrap_or("any")
    );
    Ok(Json(issued))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let issuer =
            TokenIssuer::new("wss://example.livekit.cloud", "devkey", "devsecret-devsecret")
                .unwrap();
        router(issuer)
    }

    async fn request(uri: &str) -> axum::response::Response {
        test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_token_requires_identity() {
        let response = request("/token?room=demo").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_token_rejects_empty_identity() {
        let response = request("/token?identity=&room=demo").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_token_response_shape() {
        let response = request("/token?identity=alice&room=demo").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["livekitUrl"], "wss://example.livekit.cloud");
        let token = body["token"].as_str().unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_token_room_is_optional() {
        let response = request("/token?identity=alice").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
