//! LiveKit access token issuance.
//!
//! Tokens grant full participant capabilities (publish, subscribe, data,
//! room join and room create) for a bounded session, optionally scoped to
//! a single room. Signing is delegated to the SDK's own server crate.

use anyhow::{anyhow, Context, Result};
use livekit_api::access_token::{AccessToken, VideoGrants};
use serde::Serialize;
use std::time::Duration;

/// Max period a participant is allowed to be in a room (4 hours).
pub const MAX_ALLOWED_SESSION_DURATION: Duration = Duration::from_secs(14_400);

/// A signed credential plus the server URL the client should connect to.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(rename = "livekitUrl")]
    pub livekit_url: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    livekit_url: String,
    api_key: String,
    api_secret: String,
}

impl TokenIssuer {
    pub fn new(livekit_url: &str, api_key: &str, api_secret: &str) -> Result<Self> {
        if livekit_url.is_empty() {
            return Err(anyhow!(
                "LiveKit server URL is not configured (set LIVEKIT_URL or edit the config file)"
            ));
        }
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(anyhow!(
                "LiveKit API credentials are not configured (set LIVEKIT_KEY and LIVEKIT_SECRET or edit the config file)"
            ));
        }

        Ok(Self {
            livekit_url: livekit_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    /// Sign an access token for `identity`, optionally scoped to `room`.
    pub fn issue(&self, identity: &str, room: Option<&str>) -> Result<IssuedToken> {
        let grants = VideoGrants {
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            room_join: true,
            room_create: true,
            room: room.unwrap_or_default().to_string(),
            ..Default::default()
        };

        let token = AccessToken::with_api_key(&self.api_key, &self.api_secret)
            .with_identity(identity)
            .with_ttl(MAX_ALLOWED_SESSION_DURATION)
            .with_grants(grants)
            .to_jwt()
            .context("Failed to sign access token")?;

        Ok(IssuedToken {
            token,
            livekit_url: self.livekit_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::new("wss://example.livekit.cloud", "devkey", "devsecret-devsecret").unwrap()
    }

    fn decode_claims(jwt: &str) -> serde_json::Value {
        let payload = jwt.split('.').nth(1).expect("JWT has a payload segment");
        let bytes = URL_SAFE_NO_PAD.decode(payload).expect("payload is base64url");
        serde_json::from_slice(&bytes).expect("payload is JSON")
    }

    #[test]
    fn test_issue_signs_identity_and_grants() {
        let issued = test_issuer().issue("alice", Some("demo")).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);

        let claims = decode_claims(&issued.token);
        assert_eq!(claims["iss"], "devkey");
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["video"]["roomJoin"], true);
        assert_eq!(claims["video"]["roomCreate"], true);
        assert_eq!(claims["video"]["canPublish"], true);
        assert_eq!(claims["video"]["canSubscribe"], true);
        assert_eq!(claims["video"]["canPublishData"], true);
        assert_eq!(claims["video"]["room"], "demo");
    }

    #[test]
    fn test_issue_bounds_session_duration() {
        let issued = test_issuer().issue("alice", None).unwrap();
        let claims = decode_claims(&issued.token);

        let ttl = claims["exp"].as_i64().unwrap() - claims["nbf"].as_i64().unwrap();
        assert!(
            (14_399..=14_401).contains(&ttl),
            "unexpected session ttl: {ttl}"
        );
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(TokenIssuer::new("", "devkey", "devsecret").is_err());
        assert!(TokenIssuer::new("wss://example.livekit.cloud", "", "devsecret").is_err());
        assert!(TokenIssuer::new("wss://example.livekit.cloud", "devkey", "").is_err());
    }

    #[test]
    fn test_wire_shape_uses_livekit_url_key() {
        let issued = test_issuer().issue("alice", None).unwrap();
        let value = serde_json::to_value(&issued).unwrap();

        assert!(value.get("token").is_some());
        assert!(value.get("livekitUrl").is_some());
        assert!(value.get("livekit_url").is_none());
    }
}
