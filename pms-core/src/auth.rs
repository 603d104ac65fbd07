use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::AppState;
use crate::models::User;

/// Claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Provider-side account id
    pub sub: String,
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: usize,
}

/// Identity asserted by a verified token, before role resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal {
            subject: claims.sub,
            email: claims.email.trim().to_lowercase(),
            display_name: claims.name.filter(|n| !n.trim().is_empty()),
            photo_url: claims.picture.filter(|p| !p.is_empty()),
        }
    }
}

/// Container for the resolved user stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    match header {
        Some(s) if s.starts_with("Bearer ") => Ok(s[7..].trim()),
        _ => Err(AppError::Unauthorized("missing bearer token".to_string())),
    }
}

/// Verifies an HS256 token and returns the principal it names.
pub fn decode_principal(token: &str, secret: &str) -> Result<Principal, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let claims = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?
        .claims;

    if claims.email.trim().is_empty() {
        return Err(AppError::Unauthorized("token carries no email".to_string()));
    }
    Ok(Principal::from(claims))
}

/// Middleware to validate a Bearer JWT in the `Authorization` header.
///
/// On success the resolved user is attached to the request as
/// [`CurrentUser`]; on failure a `401` is returned.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;
    let principal = decode_principal(token, &state.config.jwt_secret)?;

    let user = state.workspace.resolve_user(&principal).await;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Rejects callers without the admin role.
pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("administrator role required".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "k7Qw2mZ9vL4xR8tY";

    pub(crate) fn token_for(email: &str, name: Option<&str>, secret: &str) -> String {
        let claims = Claims {
            sub: "acct-1".to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            picture: None,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(bearer_token(Some("Basic abc")).is_err());
        assert!(bearer_token(None).is_err());
    }

    #[test]
    fn test_decode_principal() {
        let token = token_for("Ken@Firm.tw", Some("Ken"), TEST_SECRET);
        let principal = decode_principal(&token, TEST_SECRET).unwrap();
        assert_eq!(principal.email, "ken@firm.tw");
        assert_eq!(principal.display_name.as_deref(), Some("Ken"));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = token_for("ken@firm.tw", None, "another-key-9Z");
        assert!(matches!(
            decode_principal(&token, TEST_SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let claims = Claims {
            sub: "acct-1".to_string(),
            email: "ken@firm.tw".to_string(),
            name: None,
            picture: None,
            exp: 1_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();
        assert!(decode_principal(&token, TEST_SECRET).is_err());
    }
}
