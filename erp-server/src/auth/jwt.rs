//! JWT token service
//!
//! Issues and validates HS256 access tokens carrying the user's role,
//! permissions and department.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ISSUER: &str = "erp-server";

/// Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    /// Role name
    pub role: String,
    /// Comma separated permission list
    pub permissions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    expiry_hours: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiry_hours", &self.expiry_hours)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            expiry_hours,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Token lifetime in seconds (returned to the client on login)
    pub fn expires_in(&self) -> i64 {
        self.expiry_hours * 3600
    }

    pub fn generate_token(&self, user: &CurrentUser) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            permissions: user.permissions.join(","),
            department: user.department.clone(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim)
    }
}

/// Authenticated user context (parsed from JWT claims)
///
/// Inserted into request extensions by [`super::require_auth`] and
/// extractable directly in handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub department: Option<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let permissions = claims
            .permissions
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            id: claims.sub.parse()?,
            username: claims.username,
            role: claims.role,
            permissions,
            department: claims.department,
        })
    }
}

impl CurrentUser {
    /// Role `admin` holds every permission
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Checks a permission, honouring `all` and `module:*` wildcards
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }

        self.permissions.iter().any(|p| {
            if p == "all" || p == permission {
                return true;
            }
            match p.strip_suffix(":*") {
                Some(prefix) => permission
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with(':')),
                None => false,
            }
        })
    }

    /// Is the user posted to `department`?
    pub fn works_in(&self, department: &str) -> bool {
        self.department
            .as_deref()
            .is_some_and(|d| shared::models::department::same_department(d, department))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, permissions: &[&str], department: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "press_op".to_string(),
            role: role.to_string(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let service = JwtService::new("test-secret-at-least-32-bytes-long!!", 1);
        let u = user("operator", &["jobs:advance", "reports:view"], Some("CTP"));

        let token = service.generate_token(&u).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.permissions, "jobs:advance,reports:view");
        assert_eq!(claims.department.as_deref(), Some("CTP"));

        let parsed = CurrentUser::try_from(claims).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.permissions.len(), 2);
        assert_eq!(service.expires_in(), 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("secret-one", 1);
        let verifier = JwtService::new("secret-two", 1);
        let token = issuer.generate_token(&user("viewer", &[], None)).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60s leeway
        let service = JwtService::new("secret", -1);
        let token = service.generate_token(&user("viewer", &[], None)).unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_empty_permissions_parse_to_empty_vec() {
        let claims = Claims {
            sub: "3".into(),
            username: "viewer".into(),
            role: "viewer".into(),
            permissions: String::new(),
            department: None,
            exp: 0,
            iat: 0,
            iss: ISSUER.into(),
        };
        assert!(CurrentUser::try_from(claims).unwrap().permissions.is_empty());
    }

    #[test]
    fn test_permission_wildcards() {
        let u = user("manager", &["inventory:*", "jobs:advance"], None);
        assert!(u.has_permission("inventory:manage"));
        assert!(u.has_permission("jobs:advance"));
        assert!(!u.has_permission("jobs:manage"));
        assert!(!u.has_permission("inventoryx:manage"));

        assert!(user("manager", &["all"], None).has_permission("users:manage"));
        assert!(user("admin", &[], None).has_permission("purchasing:approve"));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_works_in_department() {
        let u = user("operator", &[], Some("offset printing"));
        assert!(u.works_in("Offset Printing"));
        assert!(!u.works_in("CTP"));
        assert!(!user("operator", &[], None).works_in("CTP"));
    }
}
