//! Caller identity extraction
//!
//! Sessions are resolved upstream; the gateway forwards the authenticated
//! user as `x-user-id` and `x-user-role` headers.

use super::error::ApiError;
use crate::types::{Actor, Role, UserId};
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Actor);

impl Caller {
    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn actor(&self) -> &Actor {
        &self.0
    }

    /// Read the caller from the identity headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let id = headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .ok_or_else(|| ApiError::unauthorized("Invalid x-user-id header"))?;

        // A missing role means an ordinary user
        let role = match headers.get(USER_ROLE_HEADER) {
            None => Role::User,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|value| value.parse::<Role>().ok())
                .ok_or_else(|| ApiError::unauthorized("Invalid x-user-role header"))?,
        };

        Ok(Caller(Actor { id, role }))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(*caller);
        }

        let caller = Caller::from_headers(&parts.headers)?;
        parts.extensions.insert(caller);
        Ok(caller)
    }
}

/// Middleware guarding the admin routes
///
/// Non-admin callers get 403 before the handler runs.
pub async fn require_admin(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let caller = Caller::from_headers(req.headers())?;
    if !caller.actor().is_admin() {
        warn!(user_id = caller.id(), uri = %req.uri(), "admin route denied");
        return Err(ApiError::admin_required());
    }

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use rstest::rstest;

    fn headers(id: Option<&'static str>, role: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(id) = id {
            headers.insert(USER_ID_HEADER, HeaderValue::from_static(id));
        }
        if let Some(role) = role {
            headers.insert(USER_ROLE_HEADER, HeaderValue::from_static(role));
        }
        headers
    }

    #[rstest]
    #[case::admin(Some("7"), Some("admin"), Actor::admin(7))]
    #[case::explicit_user(Some("8"), Some("user"), Actor::user(8))]
    #[case::default_role(Some(" 9 "), None, Actor::user(9))]
    fn test_caller_from_headers(
        #[case] id: Option<&'static str>,
        #[case] role: Option<&'static str>,
        #[case] expected: Actor,
    ) {
        assert_eq!(Caller::from_headers(&headers(id, role)).unwrap(), Caller(expected));
    }

    #[rstest]
    #[case::missing_id(None, Some("admin"))]
    #[case::bad_id(Some("abc"), None)]
    #[case::bad_role(Some("1"), Some("root"))]
    fn test_caller_rejects_bad_headers(
        #[case] id: Option<&'static str>,
        #[case] role: Option<&'static str>,
    ) {
        let err = Caller::from_headers(&headers(id, role)).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
