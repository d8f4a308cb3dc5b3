use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::WebError;

/// Identity resolved by the upstream auth layer. This service never validates
/// credentials itself; the auth collaborator in front of it authenticates the
/// session and forwards the resolved user in trusted headers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

pub fn resolve_user(headers: &HeaderMap) -> Option<CurrentUser> {
    let id = headers.get(USER_ID_HEADER)?.to_str().ok()?;
    let id = Uuid::parse_str(id.trim()).ok()?;

    Some(CurrentUser {
        id,
        email: header_value(headers, USER_EMAIL_HEADER),
        name: header_value(headers, USER_NAME_HEADER),
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Attaches the resolved identity to the request, when present. Never
/// rejects; public endpoints stay anonymous.
pub async fn authenticate(mut req: Request, next: Next) -> Response {
    if let Some(user) = resolve_user(req.headers()) {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

/// Protects routes that require a resolved identity.
pub async fn require_auth(req: Request, next: Next) -> Response {
    if req.extensions().get::<CurrentUser>().is_none() {
        tracing::warn!("Unauthenticated request to protected endpoint");
        return WebError::Unauthorized.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn resolves_full_identity() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("ana@example.com"));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("Ana"));

        let user = resolve_user(&headers).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(user.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn id_alone_is_enough() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        let user = resolve_user(&headers).unwrap();
        assert_eq!(user.id, id);
        assert!(user.email.is_none());
        assert!(user.name.is_none());
    }

    #[test]
    fn missing_or_malformed_id_resolves_to_anonymous() {
        assert!(resolve_user(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(resolve_user(&headers).is_none());
    }

    #[test]
    fn blank_contact_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("  "));

        let user = resolve_user(&headers).unwrap();
        assert!(user.email.is_none());
    }
}
