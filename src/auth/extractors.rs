use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use super::claims::Claims;
use super::jwt::SessionKeys;
use crate::error::AppError;

/// Verified session of the caller.
///
/// The token comes from `Authorization: Bearer <token>`, or from the session
/// cookie when no such header is present.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts, keys.cookie_name()))
            .ok_or_else(|| AppError::Unauthenticated("missing session token".into()))?;

        let claims = keys.verify(&token).map_err(|e| {
            warn!("invalid or expired token");
            e
        })?;
        Ok(AuthUser(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let auth = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(parts: &Parts, name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut req = Request::builder();
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn header_wins_over_cookie() {
        let p = parts(&[("authorization", "Bearer abc"), ("cookie", "wrenchturn-jwt=def")]);
        assert_eq!(bearer_token(&p).as_deref(), Some("abc"));
        assert_eq!(cookie_token(&p, "wrenchturn-jwt").as_deref(), Some("def"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let p = parts(&[("cookie", "theme=dark; wrenchturn-jwt=tok; lang=en")]);
        assert_eq!(bearer_token(&p), None);
        assert_eq!(cookie_token(&p, "wrenchturn-jwt").as_deref(), Some("tok"));
        assert_eq!(cookie_token(&p, "missing"), None);
    }

    #[test]
    fn emptied_cookie_is_no_token() {
        let p = parts(&[("cookie", "wrenchturn-jwt=")]);
        assert_eq!(cookie_token(&p, "wrenchturn-jwt"), None);
    }
}
