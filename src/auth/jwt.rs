use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, Identity};
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// A freshly signed token plus the cookie that delivers it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: Claims,
    pub expires_at: OffsetDateTime,
    pub cookie: Cookie<'static>,
}

/// Signing material and session policy, shared by handlers and the extractor.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    refresh_window: Duration,
    cookie_name: String,
    cookie_domain: String,
    cookie_secure: bool,
}

impl SessionKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::hours(cfg.ttl_hours),
            refresh_window: Duration::hours(cfg.refresh_window_hours),
            cookie_name: cfg.cookie_name.clone(),
            cookie_domain: cfg.cookie_domain.clone(),
            cookie_secure: cfg.cookie_secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Signs a token for `identity` expiring one TTL from now.
    pub fn issue(&self, identity: &Identity) -> AppResult<IssuedSession> {
        let now = OffsetDateTime::now_utc();
        self.sign(identity, now, now + self.ttl)
    }

    fn sign(
        &self,
        identity: &Identity,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> AppResult<IssuedSession> {
        let claims = Claims {
            sub: identity.id,
            username: identity.username.clone(),
            is_admin: identity.is_admin,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("sign jwt: {e}")))?;
        debug!(user_id = identity.id, exp = claims.exp, "jwt signed");

        let cookie = self.cookie(token.clone(), expires_at);
        Ok(IssuedSession { token, claims, expires_at, cookie })
    }

    /// Any failure (bad signature, wrong algorithm, malformed, expired) is
    /// reported as [`AppError::Unauthenticated`].
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::Unauthenticated("invalid or expired token".into())
        })?;
        Ok(data.claims)
    }

    /// Re-issues a session for verified `claims`.
    ///
    /// Without `force`, nothing happens unless the token expires within the
    /// refresh window. A re-issued token always expires strictly later than
    /// the one it replaces.
    pub fn refresh(&self, claims: &Claims, force: bool) -> AppResult<Option<IssuedSession>> {
        let now = OffsetDateTime::now_utc();
        let remaining = claims.exp - now.unix_timestamp();
        if remaining <= 0 {
            return Err(AppError::Unauthenticated("token expired".into()));
        }
        if !force && remaining > self.refresh_window.whole_seconds() {
            debug!(user_id = claims.sub, remaining, "refresh not due");
            return Ok(None);
        }

        let mut expires_at = now + self.ttl;
        if expires_at.unix_timestamp() <= claims.exp {
            expires_at = OffsetDateTime::from_unix_timestamp(claims.exp + 1)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("expiry out of range: {e}")))?;
        }
        self.sign(&claims.identity(), now, expires_at).map(Some)
    }

    /// Verifies `token` and then refreshes it.
    pub fn refresh_token(&self, token: &str, force: bool) -> AppResult<Option<IssuedSession>> {
        let claims = self.verify(token).map_err(|e| {
            warn!("refresh attempted with invalid token");
            e
        })?;
        self.refresh(&claims, force)
    }

    /// Cookie that makes the client discard its session.
    pub fn revoke_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(String::new(), OffsetDateTime::UNIX_EPOCH);
        cookie.set_max_age(Duration::ZERO);
        cookie
    }

    fn cookie(&self, value: String, expires: OffsetDateTime) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .expires(expires)
            .http_only(true)
            .same_site(SameSite::None)
            .secure(self.cookie_secure)
            .build();
        if !self.cookie_domain.is_empty() {
            cookie.set_domain(self.cookie_domain.clone());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 120,
            refresh_window_hours: 24,
            cookie_name: "wrenchturn-jwt".into(),
            cookie_domain: "example.test".into(),
            cookie_secure: true,
        })
    }

    fn identity() -> Identity {
        Identity {
            id: 7,
            username: "mechanic".into(),
            is_admin: false,
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = keys("dev-secret");
        let session = keys.issue(&identity()).expect("issue");
        let claims = keys.verify(&session.token).expect("verify");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "mechanic");
        assert!(!claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 120 * 3600);
        assert_eq!(session.expires_at.unix_timestamp(), claims.exp);
    }

    #[test]
    fn verify_rejects_other_key() {
        let token = keys("one").issue(&identity()).unwrap().token;
        let err = keys("two").verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn verify_rejects_garbage_and_expired() {
        let keys = keys("dev-secret");
        assert!(matches!(keys.verify("not.a.jwt"), Err(AppError::Unauthenticated(_))));

        let past = OffsetDateTime::now_utc() - Duration::hours(2);
        let expired = keys.sign(&identity(), past, past + Duration::hours(1)).unwrap();
        assert!(matches!(keys.verify(&expired.token), Err(AppError::Unauthenticated(_))));
        assert!(matches!(
            keys.refresh_token(&expired.token, true),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn refresh_outside_window_is_a_no_op() {
        let keys = keys("dev-secret");
        let session = keys.issue(&identity()).unwrap();
        assert!(keys.refresh_token(&session.token, false).unwrap().is_none());
    }

    #[test]
    fn refresh_inside_window_extends_expiry() {
        let keys = keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let near = keys.sign(&identity(), now, now + Duration::hours(1)).unwrap();
        let fresh = keys
            .refresh_token(&near.token, false)
            .unwrap()
            .expect("due for refresh");
        assert!(fresh.claims.exp > near.claims.exp);
        assert_eq!(keys.verify(&fresh.token).unwrap().sub, 7);
    }

    #[test]
    fn forced_refresh_always_moves_expiry_forward() {
        let keys = keys("dev-secret");
        let session = keys.issue(&identity()).unwrap();
        let forced = keys.refresh(&session.claims, true).unwrap().expect("forced");
        assert!(forced.claims.exp > session.claims.exp);
        assert_eq!(forced.claims.username, session.claims.username);
    }

    #[test]
    fn cookie_envelope_attributes() {
        let keys = keys("dev-secret");
        let session = keys.issue(&identity()).unwrap();
        let cookie = &session.cookie;
        assert_eq!(cookie.name(), "wrenchturn-jwt");
        assert_eq!(cookie.value(), session.token);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.test"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(session.claims.exp)
        );
    }

    #[test]
    fn revoke_cookie_is_already_expired() {
        let cookie = keys("dev-secret").revoke_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        let header = cookie.to_string();
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(header.contains("Max-Age=0"));
    }
}
