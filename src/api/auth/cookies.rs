//! Cookies set by the auth routes

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use time::{Duration, OffsetDateTime};

use crate::api::state::CookiePolicy;
use crate::domain::token::RefreshToken;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshtoken";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the CSRF state of a provider redirect
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

fn to_offset(instant: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(instant.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Carries the refresh token until its own expiry
pub fn refresh_cookie(token: &RefreshToken, policy: CookiePolicy) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token.token().to_string()))
        .http_only(true)
        .secure(policy.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(to_offset(token.exp()))
        .build()
}

/// Overwrites the refresh cookie with an empty, already expired one
pub fn cleared_refresh_cookie(policy: CookiePolicy) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, ""))
        .http_only(true)
        .secure(policy.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .build()
}

pub fn oauth_state_cookie(state: &str, policy: CookiePolicy) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state.to_string()))
        .http_only(true)
        .secure(policy.secure)
        .same_site(SameSite::Lax)
        .path("/auth")
        .max_age(Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .build()
}

pub fn cleared_oauth_state_cookie() -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, ""))
        .path("/auth")
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserId;

    #[test]
    fn test_refresh_cookie_attributes() {
        let exp = Utc::now() + chrono::Duration::hours(12);
        let token = RefreshToken::new("opaque", UserId::generate(), "UA1", exp);

        let cookie = refresh_cookie(&token, CookiePolicy { secure: false });

        assert_eq!(cookie.name(), "refreshtoken");
        assert_eq!(cookie.value(), "opaque");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.expires_datetime().map(|d| d.unix_timestamp()),
            Some(exp.timestamp())
        );
    }

    #[test]
    fn test_secure_only_in_production() {
        let token = RefreshToken::new("t", UserId::generate(), "UA1", Utc::now());

        let cookie = refresh_cookie(&token, CookiePolicy { secure: true });
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_cleared_cookie_is_expired() {
        let cookie = cleared_refresh_cookie(CookiePolicy::default());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
