//! Common API utilities and shared types

use axum::http::{header, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::api::middleware::SESSION_COOKIE;
use crate::models::ListParams;

// ============================================================================
// Pagination
// ============================================================================

pub fn default_page() -> u32 {
    1
}

/// Default page size for public APIs
pub fn default_page_size() -> u32 {
    10
}

/// Default page size for admin APIs
pub fn default_admin_page_size() -> u32 {
    20
}

/// Public pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub per_page: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct AdminPaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_admin_page_size")]
    pub per_page: u32,
}

impl AdminPaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

// ============================================================================
// Session cookie
// ============================================================================

/// `Set-Cookie` header carrying a session token
pub fn session_cookie(token: &str, days: i64) -> HeaderMap {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        days.max(0) * 24 * 60 * 60
    );
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

/// `Set-Cookie` header that clears the session
pub fn clear_session_cookie() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.params(), ListParams::new(1, 10));

        let admin: AdminPaginationQuery = serde_json::from_str(r#"{"page":0,"per_page":500}"#).unwrap();
        assert_eq!(admin.params(), ListParams::new(1, 100));
    }

    #[test]
    fn test_session_cookie() {
        let headers = session_cookie("abc", 14);
        let value = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.starts_with("session=abc;"));
        assert!(value.contains("Max-Age=1209600"));

        let cleared = clear_session_cookie();
        assert!(cleared
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }
}
