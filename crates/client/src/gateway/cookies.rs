//! Cookie jar kept in the session cache.
//!
//! The API's session credential is a cookie. Keeping it next to the cached
//! user lets a restarted process (the CLI, for one) resume the session that
//! `check_auth` restores. Cookies are stored as a JSON `name -> value` map
//! under [`keys::COOKIES`]; the API is a single host, so domain and path
//! attributes are not tracked.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use crate::session_cache::{SessionCache, keys};

/// [`CookieStore`] that reads and writes the session cache on every request.
pub struct CacheCookieJar {
    cache: Arc<dyn SessionCache>,
}

impl CacheCookieJar {
    #[must_use]
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self { cache }
    }

    fn load(&self) -> BTreeMap<String, String> {
        match self.cache.get(keys::COOKIES) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Stored cookies unreadable; ignoring");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored cookies");
                BTreeMap::new()
            }
        }
    }

    fn store(&self, jar: &BTreeMap<String, String>) {
        let result = if jar.is_empty() {
            self.cache.remove(keys::COOKIES)
        } else {
            match serde_json::to_string(jar) {
                Ok(json) => self.cache.set(keys::COOKIES, &json),
                Err(e) => {
                    warn!(error = %e, "Failed to encode cookies");
                    return;
                }
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to store cookies");
        }
    }
}

/// One parsed `Set-Cookie` header.
#[derive(Debug, PartialEq, Eq)]
struct SetCookie {
    name: String,
    value: String,
    expired: bool,
}

fn parse_set_cookie(header: &str, now: DateTime<Utc>) -> Option<SetCookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut expired = false;
    for attribute in parts {
        let Some((key, raw)) = attribute.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "max-age" => expired |= raw.parse::<i64>().is_ok_and(|secs| secs <= 0),
            "expires" => {
                expired |= DateTime::parse_from_rfc2822(raw).is_ok_and(|at| at <= now);
            }
            _ => {}
        }
    }

    Some(SetCookie {
        name: name.to_string(),
        value: value.trim().trim_matches('"').to_string(),
        expired,
    })
}

impl CookieStore for CacheCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        let now = Utc::now();
        let updates: Vec<SetCookie> = cookie_headers
            .filter_map(|header| header.to_str().ok())
            .filter_map(|header| parse_set_cookie(header, now))
            .collect();
        if updates.is_empty() {
            return;
        }

        let mut jar = self.load();
        for cookie in updates {
            debug!(name = %cookie.name, expired = cookie.expired, "Cookie received");
            if cookie.expired || cookie.value.is_empty() {
                jar.remove(&cookie.name);
            } else {
                jar.insert(cookie.name, cookie.value);
            }
        }
        self.store(&jar);
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let jar = self.load();
        if jar.is_empty() {
            return None;
        }
        let header = jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session_cache::MemoryCache;

    fn url() -> Url {
        Url::parse("http://localhost:5000/api/auth/sign-in").unwrap()
    }

    fn receive(jar: &CacheCookieJar, headers: &[&'static str]) {
        let values: Vec<HeaderValue> = headers.iter().map(|h| HeaderValue::from_static(*h)).collect();
        jar.set_cookies(&mut values.iter(), &url());
    }

    #[test]
    fn test_cookies_survive_a_new_jar() {
        let cache: Arc<dyn SessionCache> = Arc::new(MemoryCache::new());
        receive(
            &CacheCookieJar::new(cache.clone()),
            &["token=abc123; Path=/; HttpOnly; SameSite=None; Secure"],
        );

        // A fresh jar over the same cache, as after a restart.
        let restored = CacheCookieJar::new(cache);
        assert_eq!(
            restored.cookies(&url()).unwrap().to_str().unwrap(),
            "token=abc123"
        );
    }

    #[test]
    fn test_expired_cookie_is_dropped() {
        let cache: Arc<dyn SessionCache> = Arc::new(MemoryCache::new());
        let jar = CacheCookieJar::new(cache.clone());
        receive(&jar, &["token=abc123; Path=/", "theme=dark"]);

        receive(&jar, &["token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"]);
        assert_eq!(jar.cookies(&url()).unwrap().to_str().unwrap(), "theme=dark");

        receive(&jar, &["theme=dark; Max-Age=0"]);
        assert!(jar.cookies(&url()).is_none());
        assert_eq!(cache.get(keys::COOKIES).unwrap(), None);
    }

    #[test]
    fn test_parse_set_cookie() {
        let now = Utc::now();
        assert_eq!(
            parse_set_cookie("sid=\"x.y\"; Max-Age=3600", now),
            Some(SetCookie {
                name: "sid".to_string(),
                value: "x.y".to_string(),
                expired: false,
            })
        );
        assert!(parse_set_cookie("garbage", now).is_none());
        assert!(parse_set_cookie("=value", now).is_none());
    }
}
