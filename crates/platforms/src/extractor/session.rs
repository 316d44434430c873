use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use reqwest::header::HeaderValue;
use tracing::debug;

/// Cookies captured from an anti-automation challenge.
///
/// Cloning shares the underlying store: every extractor built from the same
/// handle sends the same cookies. Use [`SessionState::new`] for a store that
/// is isolated from everything else.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    cookies: Arc<RwLock<FxHashMap<String, String>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the `name=value` part of each raw `Set-Cookie` header value.
    ///
    /// Attributes (`Path`, `Expires`, ...) are dropped. Returns how many
    /// cookies were stored.
    pub fn store_set_cookies<S: AsRef<str>>(&self, set_cookies: &[S]) -> usize {
        let mut stored = 0;
        let mut cookies = self.cookies.write();

        for raw in set_cookies {
            if let Some(cookie_part) = raw.as_ref().split(';').next()
                && let Some((name, value)) = cookie_part.split_once('=')
            {
                let name = name.trim();
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    continue;
                }
                debug!(cookie = name, "Storing session cookie");
                cookies.insert(name.to_owned(), value.to_owned());
                stored += 1;
            }
        }

        stored
    }

    /// Import cookies in `Cookie` header form (`a=1; b=2`), e.g. copied from a browser.
    pub fn set_cookies_from_string(&self, cookie_string: &str) {
        let mut cookies = self.cookies.write();
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn get_cookie(&self, name: &str) -> Option<String> {
        self.cookies.read().get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.read().is_empty()
    }

    /// `Cookie` request header value, `None` when no cookies are stored.
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }

        let joined = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        match HeaderValue::from_str(&joined) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "Failed to build Cookie header");
                None
            }
        }
    }
}
