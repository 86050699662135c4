//! Request identity: the browser strings and content negotiation headers
//! the provider adapters send

use crate::locales::Locale;
use rand::seq::SliceRandom;

/// Desktop browser that the HTML providers serve their full result markup to
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";

/// Legacy desktop user agent; some providers answer it with plain HTML
/// instead of a script-rendered page
pub const LEGACY_USER_AGENT: &str = "Mozilla/5.0 (MSIE 10.0; Windows NT 6.1; Trident/5.0)";

/// Desktop identities a client may start with when none is configured.
/// Every entry must get server-rendered results from the HTML providers.
const DESKTOP_POOL: &[&str] = &[
    DESKTOP_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36",
];

/// Accept header for the HTML result pages
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept header for the JSON APIs
pub const ACCEPT_JSON: &str = "application/json,text/javascript,*/*;q=0.01";

/// Pick the identity a client presents for its lifetime
pub fn desktop_user_agent() -> &'static str {
    DESKTOP_POOL
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DESKTOP_USER_AGENT)
}

/// Accept-Language value preferring the locale, then its bare language,
/// then English
pub fn accept_language(locale: Locale) -> String {
    let mut ranges = vec![locale.tag().to_string()];
    if locale.region().is_some() {
        ranges.push(format!("{};q=0.9", locale.language()));
    }
    if locale.language() != "en" {
        ranges.push("en;q=0.8".to_string());
    }
    ranges.join(",")
}
