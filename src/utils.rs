use once_cell::sync::Lazy;
use regex::Regex;

// Compiled regexes for attribute and form parsing
static LEADING_INT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const MOBILE_KEYWORDS: [&str; 7] = [
    "mobile",
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "windows phone",
];

/// Parse the leading integer of an attribute or text value, the way markup
/// authors write them ("600", " 42 ", "800ms").
pub fn parse_leading_int(input: &str) -> Option<i64> {
    LEADING_INT_REGEX
        .captures(input)
        .and_then(|c| c[1].parse().ok())
}

/// Positive duration from a `data-speed` attribute. Zero or garbage means
/// "use the default".
pub fn parse_duration_attr(input: Option<&str>) -> Option<f64> {
    input
        .and_then(parse_leading_int)
        .filter(|ms| *ms > 0)
        .map(|ms| ms as f64)
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL_REGEX.is_match(input.trim())
}

/// Checkpoint id an anchor should navigate to, or `None` when the browser
/// should follow the link normally.
pub fn anchor_checkpoint<'a>(href: Option<&'a str>, data_active: Option<&str>) -> Option<&'a str> {
    if data_active == Some("true") {
        return None;
    }
    let href = href?;
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        return None;
    }
    Some(href)
}

/// Horizontal slider offset (percent) for a 1-based card number.
pub fn card_translate_percent(card: &str) -> Option<i64> {
    parse_leading_int(card).map(|n| (n - 1) * -100)
}

/// Multi-signal mobile guess: user agent keywords, or a touch screen on a
/// narrow viewport.
pub fn is_mobile(user_agent: &str, viewport_width: f64, has_touch: bool, width_cutoff: f64) -> bool {
    let ua = user_agent.to_lowercase();
    let ua_mobile = MOBILE_KEYWORDS.iter().any(|k| ua.contains(k));
    let narrow = viewport_width < width_cutoff;
    ua_mobile || (has_touch && narrow)
}
