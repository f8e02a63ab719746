//! Accept-Language negotiation.
//!
//! `"auto"` derives the header from the process locale, the way desktop HTTP
//! stacks do: `de_DE.UTF-8` becomes `de-de, de;q=0.9`.

use std::env;

/// Setting value that asks for the locale-derived header.
pub const AUTO: &str = "auto";

/// Resolve the configured Accept-Language setting to a header value.
///
/// Empty and `"none"` disable the header; anything else is used verbatim.
pub fn accept_language(setting: &str) -> Option<String> {
    match setting.trim() {
        "" | "none" => None,
        AUTO => ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .and_then(|locale| from_locale(&locale)),
        explicit => Some(explicit.to_string()),
    }
}

/// Convert a POSIX locale name into an Accept-Language value.
pub fn from_locale(locale: &str) -> Option<String> {
    // language[_territory][.codeset][@modifier]
    let name = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "C" || name == "POSIX" {
        return None;
    }

    let mut parts = name.splitn(2, '_');
    let language = parts.next()?.to_ascii_lowercase();
    if !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    match parts.next() {
        Some(territory) if !territory.is_empty() => Some(format!(
            "{}-{}, {};q=0.9",
            language,
            territory.to_ascii_lowercase(),
            language
        )),
        _ => Some(language),
    }
}
