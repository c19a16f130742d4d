//! Find URLs embedded in raw message text.

use regex::Regex;

static URL_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s<>"'`]+"#).unwrap()
});

/// Characters that usually close the surrounding sentence rather than the URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '*', '_', '~', '|'];

/// Extract every http(s) URL from `text`, in order of appearance.
///
/// Duplicates are kept; each occurrence becomes its own embed. Trailing
/// punctuation is trimmed unless it balances an opening bracket in the URL
/// (`https://en.wikipedia.org/wiki/Rust_(language)`).
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| trim_trailing(m.as_str()).to_string())
        .filter(|url| url.contains("://") && !url.ends_with("://"))
        .collect()
}

fn trim_trailing(mut url: &str) -> &str {
    while let Some(last) = url.chars().last() {
        if !TRAILING_PUNCTUATION.contains(&last) {
            break;
        }
        if last == ')' && url.matches('(').count() >= url.matches(')').count() {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

/// The last path segment of `url`, used as the embed's original name.
///
/// Empty when the URL points at a directory or a bare host.
#[must_use]
pub fn original_name(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
        Err(_) => {
            let without_query = url.split(['?', '#']).next().unwrap_or(url);
            without_query
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    }
}
