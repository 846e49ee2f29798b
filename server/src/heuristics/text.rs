//! Text cleanup and extraction helpers

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static QUOTED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)From:.*?Subject:.*?\n").expect("header pattern"));
static SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^--[ \t]*\r?\n.*").expect("signature pattern"));
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("url pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});

/// Normalize a mail body or note for analysis.
///
/// Removes markup, quoted `From: ... Subject:` headers, everything after a
/// `--` signature line, and URLs, then collapses whitespace. Headers and
/// signatures are stripped before whitespace is collapsed since both are
/// line-anchored.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = HTML_TAG.replace_all(text, "");
    let text = QUOTED_HEADER.replace_all(&text, "");
    let text = SIGNATURE.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// First `max_chars` characters, with `...` appended when anything was cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn extract_email_addresses(text: &str) -> Vec<String> {
    EMAIL.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_urls(text: &str) -> Vec<String> {
    URL.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Jaccard similarity over lowercase whitespace-separated words
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let words_a: HashSet<&str> = a_lower.split_whitespace().collect();
    let words_b: HashSet<&str> = b_lower.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Human-readable byte count ("0 B", "1.0 KB", "3.2 GB")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Mask all but the first and last two characters, for log output
pub fn mask_sensitive(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() < 4 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup() {
        assert_eq!(clean_text("<p>Hello <b>world</b>!</p>"), "Hello world!");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n\t "), "");
    }

    #[test]
    fn test_clean_text_strips_signature_and_urls() {
        let body = "Hi team,\n\nDocs at https://example.com/spec?id=4 are final.\n\n-- \nJane Doe\nHead of Ops";
        assert_eq!(clean_text(body), "Hi team, Docs at are final.");
    }

    #[test]
    fn test_clean_text_keeps_dashes_outside_signature_line() {
        let ruled = "Q3 numbers are in:\n----------\nRevenue up 20 percent.";
        assert_eq!(clean_text(ruled), "Q3 numbers are in: ---------- Revenue up 20 percent.");

        let trailing = "We can meet at 3pm --\nlet me know if the agenda works.";
        assert_eq!(clean_text(trailing), "We can meet at 3pm -- let me know if the agenda works.");

        let crlf = "Thanks,\r\n--\r\nJane";
        assert_eq!(clean_text(crlf), "Thanks,");
    }

    #[test]
    fn test_clean_text_strips_quoted_header() {
        let body = "Sounds good.\nFrom: a@example.com\nSent: Monday\nSubject: Re: plan\nOriginal text";
        assert_eq!(clean_text(body), "Sounds good. Original text");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_extract_email_addresses() {
        let emails = extract_email_addresses("Contact us at support@example.com or admin@test.org");
        assert_eq!(emails, vec!["support@example.com", "admin@test.org"]);
    }

    #[test]
    fn test_extract_urls() {
        let urls = extract_urls("see https://a.example/x and http://b.example.");
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://a.example/x");
    }

    #[test]
    fn test_text_similarity() {
        let s = text_similarity("hello world", "hello universe");
        assert!((s - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(text_similarity("hello world", "hello world"), 1.0);
        assert_eq!(text_similarity("", ""), 0.0);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_mask_sensitive() {
        assert_eq!(mask_sensitive(""), "");
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive("192.168.0.1"), "19*******.1");
    }
}
