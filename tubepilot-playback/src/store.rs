//! Session-list persistence and URL-list import.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tubepilot_core::Result;

/// One persisted session slot. Optional fields default to empty so older
/// or hand-edited files load cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub proxy: String,
    #[serde(default)]
    pub profile: String,
}

impl SessionRecord {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionList {
    #[serde(default)]
    sessions: Vec<SessionRecord>,
}

/// Load a session list from the on-disk JSON shape
/// `{"sessions": [{url, proxy, profile}, ...]}`.
pub fn load_records(path: &Path) -> Result<Vec<SessionRecord>> {
    let text = fs::read_to_string(path)?;
    let list: SessionList = serde_json::from_str(&text)?;
    Ok(list.sessions)
}

/// Save a session list, reproducing the same shape `load_records` reads.
pub fn save_records(path: &Path, records: &[SessionRecord]) -> Result<()> {
    let list = SessionList { sessions: records.to_vec() };
    let text = serde_json::to_string_pretty(&list)?;
    fs::write(path, text)?;
    Ok(())
}

/// Parse a URL-list text: one URL per line, blank lines and `#` comments
/// skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reduce a profile name to a filesystem-safe directory name: runs of
/// characters outside `[A-Za-z0-9._-]` collapse to a single underscore.
pub fn sanitize_profile_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sub = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            last_was_sub = false;
        } else if !last_was_sub {
            out.push('_');
            last_was_sub = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let records = vec![
            SessionRecord {
                url: "https://www.youtube.com/watch?v=A".to_string(),
                proxy: "socks5://127.0.0.1:1080".to_string(),
                profile: "viewer one".to_string(),
            },
            SessionRecord::with_url("https://www.youtube.com/watch?v=B"),
        ];

        let text = serde_json::to_string(&SessionList { sessions: records.clone() }).unwrap();
        let parsed: SessionList = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.sessions, records);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let text = r#"{"sessions": [{"url": "https://example.com"}, {}]}"#;
        let parsed: SessionList = serde_json::from_str(text).unwrap();

        assert_eq!(parsed.sessions.len(), 2);
        assert_eq!(parsed.sessions[0].url, "https://example.com");
        assert_eq!(parsed.sessions[0].proxy, "");
        assert_eq!(parsed.sessions[1], SessionRecord::default());
    }

    #[test]
    fn test_parse_url_list_skips_blanks_and_comments() {
        let text = "\
https://www.youtube.com/watch?v=A

# a comment
  https://www.youtube.com/watch?v=B
#https://www.youtube.com/watch?v=C
";
        let urls = parse_url_list(text);
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=A".to_string(),
                "https://www.youtube.com/watch?v=B".to_string(),
            ]
        );
    }

    #[test]
    fn test_sanitize_profile_name() {
        assert_eq!(sanitize_profile_name("viewer one"), "viewer_one");
        assert_eq!(sanitize_profile_name("a//b??c"), "a_b_c");
        assert_eq!(sanitize_profile_name("ok-name_1.2"), "ok-name_1.2");
    }
}
