//! Streaming output helpers (made by FontLab https://www.fontlab.com/)

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

/// Write results as prettified JSON array.
pub fn write_json_pretty<T: Serialize>(results: &[T], mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write results as newline-delimited JSON (NDJSON).
pub fn write_ndjson<T: Serialize>(results: &[T], mut w: impl Write) -> Result<()> {
    for item in results {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{MatchType, SearchResult};

    fn sample_result(id: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            name: "Roboto".to_string(),
            source: "google-fonts".to_string(),
            source_name: "Google Fonts".to_string(),
            license: "OFL".to_string(),
            categories: vec!["Sans Serif".to_string()],
            popularity: 12,
            score: 356,
            match_type: MatchType::Exact,
        }
    }

    #[test]
    fn ndjson_writes_one_line_per_result() {
        let results = vec![sample_result("google.roboto"), sample_result("nerd.roboto")];
        let mut buf = Vec::new();

        write_ndjson(&results, &mut buf).expect("write ndjson");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: SearchResult = serde_json::from_str(lines[1]).expect("parse");
        assert_eq!(parsed.id, "nerd.roboto");
        assert!(lines[0].contains("\"match_type\":\"exact\""));
    }

    #[test]
    fn pretty_json_is_one_array() {
        let mut buf = Vec::new();
        write_json_pretty(&[sample_result("google.roboto")], &mut buf).expect("write json");

        let parsed: Vec<SearchResult> = serde_json::from_slice(&buf).expect("parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].score, 356);
    }
}
