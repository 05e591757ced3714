use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::age::zero_timestamp;

/// One story row of a listing page.
///
/// The aliases accept databases written by older releases, which used
/// capitalized keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "URL")]
    pub url: String,
    #[serde(default, alias = "Points", deserialize_with = "legacy_count")]
    pub score: Option<u64>,
    #[serde(default, alias = "Comments", deserialize_with = "legacy_count")]
    pub comments: Option<u64>,
    #[serde(default, alias = "CommentsURL")]
    pub comments_url: String,
    #[serde(default, alias = "Submitter")]
    pub submitter: String,
    #[serde(default = "zero_timestamp", alias = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

// Older databases store a missing count as -1.
fn legacy_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value.and_then(|count| u64::try_from(count).ok()))
}

/// Records scraped from one listing page plus the link to the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub records: Vec<ListingRecord>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        use anyhow::Context as _;

        match self {
            Self::Json => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value
                    .serialize(&mut serializer)
                    .context("serialize json")?;
                buf.push(b'\n');
                String::from_utf8(buf).context("json output is not valid UTF-8")
            }
            Self::Yaml => serde_yaml::to_string(value).context("serialize yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_database_keys_are_accepted() -> anyhow::Result<()> {
        let json = r#"[{
            "ID": 18927109,
            "Title": "Brexit Deal Fails in Parliament",
            "URL": "https://example.com/brexit",
            "Points": -1,
            "Comments": 42,
            "CommentsURL": "https://news.ycombinator.com/item?id=18927109",
            "Submitter": "candiodari",
            "Timestamp": "2019-01-15T20:00:00Z",
            "Children": null
        }]"#;

        let records: Vec<ListingRecord> = serde_json::from_str(json)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 18927109);
        assert_eq!(records[0].score, None);
        assert_eq!(records[0].comments, Some(42));
        assert_eq!(records[0].submitter, "candiodari");
        Ok(())
    }

    #[test]
    fn json_output_uses_four_space_indent() -> anyhow::Result<()> {
        let out = OutputFormat::Json.render(&vec![1, 2])?;
        assert_eq!(out, "[\n    1,\n    2\n]\n");
        Ok(())
    }
}
