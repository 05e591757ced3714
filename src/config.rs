use anyhow::Context as _;
use url::Url;

use crate::cli::{Password, SessionArgs};

pub const DEFAULT_BASE_URL: &str = "https://news.ycombinator.com";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/65.0.3325.162 Safari/537.36";

/// Settings for one run, handed explicitly to the client and the merger.
#[derive(Debug, Clone)]
pub struct SlurpConfig {
    /// Forum root; always ends with `/` so relative links join under it.
    pub base_url: Url,
    pub user_agent: String,
    pub user: String,
    pub password: Option<Password>,
    pub max_records: Option<usize>,
}

impl SlurpConfig {
    pub fn from_session(args: &SessionArgs, max_records: Option<usize>) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&args.base_url)?,
            user_agent: args.user_agent.clone(),
            user: args.user.clone(),
            password: args
                .password
                .clone()
                .filter(|password| !password.expose().is_empty()),
            max_records,
        })
    }

    pub fn page_url(&self, path: &str) -> anyhow::Result<String> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("join {path:?} onto {}", self.base_url))?;
        Ok(url.to_string())
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim()).context("parse --base-url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("--base-url must be http/https: {url}");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
