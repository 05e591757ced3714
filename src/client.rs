use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, LOCATION, ORIGIN, REFERER, USER_AGENT,
};

use crate::config::SlurpConfig;
use crate::formats::ListingPage;
use crate::merge::PageFetcher;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";

/// HTTP session against the forum. Redirects are not followed so that a
/// successful login (a 3xx) can be told apart from a failed one (a 200 with
/// the login form again).
#[derive(Debug, Clone)]
pub struct ForumClient {
    http: reqwest::Client,
    config: SlurpConfig,
}

impl ForumClient {
    pub fn anonymous(config: &SlurpConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(true)
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Logs in with the account in `config` when a password is present,
    /// otherwise returns an anonymous session.
    pub async fn connect(config: &SlurpConfig) -> anyhow::Result<Self> {
        let client = Self::anonymous(config)?;
        match &config.password {
            Some(password) => {
                if config.user.trim().is_empty() {
                    anyhow::bail!("--user must not be empty when --password is given");
                }
                client.login(&config.user, password.expose()).await?;
                tracing::debug!(user = %config.user, "logged in");
            }
            None => tracing::debug!("no password given; continuing anonymously"),
        }
        Ok(client)
    }

    pub async fn login(&self, user: &str, password: &str) -> anyhow::Result<()> {
        let login_url = self
            .config
            .base_url
            .join("login")
            .context("build login url")?;
        let origin = self.config.base_url.as_str();

        let response = self
            .http
            .post(login_url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFERER, origin)
            .header(ORIGIN, origin)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(ACCEPT, ACCEPT_HTML)
            .header(CACHE_CONTROL, "max-age=0")
            .header(USER_AGENT, &self.config.user_agent)
            .body(login_form(user, password))
            .send()
            .await
            .with_context(|| format!("login: POST {login_url}"))?;

        let status = response.status();
        let has_location = response.headers().contains_key(LOCATION);
        if !status.is_redirection() || !has_location {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("login: expected 3xx response status-code but got {status} (body={body})");
        }
        Ok(())
    }

    /// GETs `url` and returns its body; anything other than 2xx is an error.
    pub async fn checked_get(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("expected 2xx response status-code from {url} but got {status}");
        }

        response
            .text()
            .await
            .with_context(|| format!("read response body from {url}"))
    }

    pub fn config(&self) -> &SlurpConfig {
        &self.config
    }
}

fn login_form(user: &str, password: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("acct", user)
        .append_pair("pw", password)
        .append_pair("goto", "news")
        .finish()
}

#[async_trait]
impl PageFetcher for ForumClient {
    async fn fetch(&mut self, locator: &str) -> anyhow::Result<ListingPage> {
        let html = self.checked_get(locator).await?;
        crate::extract::listing_page(&html, &self.config.base_url, chrono::Utc::now())
            .with_context(|| format!("extract listing from {locator}"))
    }
}
