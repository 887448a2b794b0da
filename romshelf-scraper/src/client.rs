//! HTTP gateway to the ScreenScraper API.
//!
//! Every remote call, including each retry attempt, passes through the
//! shared [`RateBudget`] before it goes out, so the aggregate request rate
//! across all workers never exceeds the configured budget.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Duration;

use crate::budget::RateBudget;
use crate::credentials::Credentials;
use crate::error::ScrapeError;
use crate::resolve::{AssetSource, Resolver};
use crate::retry::{RetryPolicy, run_with_retry};
use crate::scan::CandidateItem;
use crate::types::{GameInfo, JeuInfosResponse, RemoteRecord, UserInfo, UserInfoResponse};

const BASE_URL: &str = "https://api.screenscraper.fr/api2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless remote gateway: one logical lookup or download per call, with
/// budget gating and bounded retry on transient failures.
pub struct Gateway {
    http: reqwest::Client,
    creds: Credentials,
    budget: Arc<RateBudget>,
    retry: RetryPolicy,
    system_id: Option<u32>,
}

impl Gateway {
    pub fn new(
        creds: Credentials,
        budget: Arc<RateBudget>,
        retry: RetryPolicy,
        system_id: Option<u32>,
    ) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            creds,
            budget,
            retry,
            system_id,
        })
    }

    /// Preflight: validate credentials against ssuserInfos.php and return
    /// the account limits. An auth failure here aborts the run before any
    /// job is dispatched.
    pub async fn connect(&self) -> Result<UserInfo, ScrapeError> {
        run_with_retry(&self.retry, || self.user_info_once()).await
    }

    async fn user_info_once(&self) -> Result<UserInfo, ScrapeError> {
        let mut params = self.base_params();
        params.insert("output", "json".to_string());

        self.budget.acquire().await;
        let resp = self
            .http
            .get(format!("{BASE_URL}/ssuserInfos.php"))
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if let Some(err) = classify_response(status, &text) {
            return Err(err);
        }

        let info: UserInfoResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::permanent(format!(
                "Failed to parse user info: {e}. Response: {}",
                excerpt(&text)
            ))
        })?;
        Ok(info.response.ssuser)
    }

    /// One jeuInfos.php lookup. `Ok(None)` means the catalog has no entry
    /// for the query; HTTP and API error markers are classified into
    /// transient or permanent failures for the retry loop.
    async fn lookup_once(&self, item: &CandidateItem) -> Result<Option<GameInfo>, ScrapeError> {
        let mut params = self.base_params();
        params.insert("output", "json".to_string());
        params.insert("romnom", item.file_name.clone());
        params.insert("romtaille", item.size.to_string());
        if let Some(id) = self.system_id {
            params.insert("systemeid", id.to_string());
        }

        self.budget.acquire().await;
        let resp = self
            .http
            .get(format!("{BASE_URL}/jeuInfos.php"))
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = resp.text().await?;
        if let Some(err) = classify_response(status, &text) {
            return Err(err);
        }
        // ScreenScraper can answer 200 with error text instead of JSON.
        if text.is_empty() || text.contains("Erreur") || text.contains("Jeu non trouvé") {
            return Ok(None);
        }

        let response: JeuInfosResponse = serde_json::from_str(&text).map_err(|e| {
            ScrapeError::permanent(format!(
                "Failed to parse game info: {e}. Response: {}",
                excerpt(&text)
            ))
        })?;
        Ok(Some(response.response.jeu))
    }

    async fn download_once(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        self.budget.acquire().await;
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_response(status, &text).unwrap_or_else(|| {
                ScrapeError::permanent(format!("Media download failed with HTTP {status}"))
            }));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Media URLs from lookup responses do not always carry credentials;
    /// append them when absent, the same way the API's own clients do.
    fn with_media_credentials(&self, url: &str) -> String {
        if url.contains("ssid=") {
            return url.to_string();
        }
        let Some(ref user_id) = self.creds.user_id else {
            return url.to_string();
        };
        let mut full = format!(
            "{url}&ssid={user_id}&sspassword={}",
            self.creds.user_password.as_deref().unwrap_or(""),
        );
        full.push_str(&format!(
            "&devid={}&devpassword={}&softname={}",
            self.creds.dev_id, self.creds.dev_password, self.creds.soft_name,
        ));
        full
    }

    fn base_params(&self) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("devid", self.creds.dev_id.clone());
        params.insert("devpassword", self.creds.dev_password.clone());
        params.insert("softname", self.creds.soft_name.clone());
        if let Some(ref id) = self.creds.user_id {
            params.insert("ssid", id.clone());
        }
        if let Some(ref pw) = self.creds.user_password {
            params.insert("sspassword", pw.clone());
        }
        params
    }
}

/// The gateway's own matching strategy: ROM file name plus byte size plus
/// the configured system id.
impl Resolver for Gateway {
    async fn resolve(&self, item: &CandidateItem) -> Result<Option<RemoteRecord>, ScrapeError> {
        let game = run_with_retry(&self.retry, || self.lookup_once(item)).await?;
        Ok(game.map(|g| g.to_record()))
    }
}

impl AssetSource for Gateway {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let url = self.with_media_credentials(url);
        run_with_retry(&self.retry, || self.download_once(&url)).await
    }
}

/// Map an HTTP status and response body to a failure, or `None` when the
/// response looks healthy. 430 is ScreenScraper's own rate-pressure code.
fn classify_response(status: reqwest::StatusCode, text: &str) -> Option<ScrapeError> {
    match status.as_u16() {
        401 | 403 => Some(ScrapeError::permanent(format!(
            "Credentials rejected (HTTP {status})"
        ))),
        400 => Some(ScrapeError::permanent(
            "Bad request (HTTP 400, likely a missing systemeid)",
        )),
        429 | 430 => Some(ScrapeError::transient(format!(
            "Rate limited by remote (HTTP {status})"
        ))),
        s if s >= 500 => Some(ScrapeError::transient(format!(
            "Server error (HTTP {status})"
        ))),
        _ => {
            if text.contains("API fermé") || text.contains("API closed") {
                Some(ScrapeError::permanent("ScreenScraper API is closed"))
            } else if text.contains("Le quota de scrape journalier") {
                Some(ScrapeError::transient("Daily scrape quota exhausted"))
            } else {
                None
            }
        }
    }
}

/// First ~200 bytes of a response body for error messages, cut on a char
/// boundary so accented API error text cannot split mid-character.
fn excerpt(text: &str) -> &str {
    if text.len() <= 200 {
        return text;
    }
    let mut end = 200;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
