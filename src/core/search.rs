//! Remote search client for the Pixabay video API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::core::batch::PageFetcher;
use crate::core::models::{AppError, AppResult, ResultPage, SearchQuery, SearchResponse};

/// Production search endpoint.
pub const API_ENDPOINT: &str = "https://pixabay.com/api/videos/";

/// Hard page-size cap of the API.
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    pub api_key: String,
    pub per_page: u32,
    pub safe_search: bool,
    pub endpoint: String,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            per_page: MAX_PER_PAGE,
            safe_search: true,
            endpoint: API_ENDPOINT.to_string(),
        }
    }
}

pub struct SearchClient {
    client: Client,
    config: SearchClientConfig,
}

impl SearchClient {
    pub fn new(config: SearchClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the request URL for one query. `per_page` is clamped to the
    /// API's cap.
    pub fn request_url(&self, query: &SearchQuery) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|_| AppError::InvalidRequest)?;

        let per_page = self.config.per_page.clamp(1, MAX_PER_PAGE);
        url.query_pairs_mut()
            .append_pair("key", &self.config.api_key)
            .append_pair("q", &query.term)
            .append_pair("per_page", &per_page.to_string())
            .append_pair(
                "safesearch",
                if self.config.safe_search { "true" } else { "false" },
            )
            .append_pair("page", &query.page.to_string());

        Ok(url)
    }

    /// Issue one paginated query. An empty API key short-circuits before any
    /// network activity. No status is retried automatically.
    pub async fn search(&self, query: &SearchQuery) -> AppResult<ResultPage> {
        if self.config.api_key.trim().is_empty() {
            return Err(AppError::MissingCredential);
        }

        let url = self.request_url(query)?;
        debug!(term = %query.term, page = query.page, "requesting search page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                400 => AppError::InvalidRequest,
                429 => AppError::RateLimited,
                code => AppError::ServerError(code),
            });
        }

        let body: SearchResponse = response.json().await?;
        info!(
            term = %query.term,
            page = query.page,
            hits = body.hits.len(),
            total_hits = body.total_hits,
            "search page fetched"
        );

        Ok(ResultPage {
            page_number: query.page,
            items: body.hits,
        })
    }
}

#[async_trait]
impl PageFetcher for SearchClient {
    async fn fetch_page(&self, term: &str, page: u32) -> AppResult<ResultPage> {
        self.search(&SearchQuery::new(term, page)).await
    }
}
