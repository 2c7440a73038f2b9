use std::collections::HashMap;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::cinema_city::types::Repertoire;

pub const TMDB_API_URL: &str = "https://api.themoviedb.org/3";
pub const NO_RATING: &str = "0.0/10";
pub const NO_SUMMARY: &str = "Brak opisu filmu.";

#[derive(Debug, thiserror::Error)]
pub enum RatingsError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid ratings api url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRating {
    pub rating: String,
    pub summary: String,
}

impl Default for MovieRating {
    fn default() -> Self {
        Self {
            rating: NO_RATING.to_string(),
            summary: NO_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    vote_count: u64,
    #[serde(default)]
    overview: String,
}

impl From<SearchResponse> for MovieRating {
    fn from(response: SearchResponse) -> Self {
        match response.results.as_slice() {
            [only] => MovieRating {
                rating: format!("{:.1}/10 (głosy: {})", only.vote_average, only.vote_count),
                summary: if only.overview.trim().is_empty() {
                    NO_SUMMARY.to_string()
                } else {
                    only.overview.clone()
                },
            },
            _ => MovieRating::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl TmdbClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, RatingsError> {
        Self::with_base_url(access_token, TMDB_API_URL)
    }

    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, RatingsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub async fn verify_access_token(&self) -> Result<bool, RatingsError> {
        let url = format!("{}/authentication", self.base_url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;
        Ok(response.status() == StatusCode::OK)
    }

    pub async fn search_movie(&self, title: &str) -> Result<MovieRating, RatingsError> {
        let url = Url::parse_with_params(
            &format!("{}/search/movie", self.base_url),
            &[
                ("query", title),
                ("include_adult", "true"),
                ("language", "pl-PL"),
                ("page", "1"),
            ],
        )
        .map_err(|e| RatingsError::InvalidUrl(e.to_string()))?;
        log::debug!("Looking up rating of '{}'", title);

        let response: SearchResponse = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .json()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(response.into())
    }

    pub async fn fetch_ratings(&self, titles: &[String]) -> HashMap<String, MovieRating> {
        log::info!("Fetching ratings for {} film(s)...", titles.len());
        let mut futs: FuturesUnordered<_> = titles
            .iter()
            .map(|title| async move { (title, self.search_movie(title).await) })
            .collect();

        let mut ratings = HashMap::with_capacity(titles.len());
        while let Some((title, result)) = futs.next().await {
            let rating = result.unwrap_or_else(|e| {
                log::warn!("Failed to fetch rating of '{}': {}", title, e);
                MovieRating::default()
            });
            ratings.insert(title.clone(), rating);
        }
        ratings
    }
}

pub fn distinct_titles(repertoire: &[Repertoire]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::with_capacity(repertoire.len());
    for entry in repertoire {
        if !titles.contains(&entry.title) {
            titles.push(entry.title.clone());
        }
    }
    titles
}
