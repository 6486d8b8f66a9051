use crate::models::{Genre, MovieDetail, MoviePage, MovieSummary};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

/// Read-only queries against the external movie catalog.
///
/// Every operation returns `Err` on transport, status or parse failures; the
/// page handlers collapse those to empty results at the response boundary.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn trending(&self) -> Result<Vec<MovieSummary>>;
    async fn popular(&self, page: i64) -> Result<MoviePage>;
    async fn top_rated(&self, page: i64) -> Result<MoviePage>;
    async fn movie_detail(&self, id: i64) -> Result<MovieDetail>;
    async fn search(&self, query: &str, page: i64) -> Result<MoviePage>;
    async fn genres(&self) -> Result<Vec<Genre>>;
    async fn discover_by_genre(&self, genre_id: i64, page: i64) -> Result<MoviePage>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn trending(&self) -> Result<Vec<MovieSummary>> {
        let url = format!("{TMDB_BASE}/trending/movie/day?api_key={}", self.api_key);
        let page: MoviePage = self.get_json(&url).await?;
        Ok(page.results)
    }

    async fn popular(&self, page: i64) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/movie/popular?api_key={}&page={}",
            self.api_key,
            page.max(1)
        );
        self.get_json(&url).await
    }

    async fn top_rated(&self, page: i64) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/movie/top_rated?api_key={}&page={}",
            self.api_key,
            page.max(1)
        );
        self.get_json(&url).await
    }

    async fn movie_detail(&self, id: i64) -> Result<MovieDetail> {
        let url = format!(
            "{TMDB_BASE}/movie/{id}?append_to_response=videos,credits,similar&api_key={}",
            self.api_key
        );
        self.get_json(&url).await
    }

    async fn search(&self, query: &str, page: i64) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/search/movie?api_key={}&query={}&page={}&include_adult=false",
            self.api_key,
            urlencoding::encode(query),
            page.max(1)
        );
        self.get_json(&url).await
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreList {
            genres: Vec<Genre>,
        }

        let url = format!("{TMDB_BASE}/genre/movie/list?api_key={}", self.api_key);
        let data: GenreList = self.get_json(&url).await?;
        Ok(data.genres)
    }

    async fn discover_by_genre(&self, genre_id: i64, page: i64) -> Result<MoviePage> {
        let url = format!(
            "{TMDB_BASE}/discover/movie?api_key={}&with_genres={genre_id}&page={}&sort_by=popularity.desc",
            self.api_key,
            page.max(1)
        );
        self.get_json(&url).await
    }
}

/// Resolve an image path fragment to a full URL for the given size tier.
/// A missing fragment resolves to the bundled placeholder.
pub fn image_url(path: Option<&str>, size: &str) -> String {
    match path {
        Some(p) => format!("{IMAGE_BASE}/{size}{p}"),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}
