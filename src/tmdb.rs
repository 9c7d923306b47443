use crate::config::Config;
use crate::error::MovieApiError;
use crate::models::{CastMember, Credits, Movie, MovieCollection, Video, Videos};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const NOW_PLAYING_WINDOW_DAYS: i64 = 45;
const RELEASE_DATE_FIELD: &str = "release_date";
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait MovieApi: Send + Sync {
    /// Probes the authentication endpoint with the configured token.
    async fn authenticate(&self) -> Result<Value, MovieApiError>;
    /// Popular movies released in the trailing 45 days, as the raw discover payload.
    async fn get_now_playing(&self) -> Result<Value, MovieApiError>;
    async fn get_movie_details(&self, movie_id: i64) -> Result<Value, MovieApiError>;
    /// Key of the preferred trailer, or `None` when the movie has no trailer.
    async fn get_movie_trailer(&self, movie_id: i64) -> Result<Option<String>, MovieApiError>;
    /// Cast members known for acting, in billing order.
    async fn get_movie_actors(&self, movie_id: i64) -> Result<Vec<CastMember>, MovieApiError>;
}

/// TMDB v3 client. The bearer token lives in the client's default headers
/// and cannot change after construction.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
}

impl TmdbClient {
    /// Builds the client without touching the network.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .context("TMDB_API_KEY contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .timeout(config.timeout)
            .user_agent(format!("nowshowing/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build TMDB HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&Config::from_env()?)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, MovieApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let res = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("TMDB request to {} failed: {}", path, e);
                MovieApiError::from_transport(&e)
            })?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            warn!("TMDB returned 404 for {}", path);
            return Err(MovieApiError::NotFound);
        }
        if !status.is_success() {
            warn!("TMDB returned {} for {}", status, path);
            return Err(MovieApiError::bad_status());
        }

        res.json::<Value>().await.map_err(|e| {
            warn!("Failed to read TMDB response for {}: {}", path, e);
            MovieApiError::from_transport(&e)
        })
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, MovieApiError> {
        let value = self.get_json(path, &[]).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!("Unexpected TMDB payload for {}: {}", path, e);
            MovieApiError::generic()
        })
    }
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn authenticate(&self) -> Result<Value, MovieApiError> {
        self.get_json("/authentication", &[])
            .await
            .map_err(|e| MovieApiError::Authentication(e.to_string()))
    }

    async fn get_now_playing(&self) -> Result<Value, MovieApiError> {
        let (min_date, max_date) = now_playing_window(Utc::now().date_naive());
        self.get_json("/discover/movie", &discover_query(min_date, max_date))
            .await
    }

    async fn get_movie_details(&self, movie_id: i64) -> Result<Value, MovieApiError> {
        self.get_json(&format!("/movie/{movie_id}"), &[]).await
    }

    async fn get_movie_trailer(&self, movie_id: i64) -> Result<Option<String>, MovieApiError> {
        let videos: Videos = self.get_typed(&format!("/movie/{movie_id}/videos")).await?;
        Ok(select_trailer(&videos.results).map(|v| v.key.clone()))
    }

    async fn get_movie_actors(&self, movie_id: i64) -> Result<Vec<CastMember>, MovieApiError> {
        let credits: Credits = self
            .get_typed(&format!("/movie/{movie_id}/credits"))
            .await?;
        Ok(filter_actors(credits.cast))
    }
}

/// Inclusive `(min, max)` release window ending on `today`.
pub fn now_playing_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - chrono::Duration::days(NOW_PLAYING_WINDOW_DAYS), today)
}

pub fn discover_query(min_date: NaiveDate, max_date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("include_adult", "true".to_string()),
        ("include_video", "true".to_string()),
        ("language", "en-US".to_string()),
        ("primary_release_date.gte", min_date.to_string()),
        ("primary_release_date.lte", max_date.to_string()),
        ("sort_by", "popularity.desc".to_string()),
    ]
}

/// Trailer preferences, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerRule {
    FinalTrailer,
    Official,
    FirstTrailer,
}

impl TrailerRule {
    pub const PRIORITY: [TrailerRule; 3] = [
        TrailerRule::FinalTrailer,
        TrailerRule::Official,
        TrailerRule::FirstTrailer,
    ];

    pub fn matches(self, video: &Video) -> bool {
        if !video.is_trailer() {
            return false;
        }
        let name = video.name.to_lowercase();
        match self {
            TrailerRule::FinalTrailer => name == "final trailer",
            TrailerRule::Official => name.contains("official"),
            TrailerRule::FirstTrailer => true,
        }
    }
}

/// Picks the video matched by the highest-priority rule; within a rule the
/// earliest video in upstream order wins.
pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    TrailerRule::PRIORITY
        .iter()
        .find_map(|rule| videos.iter().find(|v| rule.matches(v)))
}

pub fn filter_actors(cast: Vec<CastMember>) -> Vec<CastMember> {
    cast.into_iter()
        .filter(|c| c.known_for_department == "Acting")
        .collect()
}

pub fn image_url(path: &str) -> String {
    format!("{IMAGE_BASE}{path}")
}

pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, RELEASE_DATE_FORMAT).ok()
}

/// Parses every movie's `release_date` into a date.
///
/// With `field` set, the movies are looked up under that key of an object
/// payload and the sibling keys are carried over untouched; without it the
/// payload must itself be the list of movies.
pub fn convert_release_dates(
    payload: Value,
    field: Option<&str>,
) -> Result<MovieCollection, MovieApiError> {
    match (payload, field) {
        (Value::Array(items), None) => Ok(MovieCollection::List(convert_movies(items)?)),
        (Value::Object(mut rest), Some(field)) => {
            let located = rest
                .remove(field)
                .ok_or_else(|| MovieApiError::FieldNotFound(field.to_string()))?;
            let Value::Array(items) = located else {
                return Err(MovieApiError::InvalidInput(format!(
                    "{field} does not hold a list of movies"
                )));
            };
            Ok(MovieCollection::Keyed {
                field: field.to_string(),
                movies: convert_movies(items)?,
                rest,
            })
        }
        (Value::Array(_), Some(field)) => Err(MovieApiError::InvalidInput(format!(
            "cannot look up {field} on a list payload"
        ))),
        (Value::Object(_), None) => Err(MovieApiError::InvalidInput(
            "expected a list of movies, got an object".to_string(),
        )),
        (other, _) => Err(MovieApiError::InvalidInput(format!(
            "expected a list or object payload, got {}",
            json_kind(&other)
        ))),
    }
}

fn convert_movies(items: Vec<Value>) -> Result<Vec<Movie>, MovieApiError> {
    items.into_iter().map(convert_movie).collect()
}

fn convert_movie(item: Value) -> Result<Movie, MovieApiError> {
    let Value::Object(mut fields) = item else {
        return Err(MovieApiError::InvalidInput(format!(
            "expected a movie object, got {}",
            json_kind(&item)
        )));
    };
    let raw = fields
        .remove(RELEASE_DATE_FIELD)
        .ok_or_else(|| MovieApiError::FieldNotFound(RELEASE_DATE_FIELD.to_string()))?;
    let text = raw.as_str().ok_or_else(|| {
        MovieApiError::InvalidInput(format!("release_date is {}, not a string", json_kind(&raw)))
    })?;
    let release_date = parse_release_date(text).ok_or_else(|| {
        MovieApiError::InvalidInput(format!("release_date '{text}' is not a YYYY-MM-DD date"))
    })?;
    Ok(Movie {
        release_date,
        fields,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
