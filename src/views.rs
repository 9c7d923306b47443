use crate::app::AppState;
use crate::error::MovieApiError;
use crate::models::{CastMember, Movie};
use crate::tmdb::{convert_release_dates, image_url, parse_release_date};
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{error, info, warn};

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";

#[derive(Template)]
#[template(path = "movie_list.html")]
pub struct MovieListTemplate {
    pub movies: Vec<MovieCard>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_date: String,
}

#[derive(Template)]
#[template(path = "movie_detail.html")]
pub struct MovieDetailTemplate {
    pub movie: MovieDetail,
    pub trailer_url: Option<String>,
    pub actors: Vec<ActorCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub title: String,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<i64>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorCard {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

pub async fn movie_list(State(state): State<AppState>) -> Response {
    let page = match load_now_playing(&state).await {
        Ok(movies) => {
            info!("Rendering {} now-playing movies", movies.len());
            MovieListTemplate {
                movies,
                error_message: None,
            }
        }
        Err(e) => {
            warn!("Failed to load now-playing movies: {}", e);
            MovieListTemplate {
                movies: Vec::new(),
                error_message: Some(e.to_string()),
            }
        }
    };
    render(StatusCode::OK, &page)
}

async fn load_now_playing(state: &AppState) -> Result<Vec<MovieCard>, MovieApiError> {
    let payload = state.movies.get_now_playing().await?;
    let collection = convert_release_dates(payload, Some("results"))?;
    Ok(collection.movies().iter().filter_map(movie_card).collect())
}

pub async fn movie_detail(State(state): State<AppState>, Path(movie_id): Path<i64>) -> Response {
    let result = tokio::try_join!(
        state.movies.get_movie_details(movie_id),
        state.movies.get_movie_trailer(movie_id),
        state.movies.get_movie_actors(movie_id),
    );

    match result {
        Ok((details, trailer_key, actors)) => {
            let page = MovieDetailTemplate {
                movie: movie_detail_view(&details),
                trailer_url: trailer_key.map(|key| format!("{YOUTUBE_EMBED_BASE}{key}")),
                actors: actors.iter().map(actor_card).collect(),
            };
            render(StatusCode::OK, &page)
        }
        Err(MovieApiError::NotFound) => {
            info!("Movie {} not found", movie_id);
            render(
                StatusCode::NOT_FOUND,
                &ErrorTemplate {
                    title: "Not found".to_string(),
                    message: MovieApiError::NotFound.to_string(),
                },
            )
        }
        Err(e) => {
            warn!("Failed to load movie {}: {}", movie_id, e);
            render(
                StatusCode::BAD_GATEWAY,
                &ErrorTemplate {
                    title: "Something went wrong".to_string(),
                    message: e.to_string(),
                },
            )
        }
    }
}

fn render<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Template rendering failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

fn movie_card(movie: &Movie) -> Option<MovieCard> {
    Some(MovieCard {
        id: movie.id()?,
        title: movie.title().unwrap_or("Untitled").to_string(),
        poster_url: movie.poster_path().map(image_url),
        release_date: display_date(movie.release_date),
    })
}

pub fn movie_detail_view(details: &Value) -> MovieDetail {
    let text = |name: &str| {
        details
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    let release_date = text("release_date").map(|raw| match parse_release_date(&raw) {
        Some(date) => display_date(date),
        None => raw,
    });
    let genres = details
        .get("genres")
        .and_then(Value::as_array)
        .map(|g| {
            g.iter()
                .filter_map(|x| x.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    MovieDetail {
        title: text("title").unwrap_or_else(|| "Untitled".to_string()),
        tagline: text("tagline"),
        overview: text("overview"),
        poster_url: text("poster_path").map(|p| image_url(&p)),
        release_date,
        runtime_minutes: details
            .get("runtime")
            .and_then(Value::as_i64)
            .filter(|r| *r > 0),
        genres,
    }
}

fn actor_card(member: &CastMember) -> ActorCard {
    ActorCard {
        name: member.name.clone(),
        character: member.character.clone().filter(|c| !c.is_empty()),
        profile_url: member.profile_path.as_deref().map(image_url),
    }
}

fn display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
