use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use nowshowing::app::{build_router, AppState};
use nowshowing::models::CastMember;
use nowshowing::{MovieApi, MovieApiError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

#[derive(Clone, Copy)]
enum Failure {
    None,
    NotFound,
    Timeout,
}

struct FakeTmdb {
    failure: Failure,
    trailer: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeTmdb {
    fn new(failure: Failure) -> Self {
        Self {
            failure,
            trailer: Some("trailer-key".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &str) -> Result<(), MovieApiError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.failure {
            Failure::None => Ok(()),
            Failure::NotFound => Err(MovieApiError::NotFound),
            Failure::Timeout => Err(MovieApiError::Timeout),
        }
    }
}

fn cast_member(name: &str, character: &str) -> CastMember {
    serde_json::from_value(json!({
        "name": name,
        "character": character,
        "known_for_department": "Acting",
        "profile_path": "/face.jpg"
    }))
    .unwrap()
}

#[async_trait::async_trait]
impl MovieApi for FakeTmdb {
    async fn authenticate(&self) -> Result<Value, MovieApiError> {
        self.record("authenticate")?;
        Ok(json!({"success": true}))
    }

    async fn get_now_playing(&self) -> Result<Value, MovieApiError> {
        self.record("now_playing")?;
        Ok(json!({
            "page": 1,
            "results": [
                {"id": 42, "title": "Dune: Part Two", "poster_path": "/dune.jpg", "release_date": "2024-03-01"},
                {"id": 43, "title": "Kung Fu Panda 4", "poster_path": null, "release_date": "2024-03-08"}
            ],
            "total_pages": 1,
            "total_results": 2
        }))
    }

    async fn get_movie_details(&self, movie_id: i64) -> Result<Value, MovieApiError> {
        self.record("details")?;
        Ok(json!({
            "id": movie_id,
            "title": "Dune: Part Two",
            "overview": "Paul unites with the Fremen.",
            "release_date": "2024-03-01",
            "runtime": 166,
            "genres": [{"id": 878, "name": "Science Fiction"}]
        }))
    }

    async fn get_movie_trailer(&self, _movie_id: i64) -> Result<Option<String>, MovieApiError> {
        self.record("trailer")?;
        Ok(self.trailer.clone())
    }

    async fn get_movie_actors(&self, _movie_id: i64) -> Result<Vec<CastMember>, MovieApiError> {
        self.record("actors")?;
        Ok(vec![
            cast_member("Timothée Chalamet", "Paul Atreides"),
            cast_member("Zendaya", "Chani"),
        ])
    }
}

fn app_with(fake: FakeTmdb) -> (Router, Arc<FakeTmdb>) {
    let fake = Arc::new(fake);
    (build_router(AppState::new(fake.clone())), fake)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let res = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn listing_renders_movies_with_formatted_dates() {
    let (app, fake) = app_with(FakeTmdb::new(Failure::None));
    let (status, html) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Dune: Part Two"));
    assert!(html.contains("Kung Fu Panda 4"));
    assert!(html.contains("March 1, 2024"));
    assert!(html.contains("/movies/42"));
    assert!(html.contains("https://image.tmdb.org/t/p/w500/dune.jpg"));
    assert!(!html.contains("class=\"error\""));
    assert_eq!(*fake.calls.lock().unwrap(), vec!["now_playing".to_string()]);
}

#[tokio::test]
async fn listing_shows_error_message_on_failure() {
    let (app, _) = app_with(FakeTmdb::new(Failure::Timeout));
    let (status, html) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Request to the movie database timed out."));
    assert!(!html.contains("/movies/"));
}

#[tokio::test]
async fn detail_renders_movie_trailer_and_actors() {
    let (app, fake) = app_with(FakeTmdb::new(Failure::None));
    let (status, html) = get(app, "/movies/42").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Dune: Part Two"));
    assert!(html.contains("166 min"));
    assert!(html.contains("Science Fiction"));
    assert!(html.contains("https://www.youtube.com/embed/trailer-key"));
    assert!(html.contains("Zendaya"));
    assert!(html.contains("Chani"));

    let mut calls = fake.calls.lock().unwrap().clone();
    calls.sort();
    assert_eq!(calls, vec!["actors", "details", "trailer"]);
}

#[tokio::test]
async fn detail_without_trailer_omits_player() {
    let mut fake = FakeTmdb::new(Failure::None);
    fake.trailer = None;
    let (app, _) = app_with(fake);
    let (status, html) = get(app, "/movies/42").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains("<iframe"));
}

#[tokio::test]
async fn detail_returns_404_when_movie_is_missing() {
    let (app, _) = app_with(FakeTmdb::new(Failure::NotFound));
    let (status, html) = get(app, "/movies/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Movie could not be found."));
}

#[tokio::test]
async fn detail_returns_bad_gateway_for_other_failures() {
    let (app, _) = app_with(FakeTmdb::new(Failure::Timeout));
    let (status, html) = get(app, "/movies/42").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(html.contains("Request to the movie database timed out."));
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app_with(FakeTmdb::new(Failure::None));
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
