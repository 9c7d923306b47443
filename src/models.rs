use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A movie record from TMDB with its release date parsed.
///
/// Everything except `release_date` is kept exactly as the API sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub release_date: NaiveDate,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Movie {
    pub fn id(&self) -> Option<i64> {
        self.fields.get("id").and_then(Value::as_i64)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn poster_path(&self) -> Option<&str> {
        self.str_field("poster_path")
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Movies after release-date conversion, in the same shape they came in.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieCollection {
    /// The payload was a bare list of movies.
    List(Vec<Movie>),
    /// The movies lived under `field` of an object; `rest` holds its siblings.
    Keyed {
        field: String,
        movies: Vec<Movie>,
        rest: Map<String, Value>,
    },
}

impl MovieCollection {
    pub fn movies(&self) -> &[Movie] {
        match self {
            MovieCollection::List(movies) => movies,
            MovieCollection::Keyed { movies, .. } => movies,
        }
    }

    pub fn into_movies(self) -> Vec<Movie> {
        match self {
            MovieCollection::List(movies) => movies,
            MovieCollection::Keyed { movies, .. } => movies,
        }
    }
}

impl Serialize for MovieCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MovieCollection::List(movies) => movies.serialize(serializer),
            MovieCollection::Keyed {
                field,
                movies,
                rest,
            } => {
                let mut map = serializer.serialize_map(Some(rest.len() + 1))?;
                for (k, v) in rest {
                    map.serialize_entry(k, v)?;
                }
                map.serialize_entry(field, movies)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub site: Option<String>,
}

impl Video {
    pub fn is_trailer(&self) -> bool {
        self.video_type.to_lowercase() == "trailer"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Videos {
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default)]
    pub known_for_department: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Credits {
    pub cast: Vec<CastMember>,
}
