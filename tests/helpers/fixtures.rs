/// Common test fixtures and data structures
///
/// Typed models implementing `TableModel` / `IndexedModel` and the raw items
/// of the movie roles data set.
use super::{Deserialize, Item, Serialize, TableModel, item, json};
use dynamo_engine::{IndexedModel, KeyType, KeyValue};

/// A user keyed by username
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct User {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: u32,
}

impl TableModel for User {
    const TABLE: &'static str = "Users";
    const PARTITION_KEY: &'static str = "Username";

    fn partition_key(&self) -> KeyValue {
        self.username.as_str().into()
    }
}

/// An actor's role in a movie, indexed by genre and year
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct MovieRole {
    #[serde(rename = "Actor")]
    pub actor: String,
    #[serde(rename = "Movie")]
    pub movie: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Genre")]
    pub genre: String,
}

impl MovieRole {
    pub fn new(actor: &str, movie: &str, role: &str, year: i64, genre: &str) -> Self {
        Self {
            actor: actor.to_string(),
            movie: movie.to_string(),
            role: role.to_string(),
            year,
            genre: genre.to_string(),
        }
    }
}

impl TableModel for MovieRole {
    const TABLE: &'static str = "MovieRoles";
    const PARTITION_KEY: &'static str = "Actor";
    const SORT_KEY: Option<&'static str> = Some("Movie");

    fn partition_key(&self) -> KeyValue {
        self.actor.as_str().into()
    }

    fn sort_key(&self) -> Option<KeyValue> {
        Some(self.movie.as_str().into())
    }
}

impl IndexedModel for MovieRole {
    const INDEX_PARTITION_KEY: &'static str = "Genre";
    const INDEX_SORT_KEY: Option<&'static str> = Some("Year");
    const INDEX_SORT_KEY_TYPE: KeyType = KeyType::Number;
}

/// Four roles across three actors and two genres
pub fn movie_roles() -> Vec<Item> {
    vec![
        item(json!({
            "Actor": "Tom Hanks",
            "Movie": "Cast Away",
            "Role": "Chuck Noland",
            "Year": 2000,
            "Genre": "Drama"
        })),
        item(json!({
            "Actor": "Tom Hanks",
            "Movie": "Toy Story",
            "Role": "Woody",
            "Year": 1995,
            "Genre": "Children"
        })),
        item(json!({
            "Actor": "Tim Allen",
            "Movie": "Toy Story",
            "Role": "Buzz Lightyear",
            "Year": 1995,
            "Genre": "Children"
        })),
        item(json!({
            "Actor": "Natalie Portman",
            "Movie": "Black Swan",
            "Role": "Nina Sayers",
            "Year": 2010,
            "Genre": "Drama"
        })),
    ]
}
