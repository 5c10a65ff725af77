use std::{collections::BTreeSet, str::FromStr};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Mpa {
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Director {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

/// A film aggregate: the base row plus its resolved MPA rating, genres,
/// directors and the ids of users who liked it.
///
/// `genres` and `directors` are kept sorted by id and free of duplicates.
/// On input only their ids are read; names are filled in by the store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: Date,
    pub duration: i32,
    pub mpa: Mpa,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub directors: Vec<Director>,
    #[serde(default)]
    pub likes: BTreeSet<i32>,
}

impl Film {
    pub fn genre_ids(&self) -> BTreeSet<i32> {
        self.genres.iter().map(|g| g.id).collect()
    }

    pub fn director_ids(&self) -> BTreeSet<i32> {
        self.directors.iter().map(|d| d.id).collect()
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// Order of a director's filmography.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortBy {
    /// Ascending release date.
    Year,
    /// Descending like count.
    Likes,
}

impl FromStr for SortBy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(SortBy::Year),
            "likes" => Ok(SortBy::Likes),
            other => Err(StoreError::Validation(format!(
                "sortBy must be \"year\" or \"likes\", got {other:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i32,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: String,
    pub birthday: Date,
}

/// A user's review of a film. `useful` is likes minus dislikes on the
/// review and is maintained by the store; input values are ignored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub review_id: i32,
    pub content: String,
    pub is_positive: bool,
    pub user_id: i32,
    pub film_id: i32,
    #[serde(default)]
    pub useful: i32,
}

/// A user's vote on a review.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn is_useful(self) -> bool {
        matches!(self, Reaction::Like)
    }

    pub fn from_useful(useful: bool) -> Self {
        if useful { Reaction::Like } else { Reaction::Dislike }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Like,
    Review,
}

impl EventType {
    pub fn as_code(self) -> i32 {
        match self {
            EventType::Like => 1,
            EventType::Review => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(EventType::Like),
            2 => Some(EventType::Review),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    pub fn as_code(self) -> i32 {
        match self {
            Operation::Add => 1,
            Operation::Remove => 2,
            Operation::Update => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Operation::Add),
            2 => Some(Operation::Remove),
            3 => Some(Operation::Update),
            _ => None,
        }
    }
}

/// One entry of a user's activity feed. `timestamp` is milliseconds since
/// the Unix epoch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: i32,
    pub timestamp: i64,
    pub user_id: i32,
    pub event_type: EventType,
    pub operation: Operation,
    pub entity_id: i32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PopularQuery {
    pub limit: u64,
    pub genre_id: Option<i32>,
    pub year: Option<i16>,
}

impl PopularQuery {
    pub fn top(limit: u64) -> Self {
        Self { limit, ..Default::default() }
    }

    pub fn genre(mut self, genre_id: i32) -> Self {
        self.genre_id = Some(genre_id);
        self
    }

    pub fn year(mut self, year: i16) -> Self {
        self.year = Some(year);
        self
    }
}
