//! The store contracts and their two backends.

mod memory;
mod sql;

use std::collections::BTreeSet;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sql::SqlStore;

use crate::{
    error::StoreResult,
    models::{Director, Event, Film, Genre, Mpa, PopularQuery, Reaction, Review, SortBy, User},
};

/// Persistence for films and the reference data they point at.
///
/// Both backends honour the same rules: ids are assigned by the store and
/// never reused, genre/director sets are replaced wholesale on update, a
/// repeated like is a no-op, and removing a like that does not exist fails.
#[async_trait]
pub trait FilmStore: Send + Sync {
    async fn genre(&self, id: i32) -> StoreResult<Genre>;
    async fn genres(&self) -> StoreResult<Vec<Genre>>;
    async fn mpa(&self, id: i32) -> StoreResult<Mpa>;
    async fn mpa_ratings(&self) -> StoreResult<Vec<Mpa>>;
    async fn director(&self, id: i32) -> StoreResult<Director>;
    async fn directors(&self) -> StoreResult<Vec<Director>>;
    async fn create_director(&self, director: Director) -> StoreResult<Director>;
    async fn update_director(&self, director: Director) -> StoreResult<Director>;

    /// User ids that liked `film_id`. Fails if the film does not exist.
    async fn likes_of(&self, film_id: i32) -> StoreResult<BTreeSet<i32>>;

    async fn film(&self, id: i32) -> StoreResult<Film>;
    /// Every film, ascending by id.
    async fn films(&self) -> StoreResult<Vec<Film>>;
    /// Persists `film` under a fresh id; any caller-supplied id and likes are ignored.
    async fn create_film(&self, film: Film) -> StoreResult<Film>;
    /// Overwrites the scalar fields and genre/director sets of an existing film.
    /// Likes are left untouched.
    async fn update_film(&self, film: Film) -> StoreResult<Film>;

    /// Adds a like and records a `LIKE`/`ADD` feed event for the user.
    /// Liking twice is a no-op and records nothing the second time.
    async fn like(&self, film_id: i32, user_id: i32) -> StoreResult<Film>;
    /// Removes a like and records a `LIKE`/`REMOVE` feed event. The film is
    /// checked first, then the user, then the like itself.
    async fn unlike(&self, film_id: i32, user_id: i32) -> StoreResult<Film>;

    async fn popular(&self, query: PopularQuery) -> StoreResult<Vec<Film>>;
    async fn films_by_director(&self, director_id: i32, sort: SortBy) -> StoreResult<Vec<Film>>;
}

/// Users and their activity feed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: i32) -> StoreResult<User>;
    async fn users(&self) -> StoreResult<Vec<User>>;
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
    /// Events recorded for `user_id`, oldest first.
    async fn feed(&self, user_id: i32) -> StoreResult<Vec<Event>>;
}

/// Film reviews and the like/dislike votes on them.
///
/// A user holds at most one reaction per review; reacting again replaces it.
/// Creating, editing and deleting a review each record a `REVIEW` feed event
/// for the review's author.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn review(&self, id: i32) -> StoreResult<Review>;
    /// Most useful first, ties by review id; limited to `film_id` when given.
    async fn reviews(&self, film_id: Option<i32>, limit: u64) -> StoreResult<Vec<Review>>;
    /// Fails if the author or the film does not exist.
    async fn create_review(&self, review: Review) -> StoreResult<Review>;
    /// Only `content` and `is_positive` change; author, film and score stay.
    async fn update_review(&self, review: Review) -> StoreResult<Review>;
    /// Removes the review with its reactions and returns what was removed.
    async fn delete_review(&self, id: i32) -> StoreResult<Review>;
    async fn react(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review>;
    /// Fails with `ReactionNotFound` unless the user holds exactly `reaction`.
    async fn unreact(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review>;
}

/// Everything the catalog needs from a backend.
pub trait Store: FilmStore + UserStore + ReviewStore {}

impl<T: FilmStore + UserStore + ReviewStore> Store for T {}

/// Feed timestamps: milliseconds since the Unix epoch.
fn now_millis() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}
