use std::sync::Arc;

use tracing::debug;

use crate::{
    error::StoreResult,
    models::{Director, Event, Film, Genre, Mpa, PopularQuery, Reaction, Review, SortBy, User},
    store::{FilmStore, ReviewStore, Store, UserStore},
};

/// Entry point for callers of the film catalog; routes every operation to
/// whichever store backs it.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_film(&self, id: i32) -> StoreResult<Film> {
        debug!(film_id = id, "get film");
        self.store.film(id).await
    }

    pub async fn list_all_films(&self) -> StoreResult<Vec<Film>> {
        self.store.films().await
    }

    pub async fn create_film(&self, film: Film) -> StoreResult<Film> {
        self.store.create_film(film).await
    }

    pub async fn update_film(&self, film: Film) -> StoreResult<Film> {
        self.store.update_film(film).await
    }

    pub async fn like_film(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        self.store.like(film_id, user_id).await
    }

    pub async fn unlike_film(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        self.store.unlike(film_id, user_id).await
    }

    pub async fn popular_films(&self, query: PopularQuery) -> StoreResult<Vec<Film>> {
        debug!(?query, "popular films");
        self.store.popular(query).await
    }

    /// `sort_mode` must be `"year"` or `"likes"`. A bad mode is rejected
    /// before the store is asked, so it wins over an unknown director.
    pub async fn films_by_director(
        &self,
        director_id: i32,
        sort_mode: &str,
    ) -> StoreResult<Vec<Film>> {
        debug!(director_id, sort_mode, "films by director");
        let sort: SortBy = sort_mode.parse()?;
        self.store.films_by_director(director_id, sort).await
    }

    pub async fn genre(&self, id: i32) -> StoreResult<Genre> {
        self.store.genre(id).await
    }

    pub async fn genres(&self) -> StoreResult<Vec<Genre>> {
        self.store.genres().await
    }

    pub async fn mpa(&self, id: i32) -> StoreResult<Mpa> {
        self.store.mpa(id).await
    }

    pub async fn mpa_ratings(&self) -> StoreResult<Vec<Mpa>> {
        self.store.mpa_ratings().await
    }

    pub async fn director(&self, id: i32) -> StoreResult<Director> {
        self.store.director(id).await
    }

    pub async fn directors(&self) -> StoreResult<Vec<Director>> {
        self.store.directors().await
    }

    pub async fn create_director(&self, director: Director) -> StoreResult<Director> {
        self.store.create_director(director).await
    }

    pub async fn update_director(&self, director: Director) -> StoreResult<Director> {
        self.store.update_director(director).await
    }

    pub async fn user(&self, id: i32) -> StoreResult<User> {
        self.store.user(id).await
    }

    pub async fn users(&self) -> StoreResult<Vec<User>> {
        self.store.users().await
    }

    /// A blank display name falls back to the login.
    pub async fn create_user(&self, user: User) -> StoreResult<User> {
        self.store.create_user(with_display_name(user)).await
    }

    pub async fn update_user(&self, user: User) -> StoreResult<User> {
        self.store.update_user(with_display_name(user)).await
    }

    pub async fn feed(&self, user_id: i32) -> StoreResult<Vec<Event>> {
        self.store.feed(user_id).await
    }

    pub async fn review(&self, id: i32) -> StoreResult<Review> {
        self.store.review(id).await
    }

    pub async fn reviews(&self, film_id: Option<i32>, limit: u64) -> StoreResult<Vec<Review>> {
        debug!(?film_id, limit, "list reviews");
        self.store.reviews(film_id, limit).await
    }

    pub async fn create_review(&self, review: Review) -> StoreResult<Review> {
        self.store.create_review(review).await
    }

    pub async fn update_review(&self, review: Review) -> StoreResult<Review> {
        self.store.update_review(review).await
    }

    pub async fn delete_review(&self, id: i32) -> StoreResult<Review> {
        self.store.delete_review(id).await
    }

    pub async fn react_to_review(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        self.store.react(review_id, user_id, reaction).await
    }

    pub async fn remove_reaction(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        self.store.unreact(review_id, user_id, reaction).await
    }
}

fn with_display_name(user: User) -> User {
    if user.name.trim().is_empty() {
        User { name: user.login.clone(), ..user }
    } else {
        user
    }
}
