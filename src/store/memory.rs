use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use jiff::civil::Date;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{FilmStore, ReviewStore, UserStore, now_millis};
use crate::{
    error::{EntityKind, StoreError, StoreResult},
    models::{
        Director, Event, EventType, Film, Genre, Mpa, Operation, PopularQuery, Reaction, Review,
        SortBy, User,
    },
    ranking,
};

#[derive(Clone, Debug)]
struct FilmRow {
    id: i32,
    name: String,
    description: String,
    release_date: Date,
    duration: i32,
    mpa_id: i32,
    genre_ids: BTreeSet<i32>,
    director_ids: BTreeSet<i32>,
    likes: BTreeSet<i32>,
}

#[derive(Clone, Debug)]
struct ReviewRow {
    review: Review,
    reactions: BTreeMap<i32, Reaction>,
}

impl ReviewRow {
    fn to_review(&self) -> Review {
        let useful = self
            .reactions
            .values()
            .map(|reaction| if reaction.is_useful() { 1 } else { -1 })
            .sum();
        Review { useful, ..self.review.clone() }
    }
}

#[derive(Debug)]
struct Tables {
    genres: BTreeMap<i32, String>,
    mpa: BTreeMap<i32, String>,
    directors: BTreeMap<i32, String>,
    films: BTreeMap<i32, FilmRow>,
    users: BTreeMap<i32, User>,
    reviews: BTreeMap<i32, ReviewRow>,
    events: Vec<Event>,
    last_film_id: i32,
    last_director_id: i32,
    last_user_id: i32,
    last_review_id: i32,
}

/// Process-local store. All tables sit behind a single lock, so writes to
/// the same film are serialized and readers never see a half-applied change.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty catalog seeded with the standard genre and MPA tables.
    pub fn new() -> Self {
        let seed = |rows: &[(i32, &str)]| {
            rows.iter().map(|&(id, name)| (id, name.to_string())).collect::<BTreeMap<_, _>>()
        };
        Self {
            tables: RwLock::new(Tables {
                genres: seed(migration::GENRES),
                mpa: seed(migration::MPA_RATINGS),
                directors: BTreeMap::new(),
                films: BTreeMap::new(),
                users: BTreeMap::new(),
                reviews: BTreeMap::new(),
                events: Vec::new(),
                last_film_id: 0,
                last_director_id: 0,
                last_user_id: 0,
                last_review_id: 0,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn genre(&self, id: i32) -> StoreResult<Genre> {
        self.genres
            .get(&id)
            .map(|name| Genre { id, name: name.clone() })
            .ok_or(StoreError::not_found(EntityKind::Genre, id))
    }

    fn mpa(&self, id: i32) -> StoreResult<Mpa> {
        self.mpa
            .get(&id)
            .map(|name| Mpa { id, name: name.clone() })
            .ok_or(StoreError::not_found(EntityKind::Mpa, id))
    }

    fn director(&self, id: i32) -> StoreResult<Director> {
        self.directors
            .get(&id)
            .map(|name| Director { id, name: name.clone() })
            .ok_or(StoreError::not_found(EntityKind::Director, id))
    }

    fn row(&self, id: i32) -> StoreResult<&FilmRow> {
        self.films.get(&id).ok_or(StoreError::not_found(EntityKind::Film, id))
    }

    fn row_mut(&mut self, id: i32) -> StoreResult<&mut FilmRow> {
        self.films.get_mut(&id).ok_or(StoreError::not_found(EntityKind::Film, id))
    }

    fn assemble(&self, row: &FilmRow) -> StoreResult<Film> {
        Ok(Film {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            release_date: row.release_date,
            duration: row.duration,
            mpa: self.mpa(row.mpa_id)?,
            genres: row.genre_ids.iter().map(|&id| self.genre(id)).collect::<StoreResult<_>>()?,
            directors: row
                .director_ids
                .iter()
                .map(|&id| self.director(id))
                .collect::<StoreResult<_>>()?,
            likes: row.likes.clone(),
        })
    }

    fn film(&self, id: i32) -> StoreResult<Film> {
        self.assemble(self.row(id)?)
    }

    fn all_films(&self) -> StoreResult<Vec<Film>> {
        self.films.values().map(|row| self.assemble(row)).collect()
    }

    fn check_references(&self, film: &Film) -> StoreResult<()> {
        self.mpa(film.mpa.id)?;
        for id in film.genre_ids() {
            self.genre(id)?;
        }
        for id in film.director_ids() {
            self.director(id)?;
        }
        Ok(())
    }

    fn user(&self, id: i32) -> StoreResult<&User> {
        self.users.get(&id).ok_or(StoreError::not_found(EntityKind::User, id))
    }

    fn review_row(&self, id: i32) -> StoreResult<&ReviewRow> {
        self.reviews.get(&id).ok_or(StoreError::not_found(EntityKind::Review, id))
    }

    fn review_row_mut(&mut self, id: i32) -> StoreResult<&mut ReviewRow> {
        self.reviews.get_mut(&id).ok_or(StoreError::not_found(EntityKind::Review, id))
    }

    fn record(
        &mut self,
        user_id: i32,
        event_type: EventType,
        operation: Operation,
        entity_id: i32,
    ) {
        let event_id = self.events.len() as i32 + 1;
        self.events.push(Event {
            event_id,
            timestamp: now_millis(),
            user_id,
            event_type,
            operation,
            entity_id,
        });
    }
}

#[async_trait]
impl FilmStore for MemoryStore {
    async fn genre(&self, id: i32) -> StoreResult<Genre> {
        self.tables.read().await.genre(id)
    }

    async fn genres(&self) -> StoreResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables.genres.iter().map(|(&id, name)| Genre { id, name: name.clone() }).collect())
    }

    async fn mpa(&self, id: i32) -> StoreResult<Mpa> {
        self.tables.read().await.mpa(id)
    }

    async fn mpa_ratings(&self) -> StoreResult<Vec<Mpa>> {
        let tables = self.tables.read().await;
        Ok(tables.mpa.iter().map(|(&id, name)| Mpa { id, name: name.clone() }).collect())
    }

    async fn director(&self, id: i32) -> StoreResult<Director> {
        self.tables.read().await.director(id)
    }

    async fn directors(&self) -> StoreResult<Vec<Director>> {
        let tables = self.tables.read().await;
        Ok(tables.directors.iter().map(|(&id, name)| Director { id, name: name.clone() }).collect())
    }

    async fn create_director(&self, director: Director) -> StoreResult<Director> {
        let mut tables = self.tables.write().await;
        tables.last_director_id += 1;
        let id = tables.last_director_id;
        tables.directors.insert(id, director.name.clone());
        info!(director_id = id, "director created");
        Ok(Director { id, name: director.name })
    }

    async fn update_director(&self, director: Director) -> StoreResult<Director> {
        let mut tables = self.tables.write().await;
        let name = tables
            .directors
            .get_mut(&director.id)
            .ok_or(StoreError::not_found(EntityKind::Director, director.id))?;
        name.clone_from(&director.name);
        info!(director_id = director.id, "director updated");
        Ok(director)
    }

    async fn likes_of(&self, film_id: i32) -> StoreResult<BTreeSet<i32>> {
        Ok(self.tables.read().await.row(film_id)?.likes.clone())
    }

    async fn film(&self, id: i32) -> StoreResult<Film> {
        self.tables.read().await.film(id)
    }

    async fn films(&self) -> StoreResult<Vec<Film>> {
        self.tables.read().await.all_films()
    }

    async fn create_film(&self, film: Film) -> StoreResult<Film> {
        let mut tables = self.tables.write().await;
        tables.check_references(&film)?;

        tables.last_film_id += 1;
        let id = tables.last_film_id;
        let row = FilmRow {
            id,
            genre_ids: film.genre_ids(),
            director_ids: film.director_ids(),
            name: film.name,
            description: film.description,
            release_date: film.release_date,
            duration: film.duration,
            mpa_id: film.mpa.id,
            likes: BTreeSet::new(),
        };
        tables.films.insert(id, row);
        info!(film_id = id, "film created");
        tables.film(id)
    }

    async fn update_film(&self, film: Film) -> StoreResult<Film> {
        let mut tables = self.tables.write().await;
        tables.row(film.id)?;
        tables.check_references(&film)?;

        let row = tables.row_mut(film.id)?;
        row.genre_ids = film.genre_ids();
        row.director_ids = film.director_ids();
        row.name = film.name;
        row.description = film.description;
        row.release_date = film.release_date;
        row.duration = film.duration;
        row.mpa_id = film.mpa.id;
        info!(film_id = film.id, "film updated");
        tables.film(film.id)
    }

    async fn like(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        let mut tables = self.tables.write().await;
        if tables.row_mut(film_id)?.likes.insert(user_id) {
            tables.record(user_id, EventType::Like, Operation::Add, film_id);
            info!(film_id, user_id, "like added");
        } else {
            debug!(film_id, user_id, "like already present");
        }
        tables.film(film_id)
    }

    async fn unlike(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        let mut tables = self.tables.write().await;
        tables.row(film_id)?;
        tables.user(user_id)?;
        if !tables.row_mut(film_id)?.likes.remove(&user_id) {
            return Err(StoreError::LikeNotFound { film_id, user_id });
        }
        tables.record(user_id, EventType::Like, Operation::Remove, film_id);
        info!(film_id, user_id, "like removed");
        tables.film(film_id)
    }

    async fn popular(&self, query: PopularQuery) -> StoreResult<Vec<Film>> {
        let tables = self.tables.read().await;
        Ok(ranking::popular(tables.all_films()?, &query))
    }

    async fn films_by_director(&self, director_id: i32, sort: SortBy) -> StoreResult<Vec<Film>> {
        let tables = self.tables.read().await;
        tables.director(director_id)?;
        Ok(ranking::filmography(tables.all_films()?, director_id, sort))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user(&self, id: i32) -> StoreResult<User> {
        self.tables.read().await.user(id).cloned()
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        tables.last_user_id += 1;
        let user = User { id: tables.last_user_id, ..user };
        tables.users.insert(user.id, user.clone());
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::not_found(EntityKind::User, user.id))?;
        stored.clone_from(&user);
        info!(user_id = user.id, "user updated");
        Ok(user)
    }

    async fn feed(&self, user_id: i32) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read().await;
        tables.user(user_id)?;
        Ok(tables.events.iter().filter(|event| event.user_id == user_id).cloned().collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn review(&self, id: i32) -> StoreResult<Review> {
        Ok(self.tables.read().await.review_row(id)?.to_review())
    }

    async fn reviews(&self, film_id: Option<i32>, limit: u64) -> StoreResult<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|row| film_id.is_none_or(|id| row.review.film_id == id))
            .map(ReviewRow::to_review)
            .collect();
        reviews.sort_by_key(|review| (std::cmp::Reverse(review.useful), review.review_id));
        reviews.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(reviews)
    }

    async fn create_review(&self, review: Review) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        tables.user(review.user_id)?;
        tables.row(review.film_id)?;

        tables.last_review_id += 1;
        let id = tables.last_review_id;
        let review = Review { review_id: id, useful: 0, ..review };
        tables.reviews.insert(id, ReviewRow { review: review.clone(), reactions: BTreeMap::new() });
        tables.record(review.user_id, EventType::Review, Operation::Add, id);
        info!(review_id = id, film_id = review.film_id, "review created");
        Ok(review)
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        let row = tables.review_row_mut(review.review_id)?;
        row.review.content = review.content;
        row.review.is_positive = review.is_positive;
        let updated = row.to_review();
        tables.record(updated.user_id, EventType::Review, Operation::Update, updated.review_id);
        info!(review_id = updated.review_id, "review updated");
        Ok(updated)
    }

    async fn delete_review(&self, id: i32) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .reviews
            .remove(&id)
            .ok_or(StoreError::not_found(EntityKind::Review, id))?
            .to_review();
        tables.record(removed.user_id, EventType::Review, Operation::Remove, id);
        info!(review_id = id, "review deleted");
        Ok(removed)
    }

    async fn react(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        tables.review_row(review_id)?;
        tables.user(user_id)?;
        let row = tables.review_row_mut(review_id)?;
        row.reactions.insert(user_id, reaction);
        debug!(review_id, user_id, ?reaction, "reaction set");
        Ok(row.to_review())
    }

    async fn unreact(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        tables.review_row(review_id)?;
        tables.user(user_id)?;
        let row = tables.review_row_mut(review_id)?;
        if row.reactions.get(&user_id) != Some(&reaction) {
            return Err(StoreError::ReactionNotFound { review_id, user_id, reaction });
        }
        row.reactions.remove(&user_id);
        debug!(review_id, user_id, ?reaction, "reaction removed");
        Ok(row.to_review())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn film(name: &str) -> Film {
        Film {
            id: 0,
            name: name.to_string(),
            description: String::new(),
            release_date: date(2001, 1, 1),
            duration: 90,
            mpa: Mpa { id: 1, name: String::new() },
            genres: Vec::new(),
            directors: Vec::new(),
            likes: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn each_store_counts_ids_from_one() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();

        assert_eq!(a.create_film(film("a1")).await.unwrap().id, 1);
        assert_eq!(a.create_film(film("a2")).await.unwrap().id, 2);
        assert_eq!(b.create_film(film("b1")).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn concurrent_likes_are_not_lost() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let id = store.create_film(film("crowd")).await.unwrap().id;

        let tasks = (1..=50).map(|user| {
            let store = store.clone();
            tokio::spawn(async move { store.like(id, user).await })
        });
        for task in tasks.collect::<Vec<_>>() {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.likes_of(id).await.unwrap().len(), 50);
    }
}
