use std::collections::BTreeSet;

use async_trait::async_trait;
use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    JoinType, ModelTrait, Order, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    Set, TransactionTrait,
    sea_query::{Expr, OnConflict, Query, SelectStatement},
};
use tracing::{debug, info};

use super::{FilmStore, ReviewStore, UserStore, now_millis};
use crate::{
    entities::{
        director, feed_event, film, film_director, film_genre, film_like, genre, mpa, review,
        review_reaction, users,
    },
    error::{EntityKind, StoreError, StoreResult},
    models::{
        Director, Event, EventType, Film, Genre, Mpa, Operation, PopularQuery, Reaction, Review,
        SortBy, User,
    },
};

/// Relational store on top of a `sea-orm` connection.
///
/// Every write that touches more than one row (film create/update, likes
/// with their feed event, review changes) runs in a single transaction. Reads
/// assemble a film with one query per sub-relation, so a concurrent writer
/// may interleave between them.
#[derive(Clone, Debug)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<genre::Model> for Genre {
    fn from(m: genre::Model) -> Self {
        Genre { id: m.id, name: m.name }
    }
}

impl From<mpa::Model> for Mpa {
    fn from(m: mpa::Model) -> Self {
        Mpa { id: m.id, name: m.name }
    }
}

impl From<director::Model> for Director {
    fn from(m: director::Model) -> Self {
        Director { id: m.id, name: m.name }
    }
}

async fn resolve_genre<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<Genre> {
    genre::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(Genre::from)
        .ok_or(StoreError::not_found(EntityKind::Genre, id))
}

async fn resolve_mpa<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<Mpa> {
    mpa::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(Mpa::from)
        .ok_or(StoreError::not_found(EntityKind::Mpa, id))
}

async fn resolve_director<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<Director> {
    director::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(Director::from)
        .ok_or(StoreError::not_found(EntityKind::Director, id))
}

async fn film_row<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<film::Model> {
    film::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::not_found(EntityKind::Film, id))
}

async fn likes<C: ConnectionTrait>(conn: &C, film_id: i32) -> StoreResult<BTreeSet<i32>> {
    let rows = film_like::Entity::find()
        .filter(film_like::Column::FilmId.eq(film_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.user_id).collect())
}

/// Release dates are stored as ISO text and sorted and year-filtered as
/// text. That only agrees with chronological order for years 0 through 9999;
/// validation keeps release dates on or after 1895-12-28.
fn encode_release_date(date: Date) -> String {
    debug_assert!(
        (0..=9999).contains(&date.year()),
        "release date {date} does not sort as text"
    );
    date.to_string()
}

fn parse_date(table: &str, id: i32, raw: &str) -> StoreResult<Date> {
    raw.parse()
        .map_err(|e| DbErr::Type(format!("{table} {id}: bad date {raw:?}: {e}")).into())
}

fn parse_release_date(row: &film::Model) -> StoreResult<Date> {
    parse_date("film", row.id, &row.release_date)
}

async fn assemble<C: ConnectionTrait>(conn: &C, row: film::Model) -> StoreResult<Film> {
    let release_date = parse_release_date(&row)?;
    let mpa = resolve_mpa(conn, row.mpa_id).await?;

    let genres = genre::Entity::find()
        .inner_join(film_genre::Entity)
        .filter(film_genre::Column::FilmId.eq(row.id))
        .order_by_asc(genre::Column::Id)
        .all(conn)
        .await?;

    let directors = director::Entity::find()
        .inner_join(film_director::Entity)
        .filter(film_director::Column::FilmId.eq(row.id))
        .order_by_asc(director::Column::Id)
        .all(conn)
        .await?;

    let likes = likes(conn, row.id).await?;

    Ok(Film {
        id: row.id,
        name: row.name,
        description: row.description,
        release_date,
        duration: row.duration,
        mpa,
        genres: genres.into_iter().map(Genre::from).collect(),
        directors: directors.into_iter().map(Director::from).collect(),
        likes,
    })
}

async fn assemble_all<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<film::Model>,
) -> StoreResult<Vec<Film>> {
    let mut films = Vec::with_capacity(rows.len());
    for row in rows {
        films.push(assemble(conn, row).await?);
    }
    Ok(films)
}

async fn check_references<C: ConnectionTrait>(conn: &C, film: &Film) -> StoreResult<()> {
    resolve_mpa(conn, film.mpa.id).await?;
    for id in film.genre_ids() {
        resolve_genre(conn, id).await?;
    }
    for id in film.director_ids() {
        resolve_director(conn, id).await?;
    }
    Ok(())
}

/// Brings the film's genre rows in line with `wanted`, touching only the difference.
async fn sync_genres<C: ConnectionTrait>(
    conn: &C,
    film_id: i32,
    wanted: &BTreeSet<i32>,
) -> StoreResult<()> {
    let current: BTreeSet<i32> = film_genre::Entity::find()
        .filter(film_genre::Column::FilmId.eq(film_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.genre_id)
        .collect();

    let stale: Vec<i32> = current.difference(wanted).copied().collect();
    if !stale.is_empty() {
        film_genre::Entity::delete_many()
            .filter(film_genre::Column::FilmId.eq(film_id))
            .filter(film_genre::Column::GenreId.is_in(stale))
            .exec(conn)
            .await?;
    }

    for &genre_id in wanted.difference(&current) {
        let model = film_genre::ActiveModel { film_id: Set(film_id), genre_id: Set(genre_id) };
        film_genre::Entity::insert(model).exec(conn).await?;
    }
    Ok(())
}

async fn sync_directors<C: ConnectionTrait>(
    conn: &C,
    film_id: i32,
    wanted: &BTreeSet<i32>,
) -> StoreResult<()> {
    let current: BTreeSet<i32> = film_director::Entity::find()
        .filter(film_director::Column::FilmId.eq(film_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.director_id)
        .collect();

    let stale: Vec<i32> = current.difference(wanted).copied().collect();
    if !stale.is_empty() {
        film_director::Entity::delete_many()
            .filter(film_director::Column::FilmId.eq(film_id))
            .filter(film_director::Column::DirectorId.is_in(stale))
            .exec(conn)
            .await?;
    }

    for &director_id in wanted.difference(&current) {
        let model =
            film_director::ActiveModel { film_id: Set(film_id), director_id: Set(director_id) };
        film_director::Entity::insert(model).exec(conn).await?;
    }
    Ok(())
}

async fn resolve_user<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::not_found(EntityKind::User, id))
}

fn user_from_row(row: users::Model) -> StoreResult<User> {
    let birthday = parse_date("users", row.id, &row.birthday)?;
    Ok(User { id: row.id, email: row.email, login: row.login, name: row.name, birthday })
}

impl From<review::Model> for Review {
    fn from(m: review::Model) -> Self {
        Review {
            review_id: m.id,
            content: m.content,
            is_positive: m.is_positive,
            user_id: m.user_id,
            film_id: m.film_id,
            useful: m.useful,
        }
    }
}

async fn review_row<C: ConnectionTrait>(conn: &C, id: i32) -> StoreResult<review::Model> {
    review::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::not_found(EntityKind::Review, id))
}

/// Recomputes the cached `useful` score of a review from its reactions.
async fn refresh_useful<C: ConnectionTrait>(
    conn: &C,
    review_id: i32,
) -> StoreResult<review::Model> {
    let row = review_row(conn, review_id).await?;
    let useful: i32 = row
        .find_related(review_reaction::Entity)
        .all(conn)
        .await?
        .iter()
        .map(|r| if r.is_useful { 1 } else { -1 })
        .sum();

    let mut model: review::ActiveModel = row.into();
    model.useful = Set(useful);
    Ok(model.update(conn).await?)
}

async fn record_event<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_type: EventType,
    operation: Operation,
    entity_id: i32,
) -> StoreResult<()> {
    let model = feed_event::ActiveModel {
        id: Default::default(),
        timestamp: Set(now_millis()),
        user_id: Set(user_id),
        event_type: Set(event_type.as_code()),
        operation: Set(operation.as_code()),
        entity_id: Set(entity_id),
    };
    feed_event::Entity::insert(model).exec(conn).await?;
    Ok(())
}

fn event_from_row(row: feed_event::Model) -> StoreResult<Event> {
    let bad_code = |what: &str, code: i32| {
        StoreError::from(DbErr::Type(format!("feed_event {}: unknown {what} {code}", row.id)))
    };
    Ok(Event {
        event_id: row.id,
        timestamp: row.timestamp,
        user_id: row.user_id,
        event_type: EventType::from_code(row.event_type)
            .ok_or_else(|| bad_code("event type", row.event_type))?,
        operation: Operation::from_code(row.operation)
            .ok_or_else(|| bad_code("operation", row.operation))?,
        entity_id: row.entity_id,
    })
}

/// Orders films by like count descending, then id ascending.
fn rank_by_likes(select: Select<film::Entity>) -> Select<film::Entity> {
    select
        .join(JoinType::LeftJoin, film::Relation::FilmLike.def())
        .group_by(film::Column::Id)
        .order_by(Expr::col((film_like::Entity, film_like::Column::UserId)).count(), Order::Desc)
        .order_by_asc(film::Column::Id)
}

fn films_with_genre(genre_id: i32) -> SelectStatement {
    Query::select()
        .column(film_genre::Column::FilmId)
        .from(film_genre::Entity)
        .and_where(film_genre::Column::GenreId.eq(genre_id))
        .to_owned()
}

fn films_by(director_id: i32) -> SelectStatement {
    Query::select()
        .column(film_director::Column::FilmId)
        .from(film_director::Entity)
        .and_where(film_director::Column::DirectorId.eq(director_id))
        .to_owned()
}

#[async_trait]
impl FilmStore for SqlStore {
    async fn genre(&self, id: i32) -> StoreResult<Genre> {
        resolve_genre(&self.db, id).await
    }

    async fn genres(&self) -> StoreResult<Vec<Genre>> {
        let rows = genre::Entity::find().order_by_asc(genre::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Genre::from).collect())
    }

    async fn mpa(&self, id: i32) -> StoreResult<Mpa> {
        resolve_mpa(&self.db, id).await
    }

    async fn mpa_ratings(&self) -> StoreResult<Vec<Mpa>> {
        let rows = mpa::Entity::find().order_by_asc(mpa::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Mpa::from).collect())
    }

    async fn director(&self, id: i32) -> StoreResult<Director> {
        resolve_director(&self.db, id).await
    }

    async fn directors(&self) -> StoreResult<Vec<Director>> {
        let rows = director::Entity::find().order_by_asc(director::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Director::from).collect())
    }

    async fn create_director(&self, director: Director) -> StoreResult<Director> {
        let model =
            director::ActiveModel { id: Default::default(), name: Set(director.name.clone()) };
        let id = director::Entity::insert(model).exec(&self.db).await?.last_insert_id;
        info!(director_id = id, "director created");
        Ok(Director { id, name: director.name })
    }

    async fn update_director(&self, director: Director) -> StoreResult<Director> {
        let existing = director::Entity::find_by_id(director.id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::not_found(EntityKind::Director, director.id))?;

        let mut model: director::ActiveModel = existing.into();
        model.name = Set(director.name);
        let updated = model.update(&self.db).await?;
        info!(director_id = updated.id, "director updated");
        Ok(updated.into())
    }

    async fn likes_of(&self, film_id: i32) -> StoreResult<BTreeSet<i32>> {
        film_row(&self.db, film_id).await?;
        likes(&self.db, film_id).await
    }

    async fn film(&self, id: i32) -> StoreResult<Film> {
        let row = film_row(&self.db, id).await?;
        assemble(&self.db, row).await
    }

    async fn films(&self) -> StoreResult<Vec<Film>> {
        let rows = film::Entity::find().order_by_asc(film::Column::Id).all(&self.db).await?;
        assemble_all(&self.db, rows).await
    }

    async fn create_film(&self, film: Film) -> StoreResult<Film> {
        let txn = self.db.begin().await?;
        check_references(&txn, &film).await?;

        let row = film::ActiveModel {
            id: Default::default(),
            name: Set(film.name.clone()),
            description: Set(film.description.clone()),
            release_date: Set(encode_release_date(film.release_date)),
            duration: Set(film.duration),
            mpa_id: Set(film.mpa.id),
        };
        let id = film::Entity::insert(row).exec(&txn).await?.last_insert_id;

        sync_genres(&txn, id, &film.genre_ids()).await?;
        sync_directors(&txn, id, &film.director_ids()).await?;

        let created = assemble(&txn, film_row(&txn, id).await?).await?;
        txn.commit().await?;

        info!(film_id = id, "film created");
        Ok(created)
    }

    async fn update_film(&self, film: Film) -> StoreResult<Film> {
        let txn = self.db.begin().await?;
        let existing = film_row(&txn, film.id).await?;
        check_references(&txn, &film).await?;

        let mut row: film::ActiveModel = existing.into();
        row.name = Set(film.name.clone());
        row.description = Set(film.description.clone());
        row.release_date = Set(encode_release_date(film.release_date));
        row.duration = Set(film.duration);
        row.mpa_id = Set(film.mpa.id);
        let row = row.update(&txn).await?;

        sync_genres(&txn, film.id, &film.genre_ids()).await?;
        sync_directors(&txn, film.id, &film.director_ids()).await?;

        let updated = assemble(&txn, row).await?;
        txn.commit().await?;

        info!(film_id = film.id, "film updated");
        Ok(updated)
    }

    async fn like(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        let txn = self.db.begin().await?;
        film_row(&txn, film_id).await?;

        let model = film_like::ActiveModel { film_id: Set(film_id), user_id: Set(user_id) };
        let inserted = film_like::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([film_like::Column::FilmId, film_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&txn)
            .await;

        match inserted {
            Ok(_) => {
                record_event(&txn, user_id, EventType::Like, Operation::Add, film_id).await?;
                info!(film_id, user_id, "like added");
            },
            Err(DbErr::RecordNotInserted) => debug!(film_id, user_id, "like already present"),
            Err(e) => return Err(e.into()),
        }
        txn.commit().await?;

        self.film(film_id).await
    }

    async fn unlike(&self, film_id: i32, user_id: i32) -> StoreResult<Film> {
        let txn = self.db.begin().await?;
        film_row(&txn, film_id).await?;
        resolve_user(&txn, user_id).await?;

        let res = film_like::Entity::delete_by_id((film_id, user_id)).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(StoreError::LikeNotFound { film_id, user_id });
        }
        record_event(&txn, user_id, EventType::Like, Operation::Remove, film_id).await?;
        txn.commit().await?;
        info!(film_id, user_id, "like removed");

        self.film(film_id).await
    }

    async fn popular(&self, query: PopularQuery) -> StoreResult<Vec<Film>> {
        let mut select = rank_by_likes(film::Entity::find()).limit(query.limit);

        if let Some(genre_id) = query.genre_id {
            select = select.filter(film::Column::Id.in_subquery(films_with_genre(genre_id)));
        }
        if let Some(year) = query.year {
            let prefix = format!("{year:04}-");
            select = select.filter(film::Column::ReleaseDate.starts_with(&prefix));
        }

        let rows = select.all(&self.db).await?;
        debug!(count = rows.len(), ?query, "popular films selected");
        assemble_all(&self.db, rows).await
    }

    async fn films_by_director(&self, director_id: i32, sort: SortBy) -> StoreResult<Vec<Film>> {
        resolve_director(&self.db, director_id).await?;

        let select =
            film::Entity::find().filter(film::Column::Id.in_subquery(films_by(director_id)));
        let select = match sort {
            SortBy::Year => select
                .order_by_asc(film::Column::ReleaseDate)
                .order_by_asc(film::Column::Id),
            SortBy::Likes => rank_by_likes(select),
        };

        let rows = select.all(&self.db).await?;
        debug!(director_id, count = rows.len(), ?sort, "director films selected");
        assemble_all(&self.db, rows).await
    }
}

#[async_trait]
impl UserStore for SqlStore {
    async fn user(&self, id: i32) -> StoreResult<User> {
        user_from_row(resolve_user(&self.db, id).await?)
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let rows = users::Entity::find().order_by_asc(users::Column::Id).all(&self.db).await?;
        rows.into_iter().map(user_from_row).collect()
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let model = users::ActiveModel {
            id: Default::default(),
            email: Set(user.email),
            login: Set(user.login),
            name: Set(user.name),
            birthday: Set(user.birthday.to_string()),
        };
        let created = model.insert(&self.db).await?;
        info!(user_id = created.id, "user created");
        user_from_row(created)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let existing = resolve_user(&self.db, user.id).await?;

        let mut model: users::ActiveModel = existing.into();
        model.email = Set(user.email);
        model.login = Set(user.login);
        model.name = Set(user.name);
        model.birthday = Set(user.birthday.to_string());
        let updated = model.update(&self.db).await?;
        info!(user_id = updated.id, "user updated");
        user_from_row(updated)
    }

    async fn feed(&self, user_id: i32) -> StoreResult<Vec<Event>> {
        resolve_user(&self.db, user_id).await?;
        let rows = feed_event::Entity::find()
            .filter(feed_event::Column::UserId.eq(user_id))
            .order_by_asc(feed_event::Column::Id)
            .all(&self.db)
            .await?;
        rows.into_iter().map(event_from_row).collect()
    }
}

#[async_trait]
impl ReviewStore for SqlStore {
    async fn review(&self, id: i32) -> StoreResult<Review> {
        Ok(review_row(&self.db, id).await?.into())
    }

    async fn reviews(&self, film_id: Option<i32>, limit: u64) -> StoreResult<Vec<Review>> {
        let mut select = review::Entity::find();
        if let Some(film_id) = film_id {
            select = select.filter(review::Column::FilmId.eq(film_id));
        }
        let rows = select
            .order_by_desc(review::Column::Useful)
            .order_by_asc(review::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn create_review(&self, review: Review) -> StoreResult<Review> {
        let txn = self.db.begin().await?;
        resolve_user(&txn, review.user_id).await?;
        film_row(&txn, review.film_id).await?;

        let model = review::ActiveModel {
            id: Default::default(),
            content: Set(review.content),
            is_positive: Set(review.is_positive),
            user_id: Set(review.user_id),
            film_id: Set(review.film_id),
            useful: Set(0),
        };
        let created = model.insert(&txn).await?;
        record_event(&txn, created.user_id, EventType::Review, Operation::Add, created.id).await?;
        txn.commit().await?;

        info!(review_id = created.id, film_id = created.film_id, "review created");
        Ok(created.into())
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let txn = self.db.begin().await?;
        let existing = review_row(&txn, review.review_id).await?;

        let mut model: review::ActiveModel = existing.into();
        model.content = Set(review.content);
        model.is_positive = Set(review.is_positive);
        let updated = model.update(&txn).await?;
        record_event(&txn, updated.user_id, EventType::Review, Operation::Update, updated.id)
            .await?;
        txn.commit().await?;

        info!(review_id = updated.id, "review updated");
        Ok(updated.into())
    }

    async fn delete_review(&self, id: i32) -> StoreResult<Review> {
        let txn = self.db.begin().await?;
        let existing = review_row(&txn, id).await?;

        review_reaction::Entity::delete_many()
            .filter(review_reaction::Column::ReviewId.eq(id))
            .exec(&txn)
            .await?;
        review::Entity::delete_by_id(id).exec(&txn).await?;
        record_event(&txn, existing.user_id, EventType::Review, Operation::Remove, id).await?;
        txn.commit().await?;

        info!(review_id = id, "review deleted");
        Ok(existing.into())
    }

    async fn react(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        let txn = self.db.begin().await?;
        review_row(&txn, review_id).await?;
        resolve_user(&txn, user_id).await?;

        let model = review_reaction::ActiveModel {
            review_id: Set(review_id),
            user_id: Set(user_id),
            is_useful: Set(reaction.is_useful()),
        };
        review_reaction::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    review_reaction::Column::ReviewId,
                    review_reaction::Column::UserId,
                ])
                .update_column(review_reaction::Column::IsUseful)
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        let row = refresh_useful(&txn, review_id).await?;
        txn.commit().await?;

        debug!(review_id, user_id, ?reaction, "reaction set");
        Ok(row.into())
    }

    async fn unreact(
        &self,
        review_id: i32,
        user_id: i32,
        reaction: Reaction,
    ) -> StoreResult<Review> {
        let txn = self.db.begin().await?;
        review_row(&txn, review_id).await?;
        resolve_user(&txn, user_id).await?;

        let held = review_reaction::Entity::find_by_id((review_id, user_id)).one(&txn).await?;
        if held.map(|r| Reaction::from_useful(r.is_useful)) != Some(reaction) {
            return Err(StoreError::ReactionNotFound { review_id, user_id, reaction });
        }
        review_reaction::Entity::delete_by_id((review_id, user_id)).exec(&txn).await?;
        let row = refresh_useful(&txn, review_id).await?;
        txn.commit().await?;

        debug!(review_id, user_id, ?reaction, "reaction removed");
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn release_dates_encode_as_sortable_iso_text() {
        assert_eq!(encode_release_date(date(1895, 12, 28)), "1895-12-28");
        assert!(encode_release_date(date(999, 1, 1)) < encode_release_date(date(1999, 1, 1)));
        assert!(encode_release_date(date(1999, 12, 31)) < encode_release_date(date(2000, 1, 1)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "does not sort as text")]
    fn negative_release_years_trip_the_debug_check() {
        encode_release_date(date(-2, 1, 1));
    }

    #[test]
    fn stored_dates_parse_back() {
        assert_eq!(parse_date("users", 1, "1990-05-17").unwrap(), date(1990, 5, 17));
        assert!(parse_date("users", 1, "17.05.1990").is_err());
    }
}
