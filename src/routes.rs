use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{
    AppState,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    models::{Director, Event, Film, Genre, Mpa, PopularQuery, Reaction, Review, User},
    validation::{validate_director, validate_film, validate_review, validate_user},
};

fn today() -> jiff::civil::Date {
    jiff::Zoned::now().date()
}

pub async fn list_films(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.catalog.list_all_films().await?))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.get_film(id).await?))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    AppJson(film): AppJson<Film>,
) -> AppResult<(StatusCode, Json<Film>)> {
    validate_film(&film, today())?;
    let film = state.catalog.create_film(film).await?;
    info!(film_id = film.id, name = %film.name, "film added");
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    AppJson(film): AppJson<Film>,
) -> AppResult<Json<Film>> {
    validate_film(&film, today())?;
    Ok(Json(state.catalog.update_film(film).await?))
}

pub async fn like_film(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.like_film(id, user_id).await?))
}

pub async fn unlike_film(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.unlike_film(id, user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularParams {
    count: Option<u64>,
    genre_id: Option<i32>,
    year: Option<i16>,
}

pub async fn popular_films(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PopularParams>,
) -> AppResult<Json<Vec<Film>>> {
    let query = PopularQuery {
        limit: params.count.unwrap_or(state.config.popular_default_count),
        genre_id: params.genre_id,
        year: params.year,
    };
    Ok(Json(state.catalog.popular_films(query).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorFilmsParams {
    sort_by: Option<String>,
}

pub async fn director_films(
    State(state): State<Arc<AppState>>,
    AppPath(director_id): AppPath<i32>,
    AppQuery(params): AppQuery<DirectorFilmsParams>,
) -> AppResult<Json<Vec<Film>>> {
    let sort_mode = params.sort_by.as_deref().unwrap_or("year");
    Ok(Json(state.catalog.films_by_director(director_id, sort_mode).await?))
}

pub async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.genres().await?))
}

pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.catalog.genre(id).await?))
}

pub async fn list_mpa(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Mpa>>> {
    Ok(Json(state.catalog.mpa_ratings().await?))
}

pub async fn get_mpa(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Mpa>> {
    Ok(Json(state.catalog.mpa(id).await?))
}

pub async fn list_directors(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Director>>> {
    Ok(Json(state.catalog.directors().await?))
}

pub async fn get_director(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Director>> {
    Ok(Json(state.catalog.director(id).await?))
}

pub async fn create_director(
    State(state): State<Arc<AppState>>,
    AppJson(director): AppJson<Director>,
) -> AppResult<(StatusCode, Json<Director>)> {
    validate_director(&director)?;
    let director = state.catalog.create_director(director).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

pub async fn update_director(
    State(state): State<Arc<AppState>>,
    AppJson(director): AppJson<Director>,
) -> AppResult<Json<Director>> {
    validate_director(&director)?;
    Ok(Json(state.catalog.update_director(director).await?))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.catalog.users().await?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<User>> {
    Ok(Json(state.catalog.user(id).await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(user): AppJson<User>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_user(&user, today())?;
    let user = state.catalog.create_user(user).await?;
    info!(user_id = user.id, login = %user.login, "user added");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AppJson(user): AppJson<User>,
) -> AppResult<Json<User>> {
    validate_user(&user, today())?;
    Ok(Json(state.catalog.update_user(user).await?))
}

pub async fn user_feed(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.catalog.feed(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsParams {
    film_id: Option<i32>,
    count: Option<u64>,
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ReviewsParams>,
) -> AppResult<Json<Vec<Review>>> {
    let limit = params.count.unwrap_or(state.config.popular_default_count);
    Ok(Json(state.catalog.reviews(params.film_id, limit).await?))
}

pub async fn get_review(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.review(id).await?))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AppJson(review): AppJson<Review>,
) -> AppResult<(StatusCode, Json<Review>)> {
    validate_review(&review)?;
    let review = state.catalog.create_review(review).await?;
    info!(review_id = review.review_id, film_id = review.film_id, "review added");
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    AppJson(review): AppJson<Review>,
) -> AppResult<Json<Review>> {
    validate_review(&review)?;
    Ok(Json(state.catalog.update_review(review).await?))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.delete_review(id).await?))
}

pub async fn like_review(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.react_to_review(id, user_id, Reaction::Like).await?))
}

pub async fn dislike_review(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.react_to_review(id, user_id, Reaction::Dislike).await?))
}

pub async fn remove_review_like(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.remove_reaction(id, user_id, Reaction::Like).await?))
}

pub async fn remove_review_dislike(
    State(state): State<Arc<AppState>>,
    AppPath((id, user_id)): AppPath<(i32, i32)>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.catalog.remove_reaction(id, user_id, Reaction::Dislike).await?))
}
