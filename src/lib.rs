pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod models;
pub mod ranking;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    catalog::Catalog,
    config::{Config, StorageKind},
    store::{MemoryStore, SqlStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
}

/// Opens the store selected by `config.storage`.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.storage {
        StorageKind::Memory => Arc::new(MemoryStore::new()),
        StorageKind::Sqlite => {
            let db = db::connect_and_migrate(&config.database_url).await?;
            Arc::new(SqlStore::new(db))
        },
    };
    Ok(store)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/films", get(routes::list_films).post(routes::create_film).put(routes::update_film))
        .route("/films/popular", get(routes::popular_films))
        .route("/films/director/{director_id}", get(routes::director_films))
        .route("/films/{id}", get(routes::get_film))
        .route("/films/{id}/like/{user_id}", put(routes::like_film).delete(routes::unlike_film))
        .route("/genres", get(routes::list_genres))
        .route("/genres/{id}", get(routes::get_genre))
        .route("/mpa", get(routes::list_mpa))
        .route("/mpa/{id}", get(routes::get_mpa))
        .route(
            "/directors",
            get(routes::list_directors).post(routes::create_director).put(routes::update_director),
        )
        .route("/directors/{id}", get(routes::get_director))
        .route(
            "/users",
            get(routes::list_users).post(routes::create_user).put(routes::update_user),
        )
        .route("/users/{id}", get(routes::get_user))
        .route("/users/{id}/feed", get(routes::user_feed))
        .route(
            "/reviews",
            get(routes::list_reviews).post(routes::create_review).put(routes::update_review),
        )
        .route("/reviews/{id}", get(routes::get_review).delete(routes::delete_review))
        .route(
            "/reviews/{id}/like/{user_id}",
            put(routes::like_review).delete(routes::remove_review_like),
        )
        .route(
            "/reviews/{id}/dislike/{user_id}",
            put(routes::dislike_review).delete(routes::remove_review_dislike),
        )
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
