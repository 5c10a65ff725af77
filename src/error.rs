use std::fmt;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::Reaction;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Film,
    Genre,
    Mpa,
    Director,
    User,
    Review,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Film => "film",
            EntityKind::Genre => "genre",
            EntityKind::Mpa => "mpa rating",
            EntityKind::Director => "director",
            EntityKind::User => "user",
            EntityKind::Review => "review",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i32 },
    #[error("user {user_id} has not liked film {film_id}")]
    LikeNotFound { film_id: i32, user_id: i32 },
    #[error("user {user_id} has not {} review {review_id}", verb(.reaction))]
    ReactionNotFound { review_id: i32, user_id: i32, reaction: Reaction },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: i32) -> Self {
        StoreError::NotFound { entity, id }
    }

    /// A missing entity and a missing like or reaction all count as not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::LikeNotFound { .. }
                | StoreError::ReactionNotFound { .. }
        )
    }
}

fn verb(reaction: &Reaction) -> &'static str {
    match reaction {
        Reaction::Like => "liked",
        Reaction::Dislike => "disliked",
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    source: anyhow::Error,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, source: anyhow::anyhow!(message.into()) }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, source: anyhow::Error::new(err) }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, source: err }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.source, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.source, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.source.to_string() }));
        (self.status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_name_the_entity() {
        let film = StoreError::not_found(EntityKind::Film, 7);
        let like = StoreError::LikeNotFound { film_id: 7, user_id: 3 };

        assert!(film.is_not_found());
        assert!(like.is_not_found());
        assert_eq!(film.to_string(), "film 7 not found");
        assert_eq!(like.to_string(), "user 3 has not liked film 7");
        assert_ne!(film.to_string(), like.to_string());

        let dislike =
            StoreError::ReactionNotFound { review_id: 2, user_id: 5, reaction: Reaction::Dislike };
        assert!(dislike.is_not_found());
        assert_eq!(dislike.to_string(), "user 5 has not disliked review 2");
    }


    #[test]
    fn store_errors_map_to_http_status() {
        let not_found = AppError::from(StoreError::not_found(EntityKind::Director, 1));
        let invalid = AppError::from(StoreError::Validation("bad".into()));
        let db = AppError::from(StoreError::Db(sea_orm::DbErr::Custom("boom".into())));

        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
