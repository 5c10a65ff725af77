pub mod director;
pub mod feed_event;
pub mod film;
pub mod film_director;
pub mod film_genre;
pub mod film_like;
pub mod genre;
pub mod mpa;
pub mod review;
pub mod review_reaction;
pub mod users;
