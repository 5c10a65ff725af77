//! Ordering rules shared by every store.
//!
//! Ties are always broken by ascending film id, so repeated reads over
//! unchanged data return the same order.

use std::{cmp::Ordering, collections::BTreeMap};

use crate::models::{Film, PopularQuery, SortBy};

/// More likes first, then lower id.
pub fn by_likes(a: &Film, b: &Film) -> Ordering {
    b.like_count().cmp(&a.like_count()).then(a.id.cmp(&b.id))
}

/// Earlier release first, then lower id.
pub fn by_release(a: &Film, b: &Film) -> Ordering {
    a.release_date.cmp(&b.release_date).then(a.id.cmp(&b.id))
}

pub fn matches(film: &Film, query: &PopularQuery) -> bool {
    let genre_ok = query.genre_id.is_none_or(|g| film.genres.iter().any(|x| x.id == g));
    let year_ok = query.year.is_none_or(|y| film.release_date.year() == y);
    genre_ok && year_ok
}

pub fn popular(films: impl IntoIterator<Item = Film>, query: &PopularQuery) -> Vec<Film> {
    let mut out: Vec<Film> = films.into_iter().filter(|f| matches(f, query)).collect();
    out.sort_by(by_likes);
    out.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
    out
}

/// Films carrying `director_id`, deduplicated by film id and sorted by `sort`.
pub fn filmography(
    films: impl IntoIterator<Item = Film>,
    director_id: i32,
    sort: SortBy,
) -> Vec<Film> {
    let unique: BTreeMap<i32, Film> = films
        .into_iter()
        .filter(|f| f.directors.iter().any(|d| d.id == director_id))
        .map(|f| (f.id, f))
        .collect();

    let mut out: Vec<Film> = unique.into_values().collect();
    match sort {
        SortBy::Year => out.sort_by(by_release),
        SortBy::Likes => out.sort_by(by_likes),
    }
    out
}
