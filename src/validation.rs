use jiff::civil::{Date, date};

use crate::{
    error::AppError,
    models::{Director, Film, Review, User},
};

/// First public film screening; nothing may be released before it.
pub const CINEMA_EPOCH: Date = date(1895, 12, 28);

pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Field checks run on incoming films before they reach the catalog.
pub fn validate_film(film: &Film, today: Date) -> Result<(), AppError> {
    if film.name.trim().is_empty() {
        return Err(AppError::bad_request("film name must not be blank"));
    }
    if film.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::bad_request(format!(
            "film description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if film.release_date < CINEMA_EPOCH {
        return Err(AppError::bad_request(format!(
            "release date must not be before {CINEMA_EPOCH}"
        )));
    }
    if film.release_date > today {
        return Err(AppError::bad_request("release date must not be in the future"));
    }
    if film.duration <= 0 {
        return Err(AppError::bad_request("film duration must be positive"));
    }
    Ok(())
}

pub fn validate_director(director: &Director) -> Result<(), AppError> {
    if director.name.trim().is_empty() {
        return Err(AppError::bad_request("director name must not be blank"));
    }
    Ok(())
}

pub fn validate_user(user: &User, today: Date) -> Result<(), AppError> {
    if user.email.trim().is_empty() || !user.email.contains('@') {
        return Err(AppError::bad_request("email must be a valid address"));
    }
    if user.login.is_empty() || user.login.chars().any(char::is_whitespace) {
        return Err(AppError::bad_request("login must be non-empty and contain no spaces"));
    }
    if user.birthday > today {
        return Err(AppError::bad_request("birthday must not be in the future"));
    }
    Ok(())
}

pub fn validate_review(review: &Review) -> Result<(), AppError> {
    if review.content.trim().is_empty() {
        return Err(AppError::bad_request("review content must not be blank"));
    }
    Ok(())
}


#[cfg(test)]
mod social_tests {
    use super::*;

    const TODAY: Date = date(2024, 5, 1);

    fn user() -> User {
        User {
            id: 0,
            email: "fritz@ufa.de".into(),
            login: "fritz".into(),
            name: String::new(),
            birthday: date(1890, 12, 5),
        }
    }

    #[test]
    fn user_fields_are_checked() {
        assert!(validate_user(&user(), TODAY).is_ok());
        assert!(validate_user(&User { email: "fritz.ufa.de".into(), ..user() }, TODAY).is_err());
        assert!(validate_user(&User { login: "fritz lang".into(), ..user() }, TODAY).is_err());
        assert!(validate_user(&User { login: String::new(), ..user() }, TODAY).is_err());
        assert!(validate_user(&User { birthday: TODAY, ..user() }, TODAY).is_ok());
        assert!(validate_user(&User { birthday: date(2024, 5, 2), ..user() }, TODAY).is_err());
    }

    #[test]
    fn review_needs_content() {
        let review = Review {
            review_id: 0,
            content: "Too long, still great".into(),
            is_positive: true,
            user_id: 1,
            film_id: 1,
            useful: 0,
        };
        assert!(validate_review(&review).is_ok());
        assert!(validate_review(&Review { content: "  ".into(), ..review }).is_err());
    }
}
