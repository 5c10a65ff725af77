use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use filmorate::{
    AppState, build_router,
    catalog::Catalog,
    config::{Config, StorageKind},
    store::MemoryStore,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        storage: StorageKind::Memory,
        popular_default_count: 10,
    };
    let state = AppState {
        config: Arc::new(config),
        catalog: Catalog::new(Arc::new(MemoryStore::new())),
    };
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        },
        None => Body::empty(),
    };

    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn heat() -> Value {
    json!({
        "name": "Heat",
        "description": "A heist goes wrong",
        "releaseDate": "1995-12-15",
        "duration": 170,
        "mpa": { "id": 4 },
        "genres": [{ "id": 4 }]
    })
}

fn ann() -> Value {
    json!({
        "email": "ann@example.com",
        "login": "ann",
        "birthday": "1985-04-12"
    })
}

#[tokio::test]
async fn create_and_fetch_film() {
    let app = app();

    let (status, created) = send(&app, Method::POST, "/films", Some(heat())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["mpa"], json!({ "id": 4, "name": "R" }));
    assert_eq!(created["genres"], json!([{ "id": 4, "name": "Thriller" }]));
    assert_eq!(created["releaseDate"], "1995-12-15");
    assert_eq!(created["likes"], json!([]));

    let (status, fetched) = send(&app, Method::GET, "/films/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, all) = send(&app, Method::GET, "/films", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([created]));
}

#[tokio::test]
async fn invalid_film_is_rejected_before_storage() {
    let app = app();

    let mut early = heat();
    early["releaseDate"] = json!("1890-01-01");
    let (status, body) = send(&app, Method::POST, "/films", Some(early)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("release date"));

    let mut blank = heat();
    blank["name"] = json!("");
    let (status, _) = send(&app, Method::POST, "/films", Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = send(&app, Method::GET, "/films", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn malformed_input_gets_a_json_400() {
    let app = app();

    let mut no_rating = heat();
    no_rating.as_object_mut().unwrap().remove("mpa");
    let (status, body) = send(&app, Method::POST, "/films", Some(no_rating)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mpa"));

    let (status, body) = send(&app, Method::GET, "/films/popular?count=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/films/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let mut bad_date = heat();
    bad_date["releaseDate"] = json!("15.12.1995");
    let (status, body) = send(&app, Method::PUT, "/films", Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, all) = send(&app, Method::GET, "/films", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn missing_film_is_404() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/films/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "film 9 not found");

    let mut ghost = heat();
    ghost["id"] = json!(9);
    let (status, _) = send(&app, Method::PUT, "/films", Some(ghost)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn like_unlike_and_popular() {
    let app = app();
    send(&app, Method::POST, "/films", Some(heat())).await;
    let mut other = heat();
    other["name"] = json!("Ronin");
    other["genres"] = json!([{ "id": 6 }]);
    send(&app, Method::POST, "/films", Some(other)).await;

    let (status, liked) = send(&app, Method::PUT, "/films/2/like/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["likes"], json!([1]));
    let (_, liked) = send(&app, Method::PUT, "/films/2/like/1", None).await;
    assert_eq!(liked["likes"], json!([1]));

    let (_, top) = send(&app, Method::GET, "/films/popular?count=1", None).await;
    assert_eq!(top.as_array().unwrap().len(), 1);
    assert_eq!(top[0]["id"], 2);

    let (_, thrillers) = send(&app, Method::GET, "/films/popular?genreId=4&year=1995", None).await;
    assert_eq!(thrillers.as_array().unwrap().len(), 1);
    assert_eq!(thrillers[0]["id"], 1);

    let (status, body) = send(&app, Method::DELETE, "/films/2/like/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user 1 not found");

    let (status, _) = send(&app, Method::POST, "/users", Some(ann())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::DELETE, "/films/1/like/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user 1 has not liked film 1");

    let (status, unliked) = send(&app, Method::DELETE, "/films/2/like/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unliked["likes"], json!([]));
}

#[tokio::test]
async fn director_filmography() {
    let app = app();

    let (status, director) =
        send(&app, Method::POST, "/directors", Some(json!({ "name": "Michael Mann" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(director, json!({ "id": 1, "name": "Michael Mann" }));

    let mut heat = heat();
    heat["directors"] = json!([{ "id": 1 }]);
    send(&app, Method::POST, "/films", Some(heat)).await;
    let thief = json!({
        "name": "Thief",
        "description": "A safecracker",
        "releaseDate": "1981-03-27",
        "duration": 123,
        "mpa": { "id": 4 },
        "directors": [{ "id": 1 }]
    });
    send(&app, Method::POST, "/films", Some(thief)).await;

    let (status, by_year) = send(&app, Method::GET, "/films/director/1?sortBy=year", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> =
        by_year.as_array().unwrap().iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Thief", "Heat"]);

    send(&app, Method::PUT, "/films/1/like/3", None).await;
    let (_, by_likes) = send(&app, Method::GET, "/films/director/1?sortBy=likes", None).await;
    assert_eq!(by_likes[0]["name"], "Heat");

    let (status, _) = send(&app, Method::GET, "/films/director/1?sortBy=rating", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/films/director/999999?sortBy=year", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/directors", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reference_endpoints() {
    let app = app();

    let (status, genres) = send(&app, Method::GET, "/genres", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(genres.as_array().unwrap().len(), 6);

    let (_, pg13) = send(&app, Method::GET, "/mpa/3", None).await;
    assert_eq!(pg13, json!({ "id": 3, "name": "PG-13" }));

    let (status, _) = send(&app, Method::GET, "/genres/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_reviews_and_feed() {
    let app = app();
    send(&app, Method::POST, "/films", Some(heat())).await;

    let (status, user) = send(&app, Method::POST, "/users", Some(ann())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["id"], 1);
    assert_eq!(user["name"], "ann");

    let mut bad = ann();
    bad["login"] = json!("ann smith");
    let (status, _) = send(&app, Method::POST, "/users", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bob = ann();
    bob["login"] = json!("bob");
    bob["name"] = json!("Bob");
    send(&app, Method::POST, "/users", Some(bob)).await;

    let draft = json!({ "content": "Tense", "isPositive": true, "userId": 1, "filmId": 1 });
    let (status, review) = send(&app, Method::POST, "/reviews", Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        review,
        json!({
            "reviewId": 1,
            "content": "Tense",
            "isPositive": true,
            "userId": 1,
            "filmId": 1,
            "useful": 0
        })
    );

    let (status, liked) = send(&app, Method::PUT, "/reviews/1/like/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["useful"], 1);
    let (_, disliked) = send(&app, Method::PUT, "/reviews/1/dislike/2", None).await;
    assert_eq!(disliked["useful"], -1);

    let (status, body) = send(&app, Method::DELETE, "/reviews/1/like/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user 2 has not liked review 1");
    let (status, _) = send(&app, Method::DELETE, "/reviews/1/dislike/2", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, Method::GET, "/reviews?filmId=1&count=5", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, "/reviews/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/reviews/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, Method::PUT, "/films/1/like/1", None).await;
    let (status, feed) = send(&app, Method::GET, "/users/1/feed", None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<(&str, &str)> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["eventType"].as_str().unwrap(), e["operation"].as_str().unwrap()))
        .collect();
    assert_eq!(kinds, vec![("REVIEW", "ADD"), ("REVIEW", "REMOVE"), ("LIKE", "ADD")]);

    let (status, _) = send(&app, Method::GET, "/users/9/feed", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
