use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use surfspot::{app::build_app, state::AppState, store::MemoryStore};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: MemoryStore,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let router = build_app(AppState::in_memory(store.clone()));
        Self { router, store }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("Authorization", token);
        }
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = self
            .router
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({
                    "username": username,
                    "password": "pw",
                    "email": format!("{username}@surf.io"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["response"]["accessToken"].as_str().unwrap().to_string()
    }

    async fn create_post(&self, token: &str, headline: &str, level: &str, location: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/surfposts",
                Some(token),
                Some(json!({
                    "headline": headline,
                    "location": location,
                    "message": "Glassy and head high",
                    "level": level,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["response"].clone()
    }
}

#[tokio::test]
async fn register_rejects_bad_email_without_persisting() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "surfer1", "password": "pw", "email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "surfer1", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_and_login_return_the_same_token() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "surfer1", "password": "pw", "email": "a@b.co"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let registered = &body["response"];
    assert_eq!(registered["username"], "surfer1");
    assert_eq!(registered["email"], "a@b.co");
    assert!(registered["id"].is_string());
    let token = registered["accessToken"].as_str().unwrap();
    assert_ne!(token, "pw");
    assert!(registered.get("password").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "surfer1", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["accessToken"], token);
    assert_eq!(body["response"]["id"], registered["id"]);
}

#[tokio::test]
async fn login_failures_look_identical() {
    let app = TestApp::new();
    app.register("surfer1").await;

    let wrong_pw = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "surfer1", "password": "nope"})),
        )
        .await;
    let unknown = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "nobody", "password": "pw"})),
        )
        .await;
    assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
}

#[tokio::test]
async fn protected_routes_require_a_known_token() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/mysurfposts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(Method::GET, "/mysurfposts", Some("deadbeef"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.register("surfer1").await;
    let (status, _) = app
        .send(Method::GET, "/mysurfposts", Some(format!("Bearer {token}").as_str()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_post_validates_level_and_body() {
    let app = TestApp::new();
    let token = app.register("surfer1").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/surfposts",
            Some(token.as_str()),
            Some(json!({"headline": "x", "location": "y", "message": "z", "level": "pro"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/surfposts")
        .header("Authorization", &token)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_lifecycle_end_to_end() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let post = app.create_post(&alice, "cool spot", "beginner", "bells beach").await;
    assert_eq!(post["headline"], "Cool spot");
    assert_eq!(post["location"], "Bells beach");
    let id = post["_id"].as_str().unwrap().to_string();

    let update = json!({"message": "Offshore all morning"});
    let (status, foreign) = app
        .send(
            Method::PATCH,
            &format!("/surfposts/{id}/update"),
            Some(bob.as_str()),
            Some(update.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = uuid::Uuid::new_v4();
    let (status, absent) = app
        .send(
            Method::PATCH,
            &format!("/surfposts/{missing}/update"),
            Some(bob.as_str()),
            Some(update.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, absent);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/surfposts/{id}/update"),
            Some(alice.as_str()),
            Some(update),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["message"], "Offshore all morning");

    let (status, _) = app
        .send(Method::DELETE, &format!("/surfposts/{id}/delete"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(Method::DELETE, &format!("/surfposts/{id}/delete"), Some(alice.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains(&id));

    let (status, body) = app.send(Method::GET, "/surfposts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], json!([]));

    let (status, _) = app.send(Method::GET, "/mysurfposts", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn like_toggle_round_trips_over_http() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let post = app.create_post(&alice, "reef", "advanced", "uluwatu").await;
    let id = post["_id"].as_str().unwrap();
    let uri = format!("/surfposts/{id}/like");

    let (status, body) = app.send(Method::PATCH, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["response"]["numOfLikes"], 1);
    assert_eq!(body["response"]["likedBy"].as_array().unwrap().len(), 1);

    let (_, body) = app.send(Method::PATCH, &uri, Some(alice.as_str()), None).await;
    assert_eq!(body["response"]["numOfLikes"], 2);

    let (_, body) = app.send(Method::PATCH, &uri, Some(bob.as_str()), None).await;
    assert_eq!(body["response"]["numOfLikes"], 1);
    let (_, body) = app.send(Method::PATCH, &uri, Some(alice.as_str()), None).await;
    assert_eq!(body["response"]["numOfLikes"], 0);
    assert_eq!(body["response"]["likedBy"], json!([]));

    let (status, _) = app
        .send(Method::PATCH, "/surfposts/not-a-uuid/like", Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn favorites_listing_follows_the_toggle() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let post = app.create_post(&alice, "point", "intermediate", "jeffreys bay").await;
    let id = post["_id"].as_str().unwrap();

    let (status, body) = app.send(Method::GET, "/myfavsurfposts", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .send(Method::PATCH, &format!("/surfposts/{id}/addfav"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["response"]["savedFavBy"].as_array().unwrap().len(), 1);

    let (status, body) = app.send(Method::GET, "/myfavsurfposts", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"][0]["_id"], id);

    let (status, _) = app
        .send(Method::GET, "/myfavsurfposts?location=PIPE", Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.send(Method::PATCH, &format!("/surfposts/{id}/addfav"), Some(bob.as_str()), None)
        .await;
    let (status, _) = app.send(Method::GET, "/myfavsurfposts", Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_feed_pages_and_filters() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    for (i, level) in ["beginner", "advanced", "beginner", "advanced", "beginner"]
        .iter()
        .enumerate()
    {
        app.create_post(&token, &format!("spot {i}"), level, "Ericeira").await;
    }

    let (status, body) = app.send(Method::GET, "/surfposts?size=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"].as_array().unwrap().len(), 2);

    let (_, body) = app.send(Method::GET, "/surfposts?page=3&size=2", None, None).await;
    assert_eq!(body["response"].as_array().unwrap().len(), 1);

    let (status, body) = app.send(Method::GET, "/surfposts?page=9&size=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], json!([]));

    let (_, body) = app
        .send(Method::GET, "/surfposts?level=advanced&location=eric", None, None)
        .await;
    let rows = body["response"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["level"] == "advanced"));

    let (_, body) = app
        .send(Method::GET, "/surfposts?page=-1&size=zero&sort=whatever", None, None)
        .await;
    assert_eq!(body["response"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn post_store_errors_use_route_specific_statuses() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let post = app.create_post(&alice, "reef", "advanced", "uluwatu").await;
    let id = post["_id"].as_str().unwrap();
    app.store.set_posts_failing(true);

    let create = json!({"headline": "x", "location": "y", "message": "z", "level": "beginner"});
    let rejected = [
        (Method::GET, "/surfposts".to_string(), None, None),
        (Method::POST, "/surfposts".to_string(), Some(alice.as_str()), Some(create)),
        (Method::PATCH, format!("/surfposts/{id}/like"), Some(alice.as_str()), None),
        (Method::PATCH, format!("/surfposts/{id}/addfav"), Some(alice.as_str()), None),
    ];
    for (method, uri, token, body) in rejected {
        let (status, body) = app.send(method.clone(), &uri, token, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["success"], false);
        assert!(body["response"].as_str().unwrap().contains("failing"), "{body}");
    }

    let update = json!({"message": "still failing"});
    let failed = [
        (Method::GET, "/mysurfposts".to_string(), None),
        (Method::GET, "/myfavsurfposts".to_string(), None),
        (Method::PATCH, format!("/surfposts/{id}/update"), Some(update)),
        (Method::DELETE, format!("/surfposts/{id}/delete"), None),
    ];
    for (method, uri, body) in failed {
        let (status, body) = app.send(method.clone(), &uri, Some(alice.as_str()), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert!(body["response"].as_str().unwrap().contains("failing"), "{body}");
    }

    app.store.set_posts_failing(false);
    let (status, body) = app.send(Method::GET, "/surfposts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"][0]["numOfLikes"], 0);
}

#[tokio::test]
async fn token_lookup_failure_is_500_before_the_route_runs() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    app.store.set_failing(true);

    let (status, body) = app.send(Method::GET, "/mysurfposts", Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["response"].as_str().unwrap().contains("unavailable"));

    let (status, _) = app.send(Method::GET, "/surfposts", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undecodable_listing_query_falls_back_to_defaults() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    app.create_post(&alice, "reef", "advanced", "uluwatu").await;

    for uri in ["/surfposts?page=1&page=2", "/surfposts?size=1&size=1&sort=oldest"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["success"], true);
        assert_eq!(body["response"].as_array().unwrap().len(), 1);
    }

    let (status, body) = app
        .send(Method::GET, "/mysurfposts?page=1&page=2", Some(alice.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(Method::GET, "/myfavsurfposts?size=2&size=3", Some(alice.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_routes_and_methods_get_the_envelope() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/surfspots", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["response"].as_str().unwrap().contains("/surfspots"));

    let (status, body) = app.send(Method::PUT, "/surfposts", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);

    let (status, body) = app.send(Method::GET, "/surfposts/abc/delete", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn not_ready_store_short_circuits_with_503() {
    let app = TestApp::new();
    app.store.set_ready(false);

    for (method, uri) in [
        (Method::GET, "/"),
        (Method::GET, "/surfposts"),
        (Method::POST, "/login"),
    ] {
        let (status, body) = app.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"success": false, "response": "Service unavailable"}));
    }

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["ready"], false);

    app.store.set_ready(true);
    let (status, _) = app.send(Method::GET, "/surfposts", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_lists_registered_routes() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let routes = body["response"].as_array().unwrap();
    assert!(routes
        .iter()
        .any(|r| r["path"] == "/surfposts" && r["methods"] == json!(["GET", "POST"])));
    assert!(routes
        .iter()
        .any(|r| r["path"] == "/surfposts/:id/delete" && r["methods"] == json!(["DELETE"])));
}
