//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background
//! thread, then drives the client over real HTTP through `UreqTransport`.
//! Validates request building, envelope decoding, pagination and auth
//! against an actual server.

use serde_json::json;
use strapi_core::{
    ApiClient, ApiError, ClientConfig, FilterOperator, ForgotPassword, ListOptions,
    LoginCredentials, Populate, RegisterCredentials, ResetPassword, PAGE_SIZE,
};

/// Start the mock server on a random port and return its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn discovery_skips_system_and_single_types() {
    let client = ApiClient::connect_http(ClientConfig::new(&spawn_server())).unwrap();
    assert_eq!(client.collection_names(), vec!["articles", "widgets"]);
    assert!(matches!(
        client.collection("up_users"),
        Err(ApiError::UnknownCollection(_))
    ));
}

#[test]
fn crud_lifecycle() {
    let client = ApiClient::connect_http(ClientConfig::new(&spawn_server())).unwrap();
    let articles = client.collection("articles").unwrap();

    // Step 1: empty collection.
    assert!(articles.list(&ListOptions::default()).unwrap().is_empty());

    // Step 2: create.
    let created = articles.create(&json!({ "name": "A" })).unwrap().unwrap();
    let id = created.id().to_string();
    assert_eq!(created.get("name"), Some(&json!("A")));
    assert_eq!(articles.cached(&id), Some(created.clone()));

    // Step 3: list sees it.
    let listed = articles.list(&ListOptions::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), id);

    // Step 4: update through the record.
    let mut record = listed[0].clone();
    record.update(&json!({ "name": "B" })).unwrap().unwrap();
    assert_eq!(record.get("name"), Some(&json!("B")));

    // Step 5: the server agrees.
    let fetched = articles.get(&id, &Populate::All, true).unwrap();
    assert_eq!(fetched.get("name"), Some(&json!("B")));

    // Step 6: delete.
    let removed = articles.delete(&id).unwrap().unwrap();
    assert_eq!(removed.id(), id);
    assert!(articles.cached(&id).is_none());

    // Step 7: gone from a forced listing, and a direct lookup is NotFound.
    let after = articles.list(&ListOptions::new().force()).unwrap();
    assert!(after.iter().all(|r| r.id() != id));
    let err = articles.get(&id, &Populate::None, true).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn list_walks_every_page() {
    let base_url = spawn_server();
    let config = ClientConfig::new(&base_url).with_collections(["widgets"]);
    let client = ApiClient::connect_http(config).unwrap();
    let widgets = client.collection("widgets").unwrap();

    let total = PAGE_SIZE as usize * 2 + 5;
    let bodies: Vec<_> = (0..total).map(|n| json!({ "n": n })).collect();
    let results = widgets.create_many(&bodies);
    assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));

    widgets.clear_cache();
    let records = widgets.list(&ListOptions::default()).unwrap();
    assert_eq!(records.len(), total);
    let order: Vec<u64> = records
        .iter()
        .map(|r| r.get("n").and_then(|n| n.as_u64()).unwrap())
        .collect();
    assert_eq!(order, (0..total as u64).collect::<Vec<_>>());
    assert_eq!(widgets.cache_len(), total);
}

#[test]
fn list_applies_filters() {
    let client = ApiClient::connect_http(
        ClientConfig::new(&spawn_server()).with_collections(["articles"]),
    )
    .unwrap();
    let articles = client.collection("articles").unwrap();
    articles.create(&json!({ "title": "Rust in production" })).unwrap();
    articles.create(&json!({ "title": "Gardening" })).unwrap();

    let options = ListOptions::new().filter(strapi_core::Filter::new(
        "title",
        FilterOperator::Containsi,
        "rust",
    ));
    let records = articles.list(&options).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("title"), Some(&json!("Rust in production")));
}

#[test]
fn all_data_lists_every_collection() {
    let client = ApiClient::connect_http(ClientConfig::new(&spawn_server())).unwrap();
    client.post("widgets", &json!({ "size": 1 })).unwrap();
    let data = client.all_data().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data["articles"].is_empty());
    assert_eq!(data["widgets"].len(), 1);
}

#[test]
fn auth_flow() {
    let base_url = spawn_server();
    let client = ApiClient::connect_http(ClientConfig::new(&base_url).with_collections(["articles"])).unwrap();

    let registered = client
        .register(&RegisterCredentials {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "lovelace".to_string(),
        })
        .unwrap();
    assert_eq!(registered.user.username, "ada");
    assert!(!client.is_authenticated());

    let err = client.me().unwrap_err();
    assert_eq!(err.status(), Some(401));

    let auth = client
        .login(&LoginCredentials {
            identifier: "ada@example.com".to_string(),
            password: "lovelace".to_string(),
        })
        .unwrap();
    assert_eq!(client.token().as_deref(), Some(auth.jwt.as_str()));
    assert_eq!(client.me().unwrap().email, "ada@example.com");

    client.sign_out();
    assert!(client.me().is_err());

    let bad = client
        .login(&LoginCredentials {
            identifier: "ada".to_string(),
            password: "wrong".to_string(),
        })
        .unwrap_err();
    match bad {
        ApiError::Http { status, name, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(name, "ValidationError");
            assert_eq!(message, "Invalid identifier or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.is_authenticated());

    let ok = client
        .forgot_password(&ForgotPassword {
            email: "ada@example.com".to_string(),
        })
        .unwrap();
    assert_eq!(ok["ok"], true);

    let err = client
        .reset_password(&ResetPassword {
            code: "not-a-code".to_string(),
            password: "newpass1".to_string(),
            password_confirmation: "newpass1".to_string(),
        })
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ApiClient::connect_http(ClientConfig::new(&format!("http://{addr}"))).unwrap_err();
    assert!(matches!(err, ApiError::Discovery(_)));

    let client = ApiClient::connect_http(
        ClientConfig::new(&format!("http://{addr}")).with_collections(["articles"]),
    )
    .unwrap();
    let err = client
        .collection("articles")
        .unwrap()
        .list(&ListOptions::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
