use assert_matches::assert_matches;
use cachepoint::{Client, Error, MemoryStorage, QueryArgs, SessionRecord, Storage, Transport};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_with(server: &MockServer) -> (Client, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let client = Client::builder()
        .base_url(server.uri())
        .storage(storage.clone())
        .build()
        .unwrap();
    (client, storage)
}

#[tokio::test]
async fn login_stores_the_returned_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(json!({"account": "jdoe", "passwd": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc",
            "end": "2026-08-06T12:00:00",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    let record = client.sessions().login("jdoe", "secret").await.unwrap();

    assert_eq!(record.token, "abc");
    assert_eq!(client.session_store().token().unwrap(), "abc");
    assert_eq!(
        client.session_store().get().unwrap().extra["end"],
        json!("2026-08-06T12:00:00")
    );
}

#[tokio::test]
async fn login_failure_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    let err = client.sessions().login("jdoe", "wrong").await.unwrap_err();

    assert_eq!(err.http_status(), Some(401));
    assert_matches!(client.session_store().get(), Err(Error::NotLoggedIn));
}

#[tokio::test]
async fn authenticated_calls_inject_the_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(query_param("session", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["jdoe"])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("abc"));

    let accounts = client.accounts().list().await.unwrap();
    assert_eq!(accounts, json!(["jdoe"]));
}

#[tokio::test]
async fn authenticated_calls_without_a_session_never_dispatch() {
    let server = MockServer::start().await;
    // No mock mounted: any request would 404 and fail the status assert below.

    let (client, _) = client_with(&server).await;
    let err = client.accounts().list().await.unwrap_err();

    assert_matches!(err, Error::NotLoggedIn);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn caller_supplied_session_argument_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(query_param("session", "other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("mine"));

    let mut args = QueryArgs::new();
    args.set("session", "other");
    let url = format!("{}/account", client.base_url());
    client.auth_transport().get(&url, &args).await.unwrap();
}

#[tokio::test]
async fn refresh_replaces_the_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/session/!"))
        .and(query_param("session", "old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("old"));

    let record = client.sessions().refresh(None).await.unwrap();
    assert_eq!(record.token, "new");
    assert_eq!(client.session_store().token().unwrap(), "new");
}

#[tokio::test]
async fn close_removes_the_local_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/session/!"))
        .and(query_param("session", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"closed": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, storage) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("abc"));

    let removed = client.sessions().close(None).await.unwrap();
    assert_eq!(removed.unwrap().token, "abc");
    assert_matches!(client.session_store().get(), Err(Error::NotLoggedIn));
    assert_eq!(storage.read("session"), None);
}

#[tokio::test]
async fn close_on_a_gone_session_resolves_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/session/!"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such session"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, storage) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("abc"));

    // Same end state as a successful close.
    let removed = client.sessions().close(None).await.unwrap();
    assert_eq!(removed.unwrap().token, "abc");
    assert_eq!(storage.read("session"), None);
}

#[tokio::test]
async fn close_failure_keeps_the_local_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/session/!"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("abc"));

    let err = client.sessions().close(None).await.unwrap_err();
    assert_eq!(err.http_status(), Some(500));
    assert_eq!(client.session_store().token().unwrap(), "abc");
}

#[tokio::test]
async fn close_targets_an_explicit_token() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/session/other-token"))
        .and(query_param("session", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"closed": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server).await;
    client.session_store().set(&SessionRecord::new("abc"));

    // Closing a different session leaves the current record alone.
    let removed = client.sessions().close(Some("other-token")).await.unwrap();
    assert_eq!(removed, None);
    assert_eq!(client.session_store().token().unwrap(), "abc");
}
