//! The `/api/v1/users` HTTP surface.
//!
//! Four handlers over one fixed path, all answering with an [`Envelope`].
//! Each handler catches its own ingestion and store failures and converts
//! them through [`Envelope::failure`]; only a defect that escapes this module
//! reaches the dispatcher's terminal boundary.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::{Envelope, send_json};
use crate::error::Error;
use crate::http::{Request, Response};
use crate::router::RouteTable;
use crate::store::{NewUser, UserPatch, UserStore};

/// The single path the users API lives on.
pub const USERS_PATH: &str = "/api/v1/users";

// PUT body: the id to update plus the fields to change.
#[derive(Debug, Deserialize)]
struct UpdateUser {
    id: u64,
    #[serde(default)]
    user: UserPatch,
}

// DELETE body: just the id.
#[derive(Debug, Deserialize)]
struct DeleteUser {
    id: u64,
}

/// Builds the route table for the users API with `store` injected into every
/// handler.
///
/// # Errors
///
/// Propagates registration failures; with the constant path above this only
/// fires if the path constant itself is broken, and it should abort startup.
pub fn routes(store: Arc<dyn UserStore>) -> Result<RouteTable, Error> {
    let mut table = RouteTable::new();

    let listing = Arc::clone(&store);
    table.get(USERS_PATH, move |req: Request| {
        let store = Arc::clone(&listing);
        async move { list_users(store, req).await }
    })?;

    let creating = Arc::clone(&store);
    table.post(USERS_PATH, move |req: Request| {
        let store = Arc::clone(&creating);
        async move { create_user(store, req).await }
    })?;

    let updating = Arc::clone(&store);
    table.put(USERS_PATH, move |req: Request| {
        let store = Arc::clone(&updating);
        async move { update_user(store, req).await }
    })?;

    table.delete(USERS_PATH, move |req: Request| {
        let store = Arc::clone(&store);
        async move { delete_user(store, req).await }
    })?;

    Ok(table)
}

async fn list_users(store: Arc<dyn UserStore>, _req: Request) -> Result<Response, Error> {
    let data = serde_json::to_value(store.list()).map_err(|e| Error::Handler(e.to_string()))?;
    Ok(send_json(&Envelope::ok(data)))
}

async fn create_user(store: Arc<dyn UserStore>, mut req: Request) -> Result<Response, Error> {
    let envelope = match ingest_new_user(&*store, &mut req).await {
        // echo the parsed input back as the created payload
        Ok(input) => Envelope::created(input),
        Err(err) => Envelope::failure(&err),
    };
    Ok(send_json(&envelope))
}

async fn ingest_new_user(store: &dyn UserStore, req: &mut Request) -> Result<Value, Error> {
    let input = req.json().await?;
    let new_user: NewUser = serde_json::from_value(input.clone())
        .map_err(|e| Error::invalid_record("User", e.to_string()))?;
    store.create(new_user)?;
    Ok(input)
}

async fn update_user(store: Arc<dyn UserStore>, mut req: Request) -> Result<Response, Error> {
    let envelope = match apply_update(&*store, &mut req).await {
        Ok(input) => Envelope::ok(input),
        Err(err) => Envelope::failure(&err),
    };
    Ok(send_json(&envelope))
}

async fn apply_update(store: &dyn UserStore, req: &mut Request) -> Result<Value, Error> {
    let input = req.json().await?;
    let update: UpdateUser = serde_json::from_value(input.clone())
        .map_err(|e| Error::invalid_record("User update", e.to_string()))?;
    store.update(update.id, update.user)?;
    Ok(input)
}

async fn delete_user(store: Arc<dyn UserStore>, mut req: Request) -> Result<Response, Error> {
    let envelope = match apply_delete(&*store, &mut req).await {
        Ok(()) => Envelope::ok(Value::Null),
        Err(err) => Envelope::failure(&err),
    };
    Ok(send_json(&envelope))
}

async fn apply_delete(store: &dyn UserStore, req: &mut Request) -> Result<(), Error> {
    let input = req.json().await?;
    let delete: DeleteUser = serde_json::from_value(input)
        .map_err(|e| Error::invalid_record("User reference", e.to_string()))?;
    store.delete(delete.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::http::{Body, Method};
    use crate::store::InMemoryUsers;
    use serde_json::json;

    fn users_api() -> (Arc<InMemoryUsers>, Dispatcher) {
        let store = Arc::new(InMemoryUsers::new());
        let table = routes(Arc::clone(&store) as Arc<dyn UserStore>).unwrap();
        (store, Dispatcher::new(table))
    }

    fn request(method: Method, raw_body: &str) -> Request {
        Request::new(method, USERS_PATH)
            .with_body(Body::from_bytes(raw_body.as_bytes().to_vec()))
    }

    async fn envelope_of(dispatcher: &Dispatcher, req: Request) -> Envelope {
        let response = dispatcher.dispatch(req).await;
        let raw = String::from_utf8(response.into_bytes().to_vec()).unwrap();
        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn get_on_empty_store_lists_nothing() {
        let (_, dispatcher) = users_api();
        let envelope = envelope_of(&dispatcher, Request::new(Method::Get, USERS_PATH)).await;

        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.status(), "STATUS_OK");
        assert_eq!(envelope.data(), Some(&json!([])));
    }

    #[tokio::test]
    async fn post_creates_and_get_lists_the_record() {
        let (_, dispatcher) = users_api();

        let created = envelope_of(
            &dispatcher,
            request(Method::Post, r#"{"name":"A","email":"a@x.com"}"#),
        )
        .await;
        assert_eq!(created.code(), 201);
        assert_eq!(created.status(), "STATUS_CREATED");
        assert_eq!(
            created.data(),
            Some(&json!({"name": "A", "email": "a@x.com"}))
        );

        let listed = envelope_of(&dispatcher, Request::new(Method::Get, USERS_PATH)).await;
        let data = listed.data().unwrap().as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "A");
        assert_eq!(data[0]["email"], "a@x.com");
        assert_eq!(data[0]["id"], 1);
    }

    #[tokio::test]
    async fn post_with_malformed_json_is_bad_request() {
        let (store, dispatcher) = users_api();
        let envelope = envelope_of(&dispatcher, request(Method::Post, "{not json")).await;

        assert_eq!(envelope.code(), 400);
        assert_eq!(envelope.status(), "BAD_REQUEST");
        assert!(envelope.errors().unwrap()[0].contains("Invalid JSON data"));
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn post_with_empty_body_is_bad_request() {
        let (_, dispatcher) = users_api();
        let envelope = envelope_of(&dispatcher, request(Method::Post, "")).await;

        assert_eq!(envelope.code(), 400);
        assert!(envelope.errors().unwrap()[0].contains("Invalid JSON data"));
    }

    #[tokio::test]
    async fn post_with_wrong_shape_is_bad_request() {
        let (_, dispatcher) = users_api();
        let envelope = envelope_of(&dispatcher, request(Method::Post, r#"{"name":"A"}"#)).await;

        assert_eq!(envelope.code(), 400);
        assert!(envelope.errors().unwrap()[0].contains("not a valid User"));
    }

    #[tokio::test]
    async fn put_updates_the_record_and_echoes_the_input() {
        let (store, dispatcher) = users_api();
        envelope_of(
            &dispatcher,
            request(Method::Post, r#"{"name":"A","email":"a@x.com"}"#),
        )
        .await;

        let raw = r#"{"id":1,"user":{"name":"B"}}"#;
        let envelope = envelope_of(&dispatcher, request(Method::Put, raw)).await;

        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.status(), "STATUS_OK");
        assert_eq!(envelope.data(), Some(&json!({"id": 1, "user": {"name": "B"}})));

        let user = store.read(1).unwrap();
        assert_eq!(user.name, "B");
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn put_with_unknown_id_falls_through_to_500() {
        let (_, dispatcher) = users_api();
        let raw = r#"{"id":999,"user":{"name":"B"}}"#;
        let envelope = envelope_of(&dispatcher, request(Method::Put, raw)).await;

        assert_eq!(envelope.code(), 500);
        assert_eq!(envelope.status(), "INTERNAL_SERVER_ERROR");
        assert!(envelope.errors().unwrap()[0].contains("not found"));
    }

    #[tokio::test]
    async fn put_without_id_is_bad_request() {
        let (_, dispatcher) = users_api();
        let envelope =
            envelope_of(&dispatcher, request(Method::Put, r#"{"user":{"name":"B"}}"#)).await;

        assert_eq!(envelope.code(), 400);
        assert!(envelope.errors().unwrap()[0].contains("not a valid User update"));
    }

    #[tokio::test]
    async fn delete_answers_null_data_and_removes_the_record() {
        let (store, dispatcher) = users_api();
        envelope_of(
            &dispatcher,
            request(Method::Post, r#"{"name":"A","email":"a@x.com"}"#),
        )
        .await;

        let envelope = envelope_of(&dispatcher, request(Method::Delete, r#"{"id":1}"#)).await;
        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.data(), Some(&Value::Null));
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn delete_with_unknown_id_falls_through_to_500() {
        let (_, dispatcher) = users_api();
        let envelope = envelope_of(&dispatcher, request(Method::Delete, r#"{"id":7}"#)).await;

        assert_eq!(envelope.code(), 500);
        assert!(envelope.errors().unwrap()[0].contains("not found"));
    }
}
