//! Account, subscription and event flows through the full router.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{default_app, register_and_login, send, send_raw, CPFS, STRONG_PASSWORD};

#[tokio::test]
async fn registration_validates_input() -> Result<()> {
    let (app, _) = default_app();
    let base = json!({ "name": "Ana", "email": "ana@example.com", "password": STRONG_PASSWORD, "cpf": CPFS[0] });

    let mut bad_cpf = base.clone();
    bad_cpf["cpf"] = json!("123.456.789-00");
    let (status, body) = send(&app, Method::POST, "/users", None, Some(bad_cpf)).await;
    assert_eq!((status, body), (StatusCode::BAD_REQUEST, json!({ "error": "Invalid CPF" })));

    let mut weak = base.clone();
    weak["password"] = json!("password");
    let (status, _) = send(&app, Method::POST, "/users", None, Some(weak)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_email = base.clone();
    bad_email["email"] = json!("ana@");
    let (status, body) = send(&app, Method::POST, "/users", None, Some(bad_email)).await;
    assert_eq!((status, body), (StatusCode::BAD_REQUEST, json!({ "error": "Invalid e-mail format" })));

    let (status, user) = send(&app, Method::POST, "/users", None, Some(base.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "regular");
    assert!(user.get("password_hash").is_none());

    let (status, _) = send(&app, Method::POST, "/users", None, Some(base)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password() -> Result<()> {
    let (app, _) = default_app();
    register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let creds = json!({ "email": "ana@example.com", "password": "Wr0ng!pw" });
    let (status, body) = send(&app, Method::POST, "/users/login", None, Some(creds)).await;
    assert_eq!((status, body), (StatusCode::UNAUTHORIZED, json!({ "error": "Invalid credentials" })));

    let unknown = json!({ "email": "nobody@example.com", "password": STRONG_PASSWORD });
    let (status, _) = send(&app, Method::POST, "/users/login", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn listing_users_requires_a_credential_and_paginates() -> Result<()> {
    let (app, _) = default_app();
    let (_, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    register_and_login(&app, "Bia", "bia@example.com", CPFS[1]).await;
    register_and_login(&app, "Caio", "caio@example.com", CPFS[2]).await;

    let (status, _) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, page) = send(&app, Method::GET, "/users?page=2&limit=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["data"].as_array().map(|d| d.len()), Some(1));
    assert_eq!(page["data"][0]["name"], "Caio");
    Ok(())
}

#[tokio::test]
async fn owner_can_update_and_delete_their_account() -> Result<()> {
    let (app, _) = default_app();
    let (id, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let uri = format!("/users/{}", id);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "name": "Ana", "password": "weak" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, user) =
        send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "name": "Ana Maria", "password": "N3w!pass" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Ana Maria");

    let relogin = json!({ "email": "ana@example.com", "password": "N3w!pass" });
    let (status, _) = send(&app, Method::POST, "/users/login", None, Some(relogin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn subscribing_unlocks_event_management() -> Result<()> {
    let (app, _) = default_app();
    let (org_id, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let event = json!({ "title": "Rust Meetup", "date": "2030-05-01T19:00:00Z", "location": "Recife" });

    let (status, _) = send(&app, Method::POST, "/events", Some(&token), Some(event.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let sub_uri = format!("/users/{}/subscribe", org_id);
    let invalid_plan = json!({ "error": "Plan must be monthly or annual" });
    let (status, body) = send(&app, Method::POST, &sub_uri, Some(&token), Some(json!({ "plan": "weekly" }))).await;
    assert_eq!((status, body), (StatusCode::BAD_REQUEST, invalid_plan.clone()));
    let (status, body) = send(&app, Method::POST, &sub_uri, Some(&token), Some(json!({}))).await;
    assert_eq!((status, body), (StatusCode::BAD_REQUEST, invalid_plan));

    let (status, sub) = send(&app, Method::POST, &sub_uri, Some(&token), Some(json!({ "plan": "monthly" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sub["subscription"]["status"], "active");
    let (status, _) = send(&app, Method::POST, &sub_uri, Some(&token), Some(json!({ "plan": "annual" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The old credential still carries the regular role.
    let (status, _) = send(&app, Method::POST, "/events", Some(&token), Some(event.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let organizer = sub["token"].as_str().unwrap().to_string();
    let (status, created) = send(&app, Method::POST, "/events", Some(&organizer), Some(event)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["organizer_id"], org_id);

    // A fresh login picks up the new role as well.
    let creds = json!({ "email": "ana@example.com", "password": STRONG_PASSWORD });
    let (_, login) = send(&app, Method::POST, "/users/login", None, Some(creds)).await;
    let (_, me) = send(&app, Method::GET, "/me", login["token"].as_str(), None).await;
    assert_eq!(me["role"], "organizer");

    let status_uri = format!("/users/{}/subscription", org_id);
    let (status, active) = send(&app, Method::GET, &status_uri, Some(&organizer), None).await;
    assert_eq!((status, active["plan"].as_str()), (StatusCode::OK, Some("monthly")));
    let (status, cancelled) = send(&app, Method::DELETE, &status_uri, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["subscription"]["status"], "cancelled");
    let (status, _) = send(&app, Method::GET, &status_uri, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn events_are_managed_only_by_their_organizer() -> Result<()> {
    let (app, _) = default_app();
    let (ana, ana_token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let (bia, bia_token) = register_and_login(&app, "Bia", "bia@example.com", CPFS[1]).await;
    let (_, caio_token) = register_and_login(&app, "Caio", "caio@example.com", CPFS[2]).await;

    let plan = json!({ "plan": "annual" });
    let (_, sub) = send(&app, Method::POST, &format!("/users/{}/subscribe", ana), Some(&ana_token), Some(plan.clone())).await;
    let ana_org = sub["token"].as_str().unwrap().to_string();
    let (_, sub) = send(&app, Method::POST, &format!("/users/{}/subscribe", bia), Some(&bia_token), Some(plan)).await;
    let bia_org = sub["token"].as_str().unwrap().to_string();

    let event = json!({ "title": "Workshop", "date": "2030-06-01T09:00:00Z" });
    let (_, created) = send(&app, Method::POST, "/events", Some(&ana_org), Some(event.clone())).await;
    let uri = format!("/events/{}", created["id"]);

    let mut renamed = event.clone();
    renamed["title"] = json!("Hijacked");
    let (status, body) = send(&app, Method::PUT, &uri, Some(&bia_org), Some(renamed.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only the event organizer can modify this event");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&caio_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    renamed["title"] = json!("Workshop II");
    let (status, updated) = send(&app, Method::PUT, &uri, Some(&ana_org), Some(renamed)).await;
    assert_eq!((status, updated["title"].as_str()), (StatusCode::OK, Some("Workshop II")));

    // Registration is open to any authenticated caller.
    let reg_uri = format!("{}/register", uri);
    let (status, _) = send(&app, Method::POST, &reg_uri, Some(&caio_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, &reg_uri, Some(&caio_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, me) = send(&app, Method::GET, "/me", Some(&caio_token), None).await;
    assert_eq!(me["registrations"][0]["event"]["title"], "Workshop II");

    let (status, _) = send(&app, Method::DELETE, &reg_uri, Some(&caio_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &reg_uri, Some(&caio_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&ana_org), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unparseable_input_gets_a_json_error() -> Result<()> {
    let (app, _) = default_app();
    let (_, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;

    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))?;
    let (status, body) = send_raw(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/users?page=first", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/users/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn huge_page_number_returns_an_empty_page() -> Result<()> {
    let (app, _) = default_app();
    let (_, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let uri = format!("/users?page={}&limit=2", usize::MAX);
    let (status, page) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn subscription_history_and_renewal() -> Result<()> {
    let (app, _) = default_app();
    let (id, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let (_, other_token) = register_and_login(&app, "Bia", "bia@example.com", CPFS[1]).await;
    let list_uri = format!("/users/{}/subscriptions", id);
    let sub_uri = format!("/users/{}/subscription", id);

    let (status, _) = send(&app, Method::GET, &list_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::PUT, &sub_uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let subscribe = format!("/users/{}/subscribe", id);
    send(&app, Method::POST, &subscribe, Some(&token), Some(json!({ "plan": "monthly" }))).await;
    send(&app, Method::DELETE, &sub_uri, Some(&token), None).await;

    let (status, renewed) = send(&app, Method::PUT, &sub_uri, Some(&token), Some(json!({ "plan": "annual" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewed["subscription"]["status"], "active");
    assert_eq!(renewed["subscription"]["plan"], "annual");
    assert!(renewed["token"].is_string());

    let (status, body) = send(&app, Method::PUT, &sub_uri, Some(&token), Some(json!({ "plan": "weekly" }))).await;
    assert_eq!((status, body), (StatusCode::BAD_REQUEST, json!({ "error": "Plan must be monthly or annual" })));

    let (status, history) = send(&app, Method::GET, &list_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(|h| h.len()), Some(1));

    // Someone else's history and renewal stay behind the ownership gate.
    let (status, _) = send(&app, Method::GET, &list_uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::PUT, &sub_uri, Some(&other_token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn deleting_an_account_removes_its_events() -> Result<()> {
    let (app, _) = default_app();
    let (id, token) = register_and_login(&app, "Ana", "ana@example.com", CPFS[0]).await;
    let (_, sub) =
        send(&app, Method::POST, &format!("/users/{}/subscribe", id), Some(&token), Some(json!({ "plan": "annual" }))).await;
    let organizer = sub["token"].as_str().unwrap().to_string();
    let event = json!({ "title": "Workshop", "date": "2030-06-01T09:00:00Z" });
    let (_, created) = send(&app, Method::POST, "/events", Some(&organizer), Some(event)).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/events/{}", created["id"]), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
