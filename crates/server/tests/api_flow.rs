mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{call, post_feedback, seed, send, setup_tenant, test_app};

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/health", &[], None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn duplicate_tenant_is_rejected_with_envelope() -> anyhow::Result<()> {
    let app = test_app().await?;
    setup_tenant(&app, "acme", "admin@acme.io").await?;

    let res = send(
        &app,
        Method::POST,
        "/api/tenants",
        &[],
        Some(json!({ "siteName": "acme", "email": "other@acme.io", "password": "Passw0rd!" })),
    )
    .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["message"], "Tenant already exists");
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["path"], "/api/tenants");
    Ok(())
}

#[tokio::test]
async fn oauth_secret_is_visible_only_to_tenant_admins() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (tenant_id, token) = setup_tenant(&app, "acme", "admin@acme.io").await?;
    let (_, outsider) = setup_tenant(&app, "beta", "admin@beta.io").await?;
    let uri = format!("/api/tenants/{tenant_id}");

    let settings = json!({
        "siteName": "acme",
        "useEmail": true,
        "isPrivate": false,
        "isRestrictDomain": false,
        "allowDomains": [],
        "useOAuth": true,
        "oauthConfig": { "clientId": "cid", "clientSecret": "TOP-SECRET" }
    });
    let res = call(&app, Method::PUT, &uri, &token, Some(settings)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["useOAuth"], true);

    let res = send(&app, Method::GET, &uri, &[], None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["oauthConfig"]["clientId"], "cid");
    assert!(body["oauthConfig"].get("clientSecret").is_none());
    assert!(!String::from_utf8(res.bytes.clone())?.contains("TOP-SECRET"));

    let res = call(&app, Method::GET, &uri, &outsider, None).await?;
    assert!(res.json()["oauthConfig"].get("clientSecret").is_none());

    let res = call(&app, Method::GET, &uri, &token, None).await?;
    assert_eq!(res.json()["oauthConfig"]["clientSecret"], "TOP-SECRET");
    Ok(())
}

#[tokio::test]
async fn renaming_tenant_onto_taken_name_is_bad_request() -> anyhow::Result<()> {
    let app = test_app().await?;
    setup_tenant(&app, "acme", "admin@acme.io").await?;
    let (beta_id, token) = setup_tenant(&app, "beta", "admin@beta.io").await?;

    let settings = json!({
        "siteName": "acme",
        "useEmail": true,
        "isPrivate": false,
        "isRestrictDomain": false,
        "useOAuth": false
    });
    let res = call(&app, Method::PUT, &format!("/api/tenants/{beta_id}"), &token, Some(settings)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Tenant already exists");
    Ok(())
}

#[tokio::test]
async fn sign_in_sets_session_cookie_and_rejects_bad_password() -> anyhow::Result<()> {
    let app = test_app().await?;
    setup_tenant(&app, "acme", "admin@acme.io").await?;

    let res = send(&app, Method::POST, "/api/auth/sign-in", &[], Some(json!({ "email": "admin@acme.io", "password": "Passw0rd!" }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.header(header::SET_COOKIE);
    assert!(cookie.starts_with("auth_token="), "{cookie}");
    assert!(cookie.contains("HttpOnly"));

    let res = send(&app, Method::POST, "/api/auth/sign-in", &[], Some(json!({ "email": "admin@acme.io", "password": "wrong" }))).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["statusCode"], 401);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_session() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/api/projects/1", &[], None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Unauthorized");

    let res = call(&app, Method::GET, "/api/projects/1", "not-a-jwt", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_api_route_is_enveloped_404() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/api/nope", &[], None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["path"], "/api/nope");
    Ok(())
}

#[tokio::test]
async fn other_tenant_cannot_read_project() -> anyhow::Result<()> {
    let app = test_app().await?;
    let s = seed(&app).await?;
    let (_, outsider) = setup_tenant(&app, "beta", "admin@beta.io").await?;

    let res = call(&app, Method::GET, &format!("/api/projects/{}", s.project_id), &outsider, None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json()["message"], "Forbidden resource");

    let res = call(&app, Method::GET, &format!("/api/projects/{}", s.project_id), &s.token, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "web");
    Ok(())
}

#[tokio::test]
async fn feedback_intake_requires_project_api_key() -> anyhow::Result<()> {
    let app = test_app().await?;
    let s = seed(&app).await?;
    let uri = format!("/api/projects/{}/channels/{}/feedbacks", s.project_id, s.channel_id);

    let res = send(&app, Method::POST, &uri, &[], Some(json!({ "message": "hi" }))).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, Method::POST, &uri, &[("x-api-key", "WRONGKEY")], Some(json!({ "message": "hi" }))).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = post_feedback(&app, &s, json!({ "memo": "admin only" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = post_feedback(&app, &s, json!({ "message": "hi", "device": "pixel" })).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.json()["id"].as_i64().is_some());
    Ok(())
}

#[tokio::test]
async fn issue_lifecycle() -> anyhow::Result<()> {
    let app = test_app().await?;
    let s = seed(&app).await?;
    let base = format!("/api/projects/{}/issues", s.project_id);

    let res = call(&app, Method::POST, &base, &s.token, Some(json!({ "name": "crash" }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "INIT");
    let crash = res.json()["id"].as_i64().unwrap_or_default();

    let res = call(&app, Method::POST, &base, &s.token, Some(json!({ "name": "crash" }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Issue name is duplicated");

    let res = call(&app, Method::POST, &base, &s.token, Some(json!({ "name": "slow", "description": "login is slow" }))).await?;
    let slow = res.json()["id"].as_i64().unwrap_or_default();

    let res = call(&app, Method::PUT, &format!("{base}/{slow}"), &s.token, Some(json!({ "name": "crash" }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Duplicated name");

    let res = call(&app, Method::POST, &format!("{base}/search"), &s.token, Some(json!({ "query": { "searchText": "login" } }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["meta"]["totalItems"], 1);
    assert_eq!(res.json()["items"][0]["name"], "slow");

    let res = call(&app, Method::POST, &format!("{base}/search"), &s.token, Some(json!({ "query": { "bogus": "x" } }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = call(&app, Method::GET, &format!("/api/projects/{}/issue-count", s.project_id), &s.token, None).await?;
    assert_eq!(res.json()["total"], 2);

    let res = call(&app, Method::DELETE, &format!("{base}/{crash}"), &s.token, None).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = call(&app, Method::GET, &format!("{base}/{crash}"), &s.token, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = call(&app, Method::DELETE, &format!("{base}/{crash}"), &s.token, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = call(&app, Method::DELETE, &base, &s.token, Some(json!({ "issueIds": [slow] }))).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = call(&app, Method::GET, &format!("/api/projects/{}/issue-count", s.project_id), &s.token, None).await?;
    assert_eq!(res.json()["total"], 0);
    Ok(())
}

#[tokio::test]
async fn feedback_search_link_export_and_delete() -> anyhow::Result<()> {
    let app = test_app().await?;
    let s = seed(&app).await?;
    let feedbacks = format!("/api/projects/{}/channels/{}/feedbacks", s.project_id, s.channel_id);

    let first = post_feedback(&app, &s, json!({ "message": "app crashes on launch", "device": "pixel" })).await?.json()["id"]
        .as_i64()
        .unwrap_or_default();
    post_feedback(&app, &s, json!({ "message": "love it", "device": "iphone" })).await?;

    let res = call(&app, Method::POST, &format!("/api/projects/{}/issues", s.project_id), &s.token, Some(json!({ "name": "crash" }))).await?;
    let issue = res.json()["id"].as_i64().unwrap_or_default();

    let link = format!("{feedbacks}/{first}/issue/{issue}");
    let res = call(&app, Method::POST, &link, &s.token, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "feedbackId": first, "issueId": issue }));
    // linking twice keeps a single link
    call(&app, Method::POST, &link, &s.token, None).await?;

    let res = call(&app, Method::GET, &format!("/api/projects/{}/issues/{issue}", s.project_id), &s.token, None).await?;
    assert_eq!(res.json()["feedbackCount"], 1);

    let res = call(&app, Method::POST, &format!("{feedbacks}/search"), &s.token, Some(json!({ "query": { "device": "pixel" } }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["meta"]["totalItems"], 1);
    assert_eq!(body["items"][0]["id"], first);
    assert_eq!(body["items"][0]["issues"][0]["name"], "crash");

    let res = call(&app, Method::POST, &format!("{feedbacks}/search"), &s.token, Some(json!({ "query": { "searchText": "love" } }))).await?;
    assert_eq!(res.json()["meta"]["totalItems"], 1);

    let res = call(&app, Method::PUT, &format!("{feedbacks}/{first}"), &s.token, Some(json!({ "memo": "triaged" }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = call(&app, Method::PUT, &format!("{feedbacks}/{first}"), &s.token, Some(json!({ "message": "edited" }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = call(&app, Method::POST, &format!("{feedbacks}/export"), &s.token, Some(json!({ "type": "csv", "query": {} }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header(header::CONTENT_TYPE), "text/csv");
    let disposition = res.header(header::CONTENT_DISPOSITION);
    assert!(disposition.starts_with("attachment; filename=\"UFB_web_app_Feedback_"), "{disposition}");
    assert!(disposition.ends_with(".csv\""), "{disposition}");
    let csv = String::from_utf8(res.bytes.clone())?;
    assert!(csv.starts_with("ID,Created,Updated,Issue,Message,Device,Memo"), "{csv}");

    let res = call(&app, Method::DELETE, &link, &s.token, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = call(&app, Method::GET, &format!("/api/projects/{}/issues/{issue}", s.project_id), &s.token, None).await?;
    assert_eq!(res.json()["feedbackCount"], 0);

    call(&app, Method::POST, &link, &s.token, None).await?;
    let res = call(&app, Method::DELETE, &feedbacks, &s.token, Some(json!({ "feedbackIds": [first] }))).await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = call(&app, Method::GET, &format!("/api/projects/{}/issues/{issue}", s.project_id), &s.token, None).await?;
    assert_eq!(res.json()["feedbackCount"], 0);
    let res = call(&app, Method::POST, &format!("{feedbacks}/search"), &s.token, Some(json!({}))).await?;
    assert_eq!(res.json()["meta"]["totalItems"], 1);

    let res = call(&app, Method::GET, &format!("/api/tenants/{}/feedback-count", s.tenant_id), &s.token, None).await?;
    assert_eq!(res.json()["total"], 1);
    Ok(())
}

#[tokio::test]
async fn feedback_routes_reject_channel_of_other_project() -> anyhow::Result<()> {
    let app = test_app().await?;
    let s = seed(&app).await?;
    let res = call(&app, Method::POST, "/api/projects", &s.token, Some(json!({ "tenantId": s.tenant_id, "name": "mobile" }))).await?;
    let other = res.json()["id"].as_i64().unwrap_or_default();

    let uri = format!("/api/projects/{other}/channels/{}/feedbacks/search", s.channel_id);
    let res = call(&app, Method::POST, &uri, &s.token, Some(json!({}))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Invalid channel id");
    Ok(())
}
