mod common;

use axum::http::{header, Method, StatusCode};

use common::{auth_config, send, test_app};
use service::auth::domain::AuthUser;
use service::auth::service::issue_token;

fn session_cookie() -> anyhow::Result<String> {
    let user = AuthUser { id: 1, tenant_id: 1, email: "a@acme.io".into(), name: "a".into(), user_type: "SUPER".into() };
    Ok(format!("auth_token={}", issue_token(&auth_config(), &user)?))
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_sign_in() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/ko/main/1/feedback", &[], None).await?;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header(header::LOCATION), "/ko/auth/sign-in");
    Ok(())
}

#[tokio::test]
async fn signed_in_user_skips_public_pages() -> anyhow::Result<()> {
    let app = test_app().await?;
    let cookie = session_cookie()?;
    let res = send(&app, Method::GET, "/en/auth/sign-in", &[("cookie", cookie.as_str())], None).await?;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header(header::LOCATION), "/en/main");

    let res = send(&app, Method::GET, "/en/main", &[("cookie", cookie.as_str())], None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(String::from_utf8(res.bytes)?.contains("userfeedback"));
    Ok(())
}

#[tokio::test]
async fn forged_session_counts_as_anonymous() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/en/main", &[("cookie", "auth_token=forged")], None).await?;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header(header::LOCATION), "/en/auth/sign-in");
    Ok(())
}

#[tokio::test]
async fn locale_is_prefixed_from_cookie() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/auth/sign-in?from=mail", &[("cookie", "NEXT_LOCALE=ja")], None).await?;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.header(header::LOCATION), "/ja/auth/sign-in?from=mail");
    Ok(())
}

#[tokio::test]
async fn assets_bypass_the_gate() -> anyhow::Result<()> {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/assets/app.css", &[], None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(String::from_utf8(res.bytes)?, "body{}");
    Ok(())
}
