use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use t42_auth::pkce::challenge_s256;
use t42_auth::{
    AuthError, Browser, Credentials, FlowState, LoginFlow, OAuthClient, Settings, TokenStore,
    ensure_fresh_credentials,
};
use tokio_util::sync::CancellationToken;
use url::Url;

type Forms = Arc<Mutex<Vec<HashMap<String, String>>>>;
type Responder = fn(&HashMap<String, String>) -> Response;

#[derive(Clone)]
struct TokenEndpoint {
    forms: Forms,
    respond: Responder,
}

async fn token(
    State(endpoint): State<TokenEndpoint>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let response = (endpoint.respond)(&form);
    endpoint.forms.lock().unwrap().push(form);
    response
}

async fn start_token_endpoint(respond: Responder) -> (SocketAddr, Forms) {
    let forms = Forms::default();
    let app = Router::new()
        .route("/oauth/token", post(token))
        .with_state(TokenEndpoint {
            forms: forms.clone(),
            respond,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, forms)
}

fn settings(addr: SocketAddr) -> Settings {
    Settings {
        client_id: Some("u-s4t2ud-test".into()),
        client_secret: Some("s-s4t2ud-test".into()),
        api_base_url: format!("http://{addr}"),
        ..Settings::default()
    }
}

fn issue_tokens(form: &HashMap<String, String>) -> Response {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => Json(json!({
            "access_token": "user-access",
            "refresh_token": "user-refresh",
            "token_type": "bearer",
            "expires_in": 7200,
            "scope": "public",
            "created_at": 1700000000
        }))
        .into_response(),
        Some("client_credentials") => Json(json!({
            "access_token": "app-access",
            "token_type": "bearer",
            "expires_in": 7200,
            "scope": "public"
        }))
        .into_response(),
        // Refresh responses do not rotate the refresh token
        Some("refresh_token") => Json(json!({
            "access_token": "refreshed-access",
            "token_type": "bearer",
            "expires_in": 7200
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn reject(_: &HashMap<String, String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_grant",
            "error_description": "The provided authorization grant is invalid"
        })),
    )
        .into_response()
}

/// Follows the authorize URL the way a user would, straight to the redirect.
#[derive(Clone, Default)]
struct RedirectingBrowser {
    opened: Arc<Mutex<Option<String>>>,
}

impl Browser for RedirectingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        *self.opened.lock().unwrap() = Some(url.to_string());

        let parsed = Url::parse(url).map_err(io::Error::other)?;
        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        let callback = format!(
            "{}?code=the-code&state={}",
            query["redirect_uri"], query["state"]
        );
        tokio::spawn(async move {
            let _ = reqwest::get(callback).await;
        });
        Ok(())
    }
}

fn stored(refresh_token: Option<&str>, expires_in: ChronoDuration) -> Credentials {
    let now = Utc::now();
    Credentials {
        access_token: "stored-access".into(),
        refresh_token: refresh_token.map(str::to_string),
        token_type: "bearer".into(),
        scope: "public".into(),
        created_at: now,
        expires_at: now + expires_in,
    }
}

#[tokio::test]
async fn authorization_code_login_completes_with_pkce() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let browser = RedirectingBrowser::default();
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(browser.clone())
        .timeout(Duration::from_secs(10));
    assert_eq!(flow.state(), FlowState::Idle);

    let creds = flow.authorize(&CancellationToken::new()).await.unwrap();

    assert_eq!(flow.state(), FlowState::Authenticated);
    assert_eq!(creds.access_token, "user-access");
    assert_eq!(creds.refresh_token.as_deref(), Some("user-refresh"));
    assert_eq!(creds.expires_in(), 7200);

    let authorize_url = browser.opened.lock().unwrap().clone().unwrap();
    let authorize_url = Url::parse(&authorize_url).unwrap();
    let query: HashMap<String, String> = authorize_url.query_pairs().into_owned().collect();
    assert_eq!(query["code_challenge_method"], "S256");

    let forms = forms.lock().unwrap();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "the-code");
    assert_eq!(form["client_id"], "u-s4t2ud-test");
    assert_eq!(form["client_secret"], "s-s4t2ud-test");
    assert_eq!(form["redirect_uri"], query["redirect_uri"]);
    assert_eq!(challenge_s256(&form["code_verifier"]), query["code_challenge"]);
}

#[tokio::test]
async fn rejected_code_exchange_fails_the_flow() {
    let (addr, _) = start_token_endpoint(reject).await;
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(RedirectingBrowser::default())
        .timeout(Duration::from_secs(10));

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();

    assert_eq!(flow.state(), FlowState::Failed);
    match err {
        AuthError::Provider { error, .. } => assert_eq!(error, "invalid_grant"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_login_fails_without_exchange() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(t42_auth::NoBrowser)
        .timeout(Duration::from_secs(60));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = flow.authorize(&cancel).await.unwrap_err();

    assert!(matches!(err, AuthError::Cancelled), "got {err:?}");
    assert_eq!(flow.state(), FlowState::Failed);
    assert!(forms.lock().unwrap().is_empty());
}

/// Records the authorize URL and goes nowhere.
#[derive(Clone, Default)]
struct RecordingBrowser {
    opened: Arc<Mutex<Option<String>>>,
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        *self.opened.lock().unwrap() = Some(url.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn pasted_code_login_uses_fixed_redirect_port() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let browser = RecordingBrowser::default();
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(browser.clone())
        .redirect_port(4242)
        .timeout(Duration::from_secs(10));

    let creds = flow
        .authorize_pasted(&CancellationToken::new(), &b"pasted-code\n"[..])
        .await
        .unwrap();

    assert_eq!(flow.state(), FlowState::Authenticated);
    assert_eq!(creds.access_token, "user-access");

    let authorize_url = browser.opened.lock().unwrap().clone().unwrap();
    let authorize_url = Url::parse(&authorize_url).unwrap();
    let query: HashMap<String, String> = authorize_url.query_pairs().into_owned().collect();
    assert_eq!(query["redirect_uri"], "http://127.0.0.1:4242/callback");

    let forms = forms.lock().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["code"], "pasted-code");
    assert_eq!(forms[0]["redirect_uri"], "http://127.0.0.1:4242/callback");
    assert_eq!(challenge_s256(&forms[0]["code_verifier"]), query["code_challenge"]);
}

#[tokio::test]
async fn pasted_code_login_needs_a_redirect_port() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(RecordingBrowser::default())
        .redirect_port(0);

    let err = flow
        .authorize_pasted(&CancellationToken::new(), &b"pasted-code\n"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Configuration(_)), "got {err:?}");
    assert_eq!(flow.state(), FlowState::Failed);
    assert!(forms.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pasted_code_login_with_empty_input_has_no_code() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let mut flow = LoginFlow::new(&settings(addr))
        .unwrap()
        .with_browser(RecordingBrowser::default())
        .redirect_port(4242);

    let err = flow
        .authorize_pasted(&CancellationToken::new(), &b""[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MissingCode), "got {err:?}");
    assert!(forms.lock().unwrap().is_empty());
}

#[tokio::test]
async fn client_credentials_token_has_no_refresh_token() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let mut flow = LoginFlow::new(&settings(addr)).unwrap();

    let creds = flow
        .client_credentials(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(flow.state(), FlowState::Authenticated);
    assert_eq!(creds.access_token, "app-access");
    assert!(!creds.can_refresh());
    assert_eq!(forms.lock().unwrap()[0]["grant_type"], "client_credentials");
}

#[tokio::test]
async fn refresh_keeps_unrotated_refresh_token() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let oauth = OAuthClient::new(&settings(addr)).unwrap();

    let refreshed = oauth
        .refresh(&stored(Some("r-1"), ChronoDuration::minutes(1)))
        .await
        .unwrap();

    assert_eq!(refreshed.access_token, "refreshed-access");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("r-1"));
    assert_eq!(refreshed.scope, "public");
    assert_eq!(forms.lock().unwrap()[0]["refresh_token"], "r-1");
}

#[tokio::test]
async fn rejected_refresh_is_a_refresh_error() {
    let (addr, _) = start_token_endpoint(reject).await;
    let oauth = OAuthClient::new(&settings(addr)).unwrap();

    let err = oauth
        .refresh(&stored(Some("revoked"), ChronoDuration::minutes(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Refresh(msg) if msg.contains("invalid_grant")));
}

#[tokio::test]
async fn fresh_credentials_are_used_as_is() {
    let (addr, forms) = start_token_endpoint(issue_tokens).await;
    let oauth = OAuthClient::new(&settings(addr)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::at(dir.path().join("credentials.json"));
    store
        .save(&stored(Some("r-1"), ChronoDuration::hours(1)))
        .unwrap();

    let creds = ensure_fresh_credentials(&store, &oauth).await.unwrap();

    assert_eq!(creds.access_token, "stored-access");
    assert!(forms.lock().unwrap().is_empty());
}

#[tokio::test]
async fn near_expiry_credentials_are_refreshed_and_saved() {
    let (addr, _) = start_token_endpoint(issue_tokens).await;
    let oauth = OAuthClient::new(&settings(addr)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::at(dir.path().join("credentials.json"));
    store
        .save(&stored(Some("r-1"), ChronoDuration::minutes(2)))
        .unwrap();

    let creds = ensure_fresh_credentials(&store, &oauth).await.unwrap();

    assert_eq!(creds.access_token, "refreshed-access");
    assert_eq!(creds.refresh_token.as_deref(), Some("r-1"));

    let saved = store.load().unwrap();
    assert_eq!(saved.access_token, "refreshed-access");
    assert_eq!(saved.expires_at.timestamp(), creds.expires_at.timestamp());
}

#[tokio::test]
async fn expired_credentials_without_refresh_token_need_login() {
    let (addr, _) = start_token_endpoint(issue_tokens).await;
    let oauth = OAuthClient::new(&settings(addr)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::at(dir.path().join("credentials.json"));

    assert!(matches!(
        ensure_fresh_credentials(&store, &oauth).await,
        Err(AuthError::NotLoggedIn)
    ));

    store
        .save(&stored(None, ChronoDuration::minutes(2)))
        .unwrap();
    let still_valid = ensure_fresh_credentials(&store, &oauth).await.unwrap();
    assert_eq!(still_valid.access_token, "stored-access");

    store
        .save(&stored(None, ChronoDuration::minutes(-1)))
        .unwrap();
    assert!(matches!(
        ensure_fresh_credentials(&store, &oauth).await,
        Err(AuthError::RefreshUnavailable)
    ));
}
