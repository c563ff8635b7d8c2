//! Server router definition.
//!
//! The following routes are supported:
//!
//! - GET: `/install`
//! - GET: `/thanks`
//! - POST: `/slack`
//! - POST: `/after_button`
//! - GET: `/hello`

use crate::bot::{
    buttons,
    command::{self, Command},
    Bot,
};
use crate::slack::event::{Event, EventPayload, InteractionPayload};
use crate::slack::signing::{self, SigningSecret};
use axum::{
    body::Bytes,
    extract::{Form, Query, State},
    http::{header::HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use axum_extra::{headers, TypedHeader};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, warn, Level};

/// Dependencies shared by routes across requests.
#[derive(Clone)]
pub struct Deps {
    pub bot: Arc<Mutex<Bot>>,
    pub signing_secret: Option<SigningSecret>,
}

/// Instantiate a new router with tracing.
pub fn new(deps: Deps) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/install", get(install_handler))
        .route("/thanks", get(thanks_handler))
        .route("/slack", post(event_handler))
        .route("/after_button", post(button_handler))
        .layer(trace_layer)
        // Exclude the liveness route from tracing.
        .route("/hello", get(|| async { "hello, world!" }))
        .with_state(deps)
}

/// The OAuth scope requested during installation.
const OAUTH_SCOPE: &str = "bot";

/// Handler for the GET route `/install`. Renders the installation page with
/// the Add to Slack link.
async fn install_handler(State(deps): State<Deps>) -> Html<String> {
    let bot = deps.bot.lock().await;

    Html(install_page(bot.client_id(), bot.credentials().is_some()))
}

fn install_page(client_id: &str, installed: bool) -> String {
    let note = if installed {
        "<p>Sup is already installed; reinstalling refreshes its tokens.</p>"
    } else {
        ""
    };

    format!(
        "<html><body><h1>Sup</h1>{}\
         <a href=\"https://slack.com/oauth/authorize?scope={}&client_id={}\">\
         Add to Slack</a>\
         </body></html>",
        note, OAUTH_SCOPE, client_id
    )
}

/// Query params for the OAuth redirect route.
#[derive(Deserialize)]
struct ThanksParams {
    code: Option<String>,
}

/// Handler for the GET route `/thanks`, the OAuth redirect target. Exchanges
/// the temporary code for tokens and renders the outcome; failures surface
/// on the page rather than as HTTP errors.
async fn thanks_handler(
    State(deps): State<Deps>,
    Query(params): Query<ThanksParams>,
) -> Html<String> {
    let error = match params.code {
        None => Some("No authorization code was provided.".to_owned()),
        Some(code) => match deps.bot.lock().await.auth(&code).await {
            Ok(creds) => {
                info!("installed as bot user {}", creds.bot_user_id);

                None
            }
            Err(e) => {
                error!("{}", e);

                Some(e.to_string())
            }
        },
    };

    Html(thanks_page(error.as_deref()))
}

fn thanks_page(error: Option<&str>) -> String {
    match error {
        None => "<html><body><h1>Thanks for installing Sup!</h1></body></html>".to_owned(),
        Some(e) => format!(
            "<html><body><h1>Something went wrong.</h1><p>{}</p></body></html>",
            e
        ),
    }
}

/// Handler for the POST route `/slack`, the Events API endpoint.
///
/// An `X-Slack-Signature` header containing the HMAC SHA256 signature of the
/// request body, signed with the shared signing secret, must be present and
/// fresh per `X-Slack-Request-Timestamp`.
///
/// Accepts an [EventPayload] in `application/json` format. Message events
/// are dispatched to the bot; whatever the outcome, the event is
/// acknowledged so Slack doesn't retry it.
async fn event_handler(
    State(deps): State<Deps>,
    TypedHeader(content_type): TypedHeader<headers::ContentType>,
    headers: HeaderMap,
    // We can't parse this at all yet as we need to compare signatures.
    body_bytes: Bytes,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    let signing_secret = deps
        .signing_secret
        .as_ref()
        .ok_or((StatusCode::PRECONDITION_FAILED, String::new()))?;

    if content_type != headers::ContentType::json() {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Requests must have `Content-Type: application/json`"),
        ));
    }

    validate_request_signature(signing_secret, &body_bytes, &headers).map_err(|e| {
        let msg = match e {
            SignatureError::Missing => "Missing Slack signature",
            SignatureError::Stale => "Stale Slack signature",
            SignatureError::Invalid => "Invalid Slack signature",
        };
        warn!(msg);

        (StatusCode::UNAUTHORIZED, String::new())
    })?;

    let payload = serde_json::from_slice::<EventPayload>(&body_bytes).map_err(|e| {
        let msg = format!("Failed to deserialize payload: {}", e);
        warn!(msg);

        (StatusCode::UNPROCESSABLE_ENTITY, msg)
    })?;

    match payload {
        EventPayload::UrlVerification { challenge } => Ok((StatusCode::OK, challenge)),
        EventPayload::EventCallback { event } => {
            handle_event(&deps, event).await;

            Ok((StatusCode::OK, String::new()))
        }
    }
}

/// What can go wrong checking a request signature.
enum SignatureError {
    Missing,
    Stale,
    Invalid,
}

/// Check the signature headers against the shared secret before trusting a
/// request body.
fn validate_request_signature(
    secret: &SigningSecret,
    body: &Bytes,
    headers: &HeaderMap,
) -> Result<(), SignatureError> {
    let timestamp = headers
        .get("X-Slack-Request-Timestamp")
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing)?;

    let sig = headers
        .get("X-Slack-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    if signing::is_stale(timestamp, now) {
        return Err(SignatureError::Stale);
    }

    if !signing::is_valid_signature(secret, timestamp, body, sig) {
        return Err(SignatureError::Invalid);
    }

    Ok(())
}

/// React to a callback event. Failures here are our problem rather than
/// Slack's, so they're logged and the event is acknowledged regardless.
async fn handle_event(deps: &Deps, event: Event) {
    let message = match event {
        Event::Message(m) => m,
        Event::Other => return,
    };

    info!("message received from channel {}", message.channel);

    if message.text.contains("hello") {
        if let Err(e) = deps.bot.lock().await.say_hello(&message).await {
            error!("{}", e);
        }
    }

    if let Some(cmd) = command::decode_command(&message.text) {
        info!("sup command received: {:?}", cmd);

        match cmd {
            Command::ReportToday => {
                let res = deps.bot.lock().await.report_today(&message.channel).await;

                match res {
                    Ok(report) => info!("today in {}:\n{}", message.channel, report),
                    Err(e) => error!("{}", e),
                }
            }
        }
    }
}

/// The form in which Slack delivers button callbacks: a lone `payload` field
/// holding JSON.
#[derive(Deserialize)]
struct ButtonCallback {
    payload: String,
}

/// Handler for the POST route `/after_button`. Decodes the activated button
/// and replies with the canned ephemeral response; values we don't recognise
/// get a plain diagnostic rather than an error status.
async fn button_handler(Form(cb): Form<ButtonCallback>) -> Result<Response, (StatusCode, String)> {
    let payload = serde_json::from_str::<InteractionPayload>(&cb.payload).map_err(|e| {
        let msg = format!("Failed to deserialize payload: {}", e);
        warn!(msg);

        (StatusCode::UNPROCESSABLE_ENTITY, msg)
    })?;

    let action = payload.actions.first().ok_or((
        StatusCode::UNPROCESSABLE_ENTITY,
        String::from("Payload contains no actions"),
    ))?;

    match buttons::respond(&action.value) {
        Ok(res) => Ok(Json(res).into_response()),
        Err(diag) => {
            warn!(diag);

            Ok(diag.into_response())
        }
    }
}

#[cfg(test)]
mod test_helpers {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::PathBuf;

    pub fn router(
        base_slack_url: String,
        cache_path: PathBuf,
        signing_secret: Option<SigningSecret>,
    ) -> Router {
        super::new(Deps {
            bot: Arc::new(Mutex::new(Bot::new(
                base_slack_url,
                "test-client-id".to_owned(),
                "test-client-secret".to_owned(),
                cache_path,
            ))),
            signing_secret,
        })
    }

    pub fn secret() -> SigningSecret {
        SigningSecret("8f742231b10e8888abcd99yyyzzz85a5".to_owned())
    }

    /// A correctly signed, correctly typed request to the events route.
    pub fn signed_event_req(secret: &SigningSecret, body: &str) -> Request<Body> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string();
        let sig = signing::gen_signature(secret, &ts, body.as_bytes()).unwrap();

        Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/json")
            .header("X-Slack-Request-Timestamp", ts)
            .header("X-Slack-Signature", sig)
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    pub async fn plaintext_body(body: Body) -> String {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}


#[cfg(test)]
mod tests_events {
    use super::test_helpers::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use mockito::Matcher;
    use tempfile::tempdir;
    use tower::ServiceExt;

    const HELLO_EVENT: &str = r#"{
        "token": "XXYYZZ",
        "team_id": "T123ABC",
        "type": "event_callback",
        "event": {
            "type": "message",
            "channel": "C024BE91L",
            "user": "U2147483697",
            "text": "well hello there",
            "ts": "1629402001.000100"
        },
        "event_id": "Ev123ABC",
        "event_time": 1629402001
    }"#;

    #[tokio::test]
    async fn test_bad_method() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let req = Request::builder()
            .method("GET")
            .uri("/slack")
            .body(Body::empty())
            .unwrap();

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_missing_signing_secret() {
        let dir = tempdir().unwrap();
        let rt = router("any".to_owned(), dir.path().join("cache.json"), None);

        let req = Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_bad_content_type() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let req = Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/xml")
            .body(Body::from("{}"))
            .unwrap();

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            plaintext_body(res.into_body()).await,
            "Requests must have `Content-Type: application/json`"
        );
    }

    #[tokio::test]
    async fn test_missing_signature() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let req = Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(plaintext_body(res.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let mut req = signed_event_req(&secret(), HELLO_EVENT);
        req.headers_mut()
            .insert("X-Slack-Signature", "v0=deadbeef".parse().unwrap());

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stale_timestamp() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        // Correctly signed, but far too old to trust.
        let ts = "1531420618";
        let sig = crate::slack::signing::gen_signature(&secret(), ts, HELLO_EVENT.as_bytes())
            .unwrap();

        let req = Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/json")
            .header("X-Slack-Request-Timestamp", ts)
            .header("X-Slack-Signature", sig)
            .body(Body::from(HELLO_EVENT))
            .unwrap();

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let req = signed_event_req(&secret(), r#"{"type": "event_callback"}"#);

        let res = rt.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(plaintext_body(res.into_body())
            .await
            .starts_with("Failed to deserialize payload"));
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let dir = tempdir().unwrap();
        let rt = router(
            "any".to_owned(),
            dir.path().join("cache.json"),
            Some(secret()),
        );

        let body = r#"{
            "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
            "type": "url_verification"
        }"#;

        let res = rt.oneshot(signed_event_req(&secret(), body)).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            plaintext_body(res.into_body()).await,
            "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        );
    }

    #[tokio::test]
    async fn test_hello_message_posts_greeting() {
        let msg_res = r#"{
            "ok": true
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let msg_mock = srv
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "channel": "C024BE91L",
                "text": "Sup, <@U2147483697>."
            })))
            .with_body(msg_res)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let rt = router(srv.url(), dir.path().join("cache.json"), Some(secret()));

        let res = rt
            .oneshot(signed_event_req(&secret(), HELLO_EVENT))
            .await
            .unwrap();

        msg_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(plaintext_body(res.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_greeting_is_logged_and_dropped() {
        let msg_res = r#"{
            "ok": false,
            "error": "channel_not_found"
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let msg_mock = srv
            .mock("POST", "/chat.postMessage")
            .with_body(msg_res)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let rt = router(srv.url(), dir.path().join("cache.json"), Some(secret()));

        let res = rt
            .oneshot(signed_event_req(&secret(), HELLO_EVENT))
            .await
            .unwrap();

        msg_mock.assert_async().await;

        // The failure is ours to log; Slack still gets its acknowledgment.
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report_command_fetches_history() {
        let history_res = r#"{
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "text": "morning", "ts": "1629402001.000100"}
            ]
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let history_mock = srv
            .mock("GET", "/conversations.history")
            .match_query(Matcher::Any)
            .with_body(history_res)
            .create_async()
            .await;

        let body = r#"{
            "token": "XXYYZZ",
            "team_id": "T123ABC",
            "type": "event_callback",
            "event": {
                "type": "message",
                "channel": "C024BE91L",
                "user": "U2147483697",
                "text": "sup report",
                "ts": "1629402002.000100"
            },
            "event_id": "Ev123ABC",
            "event_time": 1629402002
        }"#;

        let dir = tempdir().unwrap();
        let rt = router(srv.url(), dir.path().join("cache.json"), Some(secret()));

        let res = rt.oneshot(signed_event_req(&secret(), body)).await.unwrap();

        history_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_other_events_are_acknowledged_without_action() {
        let body = r#"{
            "token": "XXYYZZ",
            "team_id": "T123ABC",
            "type": "event_callback",
            "event": {
                "type": "reaction_added",
                "user": "U2147483697",
                "reaction": "thumbsup",
                "event_ts": "1629402001.000100"
            },
            "event_id": "Ev123ABC",
            "event_time": 1629402001
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let msg_mock = srv
            .mock("POST", "/chat.postMessage")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let rt = router(srv.url(), dir.path().join("cache.json"), Some(secret()));

        let res = rt.oneshot(signed_event_req(&secret(), body)).await.unwrap();

        msg_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_authorless_hello_is_not_greeted() {
        let body = r#"{
            "token": "XXYYZZ",
            "team_id": "T123ABC",
            "type": "event_callback",
            "event": {
                "type": "message",
                "subtype": "bot_message",
                "channel": "C024BE91L",
                "text": "hello from a bot",
                "ts": "1629402001.000100"
            },
            "event_id": "Ev123ABC",
            "event_time": 1629402001
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let msg_mock = srv
            .mock("POST", "/chat.postMessage")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let rt = router(srv.url(), dir.path().join("cache.json"), Some(secret()));

        let res = rt.oneshot(signed_event_req(&secret(), body)).await.unwrap();

        msg_mock.assert_async().await;

        assert_eq!(res.status(), StatusCode::OK);
    }
}
