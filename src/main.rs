//! Sup, a friendly Slack bot.
//!
//! Receives Slack events and OAuth callbacks over HTTP. Greets anyone who
//! says hello and summarises a channel's day on request.

use bot::Bot;
use dotenvy::dotenv;
use router::Deps;
use slack::signing::SigningSecret;
use std::sync::Arc;
use std::{env, path::PathBuf};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

mod bot;
mod de;
mod router;
mod slack;

/// Application entrypoint. Initialises tracing, checks for environment
/// variables, binds to 0.0.0.0, and starts the server.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let has_dotenv = dotenv().is_ok();
    if !has_dotenv {
        warn!("No .env found");
    }

    let port: u16 = env::var("PORT")
        .map(|x| x.parse().expect("Could not parse PORT to u16"))
        .unwrap_or(5000);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Could not bind to port");

    server_(listener).await;
}

/// Initialise a server without graceful shutdown.
async fn server_(listener: TcpListener) {
    // Giving a receiver that will never resolve.
    server(listener, oneshot::channel::<()>().1).await;
}

/// Initialise a server with graceful shutdown via `rx`.
async fn server(listener: TcpListener, rx: oneshot::Receiver<()>) {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }

    let client_id = env::var("CLIENT_ID").unwrap_or_default();
    if client_id.is_empty() {
        warn!("No $CLIENT_ID environment variable found");
    }

    let client_secret = env::var("CLIENT_SECRET").unwrap_or_default();
    if client_secret.is_empty() {
        warn!("No $CLIENT_SECRET environment variable found");
    }

    let signing_secret = env::var("SIGNING_SECRET").ok().map(SigningSecret);
    if signing_secret.is_none() {
        warn!("No $SIGNING_SECRET environment variable found");
    }

    let cache_path = env::var("AUTH_CACHE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(bot::credentials::DEFAULT_CACHE_PATH));

    let bot = Bot::new(
        slack::api::API_BASE.into(),
        client_id,
        client_secret,
        cache_path,
    );

    let deps = Deps {
        bot: Arc::new(Mutex::new(bot)),
        signing_secret,
    };

    axum::serve(listener, router::new(deps))
        .with_graceful_shutdown(async {
            rx.await.ok();
        })
        .await
        .expect("Failed to start server");
}
