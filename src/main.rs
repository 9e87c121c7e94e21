//! warden server entry point: wires tracing, optional config-file loading,
//! compat-mode, and the HTTP listener.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use warden::engine::Engine;
use warden::http::{self, AppState};
use warden::store::Store;
use warden::trace::TracingSink;

const DEFAULT_HTTP_PORT: u16 = 8443;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn http_port() -> u16 {
    std::env::var("WARDEN_HTTP_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_HTTP_PORT)
}

fn compat_mode() -> bool {
    std::env::var("WARDEN_COMPAT_MODE").map(|v| matches!(v.as_str(), "1" | "true" | "yes")).unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let store = Store::new();
    store.set_compat_mode(compat_mode());

    if let Ok(config_path) = std::env::var("WARDEN_CONFIG") {
        info!(target: "warden::main", path = %config_path, "loading configuration document");
        let loaded = warden::config::load_file(Path::new(&config_path))?;
        store.bulk_load_policies(loaded.policies)?;
        store.load_groups(loaded.groups);
        store.load_custom_roles(loaded.custom_roles);
    }

    let engine = Engine::new(store);
    let state = AppState { engine, sink: Arc::new(TracingSink), trace_enabled: true };

    let app = http::router(state);
    let port = http_port();
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!(target: "warden::main", %addr, compat_mode = compat_mode(), "starting warden server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
