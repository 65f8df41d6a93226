use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USER_AGENT: &str = "antigravity-gateway/1.0";

fn build_http_client(cfg: &antigravity_gateway::config::Config) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(10 * 60));

    if let Some(proxy_url) = cfg.proxy_url.clone() {
        let proxy = reqwest::Proxy::all(proxy_url.as_str()).expect("invalid proxy url for reqwest client");
        builder = builder.proxy(proxy);
    }

    if !cfg.enable_multiplexing {
        builder = builder.http1_only().pool_max_idle_per_host(0).pool_idle_timeout(Duration::from_secs(0));
    } else {
        builder = builder.http2_adaptive_window(true);
    }

    builder.build().expect("failed to build reqwest client")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = antigravity_gateway::config::Config::load();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_level(true).with_target(false))
        .init();

    let http_client = build_http_client(&cfg);
    let pool = antigravity_gateway::pool::spawn(cfg.data_dir.clone(), http_client.clone()).await?;
    let upstream = antigravity_gateway::upstream::UpstreamClient::new(http_client);
    let dispatcher = antigravity_gateway::dispatch::Dispatcher::new(pool.clone(), upstream, cfg.cooldown_secs);
    let translate = antigravity_gateway::translate::TranslateContext::new();

    let config = Arc::new(cfg.clone());
    let state = antigravity_gateway::server::AppState::new(pool, dispatcher, translate, config);
    let app = antigravity_gateway::server::router(state);

    let addr = SocketAddr::from((cfg.listen_addr, cfg.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { /* ... */ },
        _ = terminate => { /* ... */ },
    }
}
