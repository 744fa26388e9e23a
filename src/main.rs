use std::sync::Arc;

use anyhow::Context;
use chat_relay::{
    config::Config,
    routes,
    services::{
        generator::Generator, mistral::MistralGenerator, rules::RuleGenerator,
        thread_memory::ThreadMemory,
    },
    state::AppState,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let memory = ThreadMemory::new();
    let generator: Arc<dyn Generator> = match &config.mistral {
        Some(mistral) => {
            info!(model = %mistral.model, "using hosted model generator");
            Arc::new(MistralGenerator::new(mistral.clone(), memory.clone()))
        }
        None => {
            warn!("MISTRAL_API_KEY not set, falling back to rule-based replies");
            Arc::new(RuleGenerator::new(memory.clone()))
        }
    };

    spawn_memory_janitor(memory, config.thread_ttl);

    let state = Arc::new(AppState::new(generator, config.generate_timeout));
    let app = routes::create_router()
        .with_state(state)
        .layer(routes::cors_layer(&config.cors_origins));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("chat relay listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

fn spawn_memory_janitor(memory: ThreadMemory, ttl: std::time::Duration) {
    let period = (ttl / 2).max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = memory.purge_expired(ttl).await;
            if removed > 0 {
                info!(removed, "evicted idle threads");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
