use axum::{Router, routing::get};
use overseer::prelude::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Logs a heartbeat until stopped
fn heartbeat(every: Duration) -> impl Service {
    let stopped = CancellationToken::new();
    FnService::new(
        {
            let stopped = stopped.clone();
            move || {
                let stopped = stopped.clone();
                async move {
                    let mut interval = tokio::time::interval(every);
                    let mut beats = 0u64;
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                beats += 1;
                                tracing::info!(beats, "heartbeat");
                            }
                            _ = stopped.cancelled() => return Ok(()),
                        }
                    }
                }
            }
        },
        move |_scope: ShutdownScope| {
            stopped.cancel();
            async { Ok(()) }
        },
    )
    .named("heartbeat")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overseer=debug,demo_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let router = Router::new()
        .route("/", get(|| async { "hello from overseer" }))
        .route("/health", get(|| async { "ok" }));
    let http = HttpListener::bind(&addr, router).await?;
    tracing::info!("Server running on http://{}", http.local_addr());

    let orchestrator = Orchestrator::builder()
        .shutdown_timeout(Duration::from_secs(5))
        .logger(TracingLogger)
        .register(http.into_service())
        .register(heartbeat(Duration::from_secs(5)))
        .build();

    orchestrator.serve().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
