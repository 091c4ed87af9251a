use axum::{Router, routing::get};
use overseer::{
    FnService, HttpListener, LifecycleError, Orchestrator, ServiceError, ShutdownScope, Signal,
};
use overseer_testing::{Level, RecordingLogger};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

async fn get_body(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn http_and_function_pair_run_side_by_side() {
    let logger = RecordingLogger::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let stopped = CancellationToken::new();

    let ticker = FnService::new(
        {
            let ticks = Arc::clone(&ticks);
            let stopped = stopped.clone();
            move || {
                let ticks = Arc::clone(&ticks);
                let stopped = stopped.clone();
                async move {
                    let mut interval = tokio::time::interval(Duration::from_millis(10));
                    loop {
                        tokio::select! {
                            _ = interval.tick() => { ticks.fetch_add(1, Ordering::SeqCst); }
                            _ = stopped.cancelled() => return Ok(()),
                        }
                    }
                }
            }
        },
        {
            let stopped = stopped.clone();
            move |_scope: ShutdownScope| {
                let stopped = stopped.clone();
                async move {
                    stopped.cancel();
                    Ok(())
                }
            }
        },
    )
    .named("ticker");

    let router = Router::new().route("/health", get(|| async { "healthy" }));
    let http = HttpListener::bind("127.0.0.1:0", router).await.unwrap();
    let addr = http.local_addr();

    let orchestrator = Arc::new(
        Orchestrator::builder()
            .signals([Signal::User2])
            .shutdown_timeout(Duration::from_secs(2))
            .logger(logger.clone())
            .register(http.into_service())
            .register(ticker)
            .build(),
    );

    let running = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.serve().await }
    });

    // The socket is bound before serve; early connections wait in the backlog.
    let response = get_body(addr, "/health").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("healthy"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ticks.load(Ordering::SeqCst) > 0);

    orchestrator.stop().await;
    tokio::time::timeout(Duration::from_secs(10), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(stopped.is_cancelled());
    assert!(TcpStream::connect(addr).await.is_err());
    assert_eq!(logger.count(Level::Error, "service failed to stop"), 0);
}

#[tokio::test]
async fn function_pair_start_error_ends_serve() {
    let stops = Arc::new(AtomicUsize::new(0));
    let failing = FnService::new(
        || async { Err(ServiceError::msg("config missing")) },
        {
            let stops = Arc::clone(&stops);
            move |_scope: ShutdownScope| {
                stops.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            }
        },
    )
    .named("loader");

    let orchestrator = Orchestrator::builder()
        .signals([Signal::User2])
        .register(failing)
        .build();

    let err = tokio::time::timeout(Duration::from_secs(10), orchestrator.serve())
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, LifecycleError::StartFailed { ref service, .. } if service == "loader"));
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}
