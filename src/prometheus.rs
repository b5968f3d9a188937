use futures::Future;
use hyper::service::{make_service_fn, service_fn};
use hyper::{server::Server, Body, Request, Response, StatusCode};
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};
use tracing::{error, info};

lazy_static! {
    pub static ref DISPATCHED_COMMANDS: IntCounterVec = register_int_counter_vec!(
        "bridge_dispatched_commands",
        "Number of dispatched commands",
        &["operation", "frontend", "outcome"],
    )
    .unwrap();
    pub static ref FAILED_CHAT_DELIVERIES: IntCounter = register_int_counter!(
        "bridge_failed_chat_deliveries",
        "Total number of chat responses that could not be delivered"
    )
    .unwrap();
    pub static ref SOCKET_RECONNECTS: IntCounter = register_int_counter!(
        "bridge_socket_reconnects",
        "Total number of chat socket reconnects"
    )
    .unwrap();
}

/// The function which triggers on any request to the server (incl. any path)
async fn metric_service(_req: Request<Body>) -> hyper::Result<Response<Body>> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    let mf = prometheus::gather();
    if let Err(e) = encoder.encode(&mf, &mut buffer) {
        error!("Could not encode metrics: {e}");
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Ok(response);
    }
    let mut response = Response::new(Body::from(buffer));
    if let Ok(value) = encoder.format_type().parse() {
        response.headers_mut().insert(hyper::header::CONTENT_TYPE, value);
    }
    Ok(response)
}

/// The function which spawns the prometheus server
///
/// F is generally a Notify awaiting a notification
pub async fn prometheus_server<F>(port: u16, shutdown: F) -> hyper::Result<()>
where
    F: Future<Output = ()>,
{
    let addr = ([127, 0, 0, 1], port).into();
    info!("Serving prometheus on http://{addr}");

    let service = make_service_fn(move |_| async { Ok::<_, hyper::Error>(service_fn(metric_service)) });
    let err = Server::try_bind(&addr)?
        .serve(service)
        .with_graceful_shutdown(shutdown)
        .await;
    match &err {
        Ok(()) => info!("Stopped prometheus server successfully"),
        Err(e) => error!("Error while shutting down: {e}"),
    }
    err
}

#[tokio::test]
async fn server_functions_and_shuts_down_gracefully() {
    use hyper::{body::HttpBody, Client};
    use std::sync::Arc;
    use tokio::sync::Notify;

    let port = 1337;
    let shutdown = Arc::new(Notify::new());
    let shutdown_clone = shutdown.clone();
    let server = tokio::spawn(async move {
        prometheus_server(port, shutdown_clone.notified()).await.unwrap();
    });
    // give the listener a moment to bind
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    FAILED_CHAT_DELIVERIES.inc();
    FAILED_CHAT_DELIVERIES.inc();

    let client = Client::new();
    let mut res = client
        .get(format!("http://127.0.0.1:{port}/").parse().unwrap())
        .await
        .unwrap();
    let mut buffer = String::new();
    while let Some(chunk) = res.body_mut().data().await {
        buffer += &String::from_utf8_lossy(&chunk.unwrap().to_vec());
    }

    assert!(buffer.contains("bridge_failed_chat_deliveries"));

    shutdown.notify_one();
    let ret = server.await;
    assert!(ret.is_ok())
}
