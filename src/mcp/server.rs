use futures::Future;
use hyper::service::{make_service_fn, service_fn};
use hyper::{header, server::Server, Body, Method, Request, Response, StatusCode};
use tracing::{error, info};

use super::handler::handle_message;
use crate::dispatcher::Dispatcher;

pub const DEFAULT_PORT: u16 = 6274;

/// Every JSON-RPC message is a POST to `/`
async fn tool_service(dispatcher: Dispatcher, req: Request<Body>) -> hyper::Result<Response<Body>> {
    if req.uri().path() != "/" {
        return Ok(status(StatusCode::NOT_FOUND));
    }
    if req.method() != Method::POST {
        return Ok(status(StatusCode::METHOD_NOT_ALLOWED));
    }

    let body = hyper::body::to_bytes(req.into_body()).await?;
    let response = match handle_message(&dispatcher, &body).await {
        Some(response) => response,
        None => return Ok(status(StatusCode::ACCEPTED)),
    };

    match serde_json::to_vec(&response) {
        Ok(json) => {
            let mut res = Response::new(Body::from(json));
            res.headers_mut()
                .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
            Ok(res)
        }
        Err(e) => {
            error!("Failed to serialize tool endpoint response: {e}");
            Ok(status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn status(code: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = code;
    response
}

/// Serve the tool endpoint until `shutdown` resolves
pub async fn tool_server<F>(dispatcher: Dispatcher, port: u16, shutdown: F) -> hyper::Result<()>
where
    F: Future<Output = ()>,
{
    let addr = ([127, 0, 0, 1], port).into();
    info!("Serving tool endpoint on http://{addr}");

    let service = make_service_fn(move |_| {
        let dispatcher = dispatcher.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| tool_service(dispatcher.clone(), req)))
        }
    });
    let res = Server::try_bind(&addr)?
        .serve(service)
        .with_graceful_shutdown(shutdown)
        .await;
    match &res {
        Ok(()) => info!("Stopped tool endpoint successfully"),
        Err(e) => error!("Error while shutting down tool endpoint: {e}"),
    }
    res
}
