//! Serves the metrics registry in the Prometheus text format.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use metrics::{Registry, TextReporter};
use serde::Deserialize;
use tokio::net::TcpListener;
use tripwire::Tripwire;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

fn default_endpoint() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9465))
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: SocketAddr,
}

/// Accepts connections until `shutdown` resolves, connections already
/// accepted are served to the end.
pub async fn serve(listener: TcpListener, registry: Registry, mut shutdown: Tripwire) {
    loop {
        let conn = tokio::select! {
            _ = &mut shutdown => break,
            result = listener.accept() => match result {
                Ok((conn, _peer)) => TokioIo::new(conn),
                Err(err) => {
                    error!(
                        message = "accept new connection failed",
                        %err
                    );

                    // errors like EMFILE persist for a while
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => continue,
                    }
                }
            }
        };

        let registry = registry.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let resp = handle(&req, &registry);
                async move { Ok::<_, http::Error>(resp) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(conn, service).await {
                error!(message = "handle http connection failed", ?err);
            }
        });
    }
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::default());
    *resp.status_mut() = status;
    resp
}

fn handle<B>(req: &Request<B>, registry: &Registry) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return empty(StatusCode::METHOD_NOT_ALLOWED);
    }

    if req.uri().path() != "/metrics" {
        return empty(StatusCode::NOT_FOUND);
    }

    let mut reporter = TextReporter::default();
    registry.report(&mut reporter);

    let mut resp = Response::new(Full::new(Bytes::from(reporter.into_string())));
    resp.headers_mut()
        .insert(CONTENT_TYPE, http::HeaderValue::from_static(TEXT_FORMAT));
    resp
}
