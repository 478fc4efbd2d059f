use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderValue, Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::pki_types::pem::PemObject;
use rustls::{ClientConfig, RootCertStore};
use serde::Deserialize;
use thiserror::Error;

use super::auth::Auth;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to load certificates from {path:?}: {source}")]
    LoadCertificates {
        path: PathBuf,
        source: rustls::pki_types::pem::Error,
    },
    #[error("Failed to load private key from {path:?}: {source}")]
    LoadPrivateKey {
        path: PathBuf,
        source: rustls::pki_types::pem::Error,
    },
    #[error("Both cert_file and key_file must be set for client authentication")]
    IncompleteClientAuth,
    #[error("Failed to build TLS config: {0}")]
    BuildTls(#[from] rustls::Error),
    #[error("Failed to make HTTP(S) request: {0}")]
    CallRequest(#[from] hyper_util::client::legacy::Error),
    #[error("Failed to reading response: {0}")]
    ReadIncoming(#[from] hyper::Error),
    #[error("Failed to build HTTP request: {0}")]
    BuildRequest(#[from] http::Error),
    #[error("Failed to read credential file {path:?}: {source}")]
    ReadCredential {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid {0}")]
    InvalidCredential(&'static str),
}

/// TLS settings for connections to Marathon
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM encoded CA certificates, trusted in addition to the system roots.
    pub ca_file: Option<PathBuf>,
    /// PEM encoded client certificate chain, presented to the server.
    pub cert_file: Option<PathBuf>,
    /// PEM encoded private key of `cert_file`.
    pub key_file: Option<PathBuf>,
}

impl TlsConfig {
    fn client_config(&self) -> Result<ClientConfig, HttpError> {
        let mut roots = RootCertStore::empty();

        let native = rustls_native_certs::load_native_certs();
        for err in native.errors {
            warn!(message = "load native certificate failed", %err);
        }
        roots.add_parsable_certificates(native.certs);

        if let Some(path) = &self.ca_file {
            for cert in load_certs(path)? {
                roots.add(cert)?;
            }
        }

        if roots.is_empty() {
            warn!(message = "no trusted root certificates, only plain HTTP servers are reachable");
        }

        let builder = ClientConfig::builder().with_root_certificates(roots);
        match (&self.cert_file, &self.key_file) {
            (None, None) => Ok(builder.with_no_client_auth()),
            (Some(cert_file), Some(key_file)) => {
                let certs = load_certs(cert_file)?;
                let key = PrivateKeyDer::from_pem_file(key_file).map_err(|source| {
                    HttpError::LoadPrivateKey {
                        path: key_file.clone(),
                        source,
                    }
                })?;

                Ok(builder.with_client_auth_cert(certs, key)?)
            }
            _ => Err(HttpError::IncompleteClientAuth),
        }
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, HttpError> {
    CertificateDer::pem_file_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|source| HttpError::LoadCertificates {
            path: path.to_path_buf(),
            source,
        })
}

/// An HTTP(S) client which authenticates every request it sends.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    auth: Option<Auth>,
    user_agent: HeaderValue,
}

impl HttpClient {
    pub fn new(tls: Option<&TlsConfig>, auth: Option<Auth>) -> Result<Self, HttpError> {
        let config = tls.cloned().unwrap_or_default().client_config()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnector::from((http, config));

        let client = Client::builder(TokioExecutor::new()).build(https);
        let user_agent = HeaderValue::from_static(concat!(
            "marathon-sd/",
            env!("CARGO_PKG_VERSION")
        ));

        Ok(HttpClient {
            client,
            auth,
            user_agent,
        })
    }

    pub async fn send(
        &self,
        mut req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, HttpError> {
        req.headers_mut().insert(USER_AGENT, self.user_agent.clone());
        if let Some(auth) = &self.auth {
            auth.apply(&mut req).await?;
        }

        let resp = self.client.request(req).await?;

        debug!(
            message = "HTTP response received",
            status = %resp.status(),
            version = ?resp.version(),
        );

        Ok(resp)
    }
}
