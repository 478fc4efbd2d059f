use async_trait::async_trait;
use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use rand::seq::IndexedRandom;

use super::error::Error;
use super::http::{HttpClient, HttpError};
use super::model::AppList;

/// Lists all apps together with their tasks.
pub const APP_LIST_PATH: &str = "/v2/apps/?embed=apps.tasks";

/// Something that returns the application list of a Marathon server.
#[async_trait]
pub trait AppsClient: Send + Sync {
    async fn fetch_apps(&self, url: &str) -> Result<AppList, Error>;
}

/// Fetches apps from Marathon's REST API.
#[derive(Clone)]
pub struct HttpAppsClient {
    client: HttpClient,
}

impl HttpAppsClient {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AppsClient for HttpAppsClient {
    async fn fetch_apps(&self, url: &str) -> Result<AppList, Error> {
        let req = Request::get(url)
            .body(Full::<Bytes>::default())
            .map_err(HttpError::from)?;

        let resp = self.client.send(req).await?;
        let (parts, incoming) = resp.into_parts();
        if !parts.status.is_success() {
            return Err(Error::UnexpectedStatus(parts.status));
        }

        let body = incoming
            .collect()
            .await
            .map_err(HttpError::from)?
            .to_bytes();

        parse_app_list(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

pub fn parse_app_list(body: &[u8]) -> Result<AppList, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Picks one of the servers at random and builds the URL of its app list,
/// `None` only if there are no servers at all.
pub fn random_apps_url(servers: &[String]) -> Option<String> {
    servers
        .choose(&mut rand::rng())
        .map(|server| format!("{server}{APP_LIST_PATH}"))
}
