use std::path::{Path, PathBuf};

use headers::{Authorization, HeaderMapExt};
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request};

use super::http::HttpError;
use super::secret::SecretString;

/// Where a secret comes from.
#[derive(Clone, Debug)]
pub enum Credential {
    Static(SecretString),
    /// Read again for every request, so rotated tokens are picked up.
    File(PathBuf),
}

impl Credential {
    /// A file credential, failing right away if the file cannot be read.
    pub fn file(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        std::fs::read(&path)?;

        Ok(Credential::File(path))
    }

    async fn resolve(&self) -> Result<String, HttpError> {
        match self {
            Credential::Static(secret) => Ok(secret.inner().to_string()),
            Credential::File(path) => read_credential(path).await,
        }
    }
}

async fn read_credential(path: &Path) -> Result<String, HttpError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HttpError::ReadCredential {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(content.trim().to_string())
}

/// The authentication strategy for requests to Marathon
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Basic <base64(username:password)>`
    Basic {
        username: String,
        password: Credential,
    },

    /// `Authorization: Bearer <token>`
    Bearer(Credential),

    /// `Authorization: token=<token>`, which is what DC/OS expects instead of
    /// a bearer token.
    ///
    /// https://docs.mesosphere.com/1.11/security/oss/managing-authentication/
    Token(Credential),
}

impl Auth {
    pub async fn apply<B>(&self, req: &mut Request<B>) -> Result<(), HttpError> {
        let headers = req.headers_mut();

        match self {
            Auth::Basic { username, password } => {
                let password = password.resolve().await?;
                headers.typed_insert(Authorization::basic(username, &password));
            }
            Auth::Bearer(token) => {
                let token = token.resolve().await?;
                let auth = Authorization::bearer(&token)
                    .map_err(|_err| HttpError::InvalidCredential("bearer token"))?;
                headers.typed_insert(auth);
            }
            Auth::Token(token) => {
                let token = token.resolve().await?;
                let value = HeaderValue::from_str(&format!("token={token}"))
                    .map_err(|_err| HttpError::InvalidCredential("auth token"))?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(())
    }
}
