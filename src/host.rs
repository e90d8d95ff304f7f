//! # Hosting Service API
//!
//! [`HostApi`] is the narrow slice of the hosting service's REST interface the
//! reconciler needs: who am I, does a repository exist, create it, does a
//! branch exist, create a ref. Each method maps HTTP status codes onto typed
//! results so the reconciler never looks at raw responses:
//!
//! | call                  | success        | "absent" | anything else    |
//! |-----------------------|----------------|----------|------------------|
//! | `get_repository`      | 200 → `Some`   | 404 → `None` | `Error::HostApi` |
//! | `create_repository`   | 201 → `Created`| 422 → `Unprocessable` | `Error::HostApi` |
//! | `get_branch_sha`      | 200 → `Some`   | 404 → `None` | `Error::HostApi` |
//! | `create_ref`          | 201 → `()`     |          | `Error::HostApi` |
//!
//! [`GitHubClient`] is the real implementation on top of a blocking `reqwest`
//! client with a bounded per-request timeout. Tests substitute an in-memory
//! implementation.

use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::credentials::Credential;
use crate::error::{Error, Result};

const API_VERSION: &str = "2022-11-28";

/// What a repository probe tells us about an existing repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRepo {
    pub default_branch: String,
}

/// Endpoint family a repository is created under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateScope {
    /// The authenticated user's own namespace.
    User,
    /// An organization the user can create repositories in.
    Organization(String),
}

impl CreateScope {
    /// User scope when `owner` is the authenticated login (case-insensitive,
    /// like the host's logins), organization scope otherwise.
    pub fn for_owner(owner: &str, login: &str) -> Self {
        if owner.eq_ignore_ascii_case(login) {
            CreateScope::User
        } else {
            CreateScope::Organization(owner.to_string())
        }
    }

    pub fn path(&self) -> String {
        match self {
            CreateScope::User => "user/repos".to_string(),
            CreateScope::Organization(org) => format!("orgs/{}/repos", org),
        }
    }
}

/// Body of a repository creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub private: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_init: bool,
}

/// Result of a creation call that did not fail outright.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// 201.
    Created,
    /// 422: the host says the name is taken or invalid.
    Unprocessable(String),
}

/// The host operations the reconciler relies on.
pub trait HostApi: Send + Sync {
    /// Login of the user owning the token.
    fn authenticated_login(&self) -> Result<String>;

    fn get_repository(&self, owner: &str, name: &str) -> Result<Option<RemoteRepo>>;

    fn create_repository(
        &self,
        scope: &CreateScope,
        request: &CreateRepoRequest,
    ) -> Result<CreateOutcome>;

    /// Tip commit of `refs/heads/<branch>`, or `None` if the branch is absent.
    fn get_branch_sha(&self, owner: &str, name: &str, branch: &str) -> Result<Option<String>>;

    /// Create `git_ref` (a full `refs/heads/...` name) pointing at `sha`.
    fn create_ref(&self, owner: &str, name: &str, git_ref: &str, sha: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct UserBody {
    login: String,
}

#[derive(Deserialize)]
struct RepoBody {
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct RefBody {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    sha: &'a str,
}

/// [`HostApi`] over HTTPS.
pub struct GitHubClient {
    client: Client,
    base: Url,
    credential: Credential,
}

impl GitHubClient {
    /// Build a client for `api_url`.
    ///
    /// # Errors
    ///
    /// Fails if `api_url` is not a valid URL or the HTTP client can't be built.
    pub fn new(api_url: &str, credential: Credential, timeout: Duration) -> Result<Self> {
        let base = Url::parse(api_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network {
                url: api_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base,
            credential,
        })
    }

    /// `base` extended by `segments`, each percent-encoded on its own so a
    /// `#`, `%` or `?` in a branch name stays part of the path.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Network {
                url: self.base.to_string(),
                message: "API URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, self.credential.bearer())
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(
                USER_AGENT,
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
    }

    fn send<'s>(
        &self,
        method: Method,
        segments: impl IntoIterator<Item = &'s str>,
        body: Option<&impl Serialize>,
    ) -> Result<Response> {
        let url = self.endpoint(segments)?;
        let mut builder = self.request(method.clone(), url.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().map_err(|e| Error::Network {
            url: url.to_string(),
            message: if e.is_timeout() {
                format!("request timed out: {}", e)
            } else {
                e.to_string()
            },
        })?;
        debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }

    fn parse<T: for<'de> Deserialize<'de>>(response: Response, operation: &str) -> Result<T> {
        let status = response.status().as_u16();
        response.json::<T>().map_err(|e| Error::HostApi {
            operation: operation.to_string(),
            status,
            message: format!("unreadable response body: {}", e),
        })
    }

    fn unexpected(response: Response, operation: &str) -> Error {
        let status = response.status().as_u16();
        let body: ErrorBody = response.json().unwrap_or_default();
        Error::HostApi {
            operation: operation.to_string(),
            status,
            message: body.message,
        }
    }
}

const NO_BODY: Option<&()> = None;

impl HostApi for GitHubClient {
    fn authenticated_login(&self) -> Result<String> {
        let operation = "fetch authenticated user";
        let response = self.send(Method::GET, ["user"], NO_BODY)?;
        match response.status() {
            StatusCode::OK => Ok(Self::parse::<UserBody>(response, operation)?.login),
            StatusCode::UNAUTHORIZED => Err(Error::Credential {
                message: "the host rejected the token (HTTP 401)".to_string(),
                hint: Some("Check that the token is valid and not expired".to_string()),
            }),
            _ => Err(Self::unexpected(response, operation)),
        }
    }

    fn get_repository(&self, owner: &str, name: &str) -> Result<Option<RemoteRepo>> {
        let operation = format!("probe repository {}/{}", owner, name);
        let response = self.send(Method::GET, ["repos", owner, name], NO_BODY)?;
        match response.status() {
            StatusCode::OK => {
                let body: RepoBody = Self::parse(response, &operation)?;
                Ok(Some(RemoteRepo {
                    default_branch: body.default_branch.unwrap_or_default(),
                }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::unexpected(response, &operation)),
        }
    }

    fn create_repository(
        &self,
        scope: &CreateScope,
        request: &CreateRepoRequest,
    ) -> Result<CreateOutcome> {
        let operation = format!("create repository {}", request.name);
        let path = scope.path();
        let response = self.send(Method::POST, path.split('/'), Some(request))?;
        match response.status() {
            StatusCode::CREATED => Ok(CreateOutcome::Created),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body: ErrorBody = response.json().unwrap_or_default();
                Ok(CreateOutcome::Unprocessable(body.message))
            }
            _ => Err(Self::unexpected(response, &operation)),
        }
    }

    fn get_branch_sha(&self, owner: &str, name: &str, branch: &str) -> Result<Option<String>> {
        let operation = format!("look up branch {} of {}/{}", branch, owner, name);
        let segments = ["repos", owner, name, "git", "ref", "heads"]
            .into_iter()
            .chain(branch.split('/'));
        let response = self.send(Method::GET, segments, NO_BODY)?;
        match response.status() {
            StatusCode::OK => Ok(Some(Self::parse::<RefBody>(response, &operation)?.object.sha)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::unexpected(response, &operation)),
        }
    }

    fn create_ref(&self, owner: &str, name: &str, git_ref: &str, sha: &str) -> Result<()> {
        let operation = format!("create {} in {}/{}", git_ref, owner, name);
        let body = CreateRefBody { git_ref, sha };
        let response = self.send(
            Method::POST,
            ["repos", owner, name, "git", "refs"],
            Some(&body),
        )?;
        match response.status() {
            StatusCode::CREATED => Ok(()),
            _ => Err(Self::unexpected(response, &operation)),
        }
    }
}
