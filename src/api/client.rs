//! HTTP implementation of `RemoteApi`.

use super::types::{DocumentItem, DocumentSearchResponse, TollGroupItem, TollItem};
use super::window::{DocumentDateAxis, TollDateAxis};
use super::RemoteApi;
use crate::auth::{FileSessionCache, HttpIdentityProvider, SessionManager};
use crate::clock::Clock;
use crate::config::{Config, Endpoints};
use crate::error::ApiError;
use crate::models::TollGenre;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Header carrying the session token on every API request.
const TOKEN_HEADER: &str = "x-token";

/// Header carrying the server-side file name of a downloaded document.
const FILENAME_HEADER: &str = "x-filename";

/// Feenox API client.
pub struct FeenoxClient {
    http: Client,
    endpoints: Endpoints,
    session: SessionManager,
    clock: Arc<dyn Clock>,
}

impl FeenoxClient {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        session: SessionManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            endpoints,
            session,
            clock,
        }
    }

    /// Build a client with a file-cached session from configuration.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Cannot build HTTP client")?;

        let session = SessionManager::new(
            Box::new(HttpIdentityProvider::new(http.clone(), &config.endpoints.login)),
            Box::new(FileSessionCache::new(&config.cache_path)),
            clock.clone(),
        )
        .with_credentials_source(&config.credentials_path);

        Ok(Self::new(http, config.endpoints.clone(), session, clock))
    }

    /// Session manager owned by this client.
    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    fn toll_search_url(&self, genre: TollGenre) -> &str {
        match genre {
            TollGenre::Invoice => &self.endpoints.invoice_tolls,
            TollGenre::Daily => &self.endpoints.daily_tolls,
        }
    }

    /// Fail on non-success status, passing successful responses through.
    fn check(endpoint: &str, response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(endpoint, response).into())
        }
    }
}

/// Body of a toll search.
pub fn toll_search_body(groups: &[String], axis: &TollDateAxis) -> Value {
    let mut body = Map::new();
    body.insert(
        "tollsGroup".to_string(),
        Value::Array(groups.iter().cloned().map(Value::String).collect()),
    );
    body.insert(axis.key().to_string(), axis.window().to_json());
    Value::Object(body)
}

/// Body of a document search (empty object without an axis).
pub fn document_search_body(axis: Option<&DocumentDateAxis>) -> Value {
    let mut body = Map::new();
    if let Some(axis) = axis {
        body.insert(axis.key().to_string(), axis.window().to_json());
    }
    Value::Object(body)
}

/// `<base>/<type>[/<category>]`
pub fn documents_url(base: &str, document_type: &str, category: Option<&str>) -> String {
    match category {
        Some(category) => format!("{}/{}/{}", base, document_type, category),
        None => format!("{}/{}", base, document_type),
    }
}

/// Target path for a download: the destination directory (or the parent of a
/// file path) joined with the final component of the server file name.
pub fn download_target(destination: &Path, server_name: &str) -> Option<PathBuf> {
    let file_name = Path::new(server_name.trim()).file_name()?;
    let directory = if destination.is_dir() {
        destination
    } else {
        destination.parent().unwrap_or_else(|| Path::new("."))
    };
    Some(directory.join(file_name))
}

impl RemoteApi for FeenoxClient {
    fn list_toll_groups(&mut self) -> Result<Vec<TollGroupItem>> {
        let token = self.session.token()?;
        let response = self
            .http
            .get(&self.endpoints.toll_groups)
            .header(TOKEN_HEADER, token)
            .send()
            .map_err(ApiError::from)
            .context("Cannot request toll groups")?;

        let groups: Vec<TollGroupItem> = Self::check("toll groups", response)?
            .json()
            .map_err(ApiError::from)
            .context("Cannot parse toll groups response")?;
        Ok(groups)
    }

    fn search_tolls(
        &mut self,
        genre: TollGenre,
        groups: &[String],
        axis: &TollDateAxis,
    ) -> Result<Vec<TollItem>> {
        axis.validate(self.clock.today())?;
        let token = self.session.token()?;

        let url = self.toll_search_url(genre).to_string();
        let body = toll_search_body(groups, axis);
        debug!(genre = %genre, %body, "searching tolls");

        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, token)
            .json(&body)
            .send()
            .map_err(ApiError::from)
            .with_context(|| format!("Cannot search {} tolls", genre))?;

        let tolls: Vec<TollItem> = Self::check("toll search", response)?
            .json()
            .map_err(ApiError::from)
            .context("Cannot parse toll search response")?;
        Ok(tolls)
    }

    fn search_documents(
        &mut self,
        document_type: &str,
        category: Option<&str>,
        axis: Option<&DocumentDateAxis>,
    ) -> Result<Vec<DocumentItem>> {
        let token = self.session.token()?;

        let url = documents_url(&self.endpoints.documents, document_type, category);
        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, token)
            .json(&document_search_body(axis))
            .send()
            .map_err(ApiError::from)
            .with_context(|| format!("Cannot search documents of type {}", document_type))?;

        let found: DocumentSearchResponse = Self::check("document search", response)?
            .json()
            .map_err(ApiError::from)
            .context("Cannot parse document search response")?;
        Ok(found.documents)
    }

    fn download_document(&mut self, document_id: &str, destination: &Path) -> Result<PathBuf> {
        let token = self.session.token()?;

        let url = format!("{}/{}", self.endpoints.download_document, document_id);
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, token)
            .send()
            .map_err(ApiError::from)
            .with_context(|| format!("Cannot download document {}", document_id))?;
        let response = Self::check("document download", response)?;

        let target = response
            .headers()
            .get(FILENAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|name| download_target(destination, name))
            .ok_or_else(|| ApiError::MissingFilename(document_id.to_string()))?;

        let content = response
            .bytes()
            .map_err(ApiError::from)
            .with_context(|| format!("Cannot read content of document {}", document_id))?;
        std::fs::write(&target, &content)
            .with_context(|| format!("Cannot write document: {}", target.display()))?;

        Ok(target)
    }
}
