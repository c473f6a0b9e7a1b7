use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::de::DeserializeOwned;

use crate::ExplorerError;

/// A shared HTTP client for explorer GET queries. Cloning is cheap.
#[derive(Clone)]
pub struct ExplorerClient {
    client: Arc<Client>,
}

impl ExplorerClient {
    pub fn new(timeout: Duration) -> Result<Self, ExplorerError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Initialization(e.to_string()))?;
        Ok(Self { client: Arc::new(client) })
    }

    /// Issues a GET request and decodes the JSON body.
    ///
    /// * Connection failures, timeouts and non-success status codes produce a transport error.
    /// * A body that does not decode as `T` produces [`ExplorerError::MalformedResponse`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T, ExplorerError> {
        trace!("🔎️ Sending explorer query: {url}");
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ExplorerError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ExplorerError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ExplorerError::HttpStatus { status: status.as_u16(), message: body });
        }
        trace!("🔎️ Explorer query successful. {status}");
        serde_json::from_str::<T>(&body).map_err(|e| ExplorerError::MalformedResponse(e.to_string()))
    }
}
