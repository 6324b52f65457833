use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::RemoteError;

const CONNECT_TIMEOUT: u64 = 5;
const READ_TIMEOUT: u64 = 60;

pub fn client() -> Result<Client, RemoteError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
        .timeout(Duration::from_secs(READ_TIMEOUT))
        .build()
        .map_err(|e| RemoteError::Transport {
            api: "client",
            source: e,
        })
}

pub fn transport(api: &'static str) -> impl FnOnce(reqwest::Error) -> RemoteError {
    move |source| RemoteError::Transport { api, source }
}

/// Turn a non-2xx response into `RemoteError::Status` with the body attached.
pub async fn check(api: &'static str, resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status { api, status, body })
}
