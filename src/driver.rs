//! The smoke test itself: one POST, then the status and body printed verbatim.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::adapter::{Client, RestError, RestResponse, RestResult};
use crate::payload::{DEFAULT_PHONE, DEFAULT_SCENE, DEFAULT_URL, SmsScene, SmsSendRequest};

#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    #[error("transport failure: {0}")]
    Transport(#[from] RestError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

/// Target and payload for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmokeConfig {
    pub url: String,
    pub phone: String,
    pub scene: SmsScene,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            phone: DEFAULT_PHONE.to_string(),
            scene: DEFAULT_SCENE,
        }
    }
}

impl SmokeConfig {
    pub fn payload(&self) -> SmsSendRequest {
        SmsSendRequest::new(self.phone.clone(), self.scene)
    }
}

/// Performs the single call. Any status the server answers with is `Ok`.
pub async fn send(client: &Client, config: &SmokeConfig) -> RestResult<RestResponse> {
    debug!(url = %config.url, scene = %config.scene, "sending sms request");

    match client.post_json(config.url.as_str(), &config.payload()).await {
        Ok(response) => {
            info!(
                status = response.status(),
                success = response.is_success(),
                elapsed_ms = response.elapsed.as_millis() as u64,
                "sms endpoint answered"
            );
            Ok(response)
        }
        Err(err) => {
            warn!(url = %config.url, kind = ?err.kind(), "sms request failed: {}", err.message);
            Err(err)
        }
    }
}

pub fn render<W: Write>(response: &RestResponse, out: &mut W) -> io::Result<()> {
    writeln!(out, "Status Code: {}", response.status())?;
    writeln!(out, "Response: {}", response.text())?;
    Ok(())
}

/// Sends the request and writes the report. Nothing is written when the
/// exchange fails.
pub async fn run<W: Write>(
    client: &Client,
    config: &SmokeConfig,
    out: &mut W,
) -> Result<(), SmokeError> {
    let response = send(client, config).await?;
    render(&response, out)?;
    out.flush()?;
    Ok(())
}
