// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP adapter for a rembg server (`rembg s`).
//
// The photo is posted as a multipart `file` field to `/api/remove`; the
// response body is a PNG cutout with the subject's alpha mask.

use std::time::Duration;

use image::RgbaImage;
use passwerk_core::MattingParams;
use passwerk_core::error::{PasswerkError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::traits::Segmenter;

const REMOVE_PATH: &str = "api/remove";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Segmenter backed by a remote rembg service.
#[derive(Debug, Clone)]
pub struct RembgHttpSegmenter {
    client: Client,
    endpoint: Url,
    model: Option<String>,
}

impl RembgHttpSegmenter {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:7000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| {
            PasswerkError::InvalidConfig(format!("segmenter URL '{base_url}' is not valid: {e}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PasswerkError::InvalidConfig(format!(
                "segmenter URL must be http or https, got '{}'",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(REMOVE_PATH)
            .map_err(|e| PasswerkError::InvalidConfig(format!("segmenter URL: {e}")))?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| PasswerkError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: None,
        })
    }

    /// Ask the server for a specific model (e.g. `u2net_human_seg`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> PasswerkError {
        if e.is_timeout() {
            PasswerkError::Segmentation(format!("request to {} timed out", self.endpoint))
        } else if e.is_connect() {
            PasswerkError::Segmentation(format!("cannot connect to {}: {e}", self.endpoint))
        } else {
            PasswerkError::Segmentation(format!("request failed: {e}"))
        }
    }
}

/// Text form fields sent alongside the image.
fn form_fields(model: Option<&str>, params: Option<&MattingParams>) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(model) = model {
        fields.push(("model", model.to_string()));
    }
    if let Some(p) = params {
        fields.push(("a", "true".to_string()));
        fields.push(("af", p.foreground_threshold.to_string()));
        fields.push(("ab", p.background_threshold.to_string()));
        fields.push(("ae", p.erode_size.to_string()));
    }
    fields
}

impl Segmenter for RembgHttpSegmenter {
    fn name(&self) -> &str {
        "rembg-http"
    }

    #[instrument(skip(self, image, params), fields(endpoint = %self.endpoint))]
    async fn segment(&self, image: &[u8], params: Option<&MattingParams>) -> Result<RgbaImage> {
        let part = Part::bytes(image.to_vec())
            .file_name("photo.png")
            .mime_str("image/png")
            .map_err(|e| self.map_reqwest_error(e))?;
        let mut form = Form::new().part("file", part);
        for (name, value) in form_fields(self.model.as_deref(), params) {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PasswerkError::Segmentation(format!(
                "engine returned status {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;
        debug!(bytes = body.len(), "Engine response received");

        let cutout = image::load_from_memory(&body)
            .map_err(|e| PasswerkError::Segmentation(format!("cannot decode engine output: {e}")))?;
        Ok(cutout.to_rgba8())
    }
}
