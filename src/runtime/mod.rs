//! # Inference runtime collaborator
//!
//! The server never runs transformer inference itself: pipelines live in
//! an external runtime process and are driven through this seam. The
//! production implementation is an HTTP client; tests plug in mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::error::NmtError;
use crate::device::Device;

/// Opaque handle to a pipeline loaded inside the runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeHandle(pub String);

/// Result of a load: the handle plus the runtime's estimate of the
/// pipeline's resident size, where it reports one.
#[derive(Clone, Debug)]
pub struct LoadedPipeline {
    pub handle: RuntimeHandle,
    pub size_hint_bytes: Option<u64>,
}

/// Capability handshake performed once at startup.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct RuntimeCapabilities {
    #[serde(default)]
    pub gpu_available: bool,
    #[serde(default)]
    pub gpu_count: usize,
}

/// Memory usage as observable by the runtime. Fields are absent where the
/// runtime cannot measure them.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct MemoryReport {
    pub ram_percent: Option<f64>,
    pub gpu_percent: Option<f64>,
}

/// Generation parameters for one batched call.
#[derive(Clone, Debug, Serialize)]
pub struct TranslateOptions {
    pub batch_size: usize,
    pub beam_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tgt_code: Option<String>,
}

/// Contract of the external inference runtime. `translate` preserves
/// input order and length; `release` frees device memory for the handle.
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    async fn capabilities(&self) -> Result<RuntimeCapabilities, NmtError>;

    async fn load(&self, model_id: &str, device: Device) -> Result<LoadedPipeline, NmtError>;

    async fn translate(
        &self,
        handle: &RuntimeHandle,
        texts: &[String],
        options: &TranslateOptions,
    ) -> Result<Vec<String>, NmtError>;

    async fn release(&self, handle: RuntimeHandle) -> Result<(), NmtError>;

    async fn memory(&self) -> MemoryReport;

    async fn clear_device_cache(&self) -> Result<(), NmtError>;
}

#[derive(Serialize)]
struct LoadRequest<'a> {
    model_id: &'a str,
    device: String,
}

#[derive(Deserialize)]
struct LoadResponse {
    handle: String,
    #[serde(default)]
    size_hint_bytes: Option<u64>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    handle: &'a str,
    texts: &'a [String],
    #[serde(flatten)]
    options: &'a TranslateOptions,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<String>,
}

#[derive(Serialize)]
struct ReleaseRequest<'a> {
    handle: &'a str,
}

/// HTTP client for a runtime sidecar process.
#[derive(Clone)]
pub struct HttpRuntime {
    base_url: String,
    http: reqwest::Client,
}

impl HttpRuntime {
    pub fn new(base_url: impl Into<String>) -> HttpRuntime {
        HttpRuntime {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl InferenceRuntime for HttpRuntime {
    async fn capabilities(&self) -> Result<RuntimeCapabilities, NmtError> {
        let response = self
            .http
            .get(self.url("/capabilities"))
            .send()
            .await
            .map_err(|e| NmtError::IOError(format!("runtime capabilities: {e}")))?;
        if !response.status().is_success() {
            return Err(NmtError::IOError(format!(
                "runtime capabilities: HTTP {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn load(&self, model_id: &str, device: Device) -> Result<LoadedPipeline, NmtError> {
        let request = LoadRequest {
            model_id,
            device: device.to_string(),
        };
        let response = self
            .http
            .post(self.url("/models/load"))
            .json(&request)
            .send()
            .await
            .map_err(|e| NmtError::ModelLoad(format!("{model_id}: {e}")))?;
        if !response.status().is_success() {
            return Err(NmtError::ModelLoad(format!(
                "{model_id}: HTTP {}",
                response.status()
            )));
        }
        let body: LoadResponse = response
            .json()
            .await
            .map_err(|e| NmtError::ModelLoad(format!("{model_id}: {e}")))?;
        debug!(model_id, handle = %body.handle, "pipeline loaded");
        Ok(LoadedPipeline {
            handle: RuntimeHandle(body.handle),
            size_hint_bytes: body.size_hint_bytes,
        })
    }

    async fn translate(
        &self,
        handle: &RuntimeHandle,
        texts: &[String],
        options: &TranslateOptions,
    ) -> Result<Vec<String>, NmtError> {
        let request = TranslateRequest {
            handle: &handle.0,
            texts,
            options,
        };
        let response = self
            .http
            .post(self.url("/translate"))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NmtError::Inference(format!(
                "HTTP {} from runtime",
                response.status()
            )));
        }
        let body: TranslateResponse = response.json().await?;
        if body.translations.len() != texts.len() {
            return Err(NmtError::Inference(format!(
                "runtime returned {} outputs for {} inputs",
                body.translations.len(),
                texts.len()
            )));
        }
        Ok(body.translations)
    }

    async fn release(&self, handle: RuntimeHandle) -> Result<(), NmtError> {
        let request = ReleaseRequest { handle: &handle.0 };
        let response = self
            .http
            .post(self.url("/models/release"))
            .json(&request)
            .send()
            .await
            .map_err(|e| NmtError::IOError(format!("runtime release: {e}")))?;
        if !response.status().is_success() {
            return Err(NmtError::IOError(format!(
                "runtime release: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn memory(&self) -> MemoryReport {
        // Best effort: pressure eviction degrades gracefully without it.
        match self.http.get(self.url("/memory")).send().await {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or_default()
            }
            _ => MemoryReport::default(),
        }
    }

    async fn clear_device_cache(&self) -> Result<(), NmtError> {
        let response = self
            .http
            .post(self.url("/clear-device-cache"))
            .send()
            .await
            .map_err(|e| NmtError::IOError(format!("runtime clear-device-cache: {e}")))?;
        if !response.status().is_success() {
            return Err(NmtError::IOError(format!(
                "runtime clear-device-cache: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}
