//! HTTP client for the identity and compute services.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE};
use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use capgrab_core::{AvailabilityZone, CapgrabConfig, LaunchRequest, LaunchedInstance};

use crate::error::{OciError, ProviderError, ProviderResult};
use crate::provider::{ComputeProvider, ProviderFuture};
use crate::signer::RequestSigner;
use crate::wire::{AvailabilityDomainBody, ErrorBody, InstanceBody, LaunchInstanceDetails};

const API_VERSION: &str = "20160918";
const OPC_REQUEST_ID: &str = "opc-request-id";
const X_CONTENT_SHA256: &str = "x-content-sha256";

/// Error bodies longer than this are cut before they end up in logs.
const MAX_ERROR_BODY: usize = 1024;

/// Signed OCI REST client.
#[derive(Debug, Clone)]
pub struct OciClient {
    http: reqwest::Client,
    signer: RequestSigner,
    identity_endpoint: Url,
    compute_endpoint: Url,
}

impl OciClient {
    /// Create a client. `timeout` bounds every request end to end.
    pub fn new(
        signer: RequestSigner,
        identity_endpoint: &str,
        compute_endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, OciError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            signer,
            identity_endpoint: parse_endpoint(identity_endpoint)?,
            compute_endpoint: parse_endpoint(compute_endpoint)?,
        })
    }

    /// Build a client from the `[oci]` config section, loading the API key.
    pub fn from_config(config: &CapgrabConfig) -> Result<Self, OciError> {
        let signer = RequestSigner::from_key_file(
            &config.oci.tenancy,
            &config.oci.user,
            &config.oci.fingerprint,
            &config.oci.key_file,
        )?;
        Self::new(
            signer,
            &config.identity_endpoint(),
            &config.compute_endpoint(),
            Duration::from_secs(config.oci.request_timeout_secs),
        )
    }

    /// `ListAvailabilityDomains` for a compartment.
    pub async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> ProviderResult<Vec<AvailabilityZone>> {
        let mut url = api_url(&self.identity_endpoint, "availabilityDomains")?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);

        let response = self.send(Method::GET, url, None).await?;
        let bodies: Vec<AvailabilityDomainBody> = decode(response).await?;
        Ok(bodies.into_iter().map(AvailabilityZone::from).collect())
    }

    /// `LaunchInstance` in the request's zone.
    pub async fn launch(&self, request: LaunchRequest<'_>) -> ProviderResult<LaunchedInstance> {
        let url = api_url(&self.compute_endpoint, "instances")?;
        let body = serde_json::to_vec(&LaunchInstanceDetails::from(request))
            .map_err(|e| ProviderError::Transport(format!("failed to encode launch request: {e}")))?;

        let response = self.send(Method::POST, url, Some(body)).await?;
        let instance: InstanceBody = decode(response).await?;
        Ok(instance.into())
    }

    /// Sign and send a request, turning non-2xx answers into service errors.
    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> ProviderResult<Response> {
        let signed = self
            .signer
            .sign(&method, &url, body.as_deref())
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(DATE, &signed.date)
            .header(AUTHORIZATION, &signed.authorization);

        if let Some(content) = &signed.content {
            builder = builder
                .header(CONTENT_LENGTH, content.content_length)
                .header(CONTENT_TYPE, content.content_type)
                .header(X_CONTENT_SHA256, &content.content_sha256);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let request_id = response
            .headers()
            .get(OPC_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        debug!(%method, %url, status = status.as_u16(), %request_id, "oci response");

        if status.is_success() {
            return Ok(response);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(%request_id, error = %e, "failed to read error body");
                String::new()
            }
        };

        Err(service_error(status.as_u16(), request_id, &text))
    }
}

impl ComputeProvider for OciClient {
    fn list_availability_zones<'a>(
        &'a self,
        compartment_id: &'a str,
    ) -> ProviderFuture<'a, Vec<AvailabilityZone>> {
        Box::pin(self.list_availability_domains(compartment_id))
    }

    fn launch_instance<'a>(&'a self, request: LaunchRequest<'a>) -> ProviderFuture<'a, LaunchedInstance> {
        Box::pin(self.launch(request))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, OciError> {
    let url = Url::parse(endpoint).map_err(|e| OciError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(OciError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

fn api_url(base: &Url, resource: &str) -> ProviderResult<Url> {
    let raw = format!(
        "{}/{API_VERSION}/{resource}",
        base.as_str().trim_end_matches('/')
    );
    Url::parse(&raw).map_err(|e| ProviderError::Transport(format!("invalid url {raw}: {e}")))
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Transport(format!("invalid response body: {e}")))
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Transport(format!("request timed out: {e}"))
    } else {
        ProviderError::Transport(e.to_string())
    }
}

/// Map a non-2xx response body to a service error. Bodies that are not
/// OCI error JSON, including empty ones, become code `Unknown`.
fn service_error(status: u16, request_id: String, text: &str) -> ProviderError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => (body.code, body.message),
        Err(_) => ("Unknown".to_string(), truncate(text, MAX_ERROR_BODY)),
    };

    ProviderError::Service {
        status,
        code,
        message,
        request_id,
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
