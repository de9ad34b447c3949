//! capgrab-oci — minimal Oracle Cloud Infrastructure client.
//!
//! Implements the two calls the poller needs, behind the
//! [`ComputeProvider`] trait:
//!
//! - `GET /20160918/availabilityDomains` on the identity service
//! - `POST /20160918/instances` on the compute service
//!
//! Requests are authenticated with OCI HTTP signatures (`rsa-sha256`).
//!
//! # Architecture
//!
//! ```text
//! OciClient (impl ComputeProvider)
//!   ├── reqwest::Client (per-request timeout)
//!   ├── RequestSigner (Authorization, date, x-content-sha256)
//!   └── wire (LaunchInstanceDetails / response bodies)
//! ```

pub mod client;
pub mod error;
pub mod provider;
pub mod signer;
mod wire;

pub use client::OciClient;
pub use error::{OciError, ProviderError, ProviderResult};
pub use provider::{ComputeProvider, ProviderFuture};
pub use signer::RequestSigner;
