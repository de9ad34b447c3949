//! OCI HTTP signature authentication.
//!
//! Every request is signed with the API key registered for the user:
//!
//! ```text
//! Authorization: Signature version="1",keyId="<tenancy>/<user>/<fingerprint>",
//!     algorithm="rsa-sha256",headers="date (request-target) host",signature="<b64>"
//! ```
//!
//! Requests with a body additionally sign `content-length`, `content-type`
//! and `x-content-sha256` (base64 SHA-256 of the body).

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, Url};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};

use crate::error::OciError;

/// Content type used for every request body we send.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Headers produced by [`RequestSigner::sign`], ready to attach to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub date: String,
    pub authorization: String,
    /// Set only for requests with a body.
    pub content: Option<ContentHeaders>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHeaders {
    pub content_length: usize,
    pub content_type: &'static str,
    pub content_sha256: String,
}

/// Signs requests on behalf of one OCI API key.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(tenancy: &str, user: &str, fingerprint: &str, private_key: RsaPrivateKey) -> Self {
        Self {
            key_id: format!("{tenancy}/{user}/{fingerprint}"),
            signing_key: SigningKey::<Sha256>::new(private_key),
        }
    }

    /// Parse a PEM private key, accepting both PKCS#8 and PKCS#1 encodings.
    pub fn from_pem(
        tenancy: &str,
        user: &str,
        fingerprint: &str,
        pem: &str,
    ) -> Result<Self, OciError> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|pkcs8_err| {
                RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
                    OciError::InvalidKey(format!("pkcs8: {pkcs8_err}; pkcs1: {pkcs1_err}"))
                })
            })?;
        Ok(Self::new(tenancy, user, fingerprint, key))
    }

    pub fn from_key_file(
        tenancy: &str,
        user: &str,
        fingerprint: &str,
        path: &Path,
    ) -> Result<Self, OciError> {
        let pem = std::fs::read_to_string(path).map_err(|source| OciError::KeyRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(tenancy, user, fingerprint, &pem)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign a request using the current time.
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<SignedHeaders, OciError> {
        self.sign_at(method, url, body, &http_date_now())
    }

    /// Sign a request with an explicit `date` header value.
    pub fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        date: &str,
    ) -> Result<SignedHeaders, OciError> {
        let host = host_header(url)?;
        let content = body.map(|body| ContentHeaders {
            content_length: body.len(),
            content_type: JSON_CONTENT_TYPE,
            content_sha256: STANDARD.encode(Sha256::digest(body)),
        });

        let (header_names, signing_string) =
            signing_string(method, url, &host, date, content.as_ref());

        let signature = self
            .signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| OciError::Signing(e.to_string()))?;

        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            header_names,
            STANDARD.encode(signature.to_bytes()),
        );

        Ok(SignedHeaders {
            date: date.to_string(),
            authorization,
            content,
        })
    }
}

/// Build the signing string and the matching `headers="..."` list.
pub(crate) fn signing_string(
    method: &Method,
    url: &Url,
    host: &str,
    date: &str,
    content: Option<&ContentHeaders>,
) -> (String, String) {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut names = vec!["date", "(request-target)", "host"];
    let mut lines = vec![
        format!("date: {date}"),
        format!(
            "(request-target): {} {target}",
            method.as_str().to_ascii_lowercase()
        ),
        format!("host: {host}"),
    ];

    if let Some(content) = content {
        names.extend(["content-length", "content-type", "x-content-sha256"]);
        lines.push(format!("content-length: {}", content.content_length));
        lines.push(format!("content-type: {}", content.content_type));
        lines.push(format!("x-content-sha256: {}", content.content_sha256));
    }

    (names.join(" "), lines.join("\n"))
}

/// `host` header value as the HTTP client will send it.
fn host_header(url: &Url) -> Result<String, OciError> {
    let host = url.host_str().ok_or_else(|| OciError::InvalidEndpoint {
        url: url.to_string(),
        reason: "missing host".to_string(),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// RFC 7231 date, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`.
fn http_date_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
pub(crate) fn test_private_key() -> RsaPrivateKey {
    use std::sync::OnceLock;

    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, 2048).unwrap()
    })
    .clone()
}

#[cfg(test)]
pub(crate) fn test_signer() -> RequestSigner {
    RequestSigner::new(
        "ocid1.tenancy.oc1..aaa",
        "ocid1.user.oc1..bbb",
        "20:3b:97:13:55:1c",
        test_private_key(),
    )
}
