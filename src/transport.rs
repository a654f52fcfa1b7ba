//! Authenticated HTTP client for detached content.
//!
//! The dispatcher only talks to the content service through this wrapper:
//! `get` to dereference inbound payloads, `send` to deliver replies. The
//! client authenticates with a PEM client certificate when the deployment
//! provides one and imposes no request timeout unless configured.

use crate::config::TransportConfig;
use crate::error::TransportError;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Certificate, Client, Identity, Method};
use std::collections::HashMap;
use std::fs;
use std::time::Duration;
use tracing::debug;

/// Status line and raw body of one exchange. Interpreting the status is the
/// caller's business; the transport reports what the wire said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Plain client without client-certificate auth, for cleartext
    /// endpoints and tests.
    pub fn new() -> Self {
        ensure_crypto_provider();
        Self {
            client: Client::builder()
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Client configured for mutual TLS: a PEM certificate/key pair as the
    /// client identity plus optional extra root certificates.
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        ensure_crypto_provider();
        let mut builder = Client::builder();

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let (Some(cert_file), Some(key_file)) = (&config.cert_file, &config.key_file) {
            let mut pem = fs::read(cert_file)?;
            pem.extend_from_slice(&fs::read(key_file)?);
            let identity = Identity::from_pem(&pem)
                .map_err(|error| TransportError::Identity(error.to_string()))?;
            builder = builder.identity(identity);
        }

        for ca_file in &config.ca_files {
            let bundle = fs::read(ca_file)?;
            let certificates = Certificate::from_pem_bundle(&bundle)
                .map_err(|error| TransportError::CaBundle(error.to_string()))?;
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        let client = builder
            .build()
            .map_err(|error| TransportError::Build(error.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch `url`, returning whatever status and body the remote answers
    /// with.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(Method::GET, url, &HashMap::new(), Vec::new())
            .await
    }

    /// Perform an arbitrary-method request with a body and extra headers.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.request(method.clone(), url);
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::Header { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::Header { name: name.clone() })?;
            request = request.header(header_name, header_value);
        }

        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("{method} {url} answered {status} with {} body bytes", body.len());

        Ok(HttpResponse { status, body })
    }
}

/// Pin the process-level rustls provider to ring. Without this, rustls
/// refuses to pick a provider when more than one backend is linked in.
fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
