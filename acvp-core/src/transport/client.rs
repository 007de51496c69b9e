// ── ACVP Core: HTTP Transport ───────────────────────────────────────────────
// §4.G. A thin `reqwest` wrapper doing three things the spec insists on:
//   - TLS ≥1.2 via `rustls`, with optional mTLS client identity and a
//     pinned CA bundle (grounded in the teacher's `engine/http.rs`
//     `pinned_tls_config`, generalized from "Mozilla roots only" to "this
//     server's CA, if the caller supplied one, else the standard roots").
//   - Bearer auth attached per-call via `CredentialMode`, never implicitly.
//   - Response bytes streamed into `Ctx`'s bounded buffer rather than
//     buffered unboundedly by `reqwest` itself.

use crate::ctx::{Ctx, CredentialMode, ATTR_URL_MAX};
use crate::error::{AcvpError, AcvpResult};
use async_trait::async_trait;
use reqwest::{Client, Method};
use rustls::ClientConfig;
use std::sync::Arc;
use tracing::{debug, warn};

/// The transport surface `auth` and `Coordinator` depend on. Exists as a
/// trait (rather than calling `HttpTransport` directly) so tests can swap in
/// an in-process mock for the refresh-and-retry path without a live server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `params` is appended to `path` as a percent-encoded query string
    /// (§4.G); pass `&[]` for a bare GET.
    async fn get(
        &self,
        ctx: &mut Ctx,
        path: &str,
        mode: CredentialMode,
        params: &[(&str, &str)],
    ) -> AcvpResult<Vec<u8>>;
    async fn post(&self, ctx: &mut Ctx, path: &str, mode: CredentialMode, body: Vec<u8>) -> AcvpResult<Vec<u8>>;
    async fn put(&self, ctx: &mut Ctx, path: &str, mode: CredentialMode, body: Vec<u8>) -> AcvpResult<Vec<u8>>;
}

/// Build a path + percent-encoded query string (§4.G): values are
/// `urlencoding`-escaped, pairs joined with `&`, the whole thing capped at
/// `ATTR_URL_MAX`.
fn build_query_path(path: &str, params: &[(&str, &str)]) -> AcvpResult<String> {
    if params.is_empty() {
        return Ok(path.to_string());
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let full = format!("{path}?{query}");
    if full.len() > ATTR_URL_MAX {
        return Err(AcvpError::InvalidArg(format!(
            "GET query string exceeds ATTR_URL_MAX ({} > {ATTR_URL_MAX})",
            full.len()
        )));
    }
    Ok(full)
}

/// Build a `rustls::ClientConfig`: the caller's CA file if supplied,
/// otherwise the platform's webpki roots; client identity (mTLS) if both
/// a cert and key were configured.
fn build_tls_config(ctx: &Ctx) -> AcvpResult<ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    if let Some(ca_path) = &ctx.ca_file {
        let pem = std::fs::read(ca_path)?;
        let mut reader = std::io::Cursor::new(pem);
        for cert in rustls_pemfile::certs(&mut reader) {
            let cert = cert.map_err(|e| AcvpError::Tls(format!("bad CA cert: {e}")))?;
            roots
                .add(cert)
                .map_err(|e| AcvpError::Tls(format!("CA cert rejected: {e}")))?;
        }
    } else {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    let builder = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
    .map_err(|e| AcvpError::Tls(format!("unsupported TLS protocol versions: {e}")))?
    .with_root_certificates(roots);

    match (&ctx.client_cert, &ctx.client_key) {
        (Some(cert_path), Some(key_path)) => {
            let cert_pem = std::fs::read(cert_path)?;
            let key_pem = std::fs::read(key_path)?;
            let certs = rustls_pemfile::certs(&mut std::io::Cursor::new(cert_pem))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AcvpError::Tls(format!("bad client cert: {e}")))?;
            let key = rustls_pemfile::private_key(&mut std::io::Cursor::new(key_pem))
                .map_err(|e| AcvpError::Tls(format!("bad client key: {e}")))?
                .ok_or_else(|| AcvpError::Tls("no private key found in client key file".into()))?;
            builder
                .with_client_auth_cert(certs, key)
                .map_err(|e| AcvpError::Tls(format!("client identity rejected: {e}")))
        }
        (None, None) => Ok(builder.with_no_client_auth()),
        _ => Err(AcvpError::Tls(
            "mTLS requires both client_cert and client_key".to_string(),
        )),
    }
}

/// The §4.G transport. One instance per `Session`; not shared across
/// sessions with different TLS material.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(ctx: &Ctx) -> AcvpResult<Self> {
        let tls = build_tls_config(ctx)?;
        let client = Client::builder()
            .use_preconfigured_tls(tls)
            .user_agent(ctx.user_agent().to_string())
            .timeout(ctx.request_timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn request(
        &self,
        ctx: &mut Ctx,
        method: Method,
        path: &str,
        mode: CredentialMode,
        body: Option<Vec<u8>>,
    ) -> AcvpResult<Vec<u8>> {
        let url = format!("{}{}", ctx.base_url(), path);
        let mut builder = self.client.request(method.clone(), &url);

        if let Some(token) = ctx.resolve_credential(mode) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body);
        }

        debug!(%method, %url, "sending request");
        let response = builder.send().await?;
        let status = response.status();

        ctx.reset_response_buffer();
        let bytes = response.bytes().await?;
        ctx.append_response_chunk(&bytes)?;

        if !status.is_success() {
            let body_text = String::from_utf8_lossy(ctx.response_buffer()).to_string();
            warn!(%status, %url, "non-success response");
            return Err(crate::transport::auth::inspect(status.as_u16(), &body_text));
        }

        Ok(ctx.response_buffer().to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        ctx: &mut Ctx,
        path: &str,
        mode: CredentialMode,
        params: &[(&str, &str)],
    ) -> AcvpResult<Vec<u8>> {
        let path = build_query_path(path, params)?;
        self.request(ctx, Method::GET, &path, mode, None).await
    }

    async fn post(&self, ctx: &mut Ctx, path: &str, mode: CredentialMode, body: Vec<u8>) -> AcvpResult<Vec<u8>> {
        self.request(ctx, Method::POST, path, mode, Some(body)).await
    }

    async fn put(&self, ctx: &mut Ctx, path: &str, mode: CredentialMode, body: Vec<u8>) -> AcvpResult<Vec<u8>> {
        self.request(ctx, Method::PUT, path, mode, Some(body)).await
    }
}
