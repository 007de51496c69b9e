// ── ACVP Core: Process Context (`Ctx`) ─────────────────────────────────────
// The process-wide handle carried through every call: server address, TLS
// material, JWT storage, the bounded response-accumulation buffer, the
// cached User-Agent string, and the current session URL.
//
// Per DESIGN.md's resolution of the "single-use JWT flag" design note, the
// flag itself does not live here — callers pass an explicit `CredentialMode`
// to the transport layer instead of mutating a flag on `Ctx` ahead of time.

use crate::error::{AcvpError, AcvpResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use zeroize::Zeroizing;

/// Hard cap on the accumulated response body per request (§4.G).
pub const CURL_BUF_MAX: usize = 1024 * 1024;

/// Hard cap on a bearer JWT's length (§3).
pub const JWT_MAX: usize = 2048;

/// Hard cap on a fully-built GET query string (§4.G).
pub const ATTR_URL_MAX: usize = 4096;

/// Which credential, if any, a transport call should attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// No `Authorization` header.
    None,
    /// The long-lived JWT stored in `Ctx`.
    Standard,
    /// The one-shot JWT issued by a refresh; consumed (and cleared) on use.
    SingleUse,
}

/// The process-wide handle carried through every call.
pub struct Ctx {
    pub host: String,
    pub port: u16,
    pub ca_file: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,

    jwt: Option<Zeroizing<String>>,
    temp_jwt: Option<Zeroizing<String>>,

    /// Login credentials, kept only long enough to support one transparent
    /// refresh (§4.H); never logged.
    username: Option<Zeroizing<String>>,
    password: Option<Zeroizing<String>>,

    /// Accumulated response buffer, reset at the start of every request and
    /// bounded by `CURL_BUF_MAX` (§5 "Shared resources").
    response_buf: Vec<u8>,

    user_agent: String,
    pub session_url: Option<String>,
    pub request_timeout: Duration,

    /// Verbosity for this session's `tracing` spans/events (§3). A `Ctx`
    /// field rather than a bespoke enum, since logging is `tracing` +
    /// `tracing-subscriber` end to end.
    pub debug_level: Level,
}

impl Ctx {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ca_file: None,
            client_cert: None,
            client_key: None,
            jwt: None,
            temp_jwt: None,
            username: None,
            password: None,
            response_buf: Vec::new(),
            user_agent: String::new(),
            session_url: None,
            request_timeout: Duration::from_secs(30),
            debug_level: Level::INFO,
        }
    }

    pub fn with_debug_level(mut self, level: Level) -> Self {
        self.debug_level = level;
        self
    }

    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    pub fn with_client_identity(
        mut self,
        cert: impl Into<PathBuf>,
        key: impl Into<PathBuf>,
    ) -> Self {
        self.client_cert = Some(cert.into());
        self.client_key = Some(key.into());
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(Zeroizing::new(username.into()));
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_user_agent(mut self, ua: String) -> Self {
        self.user_agent = ua;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }

    /// Store the standard (long-lived) JWT, replacing and zeroing any prior value.
    pub fn set_jwt(&mut self, token: String) -> AcvpResult<()> {
        if token.len() > JWT_MAX {
            return Err(AcvpError::InvalidArg(format!(
                "JWT exceeds JWT_MAX ({} > {})",
                token.len(),
                JWT_MAX
            )));
        }
        self.jwt = Some(Zeroizing::new(token));
        Ok(())
    }

    /// Store a single-use JWT issued by `refresh` (§4.H).
    pub fn set_temp_jwt(&mut self, token: String) -> AcvpResult<()> {
        if token.len() > JWT_MAX {
            return Err(AcvpError::InvalidArg(format!(
                "JWT exceeds JWT_MAX ({} > {})",
                token.len(),
                JWT_MAX
            )));
        }
        self.temp_jwt = Some(Zeroizing::new(token));
        Ok(())
    }

    pub fn has_jwt(&self) -> bool {
        self.jwt.is_some()
    }

    /// Resolve the credential a transport call should send, per `mode`.
    /// Consumes (and clears) the single-use slot when `SingleUse` is requested.
    pub(crate) fn resolve_credential(&mut self, mode: CredentialMode) -> Option<String> {
        match mode {
            CredentialMode::None => None,
            CredentialMode::Standard => self.jwt.as_ref().map(|z| z.as_str().to_string()),
            CredentialMode::SingleUse => self.temp_jwt.take().map(|z| z.as_str().to_string()),
        }
    }

    /// Logout: zero and drop all JWT material.
    pub fn logout(&mut self) {
        self.jwt = None;
        self.temp_jwt = None;
    }

    /// Reset the response-accumulation buffer. Called at the start of every request.
    pub(crate) fn reset_response_buffer(&mut self) {
        self.response_buf.clear();
    }

    /// Append a chunk to the response buffer, enforcing `CURL_BUF_MAX`.
    pub(crate) fn append_response_chunk(&mut self, chunk: &[u8]) -> AcvpResult<()> {
        if self.response_buf.len() + chunk.len() > CURL_BUF_MAX {
            return Err(AcvpError::TransportFail(format!(
                "response body exceeds CURL_BUF_MAX ({} bytes)",
                CURL_BUF_MAX
            )));
        }
        self.response_buf.extend_from_slice(chunk);
        Ok(())
    }

    pub(crate) fn response_buffer(&self) -> &[u8] {
        &self.response_buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_defaults_to_info_and_is_overridable() {
        let ctx = Ctx::new("example.test", 443);
        assert_eq!(ctx.debug_level, Level::INFO);
        let ctx = ctx.with_debug_level(Level::TRACE);
        assert_eq!(ctx.debug_level, Level::TRACE);
    }

    #[test]
    fn jwt_over_max_rejected() {
        let mut ctx = Ctx::new("example.test", 443);
        let too_long = "a".repeat(JWT_MAX + 1);
        assert!(matches!(ctx.set_jwt(too_long), Err(AcvpError::InvalidArg(_))));
    }

    #[test]
    fn single_use_credential_consumed_once() {
        let mut ctx = Ctx::new("example.test", 443);
        ctx.set_temp_jwt("one-shot".into()).unwrap();
        assert_eq!(
            ctx.resolve_credential(CredentialMode::SingleUse),
            Some("one-shot".to_string())
        );
        assert_eq!(ctx.resolve_credential(CredentialMode::SingleUse), None);
    }

    #[test]
    fn standard_credential_not_consumed() {
        let mut ctx = Ctx::new("example.test", 443);
        ctx.set_jwt("long-lived".into()).unwrap();
        assert_eq!(
            ctx.resolve_credential(CredentialMode::Standard),
            Some("long-lived".to_string())
        );
        assert_eq!(
            ctx.resolve_credential(CredentialMode::Standard),
            Some("long-lived".to_string())
        );
    }

    #[test]
    fn response_buffer_bounded() {
        let mut ctx = Ctx::new("example.test", 443);
        let chunk = vec![0u8; CURL_BUF_MAX];
        assert!(ctx.append_response_chunk(&chunk).is_ok());
        assert!(ctx.append_response_chunk(&[0u8]).is_err());
    }
}
