// ── ACVP Core: Error Types ─────────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain, mirroring the kinds in the spec
//     (NoCtx, MissingArg, InvalidArg, MalformedJson, ...).
//   • `#[from]` wires std/external error conversions automatically.
//   • No variant carries JWTs, passwords, or other secret material.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcvpError {
    /// No `Ctx` available where one was required.
    #[error("no context available")]
    NoCtx,

    /// A required argument/field was absent.
    #[error("missing argument: {0}")]
    MissingArg(String),

    /// An argument/field was present but malformed (bad hex, wrong length, ...).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A JSON document did not match the expected vector-set/response schema.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// Requested operation or algorithm has no registered handler.
    #[error("unsupported operation: {0}")]
    UnsupportedOp(String),

    /// The DUT handler reported a computation failure.
    #[error("crypto module failure for tcId {tc_id}: {detail}")]
    CryptoModuleFail { tc_id: u64, detail: String },

    /// The DUT reported a key-wrap integrity failure (a distinct, expected outcome).
    #[error("key-wrap integrity failure for tcId {0}")]
    CryptoWrapFail(u64),

    /// Transport-layer failure: network error, timeout, oversize body, opaque non-2xx.
    #[error("transport error: {0}")]
    TransportFail(String),

    /// The bearer JWT has expired (recoverable once, by `transport::coordinator`).
    #[error("JWT expired")]
    JwtExpired,

    /// The bearer JWT failed signature verification (fatal, not retried).
    #[error("JWT invalid: {0}")]
    JwtInvalid(String),

    /// JSON (de)serialization failure via serde_json.
    #[error("JSON error: {0}")]
    JsonErr(#[from] serde_json::Error),

    /// A GET/read returned no usable data.
    #[error("no data")]
    NoData,

    /// Underlying HTTP client (reqwest) failure.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem / I/O failure (reading CA bundles, certs, config).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration failure (bad cert/key material).
    #[error("TLS configuration error: {0}")]
    Tls(String),
}

/// All engine operations return this type.
pub type AcvpResult<T> = Result<T, AcvpError>;

impl AcvpError {
    /// `true` for the one error the coordinator is allowed to recover from
    /// by refreshing the JWT and retrying the action exactly once.
    pub fn is_jwt_expired(&self) -> bool {
        matches!(self, AcvpError::JwtExpired)
    }
}
