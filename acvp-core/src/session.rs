// ── ACVP Core: Session Runner ──────────────────────────────────────────────
// §4 data flow, composed end to end: H (login) → J (coordinator) → F
// (dispatch) → D (symmetric handler) → B (envelope), repeated once per
// vector-set URL the caller hands in. This is the one place that owns the
// whole chain; everything it calls is independently testable on its own.
// Generic over `Transport` so tests can drive the real data flow against an
// in-process mock instead of a live server.

use crate::ctx::{Ctx, CredentialMode};
use crate::dispatch::{self, Registration};
use crate::error::AcvpResult;
use crate::sym::wire::VectorSet;
use crate::transport::auth;
use crate::transport::client::{HttpTransport, Transport};
use crate::transport::coordinator::Coordinator;
use tracing::info;

/// One ACVP test session: a transport, the authenticated `Ctx` it drives,
/// and the DUT registry dispatch consults. Strictly sequential internally
/// (§5) — running several sessions concurrently is the caller's concern.
pub struct Session<'d, T: Transport = HttpTransport> {
    ctx: Ctx,
    transport: T,
    duts: Vec<Registration<'d>>,
}

impl<'d> Session<'d, HttpTransport> {
    /// Build a session backed by the real `reqwest`/`rustls` transport.
    pub fn new(ctx: Ctx, duts: Vec<Registration<'d>>) -> AcvpResult<Self> {
        let transport = HttpTransport::new(&ctx)?;
        Ok(Self { ctx, transport, duts })
    }
}

impl<'d, T: Transport> Session<'d, T> {
    /// Build a session over an already-constructed transport (tests; or a
    /// caller that wants to share one `HttpTransport` across sessions).
    pub fn with_transport(ctx: Ctx, transport: T, duts: Vec<Registration<'d>>) -> Self {
        Self { ctx, transport, duts }
    }

    /// Exchange the `Ctx`'s stored credentials for a long-lived JWT.
    pub async fn login(&mut self) -> AcvpResult<()> {
        auth::login(&mut self.ctx, &self.transport).await
    }

    /// Fetch one vector set, answer it, and submit the result. Refresh and
    /// single retry on an expired JWT is handled transparently by the
    /// coordinator for both the GET and the POST.
    pub async fn run_once(&mut self, vector_set_url: &str) -> AcvpResult<()> {
        let coordinator = Coordinator::new(&self.transport);

        let vs_bytes = coordinator
            .run_with_refresh(&mut self.ctx, |ctx, transport, mode| {
                transport.get(ctx, vector_set_url, mode, &[])
            })
            .await?;
        let vs: VectorSet = serde_json::from_slice(&vs_bytes)?;
        info!(vs_id = vs.vs_id, algorithm = %vs.algorithm, "processing vector set");

        let response = dispatch::dispatch(&vs, &self.duts)?;
        let body = serde_json::to_vec(&response)?;
        let results_path = format!("{vector_set_url}/results");

        coordinator
            .run_with_refresh(&mut self.ctx, |ctx, transport, mode| {
                transport.post(ctx, &results_path, mode, body.clone())
            })
            .await?;

        info!(vs_id = vs.vs_id, "vector set submitted");
        Ok(())
    }

    /// Run `run_once` over every URL in turn, stopping at the first error.
    pub async fn run(&mut self, vector_set_urls: &[String]) -> AcvpResult<()> {
        for url in vector_set_urls {
            self.run_once(url).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym::{CryptoHandler, DutOutcome};
    use crate::sym::testcase::SymTc;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoDut;
    impl CryptoHandler for EchoDut {
        fn compute(&self, tc: &mut SymTc) -> DutOutcome {
            *tc.ct = tc.pt.to_vec();
            DutOutcome::Ok
        }
    }

    /// Serves a fixed vector-set body on GET and records the POSTed results
    /// body, so `run_once`'s full data flow can be checked without a live
    /// server.
    struct RecordingTransport {
        vs_body: &'static str,
        submitted: Mutex<Option<Vec<u8>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(
            &self,
            _ctx: &mut Ctx,
            _path: &str,
            _mode: CredentialMode,
            _params: &[(&str, &str)],
        ) -> AcvpResult<Vec<u8>> {
            Ok(self.vs_body.as_bytes().to_vec())
        }

        async fn post(
            &self,
            _ctx: &mut Ctx,
            path: &str,
            _mode: CredentialMode,
            body: Vec<u8>,
        ) -> AcvpResult<Vec<u8>> {
            assert!(path.ends_with("/results"));
            *self.submitted.lock().unwrap() = Some(body);
            Ok(b"{}".to_vec())
        }

        async fn put(&self, _ctx: &mut Ctx, _path: &str, _mode: CredentialMode, _body: Vec<u8>) -> AcvpResult<Vec<u8>> {
            unreachable!("run_once never issues PUT")
        }
    }

    const VS_JSON: &str = r#"{
        "vsId": 1,
        "algorithm": "ACVP-TDES-ECB",
        "testGroups": [{
            "tgId": 1,
            "direction": "encrypt",
            "testType": "AFT",
            "tests": [{"tcId": 1, "key1": "0123456789abcdef", "key2": "23456789abcdef01", "key3": "456789abcdef0123", "pt": "8899aabbccddeeff"}]
        }]
    }"#;

    #[tokio::test]
    async fn run_once_drives_get_dispatch_and_post() {
        let ctx = Ctx::new("example.test", 443);
        let transport = RecordingTransport {
            vs_body: VS_JSON,
            submitted: Mutex::new(None),
        };
        let dut = EchoDut;
        let duts = vec![Registration {
            algorithm: "ACVP-TDES-ECB",
            dut: &dut,
        }];
        let mut session = Session::with_transport(ctx, transport, duts);

        session.run_once("/vectorsets/1").await.unwrap();

        let submitted = session.transport.submitted.lock().unwrap().take().unwrap();
        let submitted_text = String::from_utf8(submitted).unwrap();
        assert!(submitted_text.contains("\"ct\""));
        assert!(submitted_text.contains("8899aabbccddeeff"));
    }

    #[tokio::test]
    async fn unregistered_algorithm_aborts_before_any_post() {
        let ctx = Ctx::new("example.test", 443);
        let transport = RecordingTransport {
            vs_body: VS_JSON,
            submitted: Mutex::new(None),
        };
        let mut session: Session<'_, RecordingTransport> =
            Session::with_transport(ctx, transport, Vec::new());

        let err = session.run_once("/vectorsets/1").await.unwrap_err();
        assert!(matches!(err, crate::error::AcvpError::UnsupportedOp(_)));
        assert!(session.transport.submitted.lock().unwrap().is_none());
    }
}
