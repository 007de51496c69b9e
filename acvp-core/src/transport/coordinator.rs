// ── ACVP Core: Network Action Coordinator ──────────────────────────────────
// §4.J. Wraps any single transport action with "on JwtExpired, refresh once
// and retry; any other failure, or a second JwtExpired, propagates."
// This is the only place a refresh-and-retry ever happens — callers never
// loop on JwtExpired themselves.

use crate::ctx::{Ctx, CredentialMode};
use crate::error::{AcvpError, AcvpResult};
use crate::transport::auth;
use crate::transport::client::Transport;
use std::future::Future;
use tracing::warn;

pub struct Coordinator<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Coordinator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Run `action` once with the standard JWT; if it fails with
    /// `JwtExpired`, refresh (which lands the new token in the single-use
    /// slot) and retry `action` exactly one more time consuming that slot —
    /// `action` is handed the `CredentialMode` to attach on each attempt
    /// rather than choosing one itself, so the retry actually picks up the
    /// token `refresh` just issued instead of replaying the same expired one.
    pub async fn run_with_refresh<T, F, Fut>(&self, ctx: &mut Ctx, mut action: F) -> AcvpResult<T>
    where
        F: FnMut(&mut Ctx, &'a dyn Transport, CredentialMode) -> Fut,
        Fut: Future<Output = AcvpResult<T>>,
    {
        match action(ctx, self.transport, CredentialMode::Standard).await {
            Err(AcvpError::JwtExpired) => {
                warn!("JWT expired mid-session; refreshing and retrying once");
                auth::refresh(ctx, self.transport).await?;
                action(ctx, self.transport, CredentialMode::SingleUse).await
            }
            other => other,
        }
    }
}
