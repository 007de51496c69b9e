// ── ACVP Core: Device-Under-Test Plug-in Point ─────────────────────────────
// The DUT is the one external collaborator this crate never implements:
// the caller supplies a `CryptoHandler` that performs the actual symmetric
// computation. Per §5, the DUT may use threads internally but must return
// synchronously — so this trait is plain `Fn`-shaped, not `async`.

use crate::sym::testcase::SymTc;

/// Outcome of one DUT invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DutOutcome {
    /// Computation succeeded; the relevant output buffer on `SymTc` was written.
    Ok,
    /// Computation failed outright (distinct from a key-wrap integrity miss).
    Fail(String),
    /// TDES-KW only: the wrap/unwrap integrity check passed. A valid, scored
    /// test result (`testPassed: true`), carrying no `pt`/`ct` in the
    /// response (§6).
    KeyWrapOk,
    /// TDES-KW only: the wrap/unwrap integrity check did not pass. This is a
    /// valid, scored test result (`testPassed: false`), not a crypto failure.
    KeyWrapFail,
}

/// The pluggable cryptographic module under validation.
///
/// Implementations read whichever of `tc.pt`/`tc.ct`/`tc.key`/`tc.iv` the
/// mode and direction require, and write the complementary buffer (or, for
/// OFB/CFB1/CFB8 MCT rounds, `tc.iv_ret`). `tc.mct_index` distinguishes the
/// first MCT round from subsequent ones when that matters to the DUT.
pub trait CryptoHandler: Send + Sync {
    fn compute(&self, tc: &mut SymTc) -> DutOutcome;
}
