// ── ACVP Core: Algorithm Dispatcher ────────────────────────────────────────
// §4.F. Routes an incoming vector set to the handler registered for its
// `algorithm` string. Only the TDES symmetric family is implemented; any
// other algorithm returns `UnsupportedOp` rather than panicking, so a
// session loop iterating over a server's full capability list can keep
// going past vector sets it doesn't know how to answer.

use crate::error::{AcvpError, AcvpResult};
use crate::sym::{self, CryptoHandler, TdesMode};
use crate::sym::wire::{ResponseVectorSet, VectorSet};

/// One registered algorithm family and the DUT that answers it.
pub struct Registration<'a> {
    pub algorithm: &'a str,
    pub dut: &'a dyn CryptoHandler,
}

/// Dispatch `vs` to the handler for its algorithm, using `duts` as the
/// registry (caller-supplied so the same dispatcher can serve different DUT
/// instances per algorithm, matching §4.F's "registry, not a hardcoded
/// match").
pub fn dispatch(vs: &VectorSet, duts: &[Registration<'_>]) -> AcvpResult<ResponseVectorSet> {
    if TdesMode::from_algorithm(&vs.algorithm).is_err() {
        return Err(AcvpError::UnsupportedOp(format!(
            "no handler registered for algorithm: {}",
            vs.algorithm
        )));
    }

    let registration = duts
        .iter()
        .find(|r| r.algorithm == vs.algorithm)
        .ok_or_else(|| {
            AcvpError::UnsupportedOp(format!("no DUT registered for {}", vs.algorithm))
        })?;

    sym::process_vector_set(vs, registration.dut)
}
