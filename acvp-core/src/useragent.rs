// ── ACVP Core: User-Agent Assembler ────────────────────────────────────────
// Builds `acvp-rs/<ver>;<osname>/<osver>;<arch>;<cpu_model>;<compiler>/<ver>`.
//
// Per §4.I / §9: platform fingerprinting is an external-collaborator
// capability (no CPUID intrinsics or registry access lives in this crate).
// Each substring is harvested automatically where the standard library
// exposes it (`std::env::consts`), otherwise falls back to an environment
// variable, and is clamped to its own cap — an overrun drops that field and
// logs a warning rather than failing the whole string.

use tracing::warn;

const FIELD_CAP: usize = 64;
const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One harvested field, capped and defaulted.
fn harvest(field: &str, automatic: Option<&str>, env_var: &str) -> String {
    let raw = automatic
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .unwrap_or_else(|| "unknown".to_string());

    if raw.len() > FIELD_CAP {
        warn!(
            field,
            env_var, "User-Agent field exceeds cap ({FIELD_CAP}); dropping"
        );
        return "unknown".to_string();
    }
    raw
}

/// Assemble the full User-Agent string for this process.
pub fn assemble() -> String {
    let osname = harvest("osname", Some(std::env::consts::OS), "ACV_USER_AGENT_OSNAME");
    let osver = harvest("osver", None, "ACV_USER_AGENT_OSVER");
    let arch = harvest("arch", Some(std::env::consts::ARCH), "ACV_USER_AGENT_ARCH");
    let cpu = harvest("cpu", None, "ACV_USER_AGENT_PROC");
    let compiler = harvest("compiler", None, "ACV_USER_AGENT_COMP");

    format!("acvp-rs/{LIB_VERSION};{osname}/{osver};{arch};{cpu};{compiler}")
}
