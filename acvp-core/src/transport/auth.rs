// ── ACVP Core: Session / Auth Controller ───────────────────────────────────
// §4.H. `login` exchanges username/password for the long-lived JWT; `refresh`
// exchanges it again for a single-use JWT when the server reports the
// standard one expired. `inspect` turns a non-2xx status + body into the
// specific error variant the coordinator needs to decide whether a retry is
// worthwhile at all.

use crate::ctx::{Ctx, CredentialMode};
use crate::error::{AcvpError, AcvpResult};
use crate::transport::client::Transport;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Exchange `ctx`'s stored username/password for a long-lived JWT.
pub async fn login(ctx: &mut Ctx, transport: &dyn Transport) -> AcvpResult<()> {
    let username = ctx
        .username()
        .ok_or_else(|| AcvpError::MissingArg("username".to_string()))?
        .to_string();
    let password = ctx
        .password()
        .ok_or_else(|| AcvpError::MissingArg("password".to_string()))?
        .to_string();

    let body = serde_json::to_vec(&serde_json::json!({
        "username": username,
        "password": password,
    }))?;

    let raw = transport.post(ctx, "/acvp/v1/login", CredentialMode::None, body).await?;
    let parsed: LoginResponse = serde_json::from_slice(&raw)?;
    ctx.set_jwt(parsed.access_token)?;
    info!("login succeeded, JWT stored");
    Ok(())
}

/// Ask the server for a fresh single-use JWT, using the current long-lived
/// one. Called by the coordinator exactly once per `JwtExpired` (§4.J).
pub async fn refresh(ctx: &mut Ctx, transport: &dyn Transport) -> AcvpResult<()> {
    let raw = transport
        .post(ctx, "/acvp/v1/login", CredentialMode::Standard, Vec::new())
        .await?;
    let parsed: LoginResponse = serde_json::from_slice(&raw)?;
    ctx.set_temp_jwt(parsed.access_token)?;
    info!("JWT refreshed");
    Ok(())
}

/// Classify a non-2xx transport failure into the specific error the
/// coordinator needs, by inspecting the status code and body the server
/// returned (§4.H): a 401 whose `error` field is exactly `"JWT expired"` is
/// `JwtExpired`; one whose `error` field starts with `"JWT signature does
/// not match"` is `JwtInvalid`; every other body — malformed JSON, a missing
/// `error` field, or an unrecognized message — falls through to
/// `TransportFail`, 401 or not.
pub fn inspect(status: u16, body: &str) -> AcvpError {
    if status == 401 {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if parsed.error == "JWT expired" {
                return AcvpError::JwtExpired;
            }
            if parsed.error.starts_with("JWT signature does not match") {
                return AcvpError::JwtInvalid(parsed.error);
            }
        }
    }
    AcvpError::TransportFail(format!("HTTP {status}: {body}"))
}
