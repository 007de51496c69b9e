//! `acvp-core`: the Vector-Set Processing Engine and Authenticated Transport
//! Loop for driving an ACVP test session against symmetric (Triple-DES)
//! vector sets. See `SPEC_FULL.md` at the workspace root for the full
//! component table; `DESIGN.md` for how each piece is grounded.

pub mod ctx;
pub mod dispatch;
pub mod error;
pub mod hex_codec;
pub mod session;
pub mod sym;
pub mod testing;
pub mod transport;
pub mod useragent;

pub use ctx::Ctx;
pub use dispatch::{dispatch, Registration};
pub use error::{AcvpError, AcvpResult};
pub use session::Session;
pub use sym::{CryptoHandler, DutOutcome};
