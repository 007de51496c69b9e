//! Symmetric (Triple-DES) vector-set processing: §4 components A–F.

pub mod cipher;
pub mod dut;
pub mod envelope;
pub mod handler;
pub mod mct;
pub mod testcase;
pub mod wire;

pub use cipher::{Direction, TdesMode, TestType};
pub use dut::{CryptoHandler, DutOutcome};
pub use handler::process_vector_set;
pub use testcase::{SymTc, SymTcParams};
