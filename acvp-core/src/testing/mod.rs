//! Non-cryptographic test doubles: `CryptoHandler` implementations that
//! exist to drive the engine's state machines, not to validate anything.
//! Available outside `cfg(test)` so `acvp-cli run --demo` can exercise a
//! full session without a real DUT.

pub mod stub_dut;

pub use stub_dut::StubDut;
