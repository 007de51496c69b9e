// ── ACVP Core: Symmetric Vector-Set Handler ────────────────────────────────
// §4.D. Walks a `VectorSet`'s test groups, builds a `SymTc` per test, and
// either runs it straight through the DUT (AFT) or drives it through the
// MCT engine, then hands the result to the envelope builder.

use crate::error::AcvpResult;
use crate::sym::cipher::{Direction, TdesMode, TestType};
use crate::sym::dut::CryptoHandler;
use crate::sym::envelope::{build_aft, build_mct};
use crate::sym::mct;
use crate::sym::testcase::{SymTc, SymTcParams};
use crate::sym::wire::{ResponseTestGroup, ResponseVectorSet, VectorSet};
use tracing::{error, info};

fn parse_direction(s: &str) -> AcvpResult<Direction> {
    match s {
        "encrypt" => Ok(Direction::Encrypt),
        "decrypt" => Ok(Direction::Decrypt),
        other => Err(crate::error::AcvpError::InvalidArg(format!(
            "unrecognized direction: {other}"
        ))),
    }
}

fn parse_test_type(s: &str) -> AcvpResult<TestType> {
    match s {
        "AFT" => Ok(TestType::Aft),
        "MCT" => Ok(TestType::Mct),
        "CTR" => Ok(TestType::Ctr),
        other => Err(crate::error::AcvpError::InvalidArg(format!(
            "unrecognized testType: {other}"
        ))),
    }
}

/// Process every test group/test in `vs` against `dut`, returning the
/// response document ready for `transport` to POST back. A single failing
/// test case aborts the whole vector set (§7: the caller is responsible for
/// deciding whether to retry or abandon the session).
pub fn process_vector_set(
    vs: &VectorSet,
    dut: &dyn CryptoHandler,
) -> AcvpResult<ResponseVectorSet> {
    let cipher = TdesMode::from_algorithm(&vs.algorithm)?;
    info!(vs_id = vs.vs_id, algorithm = %vs.algorithm, "processing vector set");

    let mut groups = Vec::with_capacity(vs.test_groups.len());
    for group in &vs.test_groups {
        let direction = parse_direction(&group.direction)?;
        let test_type = parse_test_type(&group.test_type)?;

        let mut tests = Vec::with_capacity(group.tests.len());
        for wire_tc in &group.tests {
            let params = SymTcParams {
                tc_id: wire_tc.tc_id,
                cipher,
                direction,
                test_type,
                key1_hex: &wire_tc.key1,
                key2_hex: &wire_tc.key2,
                key3_hex: wire_tc.key3.as_deref(),
                pt_hex: wire_tc.pt.as_deref(),
                ct_hex: wire_tc.ct.as_deref(),
                iv_hex: wire_tc.iv.as_deref(),
                payload_len_bits: wire_tc.payload_len,
                legacy_key_offset_quirk: false,
            };

            let response = process_one(params, test_type, cipher, dut).map_err(|e| {
                error!(tc_id = wire_tc.tc_id, error = %e, "test case failed");
                e
            })?;
            tests.push(response);
        }

        groups.push(ResponseTestGroup {
            tg_id: group.tg_id,
            tests,
        });
    }

    Ok(ResponseVectorSet {
        vs_id: vs.vs_id,
        test_groups: groups,
    })
}

fn process_one(
    params: SymTcParams<'_>,
    test_type: TestType,
    cipher: TdesMode,
    dut: &dyn CryptoHandler,
) -> AcvpResult<crate::sym::wire::ResponseTestCase> {
    let tc_id = params.tc_id;
    let mut tc = SymTc::init(params)?;

    match test_type {
        TestType::Aft | TestType::Ctr => {
            run_single(&mut tc, dut)?;
            Ok(build_aft(&tc))
        }
        TestType::Mct => {
            let rounds = mct::run(&mut tc, dut)?;
            Ok(build_mct(tc_id, cipher, &rounds))
        }
    }
}

fn run_single(tc: &mut SymTc, dut: &dyn CryptoHandler) -> AcvpResult<()> {
    match dut.compute(tc) {
        crate::sym::dut::DutOutcome::Ok => Ok(()),
        crate::sym::dut::DutOutcome::Fail(detail) => {
            Err(crate::error::AcvpError::CryptoModuleFail {
                tc_id: tc.tc_id,
                detail,
            })
        }
        crate::sym::dut::DutOutcome::KeyWrapOk => {
            tc.test_passed = Some(true);
            Ok(())
        }
        crate::sym::dut::DutOutcome::KeyWrapFail => {
            tc.test_passed = Some(false);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym::dut::DutOutcome;
    use crate::sym::wire::WireTestCase;

    struct EchoDut;
    impl CryptoHandler for EchoDut {
        fn compute(&self, tc: &mut SymTc) -> DutOutcome {
            match tc.direction {
                Direction::Encrypt => {
                    *tc.ct = tc.pt.to_vec();
                    DutOutcome::Ok
                }
                Direction::Decrypt => {
                    *tc.pt = tc.ct.to_vec();
                    DutOutcome::Ok
                }
            }
        }
    }

    fn ecb_vector_set() -> VectorSet {
        VectorSet {
            vs_id: 9,
            algorithm: "ACVP-TDES-ECB".to_string(),
            test_groups: vec![crate::sym::wire::TestGroup {
                tg_id: 1,
                direction: "encrypt".to_string(),
                test_type: "AFT".to_string(),
                tests: vec![WireTestCase {
                    tc_id: 1,
                    key1: "0123456789ABCDEF".to_string(),
                    key2: "23456789ABCDEF01".to_string(),
                    key3: Some("456789ABCDEF0123".to_string()),
                    pt: Some("8899AABBCCDDEEFF".to_string()),
                    ct: None,
                    iv: None,
                    payload_len: None,
                }],
            }],
        }
    }

    #[test]
    fn aft_group_round_trips_through_echo_dut() {
        let vs = ecb_vector_set();
        let response = process_vector_set(&vs, &EchoDut).unwrap();
        assert_eq!(response.vs_id, 9);
        assert_eq!(response.test_groups[0].tests[0].ct.as_deref(), Some("8899aabbccddeeff"));
    }

    #[test]
    fn unknown_algorithm_is_rejected_before_any_group_runs() {
        let mut vs = ecb_vector_set();
        vs.algorithm = "ACVP-NOT-A-THING".to_string();
        assert!(process_vector_set(&vs, &EchoDut).is_err());
    }

    #[test]
    fn bad_direction_string_is_rejected() {
        let mut vs = ecb_vector_set();
        vs.test_groups[0].direction = "sideways".to_string();
        assert!(process_vector_set(&vs, &EchoDut).is_err());
    }
}
