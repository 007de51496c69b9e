// ── ACVP Core: Symmetric Vector-Set Wire Schema ────────────────────────────
// §6 response/request JSON shapes for TDES vector sets, independent of the
// in-memory `SymTc` the handler builds from them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct VectorSet {
    #[serde(rename = "vsId")]
    pub vs_id: u64,
    pub algorithm: String,
    #[serde(rename = "testGroups")]
    pub test_groups: Vec<TestGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestGroup {
    #[serde(rename = "tgId")]
    pub tg_id: u64,
    pub direction: String,
    #[serde(rename = "testType")]
    pub test_type: String,
    pub tests: Vec<WireTestCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTestCase {
    #[serde(rename = "tcId")]
    pub tc_id: u64,
    pub key1: String,
    pub key2: String,
    pub key3: Option<String>,
    pub pt: Option<String>,
    pub ct: Option<String>,
    pub iv: Option<String>,
    #[serde(rename = "payloadLen")]
    pub payload_len: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseVectorSet {
    #[serde(rename = "vsId")]
    pub vs_id: u64,
    #[serde(rename = "testGroups")]
    pub test_groups: Vec<ResponseTestGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseTestGroup {
    #[serde(rename = "tgId")]
    pub tg_id: u64,
    pub tests: Vec<ResponseTestCase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseTestCase {
    #[serde(rename = "tcId")]
    pub tc_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "testPassed")]
    pub test_passed: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default, rename = "resultsArray")]
    pub results_array: Vec<McResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McResult {
    pub key1: String,
    pub key2: String,
    pub key3: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_aft_group() {
        let json = r#"{
            "vsId": 1,
            "algorithm": "ACVP-TDES-ECB",
            "testGroups": [{
                "tgId": 1,
                "direction": "encrypt",
                "testType": "AFT",
                "tests": [{"tcId": 1, "key1": "0123456789abcdef", "key2": "23456789abcdef01", "key3": "456789abcdef0123", "pt": "8899aabbccddeeff"}]
            }]
        }"#;
        let vs: VectorSet = serde_json::from_str(json).unwrap();
        assert_eq!(vs.vs_id, 1);
        assert_eq!(vs.test_groups[0].tests[0].tc_id, 1);
    }

    #[test]
    fn response_case_omits_absent_fields() {
        let case = ResponseTestCase {
            tc_id: 7,
            pt: None,
            ct: Some("aabb".to_string()),
            test_passed: None,
            results_array: Vec::new(),
        };
        let json = serde_json::to_string(&case).unwrap();
        assert!(!json.contains("\"pt\""));
        assert!(!json.contains("resultsArray"));
        assert!(json.contains("\"ct\":\"aabb\""));
    }
}
