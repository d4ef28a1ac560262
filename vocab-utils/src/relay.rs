//! Wire types for the `/api/getAnswer` relay route, shared by the backend and its clients.

use serde::{Deserialize, Serialize};

pub const ANSWER_PATH: &str = "/api/getAnswer";

pub const QUESTION_REQUIRED: &str = "Question is required";
pub const FAILED_TO_RETRIEVE_ANSWER: &str = "Failed to retrieve answer";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AnswerRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AnswerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ErrorResponse {
    pub error: String,
}
