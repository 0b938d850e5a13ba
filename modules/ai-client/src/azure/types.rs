use serde::{Deserialize, Serialize};

// --- Translator ---

#[derive(Debug, Serialize)]
pub(crate) struct TranslateInput<'a> {
    #[serde(rename = "Text")]
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateResult {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Translation {
    pub text: String,
}

// --- Language (analyze-text jobs) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeJobRequest {
    pub display_name: String,
    pub analysis_input: AnalysisInput,
    pub tasks: Vec<AnalyzeTask>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalysisInput {
    pub documents: Vec<InputDocument>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InputDocument {
    pub id: String,
    pub language: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeTask {
    pub kind: String,
    pub task_name: String,
    pub parameters: SummaryParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryParameters {
    pub sentence_count: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeJobState {
    pub status: String,
    #[serde(default)]
    pub tasks: Option<JobTasks>,
    #[serde(default)]
    pub errors: Vec<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobTasks {
    #[serde(default)]
    pub items: Vec<TaskItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskItem {
    pub results: Option<TaskResults>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResults {
    #[serde(default)]
    pub documents: Vec<SummaryDocument>,
    #[serde(default)]
    pub errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryDocument {
    #[serde(default)]
    pub sentences: Vec<SummarySentence>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummarySentence {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentError {
    pub error: ErrorBody,
}

// --- Shared error envelope ---

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

/// Translator reports numeric codes, Language reports string codes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorCode {
    Number(i64),
    Text(String),
}

impl ErrorCode {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ErrorCode::Number(n) => Some(*n),
            ErrorCode::Text(s) => s.parse().ok(),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{n}"),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}
