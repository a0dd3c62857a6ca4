use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a configured backend model (e.g. "gpt-4o-mini")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Question identifier as it appears in the input, either a number or free text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{}", n),
            QuestionId::Text(s) => f.write_str(s),
        }
    }
}

/// A question and the answer the document supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    #[serde(rename = "answer")]
    pub expected_answer: String,
}

/// A named group of questions evaluated and summarized together
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: String,
    pub questions: Vec<Question>,
}

/// Uniform answer produced by every backend adapter.
///
/// An error response always carries empty text, zero tokens and zero cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub total_tokens: u64,
    pub cost: f64,
    pub model: ModelId,
    pub error: Option<String>,
}

impl ModelResponse {
    pub fn success(model: ModelId, text: String, total_tokens: u64, cost: f64) -> Self {
        Self {
            text,
            total_tokens,
            cost,
            model,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One model's scored answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub response: String,
    pub is_correct: bool,
    pub cost: f64,
    pub tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelOutcome {
    pub fn from_response(response: ModelResponse, is_correct: bool) -> Self {
        Self {
            response: response.text,
            is_correct,
            cost: response.cost,
            tokens: response.total_tokens,
            error: response.error,
        }
    }
}

/// Per-question result merging the question with every model's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: QuestionId,
    pub question: String,
    pub expected_answer: String,
    /// Outcomes in model configuration order
    pub models: IndexMap<ModelId, ModelOutcome>,
}

impl EvaluationRecord {
    pub fn outcome(&self, model: &ModelId) -> Option<&ModelOutcome> {
        self.models.get(model)
    }
}

/// Evaluation records keyed by report name, in input order
pub type RunResults = IndexMap<String, Vec<EvaluationRecord>>;

/// Aggregated statistics for one model over one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: ModelId,
    /// Correctness flags in question order
    pub flags: Vec<bool>,
    pub percent_correct: f64,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub avg_tokens_per_question: f64,
}

/// Per-model statistics table for one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_name: String,
    pub question_ids: Vec<QuestionId>,
    pub rows: Vec<ModelSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_deserializes_numeric_and_text_ids() {
        let questions: Vec<Question> = serde_json::from_str(
            r#"[
                {"id": 1, "question": "Who?", "answer": "Auditor"},
                {"id": "2a", "question": "When?", "answer": "2021"}
            ]"#,
        )
        .unwrap();

        assert_eq!(questions[0].id, QuestionId::Number(1));
        assert_eq!(questions[1].id, QuestionId::Text("2a".to_string()));
        assert_eq!(questions[0].expected_answer, "Auditor");
        assert_eq!(questions[1].id.to_string(), "2a");
    }

    #[test]
    fn test_outcome_from_error_response() {
        let response = ModelResponse {
            text: String::new(),
            total_tokens: 0,
            cost: 0.0,
            model: ModelId::new("m"),
            error: Some("m error: boom".to_string()),
        };
        assert!(response.is_error());

        let outcome = ModelOutcome::from_response(response, false);
        assert_eq!(outcome.response, "");
        assert_eq!(outcome.tokens, 0);
        assert_eq!(outcome.error.as_deref(), Some("m error: boom"));
    }

    #[test]
    fn test_record_serializes_models_in_insertion_order() {
        let mut models = IndexMap::new();
        for name in ["zeta", "alpha"] {
            models.insert(
                ModelId::new(name),
                ModelOutcome {
                    response: "ok".to_string(),
                    is_correct: true,
                    cost: 0.1,
                    tokens: 10,
                    error: None,
                },
            );
        }
        let record = EvaluationRecord {
            id: QuestionId::Number(7),
            question: "Q".to_string(),
            expected_answer: "A".to_string(),
            models,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
        assert!(!json.contains("\"error\""));
        assert!(record.outcome(&ModelId::new("alpha")).is_some());
    }
}
