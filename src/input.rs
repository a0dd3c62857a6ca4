use crate::models::{Question, QuestionId, Report};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Questions grouped by report name, in file order
pub type QuestionSet = IndexMap<String, Vec<Question>>;

/// Load the grouped questions JSON
pub fn load_questions(path: &Path) -> Result<Vec<Report>> {
    tracing::info!("Loading question set from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read questions file: {}", path.display()))?;

    let set: QuestionSet = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse questions JSON: {}", path.display()))?;

    Ok(set
        .into_iter()
        .map(|(name, questions)| Report { name, questions })
        .collect())
}

/// Load the document every question is asked against
pub fn load_document(path: &Path) -> Result<String> {
    tracing::info!("Loading audit report from {}", path.display());
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    #[serde(rename = "Report #")]
    report: String,
    #[serde(rename = "#", default)]
    number: Option<String>,
    #[serde(rename = "Question")]
    question: String,
    #[serde(rename = "Answer")]
    answer: String,
}

fn question_id(number: Option<String>, row_number: usize) -> QuestionId {
    match number.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(n) => n
            .parse::<i64>()
            .map(QuestionId::Number)
            .unwrap_or(QuestionId::Text(n)),
        None => QuestionId::Number(row_number as i64),
    }
}

/// Group a question CSV (`Report #`, optional `#`, `Question`, `Answer`) by report.
/// Rows without a `#` value are numbered by their 1-based row position.
pub fn import_questions_csv(path: &Path) -> Result<QuestionSet> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open questions CSV: {}", path.display()))?;

    let mut set = QuestionSet::new();
    for (index, row) in reader.deserialize::<QuestionRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to parse row {} of {}", index + 1, path.display()))?;

        set.entry(row.report).or_default().push(Question {
            id: question_id(row.number, index + 1),
            question: row.question,
            expected_answer: row.answer,
        });
    }

    tracing::info!("Imported {} reports from {}", set.len(), path.display());
    Ok(set)
}

/// Write a grouped question set as pretty JSON
pub fn write_questions_json(set: &QuestionSet, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(set).context("Failed to serialize questions to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write questions to: {}", path.display()))?;
    tracing::info!("JSON file created at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_load_questions_preserves_order() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "21-025": [
                    {{"id": 3, "question": "Who?", "answer": "The auditor"}},
                    {{"id": 1, "question": "When?", "answer": "2021"}}
                ],
                "19-004": [
                    {{"id": "A", "question": "What?", "answer": "A finding"}}
                ]
            }}"#
        )
        .unwrap();

        let reports = load_questions(file.path()).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "21-025");
        assert_eq!(reports[1].name, "19-004");
        let ids: Vec<QuestionId> = reports[0].questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids, vec![QuestionId::Number(3), QuestionId::Number(1)]);
        assert_eq!(reports[1].questions[0].expected_answer, "A finding");
    }

    #[test]
    fn test_load_questions_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(load_questions(file.path()).is_err());
    }

    #[test]
    fn test_load_document_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_document(&dir.path().join("missing.md")).unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }

    #[test]
    fn test_import_questions_csv_groups_by_report() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "Report #,#,Question,Answer\n\
             21-025,1,Who performed the audit?,State Auditor\n\
             19-004,,\"Which year, exactly?\",2019\n\
             21-025,2b,How many findings?,three\n"
        )
        .unwrap();

        let set = import_questions_csv(file.path()).unwrap();

        let names: Vec<&String> = set.keys().collect();
        assert_eq!(names, vec!["21-025", "19-004"]);
        assert_eq!(set["21-025"][0].id, QuestionId::Number(1));
        assert_eq!(set["21-025"][1].id, QuestionId::Text("2b".to_string()));
        assert_eq!(set["19-004"][0].id, QuestionId::Number(2));
        assert_eq!(set["19-004"][0].question, "Which year, exactly?");
    }

    #[test]
    fn test_import_questions_csv_without_number_column() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Report #,Question,Answer\nR1,Q1,A1\nR1,Q2,A2\n").unwrap();

        let set = import_questions_csv(file.path()).unwrap();
        let ids: Vec<QuestionId> = set["R1"].iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids, vec![QuestionId::Number(1), QuestionId::Number(2)]);
    }

    #[test]
    fn test_imported_questions_load_back() {
        let mut csv_file = NamedTempFile::new().unwrap();
        write!(csv_file, "Report #,#,Question,Answer\nR1,7,Who?,Me\n").unwrap();
        let dir = tempdir().unwrap();
        let json_path = dir.path().join("questions.json");

        let set = import_questions_csv(csv_file.path()).unwrap();
        write_questions_json(&set, &json_path).unwrap();
        let reports = load_questions(&json_path).unwrap();

        assert_eq!(reports[0].name, "R1");
        assert_eq!(reports[0].questions, set["R1"]);
    }
}
