use crate::error::EvalError;
use crate::models::{EvaluationRecord, ModelId, ModelSummary, ReportSummary};

/// Reduce a report's records into one statistics row per model.
///
/// The report must have at least one record, and every record must carry an
/// outcome for each of `models`.
pub fn summarize(
    report_name: &str,
    records: &[EvaluationRecord],
    models: &[ModelId],
) -> Result<ReportSummary, EvalError> {
    if records.is_empty() {
        return Err(EvalError::EmptyReport(report_name.to_string()));
    }

    let rows = models
        .iter()
        .map(|model| summarize_model(model, records))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReportSummary {
        report_name: report_name.to_string(),
        question_ids: records.iter().map(|r| r.id.clone()).collect(),
        rows,
    })
}

fn summarize_model(model: &ModelId, records: &[EvaluationRecord]) -> Result<ModelSummary, EvalError> {
    let mut flags = Vec::with_capacity(records.len());
    let mut total_cost = 0.0;
    let mut total_tokens = 0;

    for record in records {
        let outcome = record
            .outcome(model)
            .ok_or_else(|| EvalError::UnknownModel(model.to_string()))?;
        flags.push(outcome.is_correct);
        total_cost += outcome.cost;
        total_tokens += outcome.tokens;
    }

    let count = records.len() as f64;
    let correct = flags.iter().filter(|&&flag| flag).count() as f64;

    Ok(ModelSummary {
        model: model.clone(),
        flags,
        percent_correct: 100.0 * correct / count,
        total_cost,
        total_tokens,
        avg_tokens_per_question: total_tokens as f64 / count,
    })
}
