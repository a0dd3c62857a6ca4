use crate::config::{check_concurrency, check_model_names};
use crate::error::EvalError;
use crate::models::{
    EvaluationRecord, ModelId, ModelOutcome, ModelResponse, Question, Report, RunResults,
};
use crate::providers::ModelAdapter;
use crate::scoring::is_correct;
use futures::StreamExt;
use futures::future::join_all;
use futures::stream;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Drives every configured adapter over every question of every report
pub struct Runner {
    adapters: Vec<Arc<dyn ModelAdapter>>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl Runner {
    /// Create a runner allowing at most `concurrency` backend calls in flight
    pub fn new(adapters: Vec<Arc<dyn ModelAdapter>>, concurrency: usize) -> Result<Self, EvalError> {
        check_concurrency(concurrency)?;
        check_model_names(adapters.iter().map(|a| a.model().as_str()))?;

        Ok(Self {
            adapters,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Models in registration order
    pub fn models(&self) -> Vec<ModelId> {
        self.adapters.iter().map(|a| a.model().clone()).collect()
    }

    /// Evaluate every report, keeping report order
    pub async fn run_reports(&self, document: &str, reports: &[Report]) -> RunResults {
        let total_reports = reports.len();
        let mut results = IndexMap::new();

        for (report_index, report) in reports.iter().enumerate() {
            tracing::info!(
                "Processing report {} ({}/{})",
                report.name,
                report_index + 1,
                total_reports
            );
            let records = self.evaluate_report(document, report).await;
            results.insert(report.name.clone(), records);
        }

        results
    }

    /// Evaluate one report. Records come back in question order.
    pub async fn evaluate_report(&self, document: &str, report: &Report) -> Vec<EvaluationRecord> {
        let total_questions = report.questions.len();

        stream::iter(report.questions.iter().enumerate())
            .map(|(index, question)| {
                tracing::debug!(
                    "Processing question {}/{} of report {}",
                    index + 1,
                    total_questions,
                    report.name
                );
                self.evaluate_question(document, question)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Ask every adapter one question and merge the scored answers
    pub async fn evaluate_question(&self, document: &str, question: &Question) -> EvaluationRecord {
        let calls = self.adapters.iter().map(|adapter| async move {
            // semaphore is owned by the runner and never closed
            let _permit = self.semaphore.acquire().await.ok();
            adapter.ask(document, &question.question).await
        });

        let responses = join_all(calls).await;
        merge_record(question, responses)
    }
}

/// Score each response against the expected answer and merge them into one record
pub fn merge_record(question: &Question, responses: Vec<ModelResponse>) -> EvaluationRecord {
    let models = responses
        .into_iter()
        .map(|response| {
            let correct = is_correct(&question.expected_answer, &response.text);
            tracing::debug!(
                model = %response.model,
                question = %question.id,
                failed = response.is_error(),
                correct,
                "Scored response"
            );
            (response.model.clone(), ModelOutcome::from_response(response, correct))
        })
        .collect();

    EvaluationRecord {
        id: question.id.clone(),
        question: question.question.clone(),
        expected_answer: question.expected_answer.clone(),
        models,
    }
}
