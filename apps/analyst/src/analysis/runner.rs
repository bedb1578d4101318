//! Run Orchestration — ties catalog, renderer, backend and store together.
//!
//! Flow: build context → load catalog → fail fast if empty → start_run →
//! per prompt in catalog order: render → invoke → resolve → persist →
//! accumulate → aggregate → finish_run.

use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;
use tracing::info;

use crate::analysis::aggregate::{aggregate, RunSummary};
use crate::analysis::context::build_context;
use crate::analysis::outcome::{resolve_outcome, PromptOutcome};
use crate::catalog::load_catalog;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::render::render_template;
use crate::store::RunStore;

/// One prompt's verdict as returned to the caller: prompt identity plus the
/// structured outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PromptReport {
    pub prompt_id: String,
    pub prompt_name: String,
    pub prompt_version: i64,
    #[serde(flatten)]
    pub outcome: PromptOutcome,
}

/// Runs every catalog prompt against one ticker, persisting each verdict and
/// the aggregated summary. Returns the per-prompt reports in catalog order.
///
/// Prompts run strictly sequentially: a prompt's persistence write completes
/// before the next prompt starts. Fails with [`AppError::NoPrompts`] before
/// any store write if the catalog is empty; backend and parse failures
/// degrade to stub outcomes inside the pipeline.
pub async fn run_analysis(
    store: &dyn RunStore,
    llm: &LlmClient,
    prompts_dir: &Path,
    ticker: &str,
) -> Result<(Vec<PromptReport>, RunSummary), AppError> {
    let context = build_context(ticker);
    let context_json =
        serde_json::to_string(&context).context("Failed to serialize analysis context")?;

    let catalog = load_catalog(prompts_dir);
    if catalog.is_empty() {
        return Err(AppError::NoPrompts(prompts_dir.to_path_buf()));
    }
    info!("Loaded {} prompt(s) for {ticker}", catalog.len());

    let run_id = store.start_run(ticker, &context_json).await?;

    let mut reports = Vec::with_capacity(catalog.len());
    let mut outcomes = Vec::with_capacity(catalog.len());
    for prompt in &catalog {
        let rendered = render_template(&prompt.template, &context)?;
        let raw_text = llm.invoke(&rendered).await;
        let outcome = resolve_outcome(raw_text, prompt.schema.as_ref(), &prompt.prompt_id);

        store.save_prompt_result(run_id, prompt, &outcome).await?;
        info!(
            "Prompt {} v{}: score={} rating={}",
            prompt.prompt_id, prompt.version, outcome.score, outcome.rating
        );

        reports.push(PromptReport {
            prompt_id: prompt.prompt_id.clone(),
            prompt_name: prompt.name.clone(),
            prompt_version: prompt.version,
            outcome: outcome.clone(),
        });
        outcomes.push(outcome);
    }

    let summary = aggregate(&outcomes);
    store.finish_run(run_id, &summary).await?;
    info!(
        "Run {run_id} finished: average_score={:.1} final_rating={}",
        summary.average_score, summary.final_rating
    );

    Ok((reports, summary))
}
