use serde_json::{Map, Value};

/// Opaque per-run context payload handed to every prompt template.
pub type AnalysisContext = Map<String, Value>;

/// Builds the analysis context for a ticker.
///
/// Currently only the ticker symbol. Enrichment sources (price history,
/// fundamentals, news) plug in here and flow to the templates untouched.
pub fn build_context(ticker: &str) -> AnalysisContext {
    let mut context = Map::new();
    context.insert("ticker".to_string(), Value::String(ticker.to_string()));
    context
}
