//! Template Renderer — substitutes the analysis context into a prompt
//! template body, producing the literal text sent to the model.
//!
//! The whole context is exposed under the variable name `context`, so
//! templates write `{{ context.ticker }}` or `{{ context | tojson }}`.
//! Rendering is pure; malformed template syntax propagates as
//! [`AppError::Render`].

use minijinja::{context, Environment};

use crate::analysis::context::AnalysisContext;
use crate::errors::AppError;

pub fn render_template(template: &str, ctx: &AnalysisContext) -> Result<String, AppError> {
    let env = Environment::new();
    let tmpl = env.template_from_str(template)?;
    let rendered = tmpl.render(context! { context => ctx })?;
    Ok(rendered)
}
