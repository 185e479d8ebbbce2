use std::sync::Mutex;

use anyhow::{Result, ensure};
use glimmer_core::{Provider, Provision, ResultItem};

/// Evaluates `=`-prefixed queries as arithmetic expressions.
///
/// The previous successful result is available as `ans`, so `=2+2` followed
/// by `=ans*10` gives 40. Evaluation errors become a display-only error item
/// instead of a fault. This is a convenience, not a security boundary: the
/// expression grammar only reaches the evaluator's builtin math functions.
pub struct CalculatorProvider {
    ans: Mutex<Option<f64>>,
}

impl CalculatorProvider {
    pub fn new() -> Self {
        Self {
            ans: Mutex::new(None),
        }
    }

    fn evaluate(&self, expression: &str) -> Result<f64> {
        let parsed: meval::Expr = expression.parse()?;

        let mut context = meval::Context::new();
        let mut ans = self.ans.lock().expect("calculator state poisoned");
        if let Some(previous) = *ans {
            context.var("ans", previous);
        }

        let value = parsed.eval_with_context(&context)?;
        ensure!(value.is_finite(), "not a finite result");
        *ans = Some(value);
        Ok(value)
    }
}

impl Default for CalculatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CalculatorProvider {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let Some(expression) = query.strip_prefix('=') else {
            return Ok(Provision::pass());
        };

        let expression = expression.trim_start_matches('=').trim();
        let item = match self.evaluate(expression) {
            Ok(value) => ResultItem::copyable_text(format_value(value)),
            Err(err) => ResultItem::text(err.to_string()),
        };
        Ok(Provision::stop(vec![item]))
    }
}

/// Integral results print without a fractional part.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
