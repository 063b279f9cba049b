use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use project_eval_core::cash_flow::{self, SeriesInput};
use project_eval_core::ProjectEvalError;

use crate::input;

/// Arguments for standalone series metrics
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to a JSON/YAML document with `cash_flows` and `discount_rate`
    #[arg(long)]
    pub input: Option<String>,

    /// Net cash flow per period (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate as a decimal
    #[arg(long, default_value = "0.06")]
    pub rate: Decimal,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series: SeriesInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(cash_flows) = args.cash_flows {
        SeriesInput {
            cash_flows,
            discount_rate: args.rate,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data).map_err(ProjectEvalError::from)?
    } else {
        return Err("--cash-flows is required (or provide --input)".into());
    };

    let result = cash_flow::analyze_series(&series)?;
    Ok(serde_json::to_value(result)?)
}
