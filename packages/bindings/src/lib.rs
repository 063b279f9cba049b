use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use project_eval_core::cash_flow::{self, SeriesInput};
use project_eval_core::inputs::ProjectInputs;
use project_eval_core::time_value;
use project_eval_core::ProjectEvalError;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON argument, reporting failures as a serialization error.
fn parse_input<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json)
        .map_err(ProjectEvalError::from)
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn run_projection(input_json: String) -> NapiResult<String> {
    let input: ProjectInputs = parse_input(&input_json)?;
    let output = project_eval_core::run_all_calculations(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn table_names() -> NapiResult<String> {
    serde_json::to_string(&project_eval_core::TABLE_NAMES).map_err(to_napi_error)
}

#[napi]
pub fn default_inputs() -> NapiResult<String> {
    serde_json::to_string(&ProjectInputs::default()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NpvInput {
    rate: Decimal,
    cash_flows: Vec<Decimal>,
}

#[derive(Deserialize)]
struct IrrInput {
    cash_flows: Vec<Decimal>,
    #[serde(default)]
    guess: Option<Decimal>,
}

#[derive(Deserialize)]
struct PaybackInput {
    cash_flows: Vec<Decimal>,
}

#[napi]
pub fn series_metrics(input_json: String) -> NapiResult<String> {
    let input: SeriesInput = parse_input(&input_json)?;
    let output = cash_flow::analyze_series(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    let input: NpvInput = parse_input(&input_json)?;
    let value = time_value::npv(input.rate, &input.cash_flows).map_err(to_napi_error)?;
    serde_json::to_string(&value).map_err(to_napi_error)
}

#[napi]
pub fn irr(input_json: String) -> NapiResult<String> {
    let input: IrrInput = parse_input(&input_json)?;
    let guess = input.guess.unwrap_or(Decimal::new(1, 1));
    let value = time_value::irr(&input.cash_flows, guess).map_err(to_napi_error)?;
    serde_json::to_string(&value).map_err(to_napi_error)
}

#[napi]
pub fn payback(input_json: String) -> NapiResult<String> {
    let input: PaybackInput = parse_input(&input_json)?;
    let cumulative = time_value::cumulative(&input.cash_flows);
    let period = time_value::payback_period(&cumulative).period();
    serde_json::to_string(&period).map_err(to_napi_error)
}
