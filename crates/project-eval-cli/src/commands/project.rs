use clap::Args;
use serde_json::Value;

use project_eval_core::{run_all_calculations, ProjectEvalError, ProjectInputs, TABLE_NAMES};

use crate::input;

/// Arguments for a full projection run
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to the input document (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long)]
    pub input: Option<String>,

    /// Only emit the named table (repeatable)
    #[arg(long = "table")]
    pub tables: Vec<String>,

    /// Round every value to this many decimal places
    #[arg(long)]
    pub precision: Option<u32>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ProjectInputs = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data).map_err(ProjectEvalError::from)?
    } else {
        return Err("--input <file> or stdin required for a projection".into());
    };

    let mut output = run_all_calculations(&inputs)?;
    if !args.tables.is_empty() {
        output.result = output.result.select(&args.tables)?;
    }
    if let Some(dp) = args.precision {
        output.result = output.result.rounded(dp);
    }
    Ok(serde_json::to_value(output)?)
}

pub fn run_tables() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(TABLE_NAMES)?)
}

pub fn run_template() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(ProjectInputs::default())?)
}
