pub mod balance_sheet;
pub mod cash_flow;
pub mod cost;
pub mod depreciation;
pub mod disposal;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod investment;
pub mod land_tax;
pub mod period;
pub mod profit;
pub mod table;
pub mod time_value;
pub mod types;

pub use engine::{project, run_all_calculations, Projection, TABLE_NAMES};
pub use error::ProjectEvalError;
pub use inputs::ProjectInputs;
pub use period::{PeriodSeries, TimeHorizon};
pub use table::{Cell, ResultSet, ResultTable};
pub use types::*;

/// Standard result type for all project evaluation computations
pub type ProjectEvalResult<T> = Result<T, ProjectEvalError>;
