pub mod comparison;
pub mod energy;
pub mod export;
pub mod fold;

pub use comparison::{ComparisonAggregator, ComparisonResult};
pub use energy::{AggregationKeys, AggregationResult, EnergyConsumptionAggregator, LabeledSeries};
pub use export::{ExportRow, HistoryExporter};
