use crate::aggregation::energy::{AggregationKeys, AggregationResult, EnergyConsumptionAggregator};
use crate::error::GatewayResult;
use crate::planner::Scope;
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Keys for the first and second period of a comparison.
pub fn comparison_keys(scope: Scope) -> (AggregationKeys, AggregationKeys) {
    match scope {
        Scope::Day => (
            AggregationKeys::new("energy_consumption_date_1", "sum_date_1"),
            AggregationKeys::new("energy_consumption_date_2", "sum_date_2"),
        ),
        Scope::Month => (
            AggregationKeys::new("energy_consumption_month_1", "sum_month_1"),
            AggregationKeys::new("energy_consumption_month_2", "sum_month_2"),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub first: AggregationResult,
    pub second: AggregationResult,
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        self.first.serialize_values(&mut map)?;
        self.second.serialize_values(&mut map)?;
        self.first.serialize_sum(&mut map)?;
        self.second.serialize_sum(&mut map)?;
        map.end()
    }
}

pub struct ComparisonAggregator<'a> {
    energy: &'a EnergyConsumptionAggregator<'a>,
}

impl<'a> ComparisonAggregator<'a> {
    pub fn new(energy: &'a EnergyConsumptionAggregator<'a>) -> Self {
        Self { energy }
    }

    /// Aggregates two periods independently; their key sets never overlap.
    pub async fn compare(
        &self,
        tags: &[String],
        scope: Scope,
        first_date: NaiveDate,
        second_date: NaiveDate,
        granularity: u32,
    ) -> GatewayResult<ComparisonResult> {
        let (first_keys, second_keys) = comparison_keys(scope);
        let first = self
            .energy
            .aggregate(tags, scope, first_date, granularity, first_keys)
            .await?;
        let second = self
            .energy
            .aggregate(tags, scope, second_date, granularity, second_keys)
            .await?;

        Ok(ComparisonResult { first, second })
    }
}
