use crate::aggregation::fold::fold;
use crate::error::{GatewayError, GatewayResult};
use crate::planner::{plan, Scope};
use crate::upstream::{Credentials, DataLogQuery, DataLogSource, UpstreamTarget};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

/// JSON keys an aggregation is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationKeys {
    pub values_key: String,
    pub sum_key: String,
}

impl AggregationKeys {
    pub fn new(values_key: impl Into<String>, sum_key: impl Into<String>) -> Self {
        Self {
            values_key: values_key.into(),
            sum_key: sum_key.into(),
        }
    }

    pub fn defaults(scope: Scope) -> Self {
        match scope {
            Scope::Day => Self::new("energy_consumption_day", "sum"),
            Scope::Month => Self::new("energy_consumption_month", "sum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSeries {
    pub label: String,
    pub values: Vec<i64>,
}

impl Serialize for LabeledSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.values)?;
        map.end()
    }
}

/// One period's consumption: `{values_key: [{label: [..]}, ..], sum_key: total}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    keys: AggregationKeys,
    series: Vec<LabeledSeries>,
    sum: i64,
}

impl AggregationResult {
    pub fn keys(&self) -> &AggregationKeys {
        &self.keys
    }

    pub fn series(&self) -> &[LabeledSeries] {
        &self.series
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub(crate) fn serialize_values<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry(&self.keys.values_key, &self.series)
    }

    pub(crate) fn serialize_sum<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry(&self.keys.sum_key, &self.sum)
    }
}

impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        self.serialize_values(&mut map)?;
        self.serialize_sum(&mut map)?;
        map.end()
    }
}

pub struct EnergyConsumptionAggregator<'a> {
    source: &'a dyn DataLogSource,
    credentials: &'a Credentials,
    target: &'a UpstreamTarget,
}

impl<'a> EnergyConsumptionAggregator<'a> {
    pub fn new(source: &'a dyn DataLogSource, credentials: &'a Credentials, target: &'a UpstreamTarget) -> Self {
        Self {
            source,
            credentials,
            target,
        }
    }

    /// Fetches and folds every planned window of the period, in time order.
    ///
    /// The first upstream failure aborts the whole aggregation.
    pub async fn aggregate(
        &self,
        tags: &[String],
        scope: Scope,
        date: NaiveDate,
        granularity: u32,
        keys: AggregationKeys,
    ) -> GatewayResult<AggregationResult> {
        if tags.is_empty() {
            return Err(GatewayError::invalid("power_meter_id", "meter has no tags"));
        }

        let windows = plan(scope, date, granularity)?;
        let mut series = Vec::with_capacity(windows.len());
        let mut total = 0i64;

        for planned in windows {
            let window = &planned.window;
            let query = DataLogQuery {
                project: self.target.project.clone(),
                node: self.target.node.clone(),
                tags: tags.to_vec(),
                start: window.start,
                interval_type: window.unit.interval_type(),
                interval: window.step,
                records: window.bucket_count,
                reduction: self.target.reduction,
            };

            let samples = self.source.fetch(self.credentials, &query).await.map_err(|e| {
                warn!("Data log query for window {} failed: {}", planned.label, e);
                e
            })?;

            let folded = fold(&samples, window.bucket_count as usize);
            debug!(
                "Window {} starting {}: {} tags, sum {}",
                planned.label,
                window.start,
                samples.len(),
                folded.sum
            );

            total = total.saturating_add(folded.sum);
            series.push(LabeledSeries {
                label: planned.label,
                values: folded.series,
            });
        }

        Ok(AggregationResult {
            keys,
            series,
            sum: total,
        })
    }
}
