use crate::aggregation::{
    AggregationKeys, AggregationResult, ComparisonAggregator, ComparisonResult, EnergyConsumptionAggregator,
    HistoryExporter,
};
use crate::directory::MeterTagDirectory;
use crate::error::GatewayResult;
use crate::export::CsvExportStore;
use crate::operation::Operation;
use crate::planner::Scope;
use crate::upstream::{Credentials, DataLogSource, UpstreamTarget, WebAccessClient};
use crate::GatewayConfig;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// JSON body of a successful operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OperationOutput {
    PowerMeters { power_meter_list: Vec<usize> },
    Consumption(AggregationResult),
    Comparison(ComparisonResult),
    Export { csv_file_link: String },
}

/// Executes power-metering operations against a data-log source.
pub struct Gateway {
    source: Arc<dyn DataLogSource>,
    directory: MeterTagDirectory,
    target: UpstreamTarget,
    exports: CsvExportStore,
    today: Clock,
}

impl Gateway {
    pub fn new(
        source: Arc<dyn DataLogSource>,
        directory: MeterTagDirectory,
        target: UpstreamTarget,
        exports: CsvExportStore,
    ) -> Self {
        Self {
            source,
            directory,
            target,
            exports,
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Builds a gateway talking to the configured WebAccess server.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = WebAccessClient::new(
            config.upstream_root_url.clone(),
            Duration::from_secs(config.upstream_timeout_seconds),
        )?;
        let exports = CsvExportStore::new(&config.export_dir, &config.public_host, config.public_port);

        Ok(Self::new(
            Arc::new(client),
            config.meter_tags.clone(),
            config.upstream_target(),
            exports,
        ))
    }

    /// Replaces the local-date clock used by the "today" operation.
    pub fn with_clock<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Box::new(today);
        self
    }

    pub fn directory(&self) -> &MeterTagDirectory {
        &self.directory
    }

    pub fn exports(&self) -> &CsvExportStore {
        &self.exports
    }

    pub async fn execute(&self, operation: &Operation, credentials: &Credentials) -> GatewayResult<OperationOutput> {
        info!("Executing {} for user {}", operation.name(), credentials.user);
        let energy = EnergyConsumptionAggregator::new(self.source.as_ref(), credentials, &self.target);

        let output = match *operation {
            Operation::PowerMeterList => OperationOutput::PowerMeters {
                power_meter_list: self.directory.meter_ids(),
            },
            Operation::ConsumptionToday { meter, granularity } => {
                let tags = self.directory.resolve(meter)?;
                let keys = AggregationKeys::new("energy_consumption_today", "sum");
                let result = energy
                    .aggregate(tags, Scope::Day, (self.today)(), granularity, keys)
                    .await?;
                OperationOutput::Consumption(result)
            }
            Operation::ConsumptionHistory {
                meter,
                granularity,
                scope,
                date,
            } => {
                let tags = self.directory.resolve(meter)?;
                let result = energy
                    .aggregate(tags, scope, date, granularity, AggregationKeys::defaults(scope))
                    .await?;
                OperationOutput::Consumption(result)
            }
            Operation::HistoryExport {
                meter,
                requested_granularity,
                scope,
                date,
            } => {
                let tags = self.directory.resolve(meter)?;
                let rows = HistoryExporter::new(&energy).export(tags, scope, date).await?;
                let file_name = self.exports.write(&rows).await.map_err(|e| {
                    warn!("Writing export for {} {} failed: {}", scope, date, e);
                    e
                })?;
                info!(
                    "Export {} written ({} rows, requested interval {} ignored)",
                    file_name,
                    rows.len(),
                    requested_granularity
                );
                OperationOutput::Export {
                    csv_file_link: self.exports.link(&file_name),
                }
            }
            Operation::HistoryComparison {
                meter,
                granularity,
                scope,
                first_date,
                second_date,
            } => {
                let tags = self.directory.resolve(meter)?;
                let result = ComparisonAggregator::new(&energy)
                    .compare(tags, scope, first_date, second_date, granularity)
                    .await?;
                OperationOutput::Comparison(result)
            }
        };

        Ok(output)
    }
}
