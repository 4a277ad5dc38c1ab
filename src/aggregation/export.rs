use crate::aggregation::energy::{AggregationKeys, EnergyConsumptionAggregator};
use crate::error::{GatewayError, GatewayResult};
use crate::planner::{days_in_month, Scope};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

/// Exports are always sampled at 15 minutes, whatever the caller asked for.
pub const EXPORT_GRANULARITY: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRow {
    pub timestamp: NaiveDateTime,
    pub value: i64,
}

pub struct HistoryExporter<'a> {
    energy: &'a EnergyConsumptionAggregator<'a>,
}

impl<'a> HistoryExporter<'a> {
    pub fn new(energy: &'a EnergyConsumptionAggregator<'a>) -> Self {
        Self { energy }
    }

    /// Flattens one day, or every calendar day of the month, into time-ordered rows.
    pub async fn export(&self, tags: &[String], scope: Scope, date: NaiveDate) -> GatewayResult<Vec<ExportRow>> {
        let days = export_days(scope, date)?;
        let step = Duration::minutes(i64::from(EXPORT_GRANULARITY));
        let mut cursor = days[0].and_time(NaiveTime::MIN);
        let mut rows = Vec::new();

        for day in &days {
            let result = self
                .energy
                .aggregate(
                    tags,
                    Scope::Day,
                    *day,
                    EXPORT_GRANULARITY,
                    AggregationKeys::defaults(Scope::Day),
                )
                .await?;

            for series in result.series() {
                for &value in &series.values {
                    rows.push(ExportRow {
                        timestamp: cursor,
                        value,
                    });
                    cursor += step;
                }
            }
        }

        info!("Exported {} rows over {} day(s) from {}", rows.len(), days.len(), days[0]);
        Ok(rows)
    }
}

fn export_days(scope: Scope, date: NaiveDate) -> GatewayResult<Vec<NaiveDate>> {
    match scope {
        Scope::Day => Ok(vec![date]),
        Scope::Month => {
            let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .ok_or_else(|| GatewayError::invalid("date", format!("no first day for {}", date)))?;
            Ok(first.iter_days().take(days_in_month(date) as usize).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{Credentials, DataReduction, MockDataLog, UpstreamTarget};

    fn target() -> UpstreamTarget {
        UpstreamTarget {
            project: "85".to_string(),
            node: "energy".to_string(),
            reduction: DataReduction::Avg,
        }
    }

    #[tokio::test]
    async fn test_day_export_has_96_rows() {
        let source = MockDataLog::ramp();
        let credentials = Credentials::new("admin", "");
        let target = target();
        let energy = EnergyConsumptionAggregator::new(&source, &credentials, &target);
        let exporter = HistoryExporter::new(&energy);
        let day = NaiveDate::from_ymd_opt(2015, 4, 25).unwrap();

        let rows = exporter.export(&["kw".to_string()], Scope::Day, day).await.unwrap();

        assert_eq!(rows.len(), 96);
        assert_eq!(rows[0].timestamp, day.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(rows[1].timestamp, day.and_hms_opt(0, 15, 0).unwrap());
        assert_eq!(rows[95].timestamp, day.and_hms_opt(23, 45, 0).unwrap());
        // each 6-hour window restarts the ramp
        assert_eq!(rows[23].value, 23);
        assert_eq!(rows[24].value, 0);
        assert!(source.calls().iter().all(|c| c.query.interval == EXPORT_GRANULARITY));
    }

    #[tokio::test]
    async fn test_month_export_uses_real_month_length() {
        let source = MockDataLog::constant("1");
        let credentials = Credentials::new("admin", "");
        let target = target();
        let energy = EnergyConsumptionAggregator::new(&source, &credentials, &target);
        let exporter = HistoryExporter::new(&energy);

        let rows = exporter
            .export(&["kw".to_string()], Scope::Month, NaiveDate::from_ymd_opt(2015, 2, 17).unwrap())
            .await
            .unwrap();

        assert_eq!(rows.len(), 96 * 28);
        assert_eq!(source.call_count(), 4 * 28);
        assert_eq!(
            rows[0].timestamp,
            NaiveDate::from_ymd_opt(2015, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            rows[96].timestamp,
            NaiveDate::from_ymd_opt(2015, 2, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(rows.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[test]
    fn test_export_days() {
        let leap = export_days(Scope::Month, NaiveDate::from_ymd_opt(2016, 2, 10).unwrap()).unwrap();
        assert_eq!(leap.len(), 29);
        assert_eq!(leap[28], NaiveDate::from_ymd_opt(2016, 2, 29).unwrap());

        let single = export_days(Scope::Day, NaiveDate::from_ymd_opt(2016, 2, 10).unwrap()).unwrap();
        assert_eq!(single, vec![NaiveDate::from_ymd_opt(2016, 2, 10).unwrap()]);
    }
}
