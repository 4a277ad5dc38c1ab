use crate::error::{GatewayError, GatewayResult};
use crate::planner::Scope;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;

/// Date format of the `date`, `date_1` and `date_2` URL arguments.
pub const URL_DATE_FORMAT: &str = "%m/%d/%Y";

pub type Arguments = HashMap<String, String>;

/// Every logical power-metering operation the gateway serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    PowerMeterList,
    ConsumptionToday {
        meter: i64,
        granularity: u32,
    },
    ConsumptionHistory {
        meter: i64,
        granularity: u32,
        scope: Scope,
        date: NaiveDate,
    },
    HistoryExport {
        meter: i64,
        requested_granularity: u32,
        scope: Scope,
        date: NaiveDate,
    },
    HistoryComparison {
        meter: i64,
        granularity: u32,
        scope: Scope,
        first_date: NaiveDate,
        second_date: NaiveDate,
    },
}

impl Operation {
    pub const NAMES: [&'static str; 5] = [
        "get_power_meter",
        "get_energy_consumption_today",
        "get_energy_consumption_history",
        "get_energy_consumption_history_export",
        "get_energy_consumption_history_comparison",
    ];

    /// Builds an operation from its route name and URL arguments.
    pub fn parse(name: &str, args: &Arguments) -> GatewayResult<Self> {
        if name == "get_power_meter" {
            return Ok(Operation::PowerMeterList);
        }
        if !Self::NAMES.contains(&name) {
            return Err(GatewayError::NotImplemented {
                operation: name.to_string(),
            });
        }

        let meter = parse_number::<i64>(args, "power_meter_id")?;
        let granularity = parse_number::<u32>(args, "interval")?;

        match name {
            "get_energy_consumption_today" => Ok(Operation::ConsumptionToday { meter, granularity }),
            "get_energy_consumption_history" => Ok(Operation::ConsumptionHistory {
                meter,
                granularity,
                date: parse_date(args, "date")?,
                scope: parse_scope(args)?,
            }),
            "get_energy_consumption_history_export" => Ok(Operation::HistoryExport {
                meter,
                requested_granularity: granularity,
                date: parse_date(args, "date")?,
                scope: parse_scope(args)?,
            }),
            _ => Ok(Operation::HistoryComparison {
                meter,
                granularity,
                first_date: parse_date(args, "date_1")?,
                second_date: parse_date(args, "date_2")?,
                scope: parse_scope(args)?,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::PowerMeterList => "get_power_meter",
            Operation::ConsumptionToday { .. } => "get_energy_consumption_today",
            Operation::ConsumptionHistory { .. } => "get_energy_consumption_history",
            Operation::HistoryExport { .. } => "get_energy_consumption_history_export",
            Operation::HistoryComparison { .. } => "get_energy_consumption_history_comparison",
        }
    }
}

fn required<'a>(args: &'a Arguments, name: &str) -> GatewayResult<&'a str> {
    args.get(name)
        .map(|value| value.trim())
        .ok_or_else(|| GatewayError::missing(name))
}

fn parse_number<T: FromStr>(args: &Arguments, name: &str) -> GatewayResult<T> {
    let raw = required(args, name)?;
    raw.parse::<T>()
        .map_err(|_| GatewayError::invalid(name, format!("`{}` is not a valid number", raw)))
}

fn parse_date(args: &Arguments, name: &str) -> GatewayResult<NaiveDate> {
    let raw = required(args, name)?;
    NaiveDate::parse_from_str(raw, URL_DATE_FORMAT)
        .map_err(|_| GatewayError::invalid(name, format!("`{}` is not a MM/DD/YYYY date", raw)))
}

fn parse_scope(args: &Arguments) -> GatewayResult<Scope> {
    Scope::from_code(required(args, "datarange")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_power_meter_list() {
        assert_eq!(
            Operation::parse("get_power_meter", &Arguments::new()).unwrap(),
            Operation::PowerMeterList
        );
    }

    #[test]
    fn test_parse_history() {
        let op = Operation::parse(
            "get_energy_consumption_history",
            &args(&[("power_meter_id", "1"), ("interval", "30"), ("date", "04/25/2015"), ("datarange", "d")]),
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::ConsumptionHistory {
                meter: 1,
                granularity: 30,
                scope: Scope::Day,
                date: NaiveDate::from_ymd_opt(2015, 4, 25).unwrap(),
            }
        );
        assert_eq!(op.name(), "get_energy_consumption_history");
    }

    #[test]
    fn test_parse_comparison() {
        let op = Operation::parse(
            "get_energy_consumption_history_comparison",
            &args(&[
                ("power_meter_id", "0"),
                ("interval", "1"),
                ("date_1", "03/01/2015"),
                ("date_2", "04/01/2015"),
                ("datarange", "m"),
            ]),
        )
        .unwrap();
        assert!(matches!(
            op,
            Operation::HistoryComparison {
                scope: Scope::Month,
                granularity: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_arguments() {
        let err = Operation::parse("get_energy_consumption_today", &args(&[("power_meter_id", "0")])).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::MissingArguments);

        let err = Operation::parse(
            "get_energy_consumption_history",
            &args(&[("power_meter_id", "0"), ("interval", "15"), ("date", "04/25/2015")]),
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::MissingArgument { ref name } if name == "datarange"));
    }

    #[test]
    fn test_wrong_argument_values() {
        let cases = [
            vec![("power_meter_id", "x"), ("interval", "15")],
            vec![("power_meter_id", "0"), ("interval", "-15")],
            vec![("power_meter_id", "0"), ("interval", "15"), ("date", "2015-04-25"), ("datarange", "d")],
            vec![("power_meter_id", "0"), ("interval", "15"), ("date", "04/25/2015"), ("datarange", "w")],
        ];
        let names = [
            "get_energy_consumption_today",
            "get_energy_consumption_today",
            "get_energy_consumption_history",
            "get_energy_consumption_history",
        ];
        for (name, case) in names.iter().zip(cases.iter()) {
            let err = Operation::parse(name, &args(case)).unwrap_err();
            assert_eq!(err.error_code(), ErrorCode::WrongArgumentValue, "{:?}", case);
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = Operation::parse("get_weather", &Arguments::new()).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotImplemented);
    }
}
