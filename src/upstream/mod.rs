pub mod mock;
pub mod webaccess;

pub use mock::MockDataLog;
pub use webaccess::WebAccessClient;

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format expected by the WebAccess data log.
pub const DATALOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Basic-auth credentials forwarded to the upstream service on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalType {
    #[serde(rename = "S")]
    Seconds,
    #[serde(rename = "M")]
    Minutes,
    #[serde(rename = "H")]
    Hours,
    #[serde(rename = "D")]
    Days,
}

impl IntervalType {
    pub fn code(self) -> &'static str {
        match self {
            IntervalType::Seconds => "S",
            IntervalType::Minutes => "M",
            IntervalType::Hours => "H",
            IntervalType::Days => "D",
        }
    }
}

/// How the upstream reduces raw samples inside one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataReduction {
    Last,
    Min,
    Max,
    Avg,
}

impl DataReduction {
    pub fn code(self) -> &'static str {
        match self {
            DataReduction::Last => "0",
            DataReduction::Min => "1",
            DataReduction::Max => "2",
            DataReduction::Avg => "3",
        }
    }

    pub fn from_code(code: &str) -> GatewayResult<Self> {
        match code.trim() {
            "0" => Ok(DataReduction::Last),
            "1" => Ok(DataReduction::Min),
            "2" => Ok(DataReduction::Max),
            "3" => Ok(DataReduction::Avg),
            other => Err(GatewayError::Config {
                message: format!("unknown data reduction code `{}`", other),
            }),
        }
    }
}

/// Where data-log queries go on the upstream side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub project: String,
    pub node: String,
    pub reduction: DataReduction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLogQuery {
    pub project: String,
    pub node: String,
    pub tags: Vec<String>,
    pub start: NaiveDateTime,
    pub interval_type: IntervalType,
    pub interval: u32,
    pub records: u32,
    pub reduction: DataReduction,
}

impl DataLogQuery {
    pub fn start_time_string(&self) -> String {
        self.start.format(DATALOG_TIME_FORMAT).to_string()
    }
}

/// Raw samples of one tag, as strings; the upstream uses sentinels such as `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSamples {
    pub name: String,
    pub values: Vec<String>,
}

impl TagSamples {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[async_trait]
pub trait DataLogSource: Send + Sync {
    /// Runs exactly one upstream data-log query.
    async fn fetch(&self, credentials: &Credentials, query: &DataLogQuery) -> GatewayResult<Vec<TagSamples>>;
}
