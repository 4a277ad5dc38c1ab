pub mod aggregation;
pub mod directory;
pub mod error;
pub mod export;
pub mod gateway;
pub mod http;
pub mod operation;
pub mod planner;
pub mod upstream;

pub use gateway::{Gateway, OperationOutput};
pub use operation::Operation;

use directory::MeterTagDirectory;
use error::{GatewayError, GatewayResult};
use std::time::Duration;
use upstream::{DataReduction, UpstreamTarget};

const SECONDS_PER_HOUR: u64 = 3600;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_address: String,
    // Host and port written into export download links
    pub public_host: String,
    pub public_port: u16,
    // Upstream WebAccess configuration
    pub upstream_root_url: String,
    pub project_name: String,
    pub node_name: String,
    pub data_reduction: DataReduction,
    pub upstream_timeout_seconds: u64,
    pub meter_tags: MeterTagDirectory,
    pub export_dir: String,
    pub export_sweep_interval_hours: u64,
    pub export_lifetime_hours: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
            public_host: "localhost".to_string(),
            public_port: 8888,
            upstream_root_url: "http://localhost/WaWebService/".to_string(),
            project_name: "85".to_string(),
            node_name: "energy".to_string(),
            data_reduction: DataReduction::Avg,
            upstream_timeout_seconds: 30,
            meter_tags: MeterTagDirectory::default(),
            export_dir: "static/exportfiles".to_string(),
            export_sweep_interval_hours: 1,
            export_lifetime_hours: 1,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> GatewayResult<Self> {
        let mut config = Self::default();

        if let Ok(bind_addr) = std::env::var("BIND_ADDRESS") {
            config.bind_address = bind_addr;
        }

        if let Ok(host) = std::env::var("PUBLIC_HOST") {
            config.public_host = host;
        }

        if let Ok(port_str) = std::env::var("PUBLIC_PORT") {
            config.public_port = port_str.parse().unwrap_or(config.public_port);
        }

        if let Ok(root_url) = std::env::var("WA_ROOT_URL") {
            config.upstream_root_url = root_url;
        }

        if let Ok(project) = std::env::var("PROJECT_NAME") {
            config.project_name = project;
        }

        if let Ok(node) = std::env::var("NODE_NAME") {
            config.node_name = node;
        }

        if let Ok(data_type) = std::env::var("DATA_TYPE") {
            config.data_reduction = DataReduction::from_code(&data_type)?;
        }

        if let Ok(timeout_str) = std::env::var("UPSTREAM_TIMEOUT_SECONDS") {
            config.upstream_timeout_seconds = timeout_str.parse().unwrap_or(config.upstream_timeout_seconds);
        }

        if let Ok(tags) = std::env::var("METER_TAGS") {
            config.meter_tags = MeterTagDirectory::from_json(&tags)?;
        }

        if let Ok(export_dir) = std::env::var("FILE_EXPORT_PATH") {
            config.export_dir = export_dir;
        }

        if let Ok(hours_str) = std::env::var("FILE_DELETE_INTERVAL_HOURS") {
            config.export_sweep_interval_hours = hours_str.parse().unwrap_or(config.export_sweep_interval_hours);
        }

        if let Ok(hours_str) = std::env::var("FILE_EXPORT_LIFETIME_HOURS") {
            config.export_lifetime_hours = hours_str.parse().unwrap_or(config.export_lifetime_hours);
        }

        config.export_sweep_interval()?;
        config.export_lifetime()?;

        Ok(config)
    }

    /// How often expired exports are deleted; zero is rejected.
    pub fn export_sweep_interval(&self) -> GatewayResult<Duration> {
        if self.export_sweep_interval_hours == 0 {
            return Err(GatewayError::Config {
                message: "FILE_DELETE_INTERVAL_HOURS must be at least 1".to_string(),
            });
        }
        hours("FILE_DELETE_INTERVAL_HOURS", self.export_sweep_interval_hours)
    }

    pub fn export_lifetime(&self) -> GatewayResult<Duration> {
        hours("FILE_EXPORT_LIFETIME_HOURS", self.export_lifetime_hours)
    }

    pub fn upstream_target(&self) -> UpstreamTarget {
        UpstreamTarget {
            project: self.project_name.clone(),
            node: self.node_name.clone(),
            reduction: self.data_reduction,
        }
    }
}

fn hours(name: &str, hours: u64) -> GatewayResult<Duration> {
    hours
        .checked_mul(SECONDS_PER_HOUR)
        .map(Duration::from_secs)
        .ok_or_else(|| GatewayError::Config {
            message: format!("{} is too large: {}", name, hours),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.public_port, 8888);
        assert_eq!(config.meter_tags, MeterTagDirectory::from_json(r#"[["kw"],"kw"]"#).unwrap());
        assert_eq!(config.upstream_target().reduction.code(), "3");
        assert_eq!(config.export_sweep_interval().unwrap(), Duration::from_secs(3600));
        assert_eq!(config.export_lifetime().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_export_durations_are_validated() {
        let zero_interval = GatewayConfig {
            export_sweep_interval_hours: 0,
            ..GatewayConfig::default()
        };
        assert!(matches!(zero_interval.export_sweep_interval(), Err(GatewayError::Config { .. })));

        let huge_lifetime = GatewayConfig {
            export_lifetime_hours: u64::MAX,
            ..GatewayConfig::default()
        };
        assert!(matches!(huge_lifetime.export_lifetime(), Err(GatewayError::Config { .. })));

        let zero_lifetime = GatewayConfig {
            export_lifetime_hours: 0,
            ..GatewayConfig::default()
        };
        assert_eq!(zero_lifetime.export_lifetime().unwrap(), Duration::ZERO);
    }
}
