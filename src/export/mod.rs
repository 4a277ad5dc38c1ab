pub mod sweeper;

pub use sweeper::ExportSweeper;

use crate::aggregation::ExportRow;
use crate::error::{GatewayError, GatewayResult};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// URL path the export directory is served under.
pub const EXPORT_ROUTE: &str = "/static/exportfiles";

pub const CSV_HEADER: [&str; 3] = ["date", "time", "electricity consumption"];

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M";

/// Writes export rows as CSV files and builds the public download links.
#[derive(Debug, Clone)]
pub struct CsvExportStore {
    dir: PathBuf,
    public_base: String,
}

impl CsvExportStore {
    pub fn new(dir: impl Into<PathBuf>, public_host: &str, public_port: u16) -> Self {
        Self {
            dir: dir.into(),
            public_base: format!("http://{}:{}", public_host, public_port),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `rows` to a fresh `<uuid>.csv` and returns the file name.
    pub async fn write(&self, rows: &[ExportRow]) -> GatewayResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for row in rows {
            writer.write_record([
                row.timestamp.format(DATE_FORMAT).to_string(),
                row.timestamp.format(TIME_FORMAT).to_string(),
                row.value.to_string(),
            ])?;
        }
        let contents = writer.into_inner().map_err(|e| GatewayError::Io(e.into_error()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.csv", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&file_name), contents).await?;

        info!("Wrote {} export rows to {}", rows.len(), self.dir.join(&file_name).display());
        Ok(file_name)
    }

    pub fn link(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.public_base, EXPORT_ROUTE, file_name)
    }
}
