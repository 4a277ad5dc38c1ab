use crate::error::{GatewayError, GatewayResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagEntry {
    Single(String),
    Many(Vec<String>),
}

/// Maps client-facing meter selectors to upstream tag names.
///
/// Index 0 is the aggregate meter; 1..N are the individual meters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterTagDirectory {
    meters: Vec<Vec<String>>,
}

impl MeterTagDirectory {
    pub fn new(meters: Vec<Vec<String>>) -> GatewayResult<Self> {
        if meters.is_empty() {
            return Err(GatewayError::Config {
                message: "meter tag directory is empty".to_string(),
            });
        }
        if let Some(index) = meters
            .iter()
            .position(|tags| tags.is_empty() || tags.iter().any(|tag| tag.trim().is_empty()))
        {
            return Err(GatewayError::Config {
                message: format!("meter {} has no usable tag name", index),
            });
        }
        Ok(Self { meters })
    }

    /// Parses a JSON array whose entries are a tag name or a list of tag names,
    /// e.g. `[["kw_a", "kw_b"], "kw_a", "kw_b"]`.
    pub fn from_json(raw: &str) -> GatewayResult<Self> {
        let entries: Vec<TagEntry> = serde_json::from_str(raw).map_err(|e| GatewayError::Config {
            message: format!("invalid meter tag directory: {}", e),
        })?;
        Self::new(
            entries
                .into_iter()
                .map(|entry| match entry {
                    TagEntry::Single(tag) => vec![tag],
                    TagEntry::Many(tags) => tags,
                })
                .collect(),
        )
    }

    pub fn resolve(&self, selector: i64) -> GatewayResult<&[String]> {
        usize::try_from(selector)
            .ok()
            .and_then(|index| self.meters.get(index))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                GatewayError::invalid(
                    "power_meter_id",
                    format!("{} is out of range 0..{}", selector, self.meters.len()),
                )
            })
    }

    /// Selectable individual meters; the aggregate meter 0 is implied.
    pub fn meter_ids(&self) -> Vec<usize> {
        (1..self.meters.len()).collect()
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }
}

/// A single `kw` tag serving as both the aggregate and the only individual meter.
impl Default for MeterTagDirectory {
    fn default() -> Self {
        Self {
            meters: vec![vec!["kw".to_string()], vec!["kw".to_string()]],
        }
    }
}
