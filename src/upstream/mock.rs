use crate::error::GatewayResult;
use crate::upstream::{Credentials, DataLogQuery, DataLogSource, TagSamples};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&DataLogQuery) -> GatewayResult<Vec<TagSamples>> + Send + Sync;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub credentials: Credentials,
    pub query: DataLogQuery,
}

// In-memory data log that answers from a closure and records every call, for testing
pub struct MockDataLog {
    responder: Box<Responder>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockDataLog {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&DataLogQuery) -> GatewayResult<Vec<TagSamples>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every tag returns `records` copies of `value`.
    pub fn constant(value: &str) -> Self {
        let value = value.to_string();
        Self::new(move |query| {
            Ok(query
                .tags
                .iter()
                .map(|tag| TagSamples::new(tag.clone(), vec![value.clone(); query.records as usize]))
                .collect())
        })
    }

    /// Every tag returns `0, 1, 2, ..` up to the requested record count.
    pub fn ramp() -> Self {
        Self::new(|query| {
            Ok(query
                .tags
                .iter()
                .map(|tag| {
                    let values = (0..query.records).map(|i| i.to_string()).collect();
                    TagSamples::new(tag.clone(), values)
                })
                .collect())
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DataLogSource for MockDataLog {
    async fn fetch(&self, credentials: &Credentials, query: &DataLogQuery) -> GatewayResult<Vec<TagSamples>> {
        self.calls.lock().unwrap().push(RecordedCall {
            credentials: credentials.clone(),
            query: query.clone(),
        });
        (self.responder)(query)
    }
}
