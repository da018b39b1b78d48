//! Shared test doubles for sync loop tests

use async_trait::async_trait;
use retail_traffic_extractor::config::ExtractorConfig;
use retail_traffic_extractor::fetcher::{FetchError, FetchResult, RecordFetcher};
use retail_traffic_extractor::output::{OutputResult, RecordSink};
use retail_traffic_extractor::shutdown::SharedShutdown;
use retail_traffic_extractor::streams::StreamSpec;
use retail_traffic_extractor::{Granularity, Record, Window};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Base config: 2023-01-01 to 2023-01-05 in 2-day windows, no pacing delay.
pub fn config_json() -> serde_json::Value {
    serde_json::json!({
        "username": "acme",
        "password": "hunter2",
        "start_date": "2023-01-01T00:00:00",
        "end_date": "2023-01-05T00:00:00",
        "backfill_interval": 2,
        "request_delay_ms": 0,
        "max_retries": 5,
    })
}

pub fn config_from(json: serde_json::Value) -> ExtractorConfig {
    ExtractorConfig::from_json(&json.to_string()).unwrap()
}

pub fn record(tag: u64) -> Record {
    match serde_json::json!({"StoreNo": tag, "Traffic": 10 * tag}) {
        serde_json::Value::Object(fields) => Record(fields),
        _ => unreachable!(),
    }
}

pub fn records(count: u64) -> Vec<Record> {
    (0..count).map(record).collect()
}

/// One scripted fetch outcome.
pub enum Scripted {
    Ok(Vec<Record>),
    Err(FetchError),
}

/// A recorded fetch call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub stream: String,
    pub window: Option<Window>,
    pub granularity: Option<Granularity>,
}

/// Fetcher that serves a scripted sequence of outcomes and records every
/// call it sees. Once the script runs dry it returns empty batches.
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<FetchCall>>,
    trigger_shutdown: Mutex<Option<SharedShutdown>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            trigger_shutdown: Mutex::new(None),
        }
    }

    /// Request shutdown as soon as the first fetch is served, simulating an
    /// interrupt arriving while a window is in flight.
    pub fn shutdown_after_first_fetch(self, shutdown: SharedShutdown) -> Self {
        *self.trigger_shutdown.lock().unwrap() = Some(shutdown);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn serve(&self, call: FetchCall) -> FetchResult<Vec<Record>> {
        self.calls.lock().unwrap().push(call);
        if let Some(shutdown) = self.trigger_shutdown.lock().unwrap().take() {
            shutdown.request();
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Ok(records)) => Ok(records),
            Some(Scripted::Err(error)) => Err(error),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordFetcher for ScriptedFetcher {
    async fn fetch_window(
        &self,
        stream: &StreamSpec,
        window: &Window,
        granularity: Granularity,
    ) -> FetchResult<Vec<Record>> {
        self.serve(FetchCall {
            stream: stream.name.to_string(),
            window: Some(*window),
            granularity: Some(granularity),
        })
    }

    async fn fetch_all(&self, stream: &StreamSpec) -> FetchResult<Vec<Record>> {
        self.serve(FetchCall {
            stream: stream.name.to_string(),
            window: None,
            granularity: None,
        })
    }
}

/// Sink collecting emitted records in memory.
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<Record>,
    pub flushes: usize,
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.flushes += 1;
        Ok(())
    }
}
