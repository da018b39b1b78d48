//! Catalog of extractable API streams
//!
//! Streams are static descriptors; adding one is adding a table entry, not
//! writing code. The sync runner picks the extraction mode from the
//! replication method.

/// How a stream is replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replication {
    /// Whole resource in one request; no checkpoint is kept.
    FullTable,
    /// Date-windowed extraction driven by a durable watermark.
    Incremental {
        /// Record field that orders the stream.
        replication_key: &'static str,
    },
}

/// A single extractable stream of the source API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    /// Stream name, also the checkpoint key and output file stem.
    pub name: &'static str,
    /// Request path under the API root.
    pub path: &'static str,
    /// Fields that uniquely identify a record.
    pub primary_keys: &'static [&'static str],
    /// Replication method.
    pub replication: Replication,
}

impl StreamSpec {
    /// Whether this stream syncs incrementally.
    pub fn is_incremental(&self) -> bool {
        matches!(self.replication, Replication::Incremental { .. })
    }
}

/// Hourly per-store traffic counts, windowed on `DateTime`.
pub const TRAFFIC_DATA: StreamSpec = StreamSpec {
    name: "traffic_data",
    path: "/TrafficData/Hourly",
    primary_keys: &["DateTime", "StoreNo"],
    replication: Replication::Incremental {
        replication_key: "DateTime",
    },
};

/// Store directory, small enough to pull whole every run.
pub const STORES_DATA: StreamSpec = StreamSpec {
    name: "stores_data",
    path: "/Stores",
    primary_keys: &["StoreNo"],
    replication: Replication::FullTable,
};

/// All known streams, in sync order.
pub fn catalog() -> &'static [StreamSpec] {
    &[TRAFFIC_DATA, STORES_DATA]
}

/// Look up a stream by name.
pub fn find(name: &str) -> Option<&'static StreamSpec> {
    catalog().iter().find(|s| s.name == name)
}
