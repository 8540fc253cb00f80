//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one line per partition, batch or key
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use std::fmt::Write as _;

use rplog_durability::{Batch, BatchHeader, LogDir, PartitionDir, Record};
use rplog_kvstore::{KvItem, KvState};
use serde::Serialize;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Format an error.
pub fn format_error(err: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(&serde_json::json!({ "error": format!("{:#}", err) })),
        OutputMode::Human => format!("(error) {:#}", err),
    }
}

#[derive(Serialize)]
struct PartitionView {
    ntp: String,
    revision: i64,
    path: String,
    segments: Vec<String>,
    snapshot: bool,
}

impl PartitionView {
    fn new(dir: &PartitionDir) -> Self {
        PartitionView {
            ntp: dir.ntp.to_string(),
            revision: dir.revision,
            path: dir.path.display().to_string(),
            segments: dir
                .segments
                .iter()
                .filter_map(|s| s.name().map(|n| n.to_string()))
                .collect(),
            snapshot: dir.snapshot.is_some(),
        }
    }
}

/// Format the partitions of a data directory.
pub fn format_ntps(log: &LogDir, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let views: Vec<_> = log.partitions.iter().map(PartitionView::new).collect();
            to_json(&views)
        }
        OutputMode::Human => {
            let mut out = String::new();
            for p in &log.partitions {
                let _ = writeln!(
                    out,
                    "{} segments={}{}",
                    p.display_name(),
                    p.segments.len(),
                    if p.snapshot.is_some() { " snapshot" } else { "" }
                );
            }
            if out.is_empty() {
                out.push_str("(empty)\n");
            }
            out
        }
    }
}

/// A record as shown in dumps: offsets resolved, bytes as hex.
#[derive(Debug, Serialize)]
pub struct RecordView {
    offset: i64,
    timestamp_delta: i64,
    key: Option<String>,
    value: Option<String>,
    headers: usize,
}

impl RecordView {
    /// Resolve `record` against its batch header.
    pub fn new(header: &BatchHeader, record: &Record) -> Self {
        RecordView {
            offset: header.base_offset + record.offset_delta,
            timestamp_delta: record.timestamp_delta,
            key: record.key.as_deref().map(hex::encode),
            value: record.value.as_deref().map(hex::encode),
            headers: record.headers.len(),
        }
    }
}

/// A batch as shown in dumps.
#[derive(Debug, Serialize)]
pub struct BatchView {
    index: usize,
    file_position: u64,
    last_offset: i64,
    header: BatchHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<RecordView>>,
}

impl BatchView {
    /// Summarize `batch`, optionally with its decoded records.
    pub fn new(batch: &Batch, records: Option<Vec<RecordView>>) -> Self {
        BatchView {
            index: batch.index(),
            file_position: batch.file_position(),
            last_offset: batch.last_offset(),
            header: *batch.header(),
            records,
        }
    }
}

/// Format the batches of a segment.
pub fn format_batches(batches: &[BatchView], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(&batches),
        OutputMode::Human => {
            let mut out = String::new();
            for b in batches {
                let h = &b.header;
                let _ = writeln!(
                    out,
                    "#{} @{} offsets={}..={} type={} records={} size={} ts={}",
                    b.index,
                    b.file_position,
                    h.base_offset,
                    b.last_offset,
                    h.batch_type,
                    h.record_count,
                    h.batch_size,
                    h.first_timestamp
                );
                for r in b.records.iter().flatten() {
                    let _ = writeln!(
                        out,
                        "  offset={} key={} value={}",
                        r.offset,
                        r.key.as_deref().unwrap_or("null"),
                        r.value.as_deref().unwrap_or("null")
                    );
                }
            }
            if out.is_empty() {
                out.push_str("(empty)\n");
            }
            out
        }
    }
}

#[derive(Serialize)]
struct KvStoreView<'a> {
    ntp: &'a str,
    items: Vec<KvItem>,
}

/// Format reconstructed kvstores, one per partition.
pub fn format_kvstores(stores: &[(String, KvState)], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let views: Vec<_> = stores
                .iter()
                .map(|(ntp, state)| KvStoreView {
                    ntp,
                    items: state.items(),
                })
                .collect();
            to_json(&views)
        }
        OutputMode::Human => {
            let mut out = String::new();
            for (ntp, state) in stores {
                let _ = writeln!(out, "{} ({} keys)", ntp, state.len());
                for item in state.iter() {
                    let _ = writeln!(
                        out,
                        "  {} => {} (offset {}, {})",
                        item.key, item.value, item.offset, item.ts
                    );
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rplog_core::Ntp;
    use rplog_durability::testing::PartitionFixture;
    use rplog_durability::{BatchBuilder, ReaderConfig};
    use rplog_kvstore::testing::{kv_batch, put};
    use rplog_kvstore::{ConsensusKeyType, DecodedKey, KvStore};
    use tempfile::tempdir;

    fn sample_batch() -> Batch {
        BatchBuilder::new(10, 4)
            .timestamps(5, 5)
            .key_value(Some(vec![0xAA]), None)
            .build()
    }

    #[test]
    fn test_batches_human() {
        let batch = sample_batch();
        let records = batch
            .records()
            .map(|r| RecordView::new(batch.header(), &r.unwrap()))
            .collect();
        let out = format_batches(&[BatchView::new(&batch, Some(records))], OutputMode::Human);
        assert_eq!(
            out,
            format!(
                "#0 @0 offsets=10..=10 type=4 records=1 size={} ts=5\n\
                 \x20 offset=10 key=aa value=null\n",
                batch.header().batch_size
            )
        );
    }

    #[test]
    fn test_batches_json() {
        let batch = sample_batch();
        let out = format_batches(&[BatchView::new(&batch, None)], OutputMode::Json);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json[0]["header"]["base_offset"], 10);
        assert_eq!(json[0]["last_offset"], 10);
        assert!(json[0].get("records").is_none());
    }

    #[test]
    fn test_empty_batches_human() {
        assert_eq!(format_batches(&[], OutputMode::Human), "(empty)\n");
    }

    #[test]
    fn test_ntps_human_and_json() {
        let dir = tempdir().unwrap();
        let fixture =
            PartitionFixture::create(dir.path(), &Ntp::new("kafka", "t", 0), 3).unwrap();
        fixture.write_segment("0-1-v1.log", &[]).unwrap();

        let log = LogDir::scan(dir.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(format_ntps(&log, OutputMode::Human), "kafka/t/0_3 segments=1\n");

        let json: serde_json::Value =
            serde_json::from_str(&format_ntps(&log, OutputMode::Json)).unwrap();
        assert_eq!(json[0]["ntp"], "kafka/t/0");
        assert_eq!(json[0]["revision"], 3);
        assert_eq!(json[0]["segments"][0], "0-1-v1.log");
        assert_eq!(json[0]["snapshot"], false);
    }

    #[test]
    fn test_kvstores_output() {
        let dir = tempdir().unwrap();
        let fixture =
            PartitionFixture::create(dir.path(), &Ntp::new("redpanda", "kvstore", 0), 0).unwrap();
        let key = DecodedKey::consensus(ConsensusKeyType::LastAppliedOffset, 2);
        fixture
            .write_segment("0-1-v1.log", &[kv_batch(0, 0, &[put(&key, 8i64.to_le_bytes())])])
            .unwrap();
        let state = KvStore::open(fixture.path()).unwrap().decode().unwrap();
        let stores = vec![("redpanda/kvstore/0_0".to_string(), state)];

        let human = format_kvstores(&stores, OutputMode::Human);
        assert_eq!(
            human,
            "redpanda/kvstore/0_0 (1 keys)\n\
             \x20 consensus last_applied_offset group=2 => 8 (offset 0, 1970-01-01 00:00:00)\n"
        );

        let json: serde_json::Value =
            serde_json::from_str(&format_kvstores(&stores, OutputMode::Json)).unwrap();
        assert_eq!(json[0]["items"][0]["value"], 8);
        assert_eq!(json[0]["items"][0]["key"]["data"]["name"], "last_applied_offset");
    }

    #[test]
    fn test_error_format() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(format_error(&err, OutputMode::Human), "(error) boom");
        let json: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputMode::Json)).unwrap();
        assert_eq!(json["error"], "boom");
    }
}
