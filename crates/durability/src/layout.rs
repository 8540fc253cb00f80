//! Partition directory discovery.
//!
//! A data directory is laid out as
//! `<base_dir>/<namespace>/<topic>/<partition>_<revision>/`, each leaf holding
//! segment files and an optional `snapshot`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rplog_core::Ntp;

use crate::config::ReaderConfig;
use crate::format::SNAPSHOT_FILE_NAME;
use crate::segment::{Segment, SegmentName, SEGMENT_EXTENSION};

/// One partition directory with its segments in base offset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDir {
    /// Partition identity
    pub ntp: Ntp,
    /// Partition revision (suffix of the directory name)
    pub revision: i64,
    /// Directory path
    pub path: PathBuf,
    /// Segments sorted by base offset
    pub segments: Vec<Segment>,
    /// Snapshot file, if present
    pub snapshot: Option<PathBuf>,
}

impl PartitionDir {
    /// Open a partition directory whose last three path components are
    /// `namespace/topic/partition_revision`.
    pub fn open(path: &Path) -> Result<PartitionDir, LayoutError> {
        let components: Vec<&str> = path
            .components()
            .rev()
            .take(3)
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        let [dir, topic, namespace] = components[..] else {
            return Err(LayoutError::UnrecognizedLayout(path.to_path_buf()));
        };
        let (partition, revision) = parse_partition_dir(dir)
            .ok_or_else(|| LayoutError::UnrecognizedLayout(path.to_path_buf()))?;

        Self::load(Ntp::new(namespace, topic, partition), revision, path.to_path_buf())
    }

    fn load(ntp: Ntp, revision: i64, path: PathBuf) -> Result<PartitionDir, LayoutError> {
        let mut named = Vec::new();
        let mut snapshot = None;

        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name == SNAPSHOT_FILE_NAME {
                snapshot = Some(entry.path());
            } else if let Some(parsed) = SegmentName::parse(name) {
                named.push((parsed, entry.path()));
            } else if Path::new(name).extension().map_or(false, |e| e == SEGMENT_EXTENSION) {
                tracing::debug!(file = name, "Ignoring log file with unrecognized name");
            }
        }

        named.sort_by_key(|(name, _)| (name.base_offset, name.term));
        let segments = named.into_iter().map(|(_, p)| Segment::new(p)).collect();

        Ok(PartitionDir {
            ntp,
            revision,
            path,
            segments,
            snapshot,
        })
    }

    /// `namespace/topic/partition_revision`
    pub fn display_name(&self) -> String {
        format!(
            "{}/{}/{}_{}",
            self.ntp.namespace, self.ntp.topic, self.ntp.partition, self.revision
        )
    }
}

/// Every partition under a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDir {
    /// Base directory that was scanned
    pub base_dir: PathBuf,
    /// Discovered partitions sorted by NTP then revision
    pub partitions: Vec<PartitionDir>,
}

impl LogDir {
    /// Walk `base_dir` and collect every partition directory.
    pub fn scan(base_dir: &Path, config: &ReaderConfig) -> Result<LogDir, LayoutError> {
        if !base_dir.is_dir() {
            return Err(LayoutError::NotADirectory(base_dir.to_path_buf()));
        }

        let mut leaves = Vec::new();
        collect_leaves(base_dir, config, &mut leaves)?;

        let mut partitions = Vec::new();
        for leaf in leaves {
            let Ok(relative) = leaf.strip_prefix(base_dir) else {
                continue;
            };
            let parts: Vec<&str> = relative
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect();
            let [namespace, topic, dir] = parts[..] else {
                tracing::debug!(
                    path = %leaf.display(),
                    "Skipping directory outside partition layout"
                );
                continue;
            };
            let Some((partition, revision)) = parse_partition_dir(dir) else {
                tracing::debug!(
                    path = %leaf.display(),
                    "Skipping directory with unrecognized name"
                );
                continue;
            };
            partitions.push(PartitionDir::load(
                Ntp::new(namespace, topic, partition),
                revision,
                leaf,
            )?);
        }

        partitions.sort_by(|a, b| (&a.ntp, a.revision).cmp(&(&b.ntp, b.revision)));
        tracing::debug!(
            base_dir = %base_dir.display(),
            partitions = partitions.len(),
            "Scanned data directory"
        );

        Ok(LogDir {
            base_dir: base_dir.to_path_buf(),
            partitions,
        })
    }

    /// Partitions matching `ntp` (one per revision).
    pub fn find<'a>(&'a self, ntp: &'a Ntp) -> impl Iterator<Item = &'a PartitionDir> + 'a {
        self.partitions.iter().filter(move |p| &p.ntp == ntp)
    }

    /// Partitions of a namespace/topic pair.
    pub fn topic<'a>(
        &'a self,
        namespace: &'a str,
        topic: &'a str,
    ) -> impl Iterator<Item = &'a PartitionDir> + 'a {
        self.partitions
            .iter()
            .filter(move |p| p.ntp.namespace == namespace && p.ntp.topic == topic)
    }
}

/// Depth-first walk collecting directories without subdirectories.
fn collect_leaves(
    dir: &Path,
    config: &ReaderConfig,
    leaves: &mut Vec<PathBuf>,
) -> Result<(), LayoutError> {
    let mut has_subdir = false;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        has_subdir = true;
        let name = entry.file_name();
        if name.to_str().map_or(false, |n| config.is_excluded(n)) {
            tracing::debug!(path = %entry.path().display(), "Skipping excluded directory");
            continue;
        }
        collect_leaves(&entry.path(), config, leaves)?;
    }
    if !has_subdir {
        leaves.push(dir.to_path_buf());
    }
    Ok(())
}

/// Parse `<partition>_<revision>`.
fn parse_partition_dir(name: &str) -> Option<(i32, i64)> {
    let (partition, revision) = name.split_once('_')?;
    Some((partition.parse().ok()?, revision.parse().ok()?))
}

/// Directory discovery errors
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Base path is missing or not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Path does not end in `namespace/topic/partition_revision`
    #[error("Not a partition directory: {0}")]
    UnrecognizedLayout(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_parse_partition_dir() {
        assert_eq!(parse_partition_dir("3_17"), Some((3, 17)));
        assert_eq!(parse_partition_dir("3"), None);
        assert_eq!(parse_partition_dir("x_1"), None);
    }

    #[test]
    fn test_scan_discovers_partitions() {
        let dir = tempdir().unwrap();
        let base = dir.path();

        let kv = base.join("redpanda/kvstore/0_0");
        fs::create_dir_all(&kv).unwrap();
        touch(&kv.join("100-2-v1.log"));
        touch(&kv.join("20-1-v1.log"));
        touch(&kv.join("0-1-v1.log"));
        touch(&kv.join("0-1-v1.base_index"));
        touch(&kv.join(SNAPSHOT_FILE_NAME));

        let topic = base.join("kafka/orders/1_12");
        fs::create_dir_all(&topic).unwrap();

        let log = LogDir::scan(base, &ReaderConfig::default()).unwrap();
        assert_eq!(log.partitions.len(), 2);

        let p = &log.partitions[0];
        assert_eq!(p.ntp, Ntp::new("kafka", "orders", 1));
        assert_eq!(p.revision, 12);
        assert!(p.segments.is_empty());
        assert!(p.snapshot.is_none());

        let p = &log.partitions[1];
        assert_eq!(p.display_name(), "redpanda/kvstore/0_0");
        let offsets: Vec<_> = p
            .segments
            .iter()
            .map(|s| s.name().unwrap().base_offset)
            .collect();
        assert_eq!(offsets, vec![0, 20, 100]);
        assert_eq!(p.snapshot.as_deref(), Some(kv.join("snapshot").as_path()));
    }

    #[test]
    fn test_scan_skips_cloud_storage_cache_and_odd_dirs() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("cloud_storage_cache/kafka/t/0_1")).unwrap();
        fs::create_dir_all(base.join("kafka/t/0_1")).unwrap();
        fs::create_dir_all(base.join("kafka/t/not_a_partition")).unwrap();
        fs::create_dir_all(base.join("shallow")).unwrap();

        let log = LogDir::scan(base, &ReaderConfig::default()).unwrap();
        assert_eq!(log.partitions.len(), 1);
        assert_eq!(log.partitions[0].ntp, Ntp::new("kafka", "t", 0));
    }

    #[test]
    fn test_find_and_topic() {
        let dir = tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("redpanda/kvstore/0_0")).unwrap();
        fs::create_dir_all(base.join("redpanda/kvstore/1_0")).unwrap();
        fs::create_dir_all(base.join("kafka/t/0_3")).unwrap();

        let log = LogDir::scan(base, &ReaderConfig::default()).unwrap();
        assert_eq!(log.topic("redpanda", "kvstore").count(), 2);
        let ntp = Ntp::new("kafka", "t", 0);
        let found: Vec<_> = log.find(&ntp).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].revision, 3);
    }

    #[test]
    fn test_open_partition_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kafka/events/4_9");
        fs::create_dir_all(&path).unwrap();
        touch(&path.join("5-1-v1.log"));

        let p = PartitionDir::open(&path).unwrap();
        assert_eq!(p.ntp, Ntp::new("kafka", "events", 4));
        assert_eq!(p.revision, 9);
        assert_eq!(p.segments.len(), 1);
    }

    #[test]
    fn test_open_rejects_bad_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kafka/events/nope");
        fs::create_dir_all(&path).unwrap();
        assert!(matches!(
            PartitionDir::open(&path),
            Err(LayoutError::UnrecognizedLayout(_))
        ));
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            LogDir::scan(&dir.path().join("absent"), &ReaderConfig::default()),
            Err(LayoutError::NotADirectory(_))
        ));
    }
}
