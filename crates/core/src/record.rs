//! Snapshot metadata records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One site of a (possibly multisite) WordPress install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub url: String,
    pub blog_id: u64,
    pub domain: String,
}

/// Caller-supplied description of a snapshot, before it is stored.
///
/// The store adds the id, repository and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    pub project: String,
    pub description: String,
    pub author: String,
    pub multisite: bool,
    pub sites: Vec<SiteDescriptor>,
    pub table_prefix: String,
    pub subdomain_install: bool,
    pub size: u64,
    pub wp_version: String,
}

/// A stored snapshot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub project: String,
    pub repository: String,
    /// Unix seconds, stamped at insert.
    pub time: i64,
    pub description: String,
    pub author: String,
    pub multisite: bool,
    pub sites: Vec<SiteDescriptor>,
    pub table_prefix: String,
    pub subdomain_install: bool,
    pub size: u64,
    pub wp_version: String,
}

impl SnapshotRecord {
    /// Build the record that will be written for `descriptor`.
    ///
    /// The project is lowercased so that searches can match it case-insensitively.
    pub fn from_descriptor(id: &str, repository: &str, time: i64, descriptor: &SnapshotDescriptor) -> Self {
        Self {
            id: id.to_string(),
            project: descriptor.project.to_lowercase(),
            repository: repository.to_string(),
            time,
            description: descriptor.description.clone(),
            author: descriptor.author.clone(),
            multisite: descriptor.multisite,
            sites: descriptor.sites.clone(),
            table_prefix: descriptor.table_prefix.clone(),
            subdomain_install: descriptor.subdomain_install,
            size: descriptor.size,
            wp_version: descriptor.wp_version.clone(),
        }
    }

    /// Write time as a UTC timestamp; `None` if `time` is out of range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// Payload size for display, two decimals at most.
    pub fn size_human(&self) -> String {
        format_bytes(self.size, 2)
    }
}

/// Format a byte count with a 1024 base, e.g. `1.5 MB`.
pub fn format_bytes(size: u64, precision: usize) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if size == 0 {
        return "0 B".to_string();
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SUFFIXES.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.precision$}");
    let rendered = if rendered.contains('.') { rendered.trim_end_matches('0').trim_end_matches('.') } else { &rendered };
    format!("{rendered} {}", SUFFIXES[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_descriptor_lowercases_project() {
        let descriptor = SnapshotDescriptor { project: "Acme Site".into(), author: "jo".into(), ..Default::default() };
        let record = SnapshotRecord::from_descriptor("abc123", "main", 1_700_000_000, &descriptor);
        assert_eq!(record.project, "acme site");
        assert_eq!(record.repository, "main");
        assert_eq!(record.author, "jo");
        assert_eq!(record.created_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_size_human() {
        let mut record = SnapshotRecord::from_descriptor("abc123", "main", 0, &SnapshotDescriptor::default());
        assert_eq!(record.size_human(), "0 B");
        record.size = 1536;
        assert_eq!(record.size_human(), "1.5 KB");
        record.size = 5 * 1024 * 1024 + 1024 * 1024 / 3;
        assert_eq!(record.size_human(), "5.33 MB");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0, 2), "0 B");
        assert_eq!(format_bytes(512, 2), "512 B");
        assert_eq!(format_bytes(1024, 2), "1 KB");
        assert_eq!(format_bytes(1536 * 1024, 2), "1.5 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024, 2), "3 GB");
    }
}
