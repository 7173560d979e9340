//! Table-set configuration loading.
//!
//! A table set is the YAML description of the two scheduler tables: message
//! definitions (index → stream id) and schedule entries.  The expected
//! structure is:
//!
//! ```yaml
//! messages:
//!   - index: 0
//!     msg_id: 0x0890
//! schedule:
//!   - slot: 0
//!     activity: 0
//!     enabled: true
//!     period: 4
//!     offset: 0
//!     msg_index: 0
//! ```
//!
//! Loading only parses; [`TableSetManager::apply`] pushes every definition
//! through the scheduler's validated command handlers, so a bad entry is
//! rejected per-entry (with an error event) while the rest of the file still
//! lands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::scheduler::Scheduler;
use crate::schtbl::ScheduleEntry;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Both sections are optional so that partial files are accepted gracefully.
#[derive(Debug, Default, Deserialize)]
struct TableSetFile {
    #[serde(default)]
    messages: Vec<MessageDef>,
    #[serde(default)]
    schedule: Vec<ScheduleDef>,
}

#[derive(Debug, Deserialize)]
struct MessageDef {
    index: u16,
    msg_id: u16,
}

#[derive(Debug, Deserialize)]
struct ScheduleDef {
    slot: u16,
    activity: u16,
    #[serde(default)]
    enabled: bool,
    period: u16,
    #[serde(default)]
    offset: u16,
    msg_index: u16,
}

// ── TableSetManager ───────────────────────────────────────────────────────────

/// Loads a table-set file and applies it to a scheduler.
#[derive(Debug, Default)]
pub struct TableSetManager {
    file: TableSetFile,

    /// Set to `true` after a successful [`load_from_file`](Self::load_from_file).
    loaded: bool,
}

impl TableSetManager {
    /// Creates a new, empty `TableSetManager`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `path` and stores the definitions for a later
    /// [`apply`](Self::apply).
    ///
    /// Calling this a second time replaces all previously loaded
    /// definitions.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading table set from: {}", path.display());

        // Reset state before (re-)loading
        self.file = TableSetFile::default();
        self.loaded = false;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open table set file: {}", path.display()))?;

        self.file = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;
        self.loaded = true;

        info!(
            messages = self.file.messages.len(),
            entries = self.file.schedule.len(),
            "table set parsed"
        );
        Ok(())
    }

    /// Returns `true` after a successful call to
    /// [`load_from_file`](Self::load_from_file).
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of message definitions in the loaded set.
    pub fn message_count(&self) -> usize {
        self.file.messages.len()
    }

    /// Number of schedule entries in the loaded set.
    pub fn entry_count(&self) -> usize {
        self.file.schedule.len()
    }

    /// Push every definition through the scheduler's validated command
    /// handlers.  Returns `(applied, rejected)` counts; rejected
    /// definitions have already produced an error event from the handler.
    pub fn apply(&self, scheduler: &mut Scheduler) -> (usize, usize) {
        let mut applied = 0usize;
        let mut rejected = 0usize;

        for msg in &self.file.messages {
            match scheduler.load_msg_entry(msg.index, msg.msg_id) {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(index = msg.index, %err, "message definition skipped");
                    rejected += 1;
                }
            }
        }

        for def in &self.file.schedule {
            let entry = ScheduleEntry {
                enabled: def.enabled,
                period: def.period,
                offset: def.offset,
                msg_index: def.msg_index,
            };
            match scheduler.load_entry(def.slot, def.activity, entry) {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(slot = def.slot, activity = def.activity, %err, "schedule entry skipped");
                    rejected += 1;
                }
            }
        }

        info!(applied, rejected, "table set applied");
        (applied, rejected)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testkit::{rig, small_profile};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_example_yaml() {
        let yaml = r#"
messages:
  - index: 0
    msg_id: 0x0890
  - index: 1
    msg_id: 0x1881
schedule:
  - slot: 0
    activity: 0
    enabled: true
    period: 2
    offset: 0
    msg_index: 0
  - slot: 1
    activity: 1
    enabled: true
    period: 4
    offset: 1
    msg_index: 1
"#;
        let f = yaml_tempfile(yaml);
        let mut mgr = TableSetManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.is_loaded());
        assert_eq!(mgr.message_count(), 2);
        assert_eq!(mgr.entry_count(), 2);
    }

    #[test]
    fn optional_fields_use_defaults_when_absent() {
        let yaml = r#"
schedule:
  - slot: 0
    activity: 0
    period: 1
    msg_index: 0
"#;
        let f = yaml_tempfile(yaml);
        let mut mgr = TableSetManager::new();
        mgr.load_from_file(f.path()).unwrap();

        let mut r = rig(small_profile());
        let (applied, rejected) = mgr.apply(&mut r.sched);
        assert_eq!((applied, rejected), (1, 0));

        let entry = r.sched.sch_table().entry(0, 0).unwrap();
        assert!(!entry.enabled, "enabled defaults to false");
        assert_eq!(entry.offset, 0, "offset defaults to zero");
    }

    #[test]
    fn empty_file_is_accepted() {
        let f = yaml_tempfile("{}\n");
        let mut mgr = TableSetManager::new();
        mgr.load_from_file(f.path()).unwrap();
        assert!(mgr.is_loaded());
        assert_eq!(mgr.message_count(), 0);
    }

    #[test]
    fn missing_file_returns_error() {
        let mut mgr = TableSetManager::new();
        let result = mgr.load_from_file(Path::new("/nonexistent/path/tables.yaml"));
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let mut mgr = TableSetManager::new();
        let result = mgr.load_from_file(f.path());
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn apply_rejects_invalid_entries_but_keeps_the_rest() {
        let yaml = r#"
messages:
  - index: 0
    msg_id: 0x0890
  - index: 99
    msg_id: 0x0891
schedule:
  - slot: 0
    activity: 0
    enabled: true
    period: 2
    offset: 0
    msg_index: 0
  - slot: 0
    activity: 1
    enabled: true
    period: 2
    offset: 5
    msg_index: 0
"#;
        let f = yaml_tempfile(yaml);
        let mut mgr = TableSetManager::new();
        mgr.load_from_file(f.path()).unwrap();

        // small profile: 4 message entries, so index 99 is rejected;
        // offset 5 >= period 2 is rejected
        let mut r = rig(small_profile());
        let (applied, rejected) = mgr.apply(&mut r.sched);
        assert_eq!((applied, rejected), (2, 2));

        assert!(r.sched.sch_table().entry(0, 0).unwrap().enabled);
        assert!(!r.sched.sch_table().entry(0, 1).unwrap().enabled);
        assert_eq!(r.sched.msg_table().entry(0).unwrap().msg_id(), 0x0890);
    }

    #[test]
    fn reload_replaces_previous_definitions() {
        let f1 = yaml_tempfile("messages:\n  - index: 0\n    msg_id: 0x0890\n");
        let f2 = yaml_tempfile("messages:\n  - index: 1\n    msg_id: 0x0891\n");

        let mut mgr = TableSetManager::new();
        mgr.load_from_file(f1.path()).unwrap();
        assert_eq!(mgr.message_count(), 1);

        mgr.load_from_file(f2.path()).unwrap();
        assert_eq!(mgr.message_count(), 1);

        let mut r = rig(small_profile());
        mgr.apply(&mut r.sched);
        // only the second file's definition is present
        assert_eq!(r.sched.msg_table().entry(1).unwrap().msg_id(), 0x0891);
        assert_eq!(r.sched.msg_table().entry(0).unwrap().msg_id(), 0);
    }
}
