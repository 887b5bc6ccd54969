//! Persisting MPX hierarchy state (master names, colors and slave attachments)
//! across a restart.
//!
//! The X server re-creates the default master pair on every WM restart and assigns
//! fresh ids to any virtual master the previous run had created; nothing about a
//! master's identity survives except what we write down ourselves. On startup,
//! [World::on_startup](crate::core::world::World::on_startup) seeds the registry from
//! [XConn::current_masters](crate::core::xconnection::XConn::current_masters), then
//! [apply] reconciles those fresh masters against whatever was saved here, matching by
//! their attached slave names (the one thing that *is* stable across a restart).
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::master::Color;
use crate::core::registry::Registry;
use crate::error::Result;

/// One master's persisted identity: its display name, border color, and the names of
/// the slave devices it had attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMaster {
    pub name: String,
    pub focused_color: u32,
    pub slave_names: Vec<String>,
}

/// Serialize every master in `registry` into a simple line-oriented format, one block
/// per master separated by a blank line.
pub fn serialize(registry: &Registry) -> String {
    let mut out = String::new();
    for m in registry.masters() {
        out.push_str(&format!("name={}\n", m.name()));
        out.push_str(&format!("color={}\n", m.focused_color.0));
        for s in registry.slaves_of(m.id()) {
            out.push_str(&format!("slave={}\n", s.name()));
        }
        out.push('\n');
    }
    out
}

/// Parse the format produced by [serialize] back into a list of [PersistedMaster]s.
///
/// Malformed lines are skipped rather than treated as a hard failure; persisted state
/// is a best-effort convenience, not a source of truth the rest of the core depends on.
pub fn deserialize(contents: &str) -> Vec<PersistedMaster> {
    let mut records = Vec::new();
    let mut name = None;
    let mut color = None;
    let mut slave_names = Vec::new();

    let mut flush = |name: &mut Option<String>, color: &mut Option<u32>, slave_names: &mut Vec<String>| {
        if let Some(name) = name.take() {
            records.push(PersistedMaster {
                name,
                focused_color: color.take().unwrap_or(0),
                slave_names: std::mem::take(slave_names),
            });
        } else {
            color.take();
            slave_names.clear();
        }
    };

    for line in contents.lines() {
        if line.trim().is_empty() {
            flush(&mut name, &mut color, &mut slave_names);
            continue;
        }
        if let Some(val) = line.strip_prefix("name=") {
            name = Some(val.to_string());
        } else if let Some(val) = line.strip_prefix("color=") {
            color = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("slave=") {
            slave_names.push(val.to_string());
        }
    }
    flush(&mut name, &mut color, &mut slave_names);

    records
}

fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    path.to_string()
}

/// Write `registry`'s current master hierarchy to `path`, expanding a leading `~/`.
pub fn save(path: &str, registry: &Registry) -> Result<()> {
    let path = expand_home(path);
    fs::write(&path, serialize(registry))?;
    debug!(path, "persisted master hierarchy");
    Ok(())
}

/// Load whatever was last written by [save]. A missing file is not an error: it just
/// means this is the first run, so an empty set of records is returned.
pub fn load(path: &str) -> Result<Vec<PersistedMaster>> {
    let path = expand_home(path);
    if !Path::new(&path).exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(&path)?;
    Ok(deserialize(&contents))
}

/// Reconcile freshly-seeded masters in `registry` against `records`.
///
/// Matches a persisted record to a live master by exact slave-name-set equality and
/// restores its `focused_color`. There is no public setter for a master's `name`
/// ([Master](crate::core::master::Master) treats it as fixed at construction), so the
/// name itself is not restored; the color is the only thing a restart can't otherwise
/// recover that this crate is able to write back.
pub fn apply(registry: &mut Registry, records: &[PersistedMaster]) {
    let master_ids: Vec<_> = registry.masters().map(|m| m.id()).collect();

    for record in records {
        let mut wanted: Vec<&str> = record.slave_names.iter().map(String::as_str).collect();
        wanted.sort_unstable();

        let matched = master_ids.iter().find(|&&id| {
            let mut attached: Vec<&str> = registry.slaves_of(id).map(|s| s.name()).collect();
            attached.sort_unstable();
            attached == wanted
        });

        match matched {
            Some(&id) => {
                if let Some(m) = registry.master_mut(id) {
                    m.focused_color = Color(record.focused_color);
                }
            }
            None => {
                warn!(name = %record.name, "no live master matches persisted slave set, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{MasterId, SlaveId};
    use crate::core::master::Master;
    use crate::core::layout::{monocle, Layout, LayoutArgs};
    use crate::core::slave::{Slave, SlaveKind};

    fn registry_with_one_master() -> Registry {
        let mut r = Registry::new(&["1".into()], vec![Layout::new("[]=", monocle, LayoutArgs::default())]);
        r.insert_master(Master::new(MasterId::from(1), SlaveId::from(1), SlaveId::from(2), "m1"))
            .unwrap();
        r.insert_slave(Slave::new(SlaveId::from(1), SlaveKind::Keyboard, "kbd0", false))
            .unwrap();
        r.insert_slave(Slave::new(SlaveId::from(2), SlaveKind::Pointer, "mouse0", false))
            .unwrap();
        r
    }

    #[test]
    fn round_trips_master_and_slave_names() {
        let r = registry_with_one_master();
        let text = serialize(&r);
        let records = deserialize(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "m1");
        let mut names = records[0].slave_names.clone();
        names.sort();
        assert_eq!(names, vec!["kbd0".to_string(), "mouse0".to_string()]);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let records = load("/tmp/this-path-should-never-exist-for-mpxwm-tests").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn apply_restores_color_for_matching_slave_set() {
        let mut r = registry_with_one_master();
        let records = vec![PersistedMaster {
            name: "m1".into(),
            focused_color: 0xff0000,
            slave_names: vec!["kbd0".into(), "mouse0".into()],
        }];
        apply(&mut r, &records);
        assert_eq!(r.master(MasterId::from(1)).unwrap().focused_color, Color(0xff0000));
    }
}
