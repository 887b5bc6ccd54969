//! The event-rule engine: ordered, named rule lists per event kind, with batched
//! variants fired once per idle cycle.
//!
//! This module has no idea what an X connection is; it is driven by
//! [crate::core::pump], which maps raw transport events onto [EventKind] before
//! calling [RuleTable::apply].
use std::collections::HashMap;

use tracing::trace;

use crate::core::ids::Xid;
use crate::error::{Error, Result};

/// A fixed, small enumeration of everything a rule list can be registered against.
///
/// Covers ordinary X event codes, the generic-event band used by input-extension
/// events (offset past the highest ordinary code), the RandR synthetic kind, and the
/// internal lifecycle kinds the engine itself fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Reserved: always dispatched on an X error reply.
    Error,
    KeyPress,
    ButtonPress,
    ButtonRelease,
    MotionNotify,
    EnterNotify,
    LeaveNotify,
    MapRequest,
    ConfigureRequest,
    ConfigureNotify,
    DestroyNotify,
    PropertyNotify,
    ClientMessage,
    /// A generic (XInput2) sub-event, identified by its extension opcode.
    Generic(u8),
    /// A RandR `ScreenChangeNotify`.
    RandrNotify,
    OnXConnection,
    PreRegisterWindow,
    PostRegisterWindow,
    ClientMapAllow,
    PropertyLoad,
    TileWorkspace,
    OnWindowMove,
    OnScreenChange,
    Periodic,
    Idle,
    TrueIdle,
    ProcessDeviceEvent,
    /// Catch-all for any event code above the known range.
    Extra,
}

/// How a [Rule]'s return value combines with the rest of its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThrough {
    /// Stop the list and return `false` regardless of this rule's result.
    No,
    /// Always continue to the next rule in the list.
    Always,
    /// Continue only if the result was `true`; otherwise stop and return it.
    IfTrue,
    /// Continue only if the result was `false`; otherwise stop and return the
    /// negated result.
    IfFalse,
}

/// Where a newly inserted [Rule] lands relative to the rest of its kind's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Appended to the end of the list.
    Append,
    /// Inserted at the head of the list.
    Prepend,
    /// Inserted, replacing any existing rule with the same name; appended.
    Unique,
    /// Inserted at the head, replacing any existing rule with the same name.
    PrependUnique,
}

/// A named callable attached to one [EventKind]'s rule list.
///
/// The callable receives the window the current event concerns, if any, and returns
/// whether the event was "handled" — combined with the rest of the list via
/// [PassThrough].
pub struct Rule<X> {
    pub name: String,
    pub pass_through: PassThrough,
    func: Box<dyn FnMut(&mut X, Option<Xid>) -> Result<bool>>,
}

impl<X> std::fmt::Debug for Rule<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pass_through", &self.pass_through)
            .finish()
    }
}

impl<X> Rule<X> {
    pub fn new(
        name: impl Into<String>,
        pass_through: PassThrough,
        func: impl FnMut(&mut X, Option<Xid>) -> Result<bool> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            pass_through,
            func: Box::new(func),
        }
    }
}

#[derive(Default)]
struct RuleList<X> {
    direct: Vec<Rule<X>>,
    batched: Vec<Rule<X>>,
    batch_counter: u32,
}

/// The full set of rule lists, one pair (direct + batched) per [EventKind], plus the
/// re-entrancy depth guard that keeps a rule from recursively re-triggering itself
/// without bound.
pub struct RuleTable<X> {
    lists: HashMap<EventKind, RuleList<X>>,
    reentry_depth: u32,
    max_reentry_depth: u32,
}

impl<X> Default for RuleTable<X> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
            reentry_depth: 0,
            max_reentry_depth: 8,
        }
    }
}

impl<X> RuleTable<X> {
    pub fn new(max_reentry_depth: u32) -> Self {
        Self {
            lists: HashMap::new(),
            reentry_depth: 0,
            max_reentry_depth,
        }
    }

    fn list_mut(&mut self, kind: EventKind) -> &mut RuleList<X> {
        self.lists.entry(kind).or_default()
    }

    /// Add a direct rule to `kind`'s list according to `mode`.
    pub fn add_rule(&mut self, kind: EventKind, mode: InsertMode, rule: Rule<X>) {
        trace!(?kind, name = %rule.name, ?mode, "adding rule");
        let list = self.list_mut(kind);
        match mode {
            InsertMode::Append => list.direct.push(rule),
            InsertMode::Prepend => list.direct.insert(0, rule),
            InsertMode::Unique => {
                list.direct.retain(|r| r.name != rule.name);
                list.direct.push(rule);
            }
            InsertMode::PrependUnique => {
                list.direct.retain(|r| r.name != rule.name);
                list.direct.insert(0, rule);
            }
        }
    }

    /// Add a batched rule to `kind`'s parallel list.
    pub fn add_batched_rule(&mut self, kind: EventKind, mode: InsertMode, rule: Rule<X>) {
        let list = self.list_mut(kind);
        match mode {
            InsertMode::Append => list.batched.push(rule),
            InsertMode::Prepend => list.batched.insert(0, rule),
            InsertMode::Unique => {
                list.batched.retain(|r| r.name != rule.name);
                list.batched.push(rule);
            }
            InsertMode::PrependUnique => {
                list.batched.retain(|r| r.name != rule.name);
                list.batched.insert(0, rule);
            }
        }
    }

    /// Remove every rule named `name` from `kind`'s direct and batched lists.
    pub fn remove_rule(&mut self, kind: EventKind, name: &str) {
        if let Some(list) = self.lists.get_mut(&kind) {
            list.direct.retain(|r| r.name != name);
            list.batched.retain(|r| r.name != name);
        }
    }

    /// Apply every direct rule registered for `kind` in order, combining results via
    /// pass-through. A list that runs to completion (every rule's pass-through lets the
    /// next one run) reports `true`; a list stopped early by `No` reports `false`; a
    /// list stopped early by an `IfTrue`/`IfFalse` mismatch reports that rule's result,
    /// negated in the `IfFalse` case. Increments `kind`'s batch counter exactly once.
    ///
    /// Kind 0 (`EventKind::Error`) ignores `crash_on_errors` entirely here; the caller
    /// (`World`) is responsible for aborting when that config flag is set, since only
    /// it has access to shutdown sequencing.
    pub fn apply(&mut self, state: &mut X, kind: EventKind, win: Option<Xid>) -> Result<bool> {
        if self.reentry_depth >= self.max_reentry_depth {
            return Err(Error::Raw(format!(
                "rule re-entry depth exceeded for {kind:?}"
            )));
        }
        self.reentry_depth += 1;
        let result = self.apply_inner(state, kind, win);
        self.reentry_depth -= 1;
        result
    }

    fn apply_inner(&mut self, state: &mut X, kind: EventKind, win: Option<Xid>) -> Result<bool> {
        let list = self.list_mut(kind);
        list.batch_counter += 1;

        // Whether the list ran to completion (`true`) or was stopped early by some
        // rule's pass-through tag — stopping early carries its own return value,
        // independent of what the *next* rule (which never ran) would have said.
        let mut outcome = true;
        // Rules are temporarily taken out of the table so a rule may itself call
        // `apply` (re-entrancy) without conflicting with this iteration's borrow.
        let mut rules = std::mem::take(&mut self.list_mut(kind).direct);
        for rule in rules.iter_mut() {
            let result = (rule.func)(state, win)?;
            match rule.pass_through {
                PassThrough::No => {
                    outcome = false;
                    break;
                }
                PassThrough::Always => continue,
                PassThrough::IfTrue => {
                    if !result {
                        outcome = result;
                        break;
                    }
                }
                PassThrough::IfFalse => {
                    if result {
                        outcome = !result;
                        break;
                    }
                }
            }
        }
        self.list_mut(kind).direct = rules;
        Ok(outcome)
    }

    /// Fire every batched rule for `kind` if its counter is non-zero, then reset the
    /// counter. Batched rules never abort the cycle early regardless of return value.
    pub fn flush_batched(&mut self, state: &mut X, kind: EventKind) -> Result<()> {
        let counter = self.list_mut(kind).batch_counter;
        if counter == 0 {
            return Ok(());
        }
        let mut rules = std::mem::take(&mut self.list_mut(kind).batched);
        for rule in rules.iter_mut() {
            (rule.func)(state, None)?;
        }
        let list = self.list_mut(kind);
        list.batched = rules;
        list.batch_counter = 0;
        Ok(())
    }

    /// The current batch counter for `kind`, for tests and diagnostics.
    pub fn batch_counter(&self, kind: EventKind) -> u32 {
        self.lists.get(&kind).map(|l| l.batch_counter).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_no_stops_the_list() {
        let mut table: RuleTable<Vec<&'static str>> = RuleTable::default();
        table.add_rule(
            EventKind::MapRequest,
            InsertMode::Append,
            Rule::new("first", PassThrough::No, |s: &mut Vec<&'static str>, _| {
                s.push("first");
                Ok(true)
            }),
        );
        table.add_rule(
            EventKind::MapRequest,
            InsertMode::Append,
            Rule::new("second", PassThrough::Always, |s: &mut Vec<&'static str>, _| {
                s.push("second");
                Ok(true)
            }),
        );

        let mut state = Vec::new();
        let handled = table.apply(&mut state, EventKind::MapRequest, None).unwrap();
        assert_eq!(state, vec!["first"]);
        assert!(!handled, "PassThrough::No must report false regardless of the rule's own result");
    }

    #[test]
    fn a_list_that_runs_to_completion_reports_true_regardless_of_the_last_result() {
        let mut table: RuleTable<u32> = RuleTable::default();
        table.add_rule(
            EventKind::MapRequest,
            InsertMode::Append,
            Rule::new("always-false", PassThrough::Always, |_: &mut u32, _| Ok(false)),
        );

        let mut state = 0;
        let handled = table.apply(&mut state, EventKind::MapRequest, None).unwrap();
        assert!(handled, "completing the list must report true even though the only rule returned false");
    }

    #[test]
    fn if_false_mismatch_stops_and_reports_the_negated_result() {
        let mut table: RuleTable<u32> = RuleTable::default();
        table.add_rule(
            EventKind::MapRequest,
            InsertMode::Append,
            Rule::new("if-false", PassThrough::IfFalse, |_: &mut u32, _| Ok(true)),
        );

        let mut state = 0;
        let handled = table.apply(&mut state, EventKind::MapRequest, None).unwrap();
        assert!(!handled, "an IfFalse mismatch (result == true) must report the negated result (false)");
    }

    #[test]
    fn if_true_mismatch_stops_and_reports_the_raw_result() {
        let mut table: RuleTable<u32> = RuleTable::default();
        table.add_rule(
            EventKind::MapRequest,
            InsertMode::Append,
            Rule::new("if-true", PassThrough::IfTrue, |_: &mut u32, _| Ok(false)),
        );

        let mut state = 0;
        let handled = table.apply(&mut state, EventKind::MapRequest, None).unwrap();
        assert!(!handled, "an IfTrue mismatch (result == false) must report that raw result");
    }

    #[test]
    fn unique_insert_replaces_same_named_rule() {
        let mut table: RuleTable<u32> = RuleTable::default();
        table.add_rule(
            EventKind::Idle,
            InsertMode::Unique,
            Rule::new("only", PassThrough::Always, |s: &mut u32, _| {
                *s += 1;
                Ok(true)
            }),
        );
        table.add_rule(
            EventKind::Idle,
            InsertMode::Unique,
            Rule::new("only", PassThrough::Always, |s: &mut u32, _| {
                *s += 100;
                Ok(true)
            }),
        );

        let mut state = 0;
        table.apply(&mut state, EventKind::Idle, None).unwrap();
        assert_eq!(state, 100);
    }

    #[test]
    fn batch_counter_resets_after_flush() {
        let mut table: RuleTable<u32> = RuleTable::default();
        table.add_rule(
            EventKind::Periodic,
            InsertMode::Append,
            Rule::new("noop", PassThrough::Always, |_: &mut u32, _| Ok(true)),
        );
        let mut state = 0;
        table.apply(&mut state, EventKind::Periodic, None).unwrap();
        assert_eq!(table.batch_counter(EventKind::Periodic), 1);
        table.flush_batched(&mut state, EventKind::Periodic).unwrap();
        assert_eq!(table.batch_counter(EventKind::Periodic), 0);
    }
}
