//! Diff engine.
//!
//! Compares rendered [`CommandPair`]s against the normalized running
//! configuration and produces the ordered VRP commands needed to converge.
//! Every presence test is restricted to the block of the pair's context, so
//! ` description uplink` under one interface never satisfies the same line
//! under another.

use std::collections::HashSet;
use std::fmt;

use log::{debug, trace};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::QUIT_COMMAND;
use crate::error::ReconcileError;
use crate::intent::DesiredState;
use crate::normalize::{Block, ConfigLine};
use crate::render::{CommandPair, UNDO_RULES, UndoRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    Add,
    Remove,
}

/// One configuration change, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PreviewEntry {
    pub action: DiffAction,
    /// Command issued for this change: the apply line for additions, the
    /// undo line for removals.
    pub line: String,
    /// Parent path the command is issued under.
    pub context: Vec<String>,
    /// Running-config lines a removal takes away, or that an addition
    /// overwrites in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retracted: Vec<String>,
}

impl PreviewEntry {
    fn add(context: &[String], line: &str, overwritten: Vec<String>) -> Self {
        Self {
            action: DiffAction::Add,
            line: line.to_string(),
            context: context.to_vec(),
            retracted: overwritten,
        }
    }

    fn remove(context: &[String], line: &str, retracted: Vec<String>) -> Self {
        Self {
            action: DiffAction::Remove,
            line: line.to_string(),
            context: context.to_vec(),
            retracted,
        }
    }
}

impl fmt::Display for PreviewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.action {
            DiffAction::Add => '+',
            DiffAction::Remove => '-',
        };
        if self.context.is_empty() {
            write!(f, "{sign} {}", self.line)
        } else {
            write!(f, "{sign} [{}] {}", self.context.join(" > "), self.line)
        }
    }
}

/// Outcome of one diff or reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DiffResult {
    /// Commands to push, in order, including context entries and the
    /// optional trailing save.
    pub commands: Vec<String>,
    /// True iff at least one configuration change is needed.
    pub changed: bool,
    pub preview: Vec<PreviewEntry>,
    /// The commands were computed for a dry run and must not be pushed.
    pub dry_run: bool,
    /// A save command was appended.
    pub saved: bool,
}

impl DiffResult {
    /// Commands without the trailing save.
    pub fn config_commands(&self) -> &[String] {
        match (self.saved, self.commands.split_last()) {
            (true, Some((_, rest))) => rest,
            _ => &self.commands,
        }
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.preview {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Commands moving the CLI from one context path to another.
///
/// Leaving a view takes one `quit` per level; entering only replays the
/// parent lines beyond the common prefix.
pub(crate) fn context_transition(from: &[String], to: &[String]) -> Vec<String> {
    let common = from
        .iter()
        .zip(to)
        .take_while(|(a, b)| a == b)
        .count();
    let mut commands: Vec<String> = (common..from.len())
        .map(|_| QUIT_COMMAND.to_string())
        .collect();
    commands.extend(to[common..].iter().cloned());
    commands
}

/// Pending edits and the running-config lines already accounted for.
#[derive(Default)]
struct Plan {
    removals: Vec<PreviewEntry>,
    additions: Vec<PreviewEntry>,
    claimed: HashSet<(Vec<String>, String)>,
}

impl Plan {
    fn claim(&mut self, context: &[String], text: &str) {
        self.claimed.insert((context.to_vec(), text.to_string()));
    }

    fn is_claimed(&self, context: &[String], text: &str) -> bool {
        self.claimed.contains(&(context.to_vec(), text.to_string()))
    }
}

/// Diff engine bound to a set of undo rules.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine<'r> {
    undo_rules: &'r UndoRules,
}

impl<'r> DiffEngine<'r> {
    pub fn new(undo_rules: &'r UndoRules) -> Self {
        Self { undo_rules }
    }

    /// Computes the commands converging `current` to `desired`.
    ///
    /// Pairs are validated before anything is emitted, so an unsupported
    /// removal never yields a partial command list.
    pub fn diff(
        &self,
        current: &[ConfigLine],
        desired: &[CommandPair],
    ) -> Result<DiffResult, ReconcileError> {
        validate(desired)?;

        let mut plan = Plan::default();
        for pair in desired {
            let block = Block::locate(current, &pair.context);
            match pair.state {
                DesiredState::Keep => plan.claim(&pair.context, &pair.apply),
                DesiredState::Present => self.converge_present(pair, block, &mut plan),
                DesiredState::Absent => retract_absent(pair, block, &mut plan),
            }
        }
        self.prune_exclusive(current, desired, &mut plan);

        let Plan {
            removals,
            additions,
            ..
        } = plan;
        let mut seen = HashSet::new();
        let preview: Vec<PreviewEntry> = removals
            .into_iter()
            .chain(additions)
            .filter(|entry| seen.insert((entry.context.clone(), entry.line.clone())))
            .collect();

        let mut commands = Vec::new();
        let mut path: &[String] = &[];
        for entry in &preview {
            commands.extend(context_transition(path, &entry.context));
            commands.push(entry.line.clone());
            path = entry.context.as_slice();
        }
        for command in &commands {
            debug!("Emitting '{}'", command);
        }

        Ok(DiffResult {
            changed: !preview.is_empty(),
            commands,
            preview,
            dry_run: false,
            saved: false,
        })
    }

    fn converge_present(&self, pair: &CommandPair, block: Option<Block<'_>>, plan: &mut Plan) {
        plan.claim(&pair.context, &pair.apply);
        if block.is_some_and(|b| b.contains(&pair.apply)) {
            trace!("'{}' already satisfied", pair.apply);
            return;
        }

        let mut overwritten = Vec::new();
        if let (Some(key), Some(block)) = (pair.key.as_deref(), block) {
            for stale in block.with_key(key) {
                plan.claim(&pair.context, stale.text());
                // Order-insensitive commands overwrite the old value in place.
                if pair.order_insensitive {
                    overwritten.push(stale.text().to_string());
                    continue;
                }
                match self.undo_rules.undo_for(stale.text()) {
                    Some(undo) => plan.removals.push(PreviewEntry::remove(
                        &pair.context,
                        &undo,
                        vec![stale.text().to_string()],
                    )),
                    None => debug!("Stale '{}' has no undo form, left in place", stale.text()),
                }
            }
        }

        plan.additions
            .push(PreviewEntry::add(&pair.context, &pair.apply, overwritten));
    }

    /// Retracts unclaimed children of replaced contexts and owned blocks.
    fn prune_exclusive(&self, current: &[ConfigLine], desired: &[CommandPair], plan: &mut Plan) {
        let mut contexts: Vec<Vec<String>> = Vec::new();
        for pair in desired {
            let owned = if pair.exclusive {
                pair.context.clone()
            } else if pair.owns_block && pair.state == DesiredState::Present {
                let mut path = pair.context.clone();
                path.push(pair.apply.clone());
                path
            } else {
                continue;
            };
            if !contexts.contains(&owned) {
                contexts.push(owned);
            }
        }

        for context in &contexts {
            let Some(block) = Block::locate(current, context) else {
                continue;
            };
            let unclaimed: Vec<&ConfigLine> = block
                .children()
                .filter(|line| !line.is_separator() && !plan.is_claimed(context, line.text()))
                .collect();
            for line in unclaimed {
                match self.undo_rules.undo_for(line.text()) {
                    Some(undo) => {
                        plan.claim(context, line.text());
                        plan.removals.push(PreviewEntry::remove(
                            context,
                            &undo,
                            vec![line.text().to_string()],
                        ));
                    }
                    None => debug!(
                        "Unclaimed '{}' under {:?} has no undo form, left in place",
                        line.text(),
                        context
                    ),
                }
            }
        }
    }
}

fn retract_absent(pair: &CommandPair, block: Option<Block<'_>>, plan: &mut Plan) {
    let Some(block) = block else {
        return;
    };
    let Some(undo) = pair.undo.as_deref() else {
        return;
    };
    let present: Vec<String> = match pair.key.as_deref() {
        Some(key) => block
            .with_key(key)
            .map(|line| line.text().to_string())
            .collect(),
        None => block
            .children()
            .filter(|line| line.text() == pair.apply)
            .map(|line| line.text().to_string())
            .collect(),
    };
    if present.is_empty() {
        trace!("'{}' already absent", pair.apply);
        return;
    }
    for text in &present {
        plan.claim(&pair.context, text);
    }
    let entry = PreviewEntry::remove(&pair.context, undo, present);
    if pair.order_insensitive {
        plan.additions.push(entry);
    } else {
        plan.removals.push(entry);
    }
}

fn validate(desired: &[CommandPair]) -> Result<(), ReconcileError> {
    for pair in desired {
        if pair.state == DesiredState::Absent && pair.undo.is_none() {
            return Err(ReconcileError::UndoUnsupported {
                kind: pair.kind.clone(),
                command: pair.apply.clone(),
            });
        }
        if pair.exclusive && pair.context.is_empty() {
            return Err(ReconcileError::InvalidIntent {
                kind: pair.kind.clone(),
                reason: "replace requires a parent context".to_string(),
            });
        }
    }
    Ok(())
}

/// Diffs with the built-in undo rules.
pub fn diff(current: &[ConfigLine], desired: &[CommandPair]) -> Result<DiffResult, ReconcileError> {
    DiffEngine::new(&UNDO_RULES).diff(current, desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_text;

    fn pair(context: &[&str], apply: &str) -> CommandPair {
        CommandPair {
            kind: "config_line".to_string(),
            context: context.iter().map(|s| s.to_string()).collect(),
            apply: apply.to_string(),
            undo: UNDO_RULES.undo_for(apply),
            state: DesiredState::Present,
            key: None,
            order_insensitive: false,
            exclusive: false,
            owns_block: false,
        }
    }

    fn absent(mut pair: CommandPair) -> CommandPair {
        pair.state = DesiredState::Absent;
        pair
    }

    fn keyed(mut pair: CommandPair, key: &str) -> CommandPair {
        pair.key = Some(key.to_string());
        pair
    }

    #[test]
    fn satisfied_pair_emits_nothing() {
        let current = normalize_text("ntp unicast-server 10.0.0.1");
        let result = diff(&current, &[pair(&[], "ntp unicast-server  10.0.0.1")]).expect("diff");
        assert!(!result.changed);
        assert!(result.commands.is_empty());
        assert!(result.preview.is_empty());
    }

    #[test]
    fn missing_scoped_line_enters_context() {
        let current = normalize_text("interface GigabitEthernet0/0/1\n port link-type trunk");
        let result = diff(
            &current,
            &[pair(&["interface GigabitEthernet0/0/1"], "stp edged-port enable")],
        )
        .expect("diff");
        assert_eq!(
            result.commands,
            vec!["interface GigabitEthernet0/0/1", "stp edged-port enable"]
        );
        assert!(result.changed);
    }

    #[test]
    fn line_in_another_block_does_not_satisfy() {
        let current = normalize_text(
            "interface GigabitEthernet0/0/1\n description uplink\ninterface GigabitEthernet0/0/2",
        );
        let result = diff(
            &current,
            &[pair(&["interface GigabitEthernet0/0/2"], "description uplink")],
        )
        .expect("diff");
        assert_eq!(result.preview.len(), 1);
        assert_eq!(result.preview[0].context, vec!["interface GigabitEthernet0/0/2"]);
    }

    #[test]
    fn removals_precede_additions() {
        let current = normalize_text("dns server 10.0.0.9");
        let desired = vec![
            pair(&[], "dns server 10.0.0.1"),
            absent(pair(&[], "dns server 10.0.0.9")),
        ];
        let result = diff(&current, &desired).expect("diff");
        assert_eq!(
            result.commands,
            vec!["undo dns server 10.0.0.9", "dns server 10.0.0.1"]
        );
    }

    #[test]
    fn stale_keyed_value_is_retracted_before_apply() {
        let current = normalize_text("interface Eth-Trunk1\n port link-type access");
        let desired = vec![keyed(
            pair(&["interface Eth-Trunk1"], "port link-type trunk"),
            "port link-type",
        )];
        let result = diff(&current, &desired).expect("diff");
        assert_eq!(
            result.commands,
            vec!["interface Eth-Trunk1", "undo port link-type", "port link-type trunk"]
        );
        assert_eq!(result.preview[0].retracted, vec!["port link-type access"]);
    }

    #[test]
    fn order_insensitive_value_is_overwritten_in_place() {
        let current = normalize_text("vlan 20\n name Old");
        let mut rename = keyed(pair(&["vlan 20"], "name Eng"), "name");
        rename.order_insensitive = true;
        let result = diff(&current, &[rename]).expect("diff");
        assert_eq!(result.commands, vec!["vlan 20", "name Eng"]);
        assert_eq!(result.preview[0].action, DiffAction::Add);
        assert_eq!(result.preview[0].retracted, vec!["name Old"]);
    }

    #[test]
    fn order_insensitive_removal_keeps_intent_position() {
        let current = normalize_text(
            "dns server 10.0.0.9
interface GigabitEthernet0/0/1
 description uplink",
        );
        let mut clear = keyed(
            absent(pair(&["interface GigabitEthernet0/0/1"], "description")),
            "description",
        );
        clear.undo = Some("undo description".to_string());
        clear.order_insensitive = true;
        let desired = vec![
            pair(&[], "ntp unicast-server 10.0.0.2"),
            clear,
            absent(pair(&[], "dns server 10.0.0.9")),
            pair(&[], "stp bpdu-protection"),
        ];
        let result = diff(&current, &desired).expect("diff");
        assert_eq!(
            result.commands,
            vec![
                "undo dns server 10.0.0.9",
                "ntp unicast-server 10.0.0.2",
                "interface GigabitEthernet0/0/1",
                "undo description",
                "quit",
                "stp bpdu-protection",
            ]
        );
    }

    #[test]
    fn owned_block_retracts_unclaimed_body() {
        let current = normalize_text("vlan 20\n name Old\nvlan 30\n name Voice");
        let mut vlan = pair(&[], "vlan 20");
        vlan.owns_block = true;
        let result = diff(&current, &[vlan.clone()]).expect("diff");
        assert_eq!(result.commands, vec!["vlan 20", "undo name"]);
        assert_eq!(result.preview[0].retracted, vec!["name Old"]);

        let mut rename = keyed(pair(&["vlan 20"], "name Eng"), "name");
        rename.order_insensitive = true;
        let result = diff(&current, &[vlan.clone(), rename]).expect("diff");
        assert_eq!(result.commands, vec!["vlan 20", "name Eng"]);

        let result = diff(&[], &[vlan]).expect("diff");
        assert_eq!(result.commands, vec!["vlan 20"]);
    }

    #[test]
    fn keyed_absence_retracts_any_value() {
        let current = normalize_text("interface GigabitEthernet0/0/1\n description old uplink");
        let mut clear = keyed(
            absent(pair(&["interface GigabitEthernet0/0/1"], "description")),
            "description",
        );
        clear.undo = Some("undo description".to_string());
        let result = diff(&current, &[clear]).expect("diff");
        assert_eq!(
            result.commands,
            vec!["interface GigabitEthernet0/0/1", "undo description"]
        );
        assert_eq!(result.preview[0].retracted, vec!["description old uplink"]);
    }

    #[test]
    fn absent_pair_without_undo_is_rejected_before_emitting() {
        let current = normalize_text("ntp unicast-server 10.0.0.1");
        let mut locked = absent(pair(&[], "ntp unicast-server 10.0.0.1"));
        locked.undo = None;
        let desired = vec![pair(&[], "dns server 10.0.0.1"), locked];
        let err = diff(&current, &desired).expect_err("no undo");
        assert!(matches!(err, ReconcileError::UndoUnsupported { .. }));
    }

    #[test]
    fn duplicate_applies_are_emitted_once() {
        let desired = vec![
            pair(&[], "stp bpdu-protection"),
            pair(&[], "stp  bpdu-protection"),
        ];
        let desired: Vec<CommandPair> = desired
            .into_iter()
            .map(|mut p| {
                p.apply = crate::normalize::collapse_whitespace(&p.apply);
                p
            })
            .collect();
        let result = diff(&[], &desired).expect("diff");
        assert_eq!(result.commands, vec!["stp bpdu-protection"]);
    }

    #[test]
    fn switching_contexts_quits_the_previous_view() {
        let desired = vec![
            pair(&["interface GigabitEthernet0/0/1"], "shutdown"),
            pair(&["interface GigabitEthernet0/0/2"], "shutdown"),
            pair(&[], "stp bpdu-protection"),
        ];
        let result = diff(&[], &desired).expect("diff");
        assert_eq!(
            result.commands,
            vec![
                "interface GigabitEthernet0/0/1",
                "shutdown",
                "quit",
                "interface GigabitEthernet0/0/2",
                "shutdown",
                "quit",
                "stp bpdu-protection",
            ]
        );
    }

    #[test]
    fn exclusive_context_prunes_unclaimed_children() {
        let current = normalize_text(
            "acl number 3000\n rule 5 permit ip\n rule 10 deny ip\n rule 15 permit tcp",
        );
        let mut keep_five = pair(&["acl number 3000"], "rule 5 permit ip");
        keep_five.exclusive = true;
        let mut keep_fifteen = pair(&["acl number 3000"], "rule 15 permit tcp");
        keep_fifteen.state = DesiredState::Keep;
        let result = diff(&current, &[keep_five, keep_fifteen]).expect("diff");
        assert_eq!(
            result.commands,
            vec!["acl number 3000", "undo rule 10 deny ip"]
        );
    }

    #[test]
    fn exclusive_root_is_rejected() {
        let mut everything = pair(&[], "sysname core");
        everything.exclusive = true;
        let err = diff(&[], &[everything]).expect_err("root replace");
        assert!(matches!(err, ReconcileError::InvalidIntent { .. }));
    }

    #[test]
    fn context_transition_keeps_common_prefix() {
        let from = vec!["bgp 65000".to_string(), "ipv4-family unicast".to_string()];
        let to = vec!["bgp 65000".to_string(), "ipv4-family vpn-instance a".to_string()];
        assert_eq!(
            context_transition(&from, &to),
            vec!["quit", "ipv4-family vpn-instance a"]
        );
        assert!(context_transition(&to, &to).is_empty());
    }

    #[test]
    fn display_renders_signed_preview() {
        let current = normalize_text("dns server 10.0.0.9");
        let desired = vec![
            absent(pair(&[], "dns server 10.0.0.9")),
            pair(&["vlan 20"], "name Eng"),
        ];
        let result = diff(&current, &desired).expect("diff");
        assert_eq!(
            result.to_string(),
            "- undo dns server 10.0.0.9\n+ [vlan 20] name Eng\n"
        );
    }
}
