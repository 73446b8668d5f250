//! Command rendering.
//!
//! The [`Renderer`] maps an intent kind to a pure function producing a
//! [`PairDraft`], then finishes it into a [`CommandPair`] by deriving the undo
//! form through [`UndoRules`]. The default undo form prefixes the apply
//! command with `undo`; irregular commands are handled by overrides keyed on
//! the shape of the rendered command, not on the intent kind, so an override
//! applies to every intent that happens to render that shape.

use std::collections::HashMap;

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::config::UNDO_TOKEN;
use crate::error::ReconcileError;
use crate::intent::{DesiredState, Intent};
use crate::normalize::{collapse_whitespace, has_key};

/// Built-in shape overrides: (pattern over the apply command, undo template).
///
/// A `None` template marks commands that cannot be undone.
const BUILTIN_UNDO_RULES: &[(&str, Option<&str>)] = &[
    (r"^clock timezone\s", Some("undo clock timezone")),
    (
        r"^clock daylight-saving-time\s",
        Some("undo clock daylight-saving-time"),
    ),
    (r"^port link-type\s", Some("undo port link-type")),
    (r"^port default vlan\s", Some("undo port default vlan")),
    (r"^port trunk pvid vlan\s", Some("undo port trunk pvid vlan")),
    (
        r"^ntp server source-interface\s",
        Some("undo ntp server source-interface"),
    ),
    (r"^description\s", Some("undo description")),
    (r"^name\s", Some("undo name")),
    (r"^speed\s", Some("undo speed")),
    (r"^mtu\s", Some("undo mtu")),
    (
        r"^local-user (?P<user>\S+) privilege level\s",
        Some("undo local-user $user privilege level"),
    ),
    (r"^local-user \S+ password\s", None),
];

/// Built-in undo rules, compiled once.
pub static UNDO_RULES: Lazy<UndoRules> = Lazy::new(UndoRules::builtin);

/// Built-in renderer with every catalog kind registered.
pub static RENDERER: Lazy<Renderer> = Lazy::new(Renderer::builtin);

#[derive(Debug, Clone)]
struct UndoRule {
    pattern: Regex,
    undo: Option<String>,
}

/// Ordered, shape-keyed undo overrides. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct UndoRules {
    rules: Vec<UndoRule>,
}

impl UndoRules {
    /// Rules with no overrides: every command uses the default undo form.
    pub fn empty() -> Self {
        Self::default()
    }

    fn builtin() -> Self {
        let rules = BUILTIN_UNDO_RULES
            .iter()
            .map(|(pattern, undo)| match Regex::new(pattern) {
                Ok(re) => UndoRule {
                    pattern: re,
                    undo: undo.map(str::to_string),
                },
                Err(err) => panic!("invalid builtin undo pattern {pattern}: {err}"),
            })
            .collect();
        Self { rules }
    }

    /// Appends an override. `undo` may reference named captures (`$user`);
    /// `None` marks the shape as not undoable.
    pub fn with_rule(mut self, pattern: &str, undo: Option<&str>) -> Result<Self, ReconcileError> {
        self.rules.push(UndoRule {
            pattern: Regex::new(pattern)?,
            undo: undo.map(str::to_string),
        });
        Ok(self)
    }

    /// Number of registered overrides.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Derives the undo form of a command.
    ///
    /// Commands that are already negations have no undo form.
    pub fn undo_for(&self, command: &str) -> Option<String> {
        let command = collapse_whitespace(command);
        if has_key(&command, UNDO_TOKEN) {
            return None;
        }
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(&command) {
                trace!("Undo override {} matched '{}'", rule.pattern, command);
                return rule.undo.as_ref().map(|template| {
                    let mut undo = String::new();
                    caps.expand(template, &mut undo);
                    undo
                });
            }
        }
        Some(format!("{UNDO_TOKEN} {command}"))
    }
}

/// A rendered command before its undo form is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDraft {
    pub context: Vec<String>,
    pub apply: String,
    pub state: DesiredState,
    pub key: Option<String>,
    pub order_insensitive: bool,
    pub exclusive: bool,
    pub owns_block: bool,
}

impl PairDraft {
    /// A command in system view.
    pub fn global(apply: impl Into<String>) -> Self {
        Self::scoped(Vec::new(), apply)
    }

    /// A command below a parent path.
    pub fn scoped(context: Vec<String>, apply: impl Into<String>) -> Self {
        Self {
            context,
            apply: collapse_whitespace(&apply.into()),
            state: DesiredState::Present,
            key: None,
            order_insensitive: false,
            exclusive: false,
            owns_block: false,
        }
    }

    pub fn state(mut self, state: DesiredState) -> Self {
        self.state = state;
        self
    }

    /// Identifies the attribute this command sets, e.g. `description`.
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(collapse_whitespace(&key.into()));
        self
    }

    /// The command overwrites any previous value in place.
    pub fn order_insensitive(mut self) -> Self {
        self.order_insensitive = true;
        self
    }

    /// The desired set owns the whole parent block.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// The apply line opens a block whose body the desired set owns.
    pub fn owns_block(mut self) -> Self {
        self.owns_block = true;
        self
    }
}

/// The rendered form of one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandPair {
    /// Intent kind that produced this pair.
    pub kind: String,
    /// Parent path, empty for system-view commands.
    pub context: Vec<String>,
    pub apply: String,
    /// `None` when the state cannot be removed, only replaced.
    pub undo: Option<String>,
    pub state: DesiredState,
    /// Attribute shape used to find stale values.
    pub key: Option<String>,
    pub order_insensitive: bool,
    pub exclusive: bool,
    /// The block opened by `apply` keeps only children claimed by other pairs.
    #[serde(default)]
    pub owns_block: bool,
}

/// Pure function rendering one intent kind.
pub type RenderFn = fn(&Intent) -> Result<PairDraft, ReconcileError>;

/// Registry of intent renderers plus the undo rules used to finish them.
#[derive(Debug, Clone)]
pub struct Renderer {
    kinds: HashMap<String, RenderFn>,
    undo_rules: UndoRules,
}

impl Renderer {
    /// A renderer with no kinds registered.
    pub fn new(undo_rules: UndoRules) -> Self {
        Self {
            kinds: HashMap::new(),
            undo_rules,
        }
    }

    /// A renderer with every built-in kind and undo override.
    pub fn builtin() -> Self {
        let mut renderer = Self::new(UNDO_RULES.clone());
        for (kind, render) in catalog::builtin_renderers() {
            renderer.register(kind, render);
        }
        renderer
    }

    /// Registers a kind, returning the renderer it replaced.
    pub fn register(&mut self, kind: impl Into<String>, render: RenderFn) -> Option<RenderFn> {
        self.kinds.insert(kind.into(), render)
    }

    pub fn with_undo_rules(mut self, undo_rules: UndoRules) -> Self {
        self.undo_rules = undo_rules;
        self
    }

    pub fn undo_rules(&self) -> &UndoRules {
        &self.undo_rules
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Renders one intent.
    pub fn render(&self, intent: &Intent) -> Result<CommandPair, ReconcileError> {
        let render = self
            .kinds
            .get(&intent.kind)
            .ok_or_else(|| ReconcileError::UnsupportedIntent {
                kind: intent.kind.clone(),
            })?;
        let draft = render(intent)?;
        let undo = self.undo_rules.undo_for(&draft.apply);
        debug!(
            "Rendered {} -> '{}' (undo: {:?}, context: {:?})",
            intent.kind, draft.apply, undo, draft.context
        );
        Ok(CommandPair {
            kind: intent.kind.clone(),
            context: draft.context,
            apply: draft.apply,
            undo,
            state: draft.state,
            key: draft.key,
            order_insensitive: draft.order_insensitive,
            exclusive: draft.exclusive,
            owns_block: draft.owns_block,
        })
    }

    /// Renders every intent, failing on the first one that cannot be rendered.
    pub fn render_all(&self, intents: &[Intent]) -> Result<Vec<CommandPair>, ReconcileError> {
        intents.iter().map(|intent| self.render(intent)).collect()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::builtin()
    }
}
