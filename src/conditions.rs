//! `wait_for` conditions over command outputs.
//!
//! A condition reads `result[<index>] contains <text>` or
//! `result[<index>] not contains <text>`; the text may be quoted.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(r"(?i)^\s*result\s*\[\s*(\d+)\s*\]\s+(not\s+)?contains\s+(.*?)\s*$") {
        Ok(re) => re,
        Err(err) => panic!("invalid CONDITION_RE regex: {err}"),
    }
});

/// How multiple conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Any,
    #[default]
    All,
}

/// One parsed condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    /// Index into the command outputs.
    pub index: usize,
    pub needle: String,
    pub negated: bool,
}

impl Condition {
    /// Parses a condition expression, `None` when it does not fit the grammar.
    pub fn parse(expr: &str) -> Option<Self> {
        let caps = CONDITION_RE.captures(expr)?;
        let index = caps.get(1)?.as_str().parse().ok()?;
        let needle = caps
            .get(3)?
            .as_str()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        Some(Self {
            index,
            needle,
            negated: caps.get(2).is_some(),
        })
    }

    /// False when the referenced output does not exist.
    pub fn holds<S: AsRef<str>>(&self, outputs: &[S]) -> bool {
        outputs
            .get(self.index)
            .map(|output| output.as_ref().contains(&self.needle) != self.negated)
            .unwrap_or(false)
    }
}

/// Evaluates raw condition expressions against command outputs.
///
/// No conditions always holds; an unparseable expression never does.
pub fn conditions_met<S: AsRef<str>, C: AsRef<str>>(
    outputs: &[S],
    conditions: &[C],
    mode: MatchMode,
) -> bool {
    if conditions.is_empty() {
        return true;
    }
    let mut results = conditions.iter().map(|expr| {
        Condition::parse(expr.as_ref())
            .map(|cond| cond.holds(outputs))
            .unwrap_or(false)
    });
    match mode {
        MatchMode::All => results.all(|ok| ok),
        MatchMode::Any => results.any(|ok| ok),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUTS: [&str; 2] = [
        "MEth0/0/0 192.168.1.10 up",
        "0.0.0.0/0 Static 60 0 RD 192.168.1.1",
    ];

    #[test]
    fn condition_pattern_compiles() {
        assert_eq!(CONDITION_RE.captures_len(), 4);
    }

    #[test]
    fn parses_quoted_and_negated_conditions() {
        let cond = Condition::parse("result[1] not contains \"Error\"").expect("parse");
        assert_eq!(cond.index, 1);
        assert_eq!(cond.needle, "Error");
        assert!(cond.negated);

        let cond = Condition::parse("result[0] contains 'MEth0/0/0'").expect("parse");
        assert!(!cond.negated);
        assert_eq!(cond.needle, "MEth0/0/0");
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(Condition::parse("result[x] contains OK").is_none());
        assert!(Condition::parse("output contains OK").is_none());
    }

    #[test]
    fn all_and_any_modes() {
        let conds = ["result[0] contains 'MEth0/0/0'", "result[1] contains 'Error'"];
        assert!(!conditions_met(&OUTPUTS, &conds, MatchMode::All));
        assert!(conditions_met(&OUTPUTS, &conds, MatchMode::Any));
    }

    #[test]
    fn negation_and_missing_outputs() {
        assert!(conditions_met(
            &OUTPUTS,
            &["result[1] not contains Error"],
            MatchMode::All
        ));
        assert!(!conditions_met(
            &OUTPUTS,
            &["result[5] not contains Error"],
            MatchMode::All
        ));
    }

    #[test]
    fn empty_condition_list_holds() {
        let none: [&str; 0] = [];
        assert!(conditions_met(&OUTPUTS, &none, MatchMode::Any));
    }
}
