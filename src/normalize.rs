//! Running configuration normalization.
//!
//! Converts captured `display current-configuration` text into comparable
//! [`ConfigLine`]s and groups them into indentation-scoped blocks, so that a
//! sub-command such as ` description uplink` is only ever compared against
//! the children of its own `interface` block.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// One normalized line of device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigLine {
    raw: String,
    text: String,
    depth: usize,
}

impl ConfigLine {
    /// Normalizes a single captured line.
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim_end();
        let depth = raw.chars().take_while(|c| c.is_whitespace()).count();
        Self {
            raw: raw.to_string(),
            text: collapse_whitespace(raw),
            depth,
        }
    }

    /// Original text without trailing whitespace.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed text with internal whitespace runs collapsed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of leading whitespace characters in the raw line.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// True for the `#` separators VRP prints between sections.
    pub fn is_separator(&self) -> bool {
        self.text == "#"
    }

    /// True when the line sets the attribute identified by `key`.
    pub fn has_key(&self, key: &str) -> bool {
        has_key(&self.text, key)
    }
}

/// Collapses runs of whitespace into single spaces and trims both ends.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `text` equals `key` or continues it with a new word.
pub(crate) fn has_key(text: &str, key: &str) -> bool {
    text.strip_prefix(key)
        .map(|rest| rest.is_empty() || rest.starts_with(' '))
        .unwrap_or(false)
}

/// Normalizes captured lines, preserving their order.
///
/// Fails only when a line is absent; any text is accepted on a best-effort
/// basis.
pub fn normalize<I, S>(raw_lines: I) -> Result<Vec<ConfigLine>, ReconcileError>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    raw_lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            line.map(|l| ConfigLine::new(l.as_ref()))
                .ok_or(ReconcileError::Normalization { index })
        })
        .collect()
}

/// Normalizes a whole captured output blob, dropping blank lines.
pub fn normalize_text(output: &str) -> Vec<ConfigLine> {
    output
        .lines()
        .map(ConfigLine::new)
        .filter(|line| !line.is_blank())
        .collect()
}

/// A contiguous indentation scope of the running configuration.
///
/// The root block spans the whole document; the block of a parent line spans
/// every following line indented deeper than the parent.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    span: &'a [ConfigLine],
}

impl<'a> Block<'a> {
    /// The whole document.
    pub fn root(lines: &'a [ConfigLine]) -> Self {
        Self { span: lines }
    }

    /// Descends through a parent path, e.g. `["interface GE0/0/1"]`.
    ///
    /// The empty path returns the root block itself.
    pub fn locate(lines: &'a [ConfigLine], parents: &[String]) -> Option<Self> {
        parents
            .iter()
            .try_fold(Self::root(lines), |block, parent| block.child(parent))
    }

    fn child_depth(&self) -> Option<usize> {
        self.span
            .iter()
            .filter(|line| !line.is_blank())
            .map(ConfigLine::depth)
            .min()
    }

    /// Direct children of this block, skipping blank lines.
    pub fn children(self) -> impl Iterator<Item = &'a ConfigLine> + 'a {
        let depth = self.child_depth();
        let span = self.span;
        span.iter()
            .filter(move |line| !line.is_blank() && Some(line.depth()) == depth)
    }

    /// The block opened by the direct child whose text matches `parent`.
    pub fn child(self, parent: &str) -> Option<Block<'a>> {
        let parent = collapse_whitespace(parent);
        let depth = self.child_depth()?;
        let start = self
            .span
            .iter()
            .position(|line| line.depth() == depth && line.text() == parent)?;
        let end = self.span[start + 1..]
            .iter()
            .position(|line| !line.is_blank() && line.depth() <= depth)
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.span.len());
        Some(Block {
            span: &self.span[start + 1..end],
        })
    }

    /// True when a direct child has exactly this normalized text.
    pub fn contains(&self, text: &str) -> bool {
        self.children().any(|line| line.text() == text)
    }

    /// Direct children setting the attribute identified by `key`.
    pub fn with_key<'k>(self, key: &'k str) -> impl Iterator<Item = &'a ConfigLine> + 'k
    where
        'a: 'k,
    {
        self.children().filter(move |line| line.has_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.children().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: &str = "#\nsysname core-sw1\n#\nvlan 20\n name   Eng\n#\ninterface GigabitEthernet0/0/1\n description uplink  \r\n port link-type trunk\n#\nreturn";

    #[test]
    fn line_keeps_raw_and_collapses_text() {
        let line = ConfigLine::new("  port   default vlan 20 \r");
        assert_eq!(line.raw(), "  port   default vlan 20");
        assert_eq!(line.text(), "port default vlan 20");
        assert_eq!(line.depth(), 2);
    }

    #[test]
    fn normalize_preserves_order() {
        let lines = normalize(["b", "a", " c"].into_iter().map(Some)).expect("normalize");
        let texts: Vec<&str> = lines.iter().map(ConfigLine::text).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
    }

    #[test]
    fn normalize_rejects_absent_line() {
        let err = normalize(vec![Some("vlan 20"), None]).expect_err("absent line");
        assert!(matches!(err, ReconcileError::Normalization { index: 1 }));
    }

    #[test]
    fn root_children_are_top_level_lines() {
        let lines = normalize_text(RUNNING);
        let root = Block::root(&lines);
        assert!(root.contains("vlan 20"));
        assert!(!root.contains("name Eng"));
        assert!(root.contains("sysname core-sw1"));
    }

    #[test]
    fn child_block_is_scoped_by_indentation() {
        let lines = normalize_text(RUNNING);
        let vlan = Block::locate(&lines, &["vlan 20".to_string()]).expect("vlan block");
        assert!(vlan.contains("name Eng"));
        assert!(!vlan.contains("description uplink"));

        let iface = Block::locate(&lines, &["interface  GigabitEthernet0/0/1".to_string()])
            .expect("interface block");
        assert!(iface.contains("description uplink"));
        assert_eq!(iface.with_key("port link-type").count(), 1);
        assert_eq!(iface.with_key("port").count(), 1);
        assert_eq!(iface.with_key("port link").count(), 0);
    }

    #[test]
    fn missing_parent_yields_none() {
        let lines = normalize_text(RUNNING);
        assert!(Block::locate(&lines, &["vlan 30".to_string()]).is_none());
        assert!(Block::locate(&[], &["vlan 30".to_string()]).is_none());
    }

    #[test]
    fn empty_block_has_no_children() {
        let lines = normalize_text("vlan 30\n#\nvlan 40");
        let vlan = Block::locate(&lines, &["vlan 30".to_string()]).expect("vlan block");
        assert!(vlan.is_empty());
    }
}
