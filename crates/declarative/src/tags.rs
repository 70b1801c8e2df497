//! Tag-based selection of declared entries.
//!
//! An entry is `names[, clause]`. The clause is a whitespace-separated list
//! of `+tag` (include when the run has the tag) and `+!tag` (include only
//! when the run explicitly has the tag). The run's [`TagSet`] always starts
//! with `+default`; `-default` turns off every entry that is not explicitly
//! selected.

use log::warn;

/// Pseudo-tag governing entries without an explicit match.
pub const DEFAULT_TAG: &str = "default";

/// Tag added by `--bare` runs.
pub const BARE_TAG: &str = "bare";

/// The signed tags active for one run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl Default for TagSet {
    fn default() -> Self {
        Self::new([format!("+{DEFAULT_TAG}")])
    }
}

impl TagSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the run's set: `+default`, then the requested tags, then
    /// `-default +bare` for bare runs. Unsigned tags are taken as `+tag`.
    pub fn for_run(requested: &[String], bare: bool) -> Self {
        let mut set = Self::default();
        for tag in requested {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            if tag.starts_with('+') || tag.starts_with('-') {
                set.tags.push(tag.to_string());
            } else {
                set.tags.push(format!("+{tag}"));
            }
        }
        if bare {
            set.tags.push(format!("-{DEFAULT_TAG}"));
            set.tags.push(format!("+{BARE_TAG}"));
        }
        set
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Explicit state of `name` in the set; the last mention wins.
    fn lookup(&self, name: &str) -> Option<bool> {
        self.tags.iter().rev().find_map(|tag| match tag.split_at_checked(1) {
            Some(("+", rest)) if rest == name => Some(true),
            Some(("-", rest)) if rest == name => Some(false),
            _ => None,
        })
    }

    fn default_toggle(&self) -> Option<bool> {
        self.lookup(DEFAULT_TAG)
    }

    /// Whether an entry with this tag clause is active.
    pub fn is_included(&self, clause: Option<&str>) -> bool {
        let clause = match clause.map(str::trim) {
            Some(clause) if !clause.is_empty() => clause,
            _ => return self.default_toggle().unwrap_or(true),
        };

        let mut included = true;
        for token in clause.split_whitespace() {
            let Some(name) = token.strip_prefix('+') else {
                warn!("Ignoring tag {token:?}: tags must start with '+'");
                continue;
            };

            if let Some(required) = name.strip_prefix('!') {
                included = self.lookup(required) == Some(true);
            } else if let Some(state) = self.lookup(name).or_else(|| self.default_toggle()) {
                included = state;
            }
        }
        included
    }

    /// Names of one entry, or `None` if the entry is not active.
    pub fn resolve_entry(&self, entry: &str) -> Option<Vec<String>> {
        let (names, clause) = split_entry(entry);
        self.is_included(clause)
            .then(|| names.split_whitespace().map(str::to_string).collect())
    }

    /// Names of every active entry, grouped per entry, in declaration order.
    pub fn resolve_entries<I, S>(&self, entries: I) -> Vec<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .filter_map(|entry| self.resolve_entry(entry.as_ref()))
            .filter(|names| !names.is_empty())
            .collect()
    }

    /// Names of every active entry, flattened in declaration order.
    pub fn resolve<I, S>(&self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolve_entries(entries).into_iter().flatten().collect()
    }
}

/// Split `names, clause` at the first comma.
pub fn split_entry(entry: &str) -> (&str, Option<&str>) {
    match entry.split_once(',') {
        Some((names, clause)) => (names.trim(), Some(clause.trim())),
        None => (entry.trim(), None),
    }
}
