//! The configuration tree.

use indexmap::IndexMap;

/// A node of the configuration tree.
///
/// Each node holds multi-valued keys, repeatable child sections and the
/// variables bound inside it. All three keep insertion order, and the order
/// of values under one key is significant (later kernel entries win, hooks
/// run in declaration order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    values: IndexMap<String, Vec<String>>,
    children: IndexMap<String, Vec<Section>>,
    variables: IndexMap<String, String>,
}

impl Section {
    /// Create an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the section has no values, children or variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty() && self.variables.is_empty()
    }

    /// All keys and their values.
    pub fn values(&self) -> &IndexMap<String, Vec<String>> {
        &self.values
    }

    /// All child sections grouped by name.
    pub fn children(&self) -> &IndexMap<String, Vec<Section>> {
        &self.children
    }

    /// Variables bound directly in this section.
    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    /// Values of `key` in this section only.
    pub fn get(&self, key: &str) -> &[String] {
        self.values.get(key).map_or(&[], Vec::as_slice)
    }

    /// Child sections named `name` directly under this section.
    pub fn child(&self, name: &str) -> &[Section] {
        self.children.get(name).map_or(&[], Vec::as_slice)
    }

    /// Append a value to `key`.
    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Append a child section under `name`.
    pub fn push_child(&mut self, name: impl Into<String>, child: Section) {
        self.children.entry(name.into()).or_default().push(child);
    }

    /// Bind a variable in this section's scope.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.values.values_mut().flatten()
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.children.values_mut().flatten()
    }

    // ========================================================================
    // Path queries
    // ========================================================================

    /// Every section reached by walking `path` (`a/b/c`), in document order.
    ///
    /// Each component matches every repeat of that child name. An empty path
    /// yields this section.
    pub fn sections(&self, path: &str) -> Vec<&Section> {
        let mut current = vec![self];
        for name in path.split('/').filter(|c| !c.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|section| section.child(name))
                .collect();
        }
        current
    }

    /// Every value of the key addressed by `path`, across all matching sections.
    ///
    /// The last path component is the key, the rest are section names:
    /// `packages/pacman/package` collects `package` from every `pacman`
    /// section inside every `packages` section.
    pub fn get_all(&self, path: &str) -> Vec<&str> {
        let (prefix, key) = split_path(path);
        self.sections(prefix)
            .into_iter()
            .flat_map(|section| section.get(key))
            .map(String::as_str)
            .collect()
    }

    /// The first non-empty value of the key addressed by `path`.
    pub fn get_first(&self, path: &str) -> Option<&str> {
        self.get_all(path).into_iter().find(|value| !value.is_empty())
    }

    /// Whether any section on `path` declares the key.
    pub fn contains(&self, path: &str) -> bool {
        let (prefix, key) = split_path(path);
        self.sections(prefix)
            .iter()
            .any(|section| section.values.contains_key(key))
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages_tree() -> Section {
        let mut first = Section::new();
        first.push_value("package", "git");
        first.push_value("package", "");
        let mut second = Section::new();
        second.push_value("package", "vim");
        second.push_value("helper", "paru");

        let mut packages = Section::new();
        packages.push_child("pacman", first);
        packages.push_child("pacman", second);

        let mut root = Section::new();
        root.push_child("packages", packages);
        root
    }

    #[test]
    fn test_get_all_spans_repeated_sections() {
        let root = packages_tree();
        assert_eq!(
            root.get_all("packages/pacman/package"),
            vec!["git", "", "vim"]
        );
    }

    #[test]
    fn test_get_first_skips_empty_values() {
        let mut root = Section::new();
        root.push_value("kernel", "");
        root.push_value("kernel", "linux");
        assert_eq!(root.get_first("kernel"), Some("linux"));
        assert_eq!(root.get_first("missing"), None);
    }

    #[test]
    fn test_sections_by_path() {
        let root = packages_tree();
        assert_eq!(root.sections("packages/pacman").len(), 2);
        assert_eq!(root.sections("").len(), 1);
        assert!(root.sections("packages/aur").is_empty());
    }

    #[test]
    fn test_contains() {
        let root = packages_tree();
        assert!(root.contains("packages/pacman/helper"));
        assert!(!root.contains("packages/pacman/missing"));
    }

    #[test]
    fn test_values_keep_insertion_order() {
        let mut section = Section::new();
        section.push_value("b", "1");
        section.push_value("a", "2");
        section.push_value("b", "3");
        let keys: Vec<_> = section.values().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(section.get("b"), ["1", "3"]);
    }
}
