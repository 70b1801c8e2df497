//! Scoped `$name` substitution.
//!
//! Variables are visible in the section that binds them and in every
//! descendant; an inner binding shadows an outer one. A reference is `$`
//! followed by the longest run of identifier characters, so `$vx` never
//! matches a variable named `v`. Unknown references stay literal, and
//! substituted text is not scanned again.

use crate::section::Section;
use std::collections::HashMap;

/// Resolve every variable reference in the tree, in place.
pub fn substitute(root: &mut Section) {
    substitute_in(root, &HashMap::new());
}

fn substitute_in(section: &mut Section, inherited: &HashMap<String, String>) {
    let mut scope = inherited.clone();
    for (name, value) in section.variables() {
        scope.insert(name.clone(), value.clone());
    }

    for value in section.values_mut() {
        if value.contains('$') {
            *value = expand(value, &scope);
        }
    }

    for child in section.children_mut() {
        substitute_in(child, &scope);
    }
}

/// Replace each `$name` in `text` with its value from `scope`.
pub fn expand(text: &str, scope: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let name_start = start + 1;
        let mut name_end = name_start;
        while let Some(&(idx, next)) = chars.peek() {
            if !is_identifier_char(next) {
                break;
            }
            name_end = idx + next.len_utf8();
            chars.next();
        }

        let name = &text[name_start..name_end];
        match scope.get(name) {
            Some(value) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push('$');
                out.push_str(name);
            }
        }
    }

    out
}

/// Characters allowed in a variable name.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_expand_suffix_reference() {
        assert_eq!(expand("pre$v", &scope(&[("v", "x")])), "prex");
    }

    #[test]
    fn test_expand_respects_name_boundary() {
        assert_eq!(expand("$vx", &scope(&[("v", "x")])), "$vx");
        assert_eq!(expand("$v-lts", &scope(&[("v", "linux")])), "linux-lts");
    }

    #[test]
    fn test_expand_unknown_and_bare_dollar() {
        let vars = scope(&[("a", "1")]);
        assert_eq!(expand("$unknown", &vars), "$unknown");
        assert_eq!(expand("cost $ 5", &vars), "cost $ 5");
        assert_eq!(expand("trailing$", &vars), "trailing$");
    }

    #[test]
    fn test_expand_is_single_pass() {
        let vars = scope(&[("a", "$b"), ("b", "nope")]);
        assert_eq!(expand("$a", &vars), "$b");
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut inner = Section::new();
        inner.bind("name", "inner");
        inner.push_value("key", "$name");

        let mut root = Section::new();
        root.bind("name", "outer");
        root.bind("other", "kept");
        root.push_value("key", "$name");
        inner.push_value("other", "$other");
        root.push_child("child", inner);

        substitute(&mut root);

        assert_eq!(root.get("key"), ["outer"]);
        let child = &root.child("child")[0];
        assert_eq!(child.get("key"), ["inner"]);
        assert_eq!(child.get("other"), ["kept"]);
    }

    #[test]
    fn test_sibling_bindings_do_not_leak() {
        let mut first = Section::new();
        first.bind("x", "1");
        let mut second = Section::new();
        second.push_value("key", "$x");

        let mut root = Section::new();
        root.push_child("a", first);
        root.push_child("b", second);
        substitute(&mut root);

        assert_eq!(root.child("b")[0].get("key"), ["$x"]);
    }
}
