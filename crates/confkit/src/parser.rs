//! Parser for the declarch configuration language.
//!
//! The language is line oriented:
//! ```text
//! # comment
//! $kernel = linux          # variable bound in the enclosing section
//! source = extra.conf      # inline another file here
//! essentials {
//!     kernel = $kernel
//!     kernel = linux-lts, +lts
//! }
//! ```
//!
//! `source` lines are expanded before any structure is built, so inlining a
//! file is equivalent to pasting its lines in place.

use crate::error::{Error, Result};
use crate::section::Section;
use crate::substitute::{is_identifier_char, substitute};
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Key whose value names a file to inline.
pub const SOURCE_KEY: &str = "source";

/// Parse a document from a file path.
///
/// Relative `source` paths are resolved against the directory of the file
/// that contains them.
pub fn parse_file(path: &Path) -> Result<Section> {
    let mut loader = Loader::default();
    let lines = loader.load(path)?;
    Ok(build(&lines))
}

/// Parse a document from a string, resolving `source` paths against the
/// current directory.
pub fn parse(text: &str) -> Result<Section> {
    parse_with_base(text, Path::new("."))
}

/// Parse a document from a string, resolving `source` paths against `base`.
pub fn parse_with_base(text: &str, base: &Path) -> Result<Section> {
    let mut loader = Loader::default();
    let lines = loader.expand(text, base)?;
    Ok(build(&lines))
}

/// Tracks the files currently being inlined.
#[derive(Default)]
struct Loader {
    stack: Vec<PathBuf>,
}

impl Loader {
    fn load(&mut self, path: &Path) -> Result<Vec<String>> {
        let canonical = std::fs::canonicalize(path).map_err(|source| Error::SourceFile {
            path: path.to_path_buf(),
            source,
        })?;

        if self.stack.contains(&canonical) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::IncludeCycle {
                path: canonical,
                chain,
            });
        }

        let text = std::fs::read_to_string(&canonical).map_err(|source| Error::SourceFile {
            path: canonical.clone(),
            source,
        })?;
        debug!("Loading {}", canonical.display());

        let base = canonical
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);

        self.stack.push(canonical);
        let lines = self.expand(&text, &base);
        self.stack.pop();
        lines
    }

    fn expand(&mut self, text: &str, base: &Path) -> Result<Vec<String>> {
        let mut lines = Vec::new();

        for raw in text.lines() {
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }

            match source_target(line) {
                Some("") => debug!("Ignoring source line without a path"),
                Some(target) => {
                    let path = resolve(target, base);
                    lines.extend(self.load(&path)?);
                }
                None => lines.push(line.to_string()),
            }
        }

        Ok(lines)
    }
}

/// Drop everything from the first `#` and trim.
fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code).trim()
}

fn source_target(line: &str) -> Option<&str> {
    let (key, value) = line.split_once('=')?;
    (key.trim() == SOURCE_KEY).then(|| value.trim())
}

fn resolve(target: &str, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(target).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Build the tree from comment-free, source-expanded lines, then substitute.
fn build(lines: &[String]) -> Section {
    let mut root = Section::new();
    let mut open: Vec<(String, Section)> = Vec::new();

    for line in lines {
        let line = line.as_str();

        if let Some(binding) = line.strip_prefix('$') {
            match binding.split_once('=') {
                Some((name, value)) if is_variable_name(name.trim()) => {
                    current(&mut root, &mut open).bind(name.trim(), value.trim());
                }
                _ => debug!("Ignoring malformed variable line: {line}"),
            }
        } else if let Some(name) = line.strip_suffix('{') {
            trace!("Opening section {}", name.trim());
            open.push((name.trim().to_string(), Section::new()));
        } else if line == "}" {
            if !close(&mut root, &mut open) {
                debug!("Ignoring unmatched closing brace");
            }
        } else if let Some((key, value)) = line.split_once('=')
            && !key.trim().is_empty()
        {
            current(&mut root, &mut open).push_value(key.trim(), value.trim());
        } else {
            debug!("Ignoring malformed line: {line}");
        }
    }

    while close(&mut root, &mut open) {}

    substitute(&mut root);
    root
}

fn current<'a>(root: &'a mut Section, open: &'a mut [(String, Section)]) -> &'a mut Section {
    match open.last_mut() {
        Some((_, section)) => section,
        None => root,
    }
}

/// Attach the innermost open section to its parent. Returns false if none was open.
fn close(root: &mut Section, open: &mut Vec<(String, Section)>) -> bool {
    match open.pop() {
        Some((name, section)) => {
            current(root, open).push_child(name, section);
            true
        }
        None => false,
    }
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_identifier_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_nested_sections() {
        let root = parse("outer {\n    inner {\n        k = v\n    }\n}\n").unwrap();
        assert!(root.values().is_empty());
        assert_eq!(root.child("outer").len(), 1);
        let outer = &root.child("outer")[0];
        assert_eq!(outer.child("inner").len(), 1);
        assert_eq!(outer.child("inner")[0].get("k"), ["v"]);
    }

    #[test]
    fn test_repeated_sections_and_values() {
        let text = "\
hook {
    package = linux
}
hook {
    package = grub
}
package = git
package = vim # trailing comment
";
        let root = parse(text).unwrap();
        assert_eq!(root.child("hook").len(), 2);
        assert_eq!(root.child("hook")[1].get("package"), ["grub"]);
        assert_eq!(root.get("package"), ["git", "vim"]);
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let root = parse("run = FOO=bar make\n").unwrap();
        assert_eq!(root.get("run"), ["FOO=bar make"]);
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let root = parse("just words\n= orphan\n}\nkey = value\n").unwrap();
        assert_eq!(root.values().len(), 1);
        assert_eq!(root.get("key"), ["value"]);
    }

    #[test]
    fn test_unclosed_section_is_kept() {
        let root = parse("packages {\n    pacman {\n        package = git\n").unwrap();
        assert_eq!(root.get_all("packages/pacman/package"), vec!["git"]);
    }

    #[test]
    fn test_variables_are_substituted() {
        let root = parse("$v = x\nkey = pre$v\nother = $vx\n").unwrap();
        assert_eq!(root.get("key"), ["prex"]);
        assert_eq!(root.get("other"), ["$vx"]);
    }

    #[test]
    fn test_variable_scoped_to_section() {
        let text = "\
a {
    $k = linux
    kernel = $k
}
b {
    kernel = $k
}
";
        let root = parse(text).unwrap();
        assert_eq!(root.get_all("a/kernel"), vec!["linux"]);
        assert_eq!(root.get_all("b/kernel"), vec!["$k"]);
    }

    #[test]
    fn test_source_equals_concatenation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("packages.conf"),
            "pacman {\n    package = git\n}\n",
        )
        .unwrap();
        let main = dir.path().join("declarch.conf");
        fs::write(
            &main,
            "packages {\n    source = packages.conf\n    aur {\n        package = paru-bin\n    }\n}\n",
        )
        .unwrap();

        let sourced = parse_file(&main).unwrap();
        let inline = parse(
            "packages {\npacman {\npackage = git\n}\naur {\npackage = paru-bin\n}\n}\n",
        )
        .unwrap();
        assert_eq!(sourced, inline);
    }

    #[test]
    fn test_source_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("conf.d");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("leaf.conf"), "kernel = linux\n").unwrap();
        fs::write(nested.join("middle.conf"), "source = leaf.conf\n").unwrap();
        let main = dir.path().join("main.conf");
        fs::write(&main, "source = conf.d/middle.conf\n").unwrap();

        let root = parse_file(&main).unwrap();
        assert_eq!(root.get("kernel"), ["linux"]);
    }

    #[test]
    fn test_source_with_base_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("extra.conf"), "key = value\n").unwrap();
        let root = parse_with_base("source = extra.conf\n", dir.path()).unwrap();
        assert_eq!(root.get("key"), ["value"]);
    }

    #[test]
    fn test_same_file_sourced_twice_is_allowed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pkg.conf"), "package = git\n").unwrap();
        let root =
            parse_with_base("source = pkg.conf\nsource = pkg.conf\n", dir.path()).unwrap();
        assert_eq!(root.get("package"), ["git", "git"]);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = parse_with_base("source = nope.conf\n", dir.path()).unwrap_err();
        assert!(matches!(err, Error::SourceFile { .. }));
    }

    #[test]
    fn test_include_cycle_detected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.conf"), "source = b.conf\n").unwrap();
        fs::write(dir.path().join("b.conf"), "source = a.conf\n").unwrap();

        let err = parse_file(&dir.path().join("a.conf")).unwrap_err();
        match err {
            Error::IncludeCycle { path, chain } => {
                assert!(path.ends_with("a.conf"));
                assert!(chain.contains("b.conf"));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_include_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("self.conf");
        fs::write(&path, "source = self.conf\n").unwrap();
        assert!(matches!(
            parse_file(&path),
            Err(Error::IncludeCycle { .. })
        ));
    }
}
