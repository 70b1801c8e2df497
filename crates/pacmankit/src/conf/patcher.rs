//! Structural patching of INI-style config files.
//!
//! A patch is a map from section name to the keys to set, flag or remove
//! in it. Applying the same patch twice yields the same file, and lines the
//! patch does not address are left untouched, comments included.

use super::document::{Document, Line};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Desired state of one key or section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// `key = value`
    Set(String),
    /// A bare `key` with no value (pacman's boolean options)
    Flag,
    /// Delete every occurrence of the key
    Remove,
    /// Keys of a named section, created if missing
    Section(PatchMap),
}

/// Patches by key or section name, applied in sorted order.
pub type PatchMap = BTreeMap<String, Patch>;

/// Applies [`Patch`]es to documents.
#[derive(Debug, Clone, Copy)]
pub struct Patcher {
    /// Uncomment a matching `#key` or `#[section]` instead of appending a new line
    replace_comments: bool,
}

impl Default for Patcher {
    fn default() -> Self {
        Self {
            replace_comments: true,
        }
    }
}

impl Patcher {
    pub fn new(replace_comments: bool) -> Self {
        Self { replace_comments }
    }

    /// Patch document text.
    pub fn patch_str(&self, text: &str, patches: &PatchMap) -> String {
        let mut doc = Document::parse(text);
        for (name, patch) in patches {
            match patch {
                Patch::Section(keys) => self.patch_section(&mut doc, name, keys),
                leaf => self.patch_key(&mut doc, None, name, leaf),
            }
        }
        doc.render()
    }

    /// Patch a file in place. Returns whether its content changed.
    pub fn patch_file(&self, path: &Path, patches: &PatchMap) -> Result<bool> {
        let config_error = |source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        };

        let original = std::fs::read_to_string(path).map_err(config_error)?;
        let patched = self.patch_str(&original, patches);
        if patched == original {
            debug!("{} already up to date", path.display());
            return Ok(false);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("/"));
        let permissions = std::fs::metadata(path).map_err(config_error)?.permissions();
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(config_error)?;
        temp.write_all(patched.as_bytes()).map_err(config_error)?;
        std::fs::set_permissions(temp.path(), permissions).map_err(config_error)?;
        temp.persist(path).map_err(|e| config_error(e.error))?;

        debug!("Patched {}", path.display());
        Ok(true)
    }

    fn patch_section(&self, doc: &mut Document, name: &str, keys: &PatchMap) {
        if doc.find_section(name).is_none() {
            match doc.find_commented_section(name) {
                Some(index) if self.replace_comments => {
                    doc.lines[index] = Line::parse(&format!("[{name}]"));
                }
                _ => append_section(doc, name),
            }
        }

        for (key, patch) in keys {
            match patch {
                Patch::Section(_) => warn!("Ignoring nested section {key} inside [{name}]"),
                leaf => self.patch_key(doc, Some(name), key, leaf),
            }
        }
    }

    fn patch_key(&self, doc: &mut Document, section: Option<&str>, key: &str, patch: &Patch) {
        let header = section.and_then(|name| doc.find_section(name));
        let body = doc.body(header);
        let existing: Vec<usize> = body
            .clone()
            .filter(|&i| doc.lines[i].key() == Some(key))
            .collect();

        let wanted = match patch {
            Patch::Set(value) => format!("{key} = {value}"),
            Patch::Flag => key.to_string(),
            Patch::Remove => {
                for index in existing.into_iter().rev() {
                    doc.lines.remove(index);
                }
                return;
            }
            Patch::Section(_) => return,
        };
        let wanted = Line::parse(&wanted);

        if let Some(&index) = existing.first() {
            if !same_assignment(&doc.lines[index], &wanted) {
                doc.lines[index] = wanted;
            }
            return;
        }

        if self.replace_comments
            && let Some(index) = body
                .clone()
                .find(|&i| doc.lines[i].commented_key() == Some(key))
        {
            doc.lines[index] = wanted;
            return;
        }

        let mut at = body.end;
        while at > body.start && doc.lines[at - 1].is_blank() {
            at -= 1;
        }
        doc.lines.insert(at, wanted);
    }
}

fn same_assignment(current: &Line, wanted: &Line) -> bool {
    match (current, wanted) {
        (
            Line::Key {
                key: a, value: va, ..
            },
            Line::Key {
                key: b, value: vb, ..
            },
        ) => a == b && va == vb,
        _ => false,
    }
}

fn append_section(doc: &mut Document, name: &str) {
    if doc.lines.last().is_some_and(|line| !line.is_blank()) {
        doc.lines.push(Line::Blank(String::new()));
    }
    doc.lines.push(Line::parse(&format!("[{name}]")));
}
