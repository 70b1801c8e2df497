//! Line model for INI-style files such as `/etc/pacman.conf`.
//!
//! Every line keeps its raw text so untouched lines are written back
//! byte for byte.

/// One line of an INI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank(String),
    /// A `#` comment. `inner` is the trimmed text after the `#`.
    Comment { raw: String, inner: String },
    /// A `[name]` header.
    Section { raw: String, name: String },
    /// `key = value`, or a bare flag key when `value` is `None`.
    Key {
        raw: String,
        key: String,
        value: Option<String>,
    },
}

impl Line {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Blank(raw.to_string());
        }
        if let Some(inner) = trimmed.strip_prefix('#') {
            return Self::Comment {
                raw: raw.to_string(),
                inner: inner.trim().to_string(),
            };
        }
        if let Some(name) = section_name(trimmed) {
            return Self::Section {
                raw: raw.to_string(),
                name: name.to_string(),
            };
        }
        let (key, value) = split_key(trimmed);
        Self::Key {
            raw: raw.to_string(),
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Self::Blank(raw)
            | Self::Comment { raw, .. }
            | Self::Section { raw, .. }
            | Self::Key { raw, .. } => raw,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// Section name if this is a real header.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Section { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Section name if this is a commented-out header such as `#[multilib]`.
    pub fn commented_section(&self) -> Option<&str> {
        match self {
            Self::Comment { inner, .. } => section_name(inner),
            _ => None,
        }
    }

    /// Key name if this is a commented-out assignment such as `#Color` or
    /// `#ParallelDownloads = 5`.
    pub fn commented_key(&self) -> Option<&str> {
        match self {
            Self::Comment { inner, .. } => {
                let (key, _) = split_key(inner);
                (!key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric()))
                    .then_some(key)
            }
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Key { key, .. } => Some(key),
            _ => None,
        }
    }
}

fn section_name(text: &str) -> Option<&str> {
    text.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn split_key(text: &str) -> (&str, Option<&str>) {
    match text.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (text.trim(), None),
    }
}

/// A parsed INI document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<Line>,
    trailing_newline: bool,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(Line::parse).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    pub fn render(&self) -> String {
        let mut output = self
            .lines
            .iter()
            .map(Line::raw)
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline && !output.is_empty() {
            output.push('\n');
        }
        output
    }

    /// Index of the first real `[name]` header.
    pub fn find_section(&self, name: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.section() == Some(name))
    }

    /// Index of the first commented-out `#[name]` header.
    pub fn find_commented_section(&self, name: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.commented_section() == Some(name))
    }

    /// Body of the section starting at `header`: from the line after it up to
    /// the next header, real or commented. `None` addresses the lines before
    /// the first header.
    pub fn body(&self, header: Option<usize>) -> std::ops::Range<usize> {
        let start = header.map_or(0, |h| h + 1);
        let end = self.lines[start..]
            .iter()
            .position(|l| l.section().is_some() || l.commented_section().is_some())
            .map_or(self.lines.len(), |offset| start + offset);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# General options
[options]
HoldPkg     = pacman glibc
#Color
ParallelDownloads = 5
CheckSpace

#[multilib]
#Include = /etc/pacman.d/mirrorlist
";

    #[test]
    fn test_classifies_lines() {
        let doc = Document::parse(SAMPLE);
        assert!(matches!(doc.lines[0], Line::Comment { .. }));
        assert_eq!(doc.lines[1].section(), Some("options"));
        assert_eq!(doc.lines[2].key(), Some("HoldPkg"));
        assert_eq!(doc.lines[3].commented_key(), Some("Color"));
        assert_eq!(doc.lines[5].key(), Some("CheckSpace"));
        assert!(doc.lines[6].is_blank());
        assert_eq!(doc.lines[7].commented_section(), Some("multilib"));
        assert_eq!(doc.lines[8].commented_key(), Some("Include"));
        assert_eq!(doc.lines[0].commented_key(), None);
    }

    #[test]
    fn test_render_is_lossless() {
        let doc = Document::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
        let no_newline = "[options]\nColor";
        assert_eq!(Document::parse(no_newline).render(), no_newline);
    }

    #[test]
    fn test_body_stops_at_commented_header() {
        let doc = Document::parse(SAMPLE);
        let options = doc.find_section("options");
        assert_eq!(doc.body(options), 2..7);
        let multilib = doc.find_commented_section("multilib");
        assert_eq!(doc.body(multilib), 8..9);
        assert_eq!(doc.body(None), 0..1);
    }
}
