//! Writer for configuration trees.
//!
//! Produces a document that parses back into an equal tree. Variables are
//! not written because every value is already substituted.

use crate::section::Section;

const INDENT: &str = "    ";

/// Serialize a tree as a snapshot document with a generation header.
pub fn to_snapshot(section: &Section) -> String {
    let mut output = String::new();
    output.push_str("# declarch snapshot, do not edit\n");
    output.push_str(&format!(
        "# Generated: {}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    write_section(&mut output, section, 0);
    output
}

/// Serialize a tree without any header.
pub fn to_string(section: &Section) -> String {
    let mut output = String::new();
    write_section(&mut output, section, 0);
    output
}

fn write_section(output: &mut String, section: &Section, depth: usize) {
    let indent = INDENT.repeat(depth);

    for (key, values) in section.values() {
        for value in values {
            let line = format!("{indent}{key} = {value}");
            output.push_str(line.trim_end());
            output.push('\n');
        }
    }

    for (name, children) in section.children() {
        for child in children {
            output.push_str(&format!("{indent}{name} {{\n"));
            write_section(output, child, depth + 1);
            output.push_str(&format!("{indent}}}\n"));
        }
    }
}
