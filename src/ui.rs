#![allow(dead_code)]

use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a command about to run
pub fn command(line: &str) {
    println!("{} {}", "$".cyan().bold(), line.bold());
}

/// Print an added item
pub fn added(item: &str) {
    println!("  {} {}", "+".green().bold(), item);
}

/// Print a removed item
pub fn removed(item: &str) {
    println!("  {} {}", "-".red().bold(), item);
}

/// Print a changed item
pub fn changed(item: &str) {
    println!("  {} {}", "~".yellow().bold(), item);
}

/// Print a unified diff between two texts
pub fn text_diff(before: &str, after: &str) {
    let diff = similar::TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}

/// Pluralize a count for display
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0, "change"), "0 changes");
        assert_eq!(plural(1, "change"), "1 change");
        assert_eq!(plural(3, "issue"), "3 issues");
    }
}
