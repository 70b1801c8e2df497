//! Whole-document semantic checks, run before anything is changed.

use crate::desired::{
    AUR_PACKAGES, BOOTLOADER, FLATPAK_AUTO_INSTALL, FLATPAK_PACKAGES, FLATPAK_REMOTES, KERNEL,
    NETWORK_HANDLER, PACMAN_PACKAGES,
};
use crate::error::Issue;
use crate::hooks::{self, AUR_HOOKS, FLATPAK_HOOKS, PACMAN_HOOKS};
use crate::pacman_conf::{FLAG_OPTIONS, PACMAN, PARALLEL_DOWNLOADS, REPLACE_COMMENTS};
use crate::tags::split_entry;
use crate::types::parse_bool;
use crate::users::{USERS, UserRegistry};
use confkit::Section;
use pacmankit::Escalation;
use log::warn;
use regex::Regex;

/// Privilege escalation setting, and its historical misspelling.
pub const ESCALATION_KEYS: [&str; 2] = [
    "essentials/privilege_escalation",
    "essentials/privilige_escalation",
];

const TAG_PATTERN: &str = r"^\+!?[A-Za-z0-9_-]+$";

/// Every problem in the document. An empty list means it is safe to apply.
pub fn validate(root: &Section) -> Vec<Issue> {
    let mut issues = Vec::new();
    let registry = UserRegistry::from_section(root);

    check_escalation(root, &mut issues);
    check_pacman(root, &mut issues);
    match Regex::new(TAG_PATTERN) {
        Ok(pattern) => check_tags(root, &pattern, &mut issues),
        Err(e) => warn!("Skipping tag checks: {e}"),
    }
    check_users(root, &registry, &mut issues);
    check_flatpak(root, &mut issues);

    let default_user = registry.normal_user();
    for path in [PACMAN_HOOKS, AUR_HOOKS, FLATPAK_HOOKS] {
        issues.extend(hooks::issues(root, path, default_user));
    }

    issues
}

/// The escalation command declared in the document, defaulting to sudo.
pub fn escalation(root: &Section) -> Option<Escalation> {
    match ESCALATION_KEYS.iter().find_map(|key| root.get_first(key)) {
        None => Some(Escalation::default()),
        Some(value) => value.parse().ok(),
    }
}

fn check_escalation(root: &Section, issues: &mut Vec<Issue>) {
    if escalation(root).is_none() {
        let value = ESCALATION_KEYS
            .iter()
            .find_map(|key| root.get_first(key))
            .unwrap_or_default();
        issues.push(Issue::new(
            "essentials/privilege_escalation",
            format!(
                "{value:?} is not one of {}",
                Escalation::NAMES.join(", ")
            ),
        ));
    }
}

fn check_bool(root: &Section, path: &str, issues: &mut Vec<Issue>) {
    for value in root.get_all(path) {
        if parse_bool(value).is_none() {
            issues.push(Issue::new(path, format!("expected true or false, got {value:?}")));
        }
    }
}

fn check_pacman(root: &Section, issues: &mut Vec<Issue>) {
    for (key, _) in FLAG_OPTIONS {
        check_bool(root, &format!("{PACMAN}/{key}"), issues);
    }
    check_bool(root, REPLACE_COMMENTS, issues);

    let path = format!("{PACMAN}/{}", PARALLEL_DOWNLOADS.0);
    for value in root.get_all(&path) {
        if value.parse::<u32>().is_err() {
            issues.push(Issue::new(&path, format!("expected a number, got {value:?}")));
        }
    }

    let repositories = format!("{PACMAN}/repository");
    for repository in root.sections(&repositories) {
        if repository.get("name").iter().all(String::is_empty) {
            issues.push(Issue::new(&repositories, "repository is missing 'name'"));
        }
    }
}

/// Every tag token must look like `+name` or `+!name`.
fn check_entry_tags<'a>(
    path: &str,
    entries: impl IntoIterator<Item = &'a str>,
    pattern: &Regex,
    issues: &mut Vec<Issue>,
) {
    for entry in entries {
        let Some(clause) = split_entry(entry).1 else {
            continue;
        };
        for token in clause.split_whitespace() {
            if !pattern.is_match(token) {
                issues.push(Issue::new(
                    path,
                    format!("invalid tag {token:?} in {entry:?}: tags look like +name or +!name"),
                ));
            }
        }
    }
}

fn check_tags(root: &Section, pattern: &Regex, issues: &mut Vec<Issue>) {
    for path in [
        KERNEL,
        BOOTLOADER,
        NETWORK_HANDLER,
        PACMAN_PACKAGES,
        AUR_PACKAGES,
        FLATPAK_PACKAGES,
    ] {
        check_entry_tags(path, root.get_all(path), pattern, issues);
    }
    for section in root.sections(FLATPAK_PACKAGES) {
        check_entry_tags(
            FLATPAK_PACKAGES,
            section.get("name").iter().map(String::as_str),
            pattern,
            issues,
        );
    }
}

fn check_users(root: &Section, registry: &UserRegistry, issues: &mut Vec<Issue>) {
    for section in root.sections(USERS) {
        if section.get("username").iter().all(String::is_empty) {
            issues.push(Issue::new(USERS, "user is missing 'username'"));
        }
        for value in section.get("create_home") {
            if parse_bool(value).is_none() {
                issues.push(Issue::new(
                    USERS,
                    format!("create_home: expected true or false, got {value:?}"),
                ));
            }
        }
        for shell in section.get("shell") {
            if !shell.is_empty() && !shell.starts_with('/') {
                issues.push(Issue::new(
                    USERS,
                    format!("shell: expected an absolute path such as /usr/bin/{shell}, got {shell:?}"),
                ));
            }
        }
    }

    if registry.users().len() > 1 && registry.normal_user().is_none() {
        issues.push(Issue::new(
            "essentials/normal_user",
            "several users are declared; set normal_user to the one that builds packages",
        ));
    }
}

fn check_flatpak(root: &Section, issues: &mut Vec<Issue>) {
    check_bool(root, FLATPAK_AUTO_INSTALL, issues);

    for remote in root.sections(FLATPAK_REMOTES) {
        for key in ["name", "url"] {
            if remote.get(key).iter().all(String::is_empty) {
                issues.push(Issue::new(FLATPAK_REMOTES, format!("remote is missing '{key}'")));
            }
        }
        for key in ["user_installation", "disable"] {
            for value in remote.get(key) {
                if parse_bool(value).is_none() {
                    issues.push(Issue::new(
                        FLATPAK_REMOTES,
                        format!("{key}: expected true or false, got {value:?}"),
                    ));
                }
            }
        }
    }

    for package in root.sections(FLATPAK_PACKAGES) {
        if package.get("name").iter().all(String::is_empty) {
            issues.push(Issue::new(FLATPAK_PACKAGES, "package is missing 'name'"));
        }
        for value in package.get("user_installation") {
            if parse_bool(value).is_none() {
                issues.push(Issue::new(
                    FLATPAK_PACKAGES,
                    format!("user_installation: expected true or false, got {value:?}"),
                ));
            }
        }
    }
}
