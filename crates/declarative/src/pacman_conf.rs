//! pacman.conf settings declared under `packages/pacman`
//!
//! ```text
//! packages {
//!     pacman {
//!         color = true
//!         parallel_downloads = 5
//!         repository {
//!             name = multilib
//!         }
//!     }
//! }
//! ```

use crate::types::parse_bool;
use confkit::Section;
use pacmankit::conf::{DEFAULT_MIRRORLIST, OFFICIAL_REPOS, Patch, PatchMap};

/// Section holding pacman settings.
pub const PACMAN: &str = "packages/pacman";

/// Whether uncommenting existing lines is preferred over appending.
pub const REPLACE_COMMENTS: &str = "config_parser/replace_comments";

/// Boolean options and the pacman.conf keys they control.
pub const FLAG_OPTIONS: [(&str, &str); 3] = [
    ("color", "Color"),
    ("verbose_pkg_lists", "VerbosePkgLists"),
    ("i_love_candy", "ILoveCandy"),
];

/// Numeric option for concurrent downloads.
pub const PARALLEL_DOWNLOADS: (&str, &str) = ("parallel_downloads", "ParallelDownloads");

/// Repository section keys and the pacman.conf keys they set.
const REPOSITORY_KEYS: [(&str, &str); 3] = [
    ("include", "Include"),
    ("server", "Server"),
    ("sig_level", "SigLevel"),
];

/// Build the pacman.conf patch for a document.
///
/// Only declared settings are patched: `color = false` removes `Color`,
/// leaving it out keeps whatever the file has.
pub fn patches(root: &Section) -> PatchMap {
    let mut patches = PatchMap::new();

    let mut options = PatchMap::new();
    for (key, conf_key) in FLAG_OPTIONS {
        if let Some(enabled) = root
            .get_first(&format!("{PACMAN}/{key}"))
            .and_then(parse_bool)
        {
            let patch = if enabled { Patch::Flag } else { Patch::Remove };
            options.insert(conf_key.to_string(), patch);
        }
    }
    let (key, conf_key) = PARALLEL_DOWNLOADS;
    if let Some(count) = root
        .get_first(&format!("{PACMAN}/{key}"))
        .filter(|v| v.parse::<u32>().is_ok())
    {
        options.insert(conf_key.to_string(), Patch::Set(count.to_string()));
    }
    if !options.is_empty() {
        patches.insert("options".to_string(), Patch::Section(options));
    }

    for repository in root.sections(&format!("{PACMAN}/repository")) {
        let Some(name) = repository.get("name").first().filter(|n| !n.is_empty()) else {
            continue;
        };

        let mut keys = PatchMap::new();
        for (key, conf_key) in REPOSITORY_KEYS {
            if let Some(value) = repository.get(key).first() {
                keys.insert(conf_key.to_string(), Patch::Set(value.clone()));
            }
        }
        if !keys.contains_key("Include")
            && !keys.contains_key("Server")
            && OFFICIAL_REPOS.contains(&name.as_str())
        {
            keys.insert(
                "Include".to_string(),
                Patch::Set(DEFAULT_MIRRORLIST.to_string()),
            );
        }
        patches.insert(name.clone(), Patch::Section(keys));
    }

    patches
}

/// `config_parser/replace_comments`, default true.
pub fn replace_comments(root: &Section) -> bool {
    root.get_first(REPLACE_COMMENTS)
        .and_then(parse_bool)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let root = confkit::parse(
            "packages {\n pacman {\n color = true\n i_love_candy = false\n parallel_downloads = 8\n }\n}\n",
        )
        .unwrap();
        let patches = patches(&root);
        let Some(Patch::Section(options)) = patches.get("options") else {
            panic!("missing options");
        };
        assert_eq!(options.get("Color"), Some(&Patch::Flag));
        assert_eq!(options.get("ILoveCandy"), Some(&Patch::Remove));
        assert_eq!(
            options.get("ParallelDownloads"),
            Some(&Patch::Set("8".to_string()))
        );
        assert!(!options.contains_key("VerbosePkgLists"));
    }

    #[test]
    fn test_official_repository_gets_mirrorlist() {
        let root = confkit::parse(
            "packages {\n pacman {\n repository {\n name = multilib\n }\n repository {\n name = chaotic-aur\n include = /etc/pacman.d/chaotic-mirrorlist\n }\n }\n}\n",
        )
        .unwrap();
        let patches = patches(&root);
        assert_eq!(
            patches.get("multilib"),
            Some(&Patch::Section(PatchMap::from([(
                "Include".to_string(),
                Patch::Set(DEFAULT_MIRRORLIST.to_string())
            )])))
        );
        assert_eq!(
            patches.get("chaotic-aur"),
            Some(&Patch::Section(PatchMap::from([(
                "Include".to_string(),
                Patch::Set("/etc/pacman.d/chaotic-mirrorlist".to_string())
            )])))
        );
        assert!(!patches.contains_key("options"));
    }

    #[test]
    fn test_nothing_declared() {
        let root = confkit::parse("essentials {\n kernel = linux\n}\n").unwrap();
        assert!(patches(&root).is_empty());
        assert!(replace_comments(&root));
    }
}
