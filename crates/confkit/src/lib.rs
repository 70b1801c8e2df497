//! # confkit
//!
//! The declarch configuration language: a line-oriented format of nested,
//! repeatable sections, multi-valued keys, scoped `$variables` and `source`
//! file inclusion.
//!
//! ```text
//! $user = alice
//! essentials {
//!     kernel = linux
//!     kernel = linux-lts, +lts
//! }
//! packages {
//!     source = packages.conf
//!     pacman {
//!         package = git vim
//!         hook {
//!             package = vim
//!             as = $user
//!             run = echo installed
//!         }
//!     }
//! }
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use confkit::parse_file;
//!
//! let root = parse_file("/etc/declarch/declarch.conf".as_ref())?;
//! for kernel in root.get_all("essentials/kernel") {
//!     println!("{kernel}");
//! }
//! let snapshot = confkit::to_snapshot(&root);
//! ```

pub mod error;
pub mod parser;
pub mod section;
pub mod substitute;
pub mod writer;

pub use error::{Error, Result};
pub use parser::{parse, parse_file, parse_with_base};
pub use section::Section;
pub use writer::{to_snapshot, to_string};
