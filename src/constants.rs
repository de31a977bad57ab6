//! Common constants used throughout tmplpress.

/// Manifest file name expected at the root of every template
pub const MANIFEST_FILE: &str = "template.json";

/// User configuration file name inside the config directory
pub const CONFIG_FILE: &str = "config.json";

/// Application directory name used under the platform config and cache dirs
pub const APP_DIR: &str = "tmplpress";

/// Version-control metadata directory, never scanned nor pressed
pub const VCS_DIR: &str = ".git";

/// Schema the manifest document must conform to
pub const MANIFEST_SCHEMA: &str = include_str!("../schema/template.schema.json");
