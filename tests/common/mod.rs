#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Writes `content` to `root/relative`, creating parent directories.
pub fn write<P: AsRef<Path>>(root: P, relative: &str, content: &str) {
    let path = root.as_ref().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn read<P: AsRef<Path>>(root: P, relative: &str) -> String {
    fs::read_to_string(root.as_ref().join(relative)).unwrap()
}
