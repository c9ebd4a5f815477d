//! Shortened path rendering
//!
//! Produces the display form of a file path for logs and host UIs. Never
//! use the result as a filesystem path.

use std::path::{Component, Path, MAIN_SEPARATOR_STR};

/// Parent directories kept verbatim next to the filename.
pub const DEFAULT_KEEP_LEVELS: usize = 3;

/// Abbreviate a path for display.
///
/// The filename and its nearest `keep_levels` parent directories are kept
/// verbatim; everything further toward the root collapses into a single
/// `..` segment no matter how many levels it hides. With `keep_root` the
/// topmost segment (drive or root) is kept as well.
pub fn abbreviate(path: &Path, keep_levels: usize, keep_root: bool) -> String {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                segments.push(prefix.as_os_str().to_string_lossy().into_owned());
            }
            // A bare root renders as a leading separator after the join.
            Component::RootDir => {
                if segments.is_empty() {
                    segments.push(String::new());
                }
            }
            Component::CurDir => {}
            Component::ParentDir => segments.push("..".to_string()),
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
        }
    }

    let Some(file) = segments.pop() else {
        return String::new();
    };
    if segments.len() <= keep_levels {
        segments.push(file);
        return segments.join(MAIN_SEPARATOR_STR);
    }

    let kept = segments.split_off(segments.len() - keep_levels);
    // `segments` is now the collapsed region; its head may survive as root.
    let mut out: Vec<String> = Vec::new();
    if keep_root {
        out.push(segments.remove(0));
    }
    if !segments.is_empty() {
        out.push("..".to_string());
    }
    out.extend(kept);
    out.push(file);
    out.join(MAIN_SEPARATOR_STR)
}
