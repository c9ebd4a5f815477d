//! Output-name collision detection
//!
//! Writing several sources with the same basename into one destination
//! directory would silently overwrite results, so save-to-directory jobs
//! are validated before any file is touched.

use std::collections::BTreeMap;
use std::path::Path;

/// Count basenames that occur more than once in `paths`.
///
/// Returns only the colliding names, so a job refusal can report all of
/// them at once. Paths without a final filename component are ignored.
pub fn find_duplicate_basenames<P: AsRef<Path>>(paths: &[P]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for path in paths {
        if let Some(name) = path.as_ref().file_name() {
            *counts
                .entry(name.to_string_lossy().into_owned())
                .or_insert(0) += 1;
        }
    }
    counts.retain(|_, count| *count > 1);
    counts
}
