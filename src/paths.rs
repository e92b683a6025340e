//! Path normalization: results reported by the search tool may be
//! relative; handlers rewrite them to absolute by joining with the
//! recorded workspace root and lexically normalizing — no filesystem
//! access, since this server is read-only with respect to the filesystem
//! (spec §4.G, §1).

use std::path::{Component, Path, PathBuf};

/// Join `path` onto `root` (if `path` is relative) and lexically normalize
/// the result, resolving `.` and `..` components without touching disk.
#[must_use]
pub fn normalize_join(root: &str, path: &str) -> String {
    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        Path::new(root).join(candidate)
    };
    lexically_normalize(&joined)
}

fn lexically_normalize(path: &Path) -> String {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    let mut result = PathBuf::new();
    for component in out {
        result.push(component.as_os_str());
    }
    result.to_string_lossy().into_owned()
}
