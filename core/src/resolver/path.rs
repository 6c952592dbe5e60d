use std::path::{Component, Path, PathBuf};

pub const WREN_EXTENSION: &str = ".wren";

/// Module names the host provides itself; they never map to files.
pub const BUILTIN_MODULES: [&str; 2] = ["meta", "random"];

/// Turns an import literal into a relative file path: quotes are stripped, a
/// leading `./` and a trailing `.wren` are added when missing.
pub fn normalize_import_path(literal: &str) -> String {
    let mut path: String = literal.chars().filter(|c| *c != '"').collect();
    if !path.starts_with("./") {
        path.insert_str(0, "./");
    }
    if !path.ends_with(WREN_EXTENSION) {
        path.push_str(WREN_EXTENSION);
    }
    path
}

/// `literal` may still carry its quotes.
pub fn is_builtin_module(literal: &str) -> bool {
    let name: String = literal.chars().filter(|c| *c != '"').collect();
    BUILTIN_MODULES.contains(&name.as_str())
}

/// Lexical cleanup: `.` components are dropped and `..` folds into its parent
/// where there is one. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(normalized.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    normalized.pop();
                } else {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// The importing file's directory first, then every search path in order.
pub fn candidate_paths(origin_dir: &Path, normalized: &str, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    std::iter::once(origin_dir)
        .chain(search_paths.iter().map(PathBuf::as_path))
        .map(|dir| normalize_path(&dir.join(normalized)))
        .collect()
}

/// Registry key for a file path.
pub fn identity_of(path: &Path) -> String {
    normalize_path(path).to_string_lossy().into_owned()
}

/// Directory imports of `identity` resolve against.
pub fn origin_dir_of(identity: &str) -> PathBuf {
    match Path::new(identity).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
