use std::path::{Component, Path, PathBuf};

/// List directories directly inside `dir`,
/// following symlinks.
pub fn subdirs<P>(dir: P) -> std::io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Make `path` absolute against the working directory,
/// then normalize it.
pub fn absolute<P>(path: P) -> std::io::Result<PathBuf>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    Ok(if path.is_absolute() {
        normalize(path)
    } else {
        normalize(std::env::current_dir()?.join(path))
    })
}

/// Lexically remove `.` and resolve `..` components.
/// Leading `..` are kept,
/// except directly under the root.
pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let mut normalized = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = normalized.components().next_back();
                if matches!(last, Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !matches!(last, Some(Component::RootDir | Component::Prefix(_))) {
                    normalized.push(component);
                }
            }
            component => normalized.push(component),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(Component::CurDir);
    }
    normalized
}

/// Whether `path` is executable by users outside its owner and group.
#[cfg(target_family = "unix")]
pub fn is_other_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o001 != 0
}

#[cfg(not(target_family = "unix"))]
pub fn is_other_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}
