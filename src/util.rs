use std::path::Path;

/// Last component of the absolute form of `path`, without a `.git` suffix.
pub fn basename(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    absolute
        .file_name()
        .map(|n| {
            let name = n.to_string_lossy();
            name.strip_suffix(".git").unwrap_or(&name).to_string()
        })
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "repository".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_git_suffix() {
        assert_eq!(basename(Path::new("/srv/git/project.git")), "project");
        assert_eq!(basename(Path::new("/srv/git/project")), "project");
        assert_eq!(basename(Path::new("/srv/git/mirror.git.git")), "mirror.git");
    }

    #[test]
    fn basename_of_root_falls_back() {
        assert_eq!(basename(Path::new("/")), "repository");
    }
}
