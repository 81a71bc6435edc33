//! Directory tree walking with subtree pruning.

use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Decides which directories are skipped together with everything below them.
pub trait DirFilter: Send + Sync {
    /// `true` to skip the directory named `dir_name`.
    fn prune(&self, dir_name: &str) -> bool;
}

impl<F> DirFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn prune(&self, dir_name: &str) -> bool {
        self(dir_name)
    }
}

/// One node reported by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsVisit {
    /// A non-directory entry (regular file or symlink), absolute path.
    File(PathBuf),
    /// A directory that was skipped along with its subtree.
    Pruned(PathBuf),
    /// A node that could not be visited.
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

/// Walk `root` in lexical order without following symlinks.
///
/// Paths are made absolute against the current directory but not
/// canonicalized, so the same file keeps the same path between walks.
pub fn walk_tree(root: &Path, filter: &dyn DirFilter) -> Vec<FsVisit> {
    let root = match std::path::absolute(root) {
        Ok(root) => root,
        Err(e) => {
            return vec![FsVisit::Error {
                path: Some(root.to_path_buf()),
                message: e.to_string(),
            }];
        }
    };

    let mut visits = Vec::new();
    let mut it = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    loop {
        let entry = match it.next() {
            None => break,
            Some(Err(e)) => {
                visits.push(FsVisit::Error {
                    path: e.path().map(Path::to_path_buf),
                    message: e
                        .io_error()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| e.to_string()),
                });
                continue;
            }
            Some(Ok(e)) => e,
        };

        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            if filter.prune(&name) {
                trace!("Pruning {}", entry.path().display());
                visits.push(FsVisit::Pruned(entry.path().to_path_buf()));
                it.skip_current_dir();
            }
            continue;
        }

        visits.push(FsVisit::File(entry.into_path()));
    }

    visits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn files(visits: &[FsVisit]) -> Vec<PathBuf> {
        visits
            .iter()
            .filter_map(|v| match v {
                FsVisit::File(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_walk_is_lexical() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();
        fs::write(dir.path().join("c").join("d.txt"), "d").unwrap();

        let visits = walk_tree(dir.path(), &|_: &str| false);
        assert_eq!(
            files(&visits),
            vec![
                dir.path().join("a.txt"),
                dir.path().join("b.txt"),
                dir.path().join("c").join("d.txt"),
            ]
        );
    }

    #[test]
    fn test_pruned_subtree_is_not_descended() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("build-cache");
        fs::create_dir_all(cache.join("deep")).unwrap();
        fs::write(cache.join("deep").join("x.log"), "x").unwrap();
        fs::write(dir.path().join("keep.log"), "k").unwrap();

        let visits = walk_tree(dir.path(), &|name: &str| name.contains("cache"));
        assert_eq!(files(&visits), vec![dir.path().join("keep.log")]);
        assert!(visits.contains(&FsVisit::Pruned(cache)));
    }

    #[test]
    fn test_file_names_are_not_pruned() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("cache.txt"), "c").unwrap();

        let visits = walk_tree(dir.path(), &|name: &str| name.contains("cache"));
        assert_eq!(files(&visits), vec![dir.path().join("cache.txt")]);
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let visits = walk_tree(&dir.path().join("gone"), &|_: &str| false);
        assert_eq!(visits.len(), 1);
        assert!(matches!(visits[0], FsVisit::Error { .. }));
    }
}
