use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory '{path}': {source}", path = path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove '{path}': {source}", path = path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}", from = from.display(), to = to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to link '{link}' to '{target}': {source}", link = link.display(), target = target.display())]
    Link {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Deferred filesystem layer for a processing session.
///
/// Reads are memoized and returned trimmed. Writes, copies and symlinks are only staged
/// and become visible on disk at [`FileCache::commit`]. Reads observe staged state:
/// a staged write is returned as-is, and a staged link or copy is followed to its
/// source. Each target path holds at most one pending operation; the latest one wins.
#[derive(Debug, Default)]
pub struct FileCache {
    contents: HashMap<PathBuf, String>,
    dirty: BTreeSet<PathBuf>,
    // target -> source
    copies: BTreeMap<PathBuf, PathBuf>,
    // link path -> path the link points at
    links: BTreeMap<PathBuf, PathBuf>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trimmed content of `path`, or `None` if there is nothing there.
    pub fn get(&mut self, path: &Path) -> Result<Option<String>, CacheError> {
        let resolved = self.resolve_staged(path);
        if let Some(content) = self.contents.get(&resolved) {
            return Ok(Some(content.clone()));
        }

        match fs::read_to_string(&resolved) {
            Ok(raw) => {
                trace!(path = %resolved.display(), "Cached file from disk");
                let content = raw.trim().to_string();
                self.contents.insert(resolved, content.clone());
                Ok(Some(content))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read {
                path: resolved,
                source,
            }),
        }
    }

    /// Stages `content`, trimmed, as the new content of `path`.
    pub fn set(&mut self, path: &Path, content: &str) {
        self.copies.remove(path);
        self.links.remove(path);
        self.contents
            .insert(path.to_path_buf(), content.trim().to_string());
        self.dirty.insert(path.to_path_buf());
    }

    /// Stages a symlink at `link` pointing to `target`. The link replaces whatever is at
    /// `link` on disk when committed.
    pub fn link(&mut self, target: &Path, link: &Path) {
        self.forget(link);
        self.links.insert(link.to_path_buf(), target.to_path_buf());
    }

    /// Stages a byte-for-byte copy of `from` to `to`.
    pub fn copy(&mut self, from: &Path, to: &Path) {
        self.forget(to);
        self.copies.insert(to.to_path_buf(), from.to_path_buf());
    }

    /// Seeds the read cache with content obtained elsewhere. Paths with a pending
    /// operation are left alone.
    pub fn preload(&mut self, path: PathBuf, content: &str) {
        if self.dirty.contains(&path) || self.links.contains_key(&path) || self.copies.contains_key(&path) {
            return;
        }
        self.contents
            .entry(path)
            .or_insert_with(|| content.trim().to_string());
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty() || !self.copies.is_empty() || !self.links.is_empty()
    }

    pub fn pending_writes(&self) -> impl Iterator<Item = &Path> {
        self.dirty.iter().map(PathBuf::as_path)
    }

    /// Pending symlinks as `(link, target)` pairs.
    pub fn pending_links(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.links.iter().map(|(l, t)| (l.as_path(), t.as_path()))
    }

    /// Flushes staged writes, then copies, then symlinks.
    ///
    /// Staged state is kept afterwards, so committing twice produces the same tree.
    pub fn commit(&mut self) -> Result<(), CacheError> {
        debug!(
            writes = self.dirty.len(),
            copies = self.copies.len(),
            links = self.links.len(),
            "Committing staged filesystem changes"
        );

        for path in &self.dirty {
            let content = self.contents.get(path).map(String::as_str).unwrap_or_default();
            ensure_parent(path)?;
            remove_if_symlink(path)?;
            fs::write(path, content).map_err(|source| CacheError::Write {
                path: path.clone(),
                source,
            })?;
        }

        for (to, from) in &self.copies {
            if to == from {
                continue;
            }
            ensure_parent(to)?;
            remove_if_symlink(to)?;
            fs::copy(from, to).map_err(|source| CacheError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
        }

        for (link, target) in &self.links {
            ensure_parent(link)?;
            if fs::symlink_metadata(link).is_ok() {
                fs::remove_file(link).map_err(|source| CacheError::Remove {
                    path: link.clone(),
                    source,
                })?;
            }
            make_symlink(target, link).map_err(|source| CacheError::Link {
                link: link.clone(),
                target: target.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Drops every cached read and staged operation.
    pub fn clear(&mut self) {
        self.contents.clear();
        self.dirty.clear();
        self.copies.clear();
        self.links.clear();
    }

    fn forget(&mut self, path: &Path) {
        self.contents.remove(path);
        self.dirty.remove(path);
        self.copies.remove(path);
        self.links.remove(path);
    }

    // Follows staged links and copies to the path whose content `path` will carry.
    fn resolve_staged(&self, path: &Path) -> PathBuf {
        let mut current = path.to_path_buf();
        let mut hops = 0;
        while hops <= self.links.len() + self.copies.len() {
            if self.dirty.contains(&current) {
                break;
            }
            match self.links.get(&current).or_else(|| self.copies.get(&current)) {
                Some(next) => current = next.clone(),
                None => break,
            }
            hops += 1;
        }
        current
    }
}

fn ensure_parent(path: &Path) -> Result<(), CacheError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn remove_if_symlink(path: &Path) -> Result<(), CacheError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::remove_file(path).map_err(|source| CacheError::Remove {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn get_reads_trimmed_content_and_reports_absence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "  hello\n\n").unwrap();

        let mut cache = FileCache::new();
        assert_eq!(cache.get(&path).unwrap().as_deref(), Some("hello"));
        assert_eq!(cache.get(&dir.path().join("missing")).unwrap(), None);
    }

    #[test]
    fn get_is_memoized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "first").unwrap();

        let mut cache = FileCache::new();
        assert_eq!(cache.get(&path).unwrap().as_deref(), Some("first"));
        fs::write(&path, "second").unwrap();
        assert_eq!(cache.get(&path).unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn set_is_visible_to_get_but_not_on_disk_until_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("b.txt");

        let mut cache = FileCache::new();
        cache.set(&path, "staged\n");
        assert_eq!(cache.get(&path).unwrap().as_deref(), Some("staged"));
        assert!(!path.exists());

        cache.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "staged");
    }

    #[test]
    fn get_follows_staged_link_to_staged_content() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("entry.inp");
        let link = dir.path().join("candidate.inp");
        fs::write(&link, "old header").unwrap();

        let mut cache = FileCache::new();
        assert_eq!(cache.get(&link).unwrap().as_deref(), Some("old header"));
        cache.set(&source, "new header");
        cache.link(&source, &link);
        assert_eq!(cache.get(&link).unwrap().as_deref(), Some("new header"));
    }

    #[test]
    fn latest_operation_on_a_path_wins() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        let other = dir.path().join("other.txt");
        fs::write(&other, "other").unwrap();

        let mut cache = FileCache::new();
        cache.link(&other, &target);
        cache.set(&target, "written");
        cache.commit().unwrap();

        let meta = fs::symlink_metadata(&target).unwrap();
        assert!(!meta.file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "written");
    }

    #[test]
    fn commit_replaces_existing_file_with_symlink() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("entry_out.out");
        let link = dir.path().join("calc_out.out");
        fs::write(&link, "candidate output").unwrap();

        let mut cache = FileCache::new();
        cache.set(&source, "test");
        cache.link(&source, &link);
        cache.commit().unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), source);
        assert_eq!(fs::read_to_string(&link).unwrap(), "test");
    }

    #[test]
    fn commit_replaces_dangling_symlink() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone.txt");
        let source = dir.path().join("present.txt");
        let link = dir.path().join("link.txt");
        make_symlink(&gone, &link).unwrap();
        fs::write(&source, "here").unwrap();

        let mut cache = FileCache::new();
        cache.link(&source, &link);
        cache.commit().unwrap();
        assert_eq!(fs::read_to_string(&link).unwrap(), "here");
    }

    #[test]
    fn write_replaces_symlink_instead_of_writing_through_it() {
        let dir = tempdir().unwrap();
        let shared = dir.path().join("shared.txt");
        let link = dir.path().join("link.txt");
        fs::write(&shared, "shared").unwrap();
        make_symlink(&shared, &link).unwrap();

        let mut cache = FileCache::new();
        cache.set(&link, "own");
        cache.commit().unwrap();

        assert_eq!(fs::read_to_string(&shared).unwrap(), "shared");
        assert_eq!(fs::read_to_string(&link).unwrap(), "own");
    }

    #[test]
    fn commit_is_idempotent() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("s.txt");
        let link = dir.path().join("l.txt");

        let mut cache = FileCache::new();
        cache.set(&source, "content");
        cache.link(&source, &link);
        cache.commit().unwrap();
        cache.commit().unwrap();

        assert_eq!(fs::read_to_string(&link).unwrap(), "content");
        assert_eq!(fs::read_link(&link).unwrap(), source);
    }

    #[test]
    fn staged_copy_reads_source_and_copies_on_commit() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("calc.cube");
        let to = dir.path().join("db").join("entry.cube");
        fs::write(&from, "cube data\n").unwrap();

        let mut cache = FileCache::new();
        cache.copy(&from, &to);
        assert_eq!(cache.get(&to).unwrap().as_deref(), Some("cube data"));
        cache.commit().unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "cube data\n");
    }

    #[test]
    fn clear_discards_staged_operations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.txt");

        let mut cache = FileCache::new();
        cache.set(&path, "never");
        assert!(cache.has_pending());
        cache.clear();
        assert!(!cache.has_pending());
        cache.commit().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn preload_does_not_override_staged_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d.txt");

        let mut cache = FileCache::new();
        cache.set(&path, "staged");
        cache.preload(path.clone(), "prefetched");
        assert_eq!(cache.get(&path).unwrap().as_deref(), Some("staged"));

        let other = dir.path().join("e.txt");
        cache.preload(other.clone(), " prefetched \n");
        assert_eq!(cache.get(&other).unwrap().as_deref(), Some("prefetched"));
    }

    #[test]
    fn link_cycle_does_not_hang() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");

        let mut cache = FileCache::new();
        cache.link(&a, &b);
        cache.link(&b, &a);
        assert_eq!(cache.get(&a).unwrap(), None);
    }
}
