//! Memo of the loaded workbooks
//!
//! The cache belongs to whoever drives the dashboard; it is not global.
//! An entry stays valid until it is invalidated explicitly or the file it
//! was read from changes on disk (modification time or size).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::load::error::LoadError;

/// Identity of a load: one file and the sheets read from it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub path: PathBuf,
    pub sheets: Vec<String>,
}

impl Source {
    pub fn new<S>(path: &Path, sheets: &[S]) -> Self
    where
        S: ToString,
    {
        Self {
            path: path.to_path_buf(),
            sheets: sheets.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What the file looked like when it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl Stamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Entry<T> {
    stamp: Option<Stamp>,
    value: Rc<T>,
}

#[derive(Debug)]
pub struct Cache<T> {
    entries: HashMap<Source, Entry<T>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `source`, loading it if absent or stale
    ///
    /// A failed load leaves the cache without an entry for `source`.
    pub fn fetch<F>(&mut self, source: &Source, load: F) -> Result<Rc<T>, LoadError>
    where
        F: FnOnce(&Source) -> Result<T, LoadError>,
    {
        let stamp = Stamp::of(&source.path);
        let reason = match self.entries.get(source) {
            Some(entry) if stamp.is_some() && entry.stamp == stamp => {
                debug!("cache hit for {}", source.path.display());
                return Ok(Rc::clone(&entry.value));
            }
            Some(_) => "file changed",
            None => "not cached",
        };
        info!("loading {} ({})", source.path.display(), reason);
        self.entries.remove(source);
        let value = Rc::new(load(source)?);
        self.entries.insert(
            source.clone(),
            Entry {
                stamp,
                value: Rc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Forget `source`, returns whether it was cached
    pub fn invalidate(&mut self, source: &Source) -> bool {
        self.entries.remove(source).is_some()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    fn counting<'c>(
        loads: &'c Cell<usize>,
        value: &'static str,
    ) -> impl FnOnce(&Source) -> Result<String, LoadError> + 'c {
        move |_| {
            loads.set(loads.get() + 1);
            Ok(value.to_string())
        }
    }

    fn workbook(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn second_fetch_is_a_hit() {
        let file = workbook("v1");
        let source = Source::new(file.path(), &["CALENDARIO"]);
        let loads = Cell::new(0);
        let mut cache = Cache::new();
        let a = cache.fetch(&source, counting(&loads, "data")).unwrap();
        let b = cache.fetch(&source, counting(&loads, "other")).unwrap();
        assert_eq!(loads.get(), 1);
        assert_eq!(*b, "data");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sheet_set_is_part_of_the_key() {
        let file = workbook("v1");
        let loads = Cell::new(0);
        let mut cache = Cache::new();
        cache
            .fetch(&Source::new(file.path(), &["A"]), counting(&loads, "a"))
            .unwrap();
        cache
            .fetch(&Source::new(file.path(), &["A", "B"]), counting(&loads, "ab"))
            .unwrap();
        assert_eq!(loads.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn explicit_invalidation() {
        let file = workbook("v1");
        let source = Source::new(file.path(), &["CALENDARIO"]);
        let loads = Cell::new(0);
        let mut cache = Cache::new();
        cache.fetch(&source, counting(&loads, "first")).unwrap();
        assert!(cache.invalidate(&source));
        assert!(!cache.invalidate(&source));
        let v = cache.fetch(&source, counting(&loads, "second")).unwrap();
        assert_eq!(loads.get(), 2);
        assert_eq!(*v, "second");
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn changed_file_is_reloaded() {
        let mut file = workbook("v1");
        let source = Source::new(file.path(), &["CALENDARIO"]);
        let loads = Cell::new(0);
        let mut cache = Cache::new();
        cache.fetch(&source, counting(&loads, "old")).unwrap();
        file.write_all(b" and more").unwrap();
        file.flush().unwrap();
        let v = cache.fetch(&source, counting(&loads, "new")).unwrap();
        assert_eq!(loads.get(), 2);
        assert_eq!(*v, "new");
    }

    #[test]
    fn failures_are_not_cached() {
        let file = workbook("v1");
        let source = Source::new(file.path(), &["CALENDARIO"]);
        let mut cache: Cache<String> = Cache::new();
        let err = cache.fetch(&source, |_| {
            Err(LoadError::MissingSheet {
                sheet: "CALENDARIO".to_string(),
            })
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_file_never_hits() {
        let source = Source::new(Path::new("/nonexistent/book.xlsx"), &["CALENDARIO"]);
        let loads = Cell::new(0);
        let mut cache = Cache::new();
        cache.fetch(&source, counting(&loads, "x")).unwrap();
        cache.fetch(&source, counting(&loads, "y")).unwrap();
        assert_eq!(loads.get(), 2);
    }
}
