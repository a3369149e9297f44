/// Content-addressed store for asynchronous results
///
/// GPU work finishes in no particular order. Each result is stored under a
/// key derived from everything that produced it (file, dimensions, lighting
/// values), so a stale completion lands on a key the UI no longer asks for.
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::Path;

use super::edit::LightingParams;

/// Hash of the inputs that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultKey(u64);

impl ResultKey {
    /// Key for work that depends only on the source pixels
    ///
    /// The file contents are part of the key, so a file rewritten in place
    /// gets a new key even when its path and dimensions are unchanged.
    pub fn source(path: &Path, contents: &[u8], width: u32, height: u32) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        contents.hash(&mut hasher);
        (width, height).hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Key for work that also depends on the lighting values
    pub fn with_lighting(self, params: &LightingParams) -> Self {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        params.bits().hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Bounded map from `ResultKey` to a completed result.
/// The oldest insertion is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct ResultCache<V> {
    entries: HashMap<ResultKey, V>,
    order: VecDeque<ResultKey>,
    capacity: usize,
}

impl<V> ResultCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, key: ResultKey, value: V) {
        if self.entries.insert(key, value).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn get(&self, key: &ResultKey) -> Option<&V> {
        self.entries.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(path: &str, contents: &[u8], width: u32, height: u32) -> ResultKey {
        ResultKey::source(Path::new(path), contents, width, height)
    }

    #[test]
    fn test_key_changes_with_any_input() {
        let params = LightingParams::default();
        let base = photo("/photos/a.RAF", b"sensor", 10, 20).with_lighting(&params);

        assert_eq!(base, photo("/photos/a.RAF", b"sensor", 10, 20).with_lighting(&params));
        assert_ne!(base, photo("/photos/a.RAF", b"sensor", 20, 10).with_lighting(&params));
        assert_ne!(base, photo("/photos/b.RAF", b"sensor", 10, 20).with_lighting(&params));

        let brighter = LightingParams {
            exposure: 0.1,
            ..params
        };
        assert_ne!(base, photo("/photos/a.RAF", b"sensor", 10, 20).with_lighting(&brighter));
    }

    #[test]
    fn test_rewritten_file_gets_new_key() {
        let before = photo("/photos/a.jpg", &[1, 2, 3, 4], 2, 2);
        let after = photo("/photos/a.jpg", &[1, 2, 3, 5], 2, 2);
        assert_ne!(before, after);
        assert_ne!(
            before.with_lighting(&LightingParams::default()),
            after.with_lighting(&LightingParams::default())
        );
    }

    #[test]
    fn test_lighting_key_differs_from_source_key() {
        let source = photo("/photos/a.jpg", b"jpeg", 4, 4);
        assert_ne!(source, source.with_lighting(&LightingParams::default()));
    }

    #[test]
    fn test_stale_result_is_never_looked_up() {
        let source = photo("/photos/a.jpg", b"jpeg", 4, 4);
        let old = source.with_lighting(&LightingParams::default());
        let current = source.with_lighting(&LightingParams {
            exposure: 1.0,
            ..LightingParams::default()
        });

        let mut cache = ResultCache::new(8);
        cache.insert(current, "new");
        // Earlier invocation completes late
        cache.insert(old, "old");
        assert_eq!(cache.get(&current), Some(&"new"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = ResultCache::new(2);
        let keys: Vec<_> = (0..3).map(|i| photo("/x", &[], i, i)).collect();
        for (i, key) in keys.iter().enumerate() {
            cache.insert(*key, i);
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[0]).is_none());
        assert_eq!(cache.get(&keys[2]), Some(&2));
    }
}
