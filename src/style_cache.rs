use dashmap::DashMap;

use crate::types::StyleId;

/// Concurrent `(column, decimal places) -> style` memo.
///
/// Seeded from the template's leading rows, then read and lazily extended by every producer.
/// The first style recorded for a key is kept forever; later inserts for the same key return the
/// settled value instead of replacing it.
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: DashMap<(usize, usize), StyleId>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, col: usize, decimals: usize) -> Option<StyleId> {
        self.entries.get(&(col, decimals)).map(|style| *style)
    }

    /// Record `style` for the key unless one is already present; returns the settled style.
    pub fn insert_if_absent(&self, col: usize, decimals: usize, style: StyleId) -> StyleId {
        *self.entries.entry((col, decimals)).or_insert(style)
    }

    /// Style for a numeric cell with `decimals` places in column `col`.
    ///
    /// A key seen for the first time settles on `fallback` (the column's data style).
    pub fn resolve(&self, col: usize, decimals: usize, fallback: StyleId) -> StyleId {
        if let Some(style) = self.get(col, decimals) {
            return style;
        }
        self.insert_if_absent(col, decimals, fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::StyleCache;

    #[test]
    fn first_writer_wins() {
        let cache = StyleCache::new();
        assert_eq!(cache.insert_if_absent(1, 2, 7), 7);
        assert_eq!(cache.insert_if_absent(1, 2, 9), 7);
        assert_eq!(cache.get(1, 2), Some(7));
        assert_eq!(cache.get(1, 3), None);
    }

    #[test]
    fn unknown_keys_settle_on_the_fallback() {
        let cache = StyleCache::new();
        assert_eq!(cache.resolve(0, 0, 4), 4);
        assert_eq!(cache.resolve(0, 0, 5), 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_resolvers_agree_on_one_style() {
        let cache = Arc::new(StyleCache::new());
        let handles: Vec<_> = (0..8u32)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    (0..200)
                        .map(|i| cache.resolve(i % 10, 2, worker + 100))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 10);
        for col in 0..10usize {
            let settled = cache.get(col, 2).unwrap();
            for seen in &results {
                for (i, style) in seen.iter().enumerate() {
                    if i % 10 == col {
                        assert_eq!(*style, settled);
                    }
                }
            }
        }
    }
}
