use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::mapping::{Annotation, AnnotationKind, TypeDescription};

/// Memoized lookup of repeatable annotations for one entity type.
///
/// The first lookup of a kind scans the type description (direct
/// annotations, container annotations and the composed base chain, in that
/// order, without duplicates) and stores the result. Later lookups return the
/// stored set. Concurrent first lookups of the same kind run a single scan;
/// the others wait for it and read its result.
pub struct AnnotationCache {
    description: Arc<TypeDescription>,
    entries: RwLock<HashMap<AnnotationKind, Arc<Vec<Annotation>>>>,
    scan_lock: Mutex<()>,
    scans: AtomicUsize,
}

impl AnnotationCache {
    pub fn new(description: Arc<TypeDescription>) -> Self {
        AnnotationCache {
            description,
            entries: RwLock::new(HashMap::new()),
            scan_lock: Mutex::new(()),
            scans: AtomicUsize::new(0),
        }
    }

    /// Returns every annotation of `kind` declared on or inherited by the type.
    pub fn find_repeatable(&self, kind: AnnotationKind) -> Arc<Vec<Annotation>> {
        if let Some(found) = self.entries.read().get(&kind) {
            return found.clone();
        }

        let _guard = self.scan_lock.lock();
        // another caller may have finished the scan while we waited
        if let Some(found) = self.entries.read().get(&kind) {
            return found.clone();
        }

        let found = Arc::new(self.scan(kind));
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.entries.write().insert(kind, found.clone());
        found
    }

    /// Returns the first annotation of `kind`; the type's own declaration
    /// takes precedence over inherited ones.
    pub fn find_first(&self, kind: AnnotationKind) -> Option<Annotation> {
        self.find_repeatable(kind).first().cloned()
    }

    /// Number of scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn scan(&self, kind: AnnotationKind) -> Vec<Annotation> {
        let mut found: Vec<Annotation> = Vec::new();
        for description in self.description.hierarchy() {
            for annotation in description.annotations() {
                if annotation.kind() != kind {
                    continue;
                }
                for item in annotation.expand() {
                    if !found.contains(&item) {
                        found.push(item);
                    }
                }
            }
        }
        log::debug!(
            "Scanned {} for {:?} annotations, found {}",
            self.description.type_name(),
            kind,
            found.len()
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{CollectionAnnotation, HashIndex, SearchViewAnnotation};
    use std::thread;

    fn hash(fields: &[&str]) -> HashIndex {
        HashIndex {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn description() -> Arc<TypeDescription> {
        let base = TypeDescription::builder("Base")
            .annotation(Annotation::SearchView(SearchViewAnnotation::named("baseView")))
            .annotation(Annotation::HashIndex(hash(&["c"])))
            .build();
        Arc::new(
            TypeDescription::builder("Entity")
                .annotation(Annotation::Document(CollectionAnnotation::named("entities")))
                .annotation(Annotation::HashIndex(hash(&["a"])))
                .annotation(Annotation::HashIndexes(vec![hash(&["b"]), hash(&["a"])]))
                .base(base)
                .build(),
        )
    }

    #[test]
    fn test_merges_direct_container_and_base() {
        let cache = AnnotationCache::new(description());
        let found = cache.find_repeatable(AnnotationKind::HashIndex);
        let fields: Vec<Vec<String>> = found
            .iter()
            .filter_map(|a| a.as_hash_index())
            .map(|i| i.fields.clone())
            .collect();
        assert_eq!(
            fields,
            vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_second_lookup_does_not_rescan() {
        let cache = AnnotationCache::new(description());
        let first = cache.find_repeatable(AnnotationKind::HashIndex);
        let second = cache.find_repeatable(AnnotationKind::HashIndex);
        assert_eq!(first, second);
        assert_eq!(cache.scan_count(), 1);

        cache.find_repeatable(AnnotationKind::GeoIndex);
        assert_eq!(cache.scan_count(), 2);
        assert!(cache.find_repeatable(AnnotationKind::GeoIndex).is_empty());
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_find_first_prefers_inherited_only_when_absent() {
        let cache = AnnotationCache::new(description());
        let document = cache.find_first(AnnotationKind::Document).unwrap();
        assert_eq!(document.as_collection().unwrap().name, "entities");
        let view = cache.find_first(AnnotationKind::SearchView).unwrap();
        assert_eq!(view.as_search_view().unwrap().name, "baseView");
        assert!(cache.find_first(AnnotationKind::Edge).is_none());
    }

    #[test]
    fn test_concurrent_lookups_scan_once() {
        let cache = Arc::new(AnnotationCache::new(description()));
        let mut handles = vec![];
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                cache.find_repeatable(AnnotationKind::HashIndex).len()
            }));
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(cache.scan_count(), 1);
    }
}
