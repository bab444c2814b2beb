use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tellina_core::types::{AccessCode, AnnotationId};
use tellina_core::view::AnnotationView;
use tokio::sync::{Mutex, RwLock};

/// Identifies one mounted annotation as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub viewer: AccessCode,
    pub annotation_id: AnnotationId,
}

impl SlotKey {
    pub fn new(viewer: impl Into<AccessCode>, annotation_id: impl Into<AnnotationId>) -> Self {
        Self {
            viewer: viewer.into(),
            annotation_id: annotation_id.into(),
        }
    }
}

/// State of one mounted annotation.
///
/// `ops` is the annotation's operation queue: every mutating widget
/// operation holds it for its whole duration, backend round trip included,
/// so operations on the same annotation never interleave. `view` is only
/// locked briefly, which keeps rendering responsive while an operation is
/// waiting on the backend.
pub struct AnnotationSlot {
    pub(crate) ops: Mutex<()>,
    pub(crate) view: RwLock<AnnotationView>,
    last_used: Mutex<Instant>,
}

impl AnnotationSlot {
    pub fn new(view: AnnotationView) -> Self {
        Self {
            ops: Mutex::new(()),
            view: RwLock::new(view),
            last_used: Mutex::new(Instant::now()),
        }
    }

    async fn touch(&self) {
        *self.last_used.lock().await = Instant::now();
    }
}

/// All mounted annotations.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Slots stay until unmounted or until
/// [`evict_idle`](Self::evict_idle) finds them unused.
#[derive(Default)]
pub struct WidgetRegistry {
    slots: RwLock<HashMap<SlotKey, Arc<AnnotationSlot>>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &SlotKey) -> Option<Arc<AnnotationSlot>> {
        let slot = self.slots.read().await.get(key).cloned()?;
        slot.touch().await;
        Some(slot)
    }

    /// Return the slot for `key`, creating it from `init` if absent.
    pub async fn get_or_insert_with(
        &self,
        key: SlotKey,
        init: impl FnOnce() -> AnnotationView,
    ) -> Arc<AnnotationSlot> {
        if let Some(slot) = self.get(&key).await {
            return slot;
        }
        let slot = {
            let mut slots = self.slots.write().await;
            Arc::clone(
                slots
                    .entry(key)
                    .or_insert_with(|| Arc::new(AnnotationSlot::new(init()))),
            )
        };
        slot.touch().await;
        slot
    }

    /// Remove a slot. Returns whether it existed.
    pub async fn remove(&self, key: &SlotKey) -> bool {
        self.slots.write().await.remove(key).is_some()
    }

    /// Remove slots nobody has looked up for at least `max_idle`. A slot
    /// with a live handle (an operation in flight included) is kept.
    /// Returns the evicted keys.
    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<SlotKey> {
        let mut slots = self.slots.write().await;
        let mut idle = Vec::new();
        for (key, slot) in slots.iter() {
            if Arc::strong_count(slot) == 1 && slot.last_used.lock().await.elapsed() >= max_idle {
                idle.push(key.clone());
            }
        }
        for key in &idle {
            slots.remove(key);
        }
        idle
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_insert_reuses_existing_slot() {
        let registry = WidgetRegistry::new();
        let key = SlotKey::new("viewer", "A1");

        let first = registry
            .get_or_insert_with(key.clone(), || AnnotationView::new("A1", "viewer", "one"))
            .await;
        let second = registry
            .get_or_insert_with(key.clone(), || AnnotationView::new("A1", "viewer", "two"))
            .await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.view.read().await.text, "one");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_viewers_get_separate_slots() {
        let registry = WidgetRegistry::new();
        registry
            .get_or_insert_with(SlotKey::new("a", "A1"), || AnnotationView::new("A1", "a", "t"))
            .await;
        registry
            .get_or_insert_with(SlotKey::new("b", "A1"), || AnnotationView::new("A1", "b", "t"))
            .await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.remove(&SlotKey::new("a", "A1")).await);
        assert!(!registry.remove(&SlotKey::new("a", "A1")).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_recent_and_held_slots() {
        let registry = WidgetRegistry::new();
        let held = registry
            .get_or_insert_with(SlotKey::new("a", "A1"), || AnnotationView::new("A1", "a", "t"))
            .await;
        registry
            .get_or_insert_with(SlotKey::new("b", "A1"), || AnnotationView::new("A1", "b", "t"))
            .await;

        assert!(registry.evict_idle(Duration::from_secs(3600)).await.is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let evicted = registry.evict_idle(Duration::from_millis(10)).await;

        assert_eq!(evicted, [SlotKey::new("b", "A1")]);
        assert_eq!(registry.len().await, 1);

        drop(held);
        tokio::time::sleep(Duration::from_millis(20)).await;
        registry.get(&SlotKey::new("a", "A1")).await;
        assert!(registry.evict_idle(Duration::from_millis(10)).await.is_empty());
    }
}
