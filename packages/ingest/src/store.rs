//! Marker store: the destination of committed feature chunks.

use madrid_map_feature_models::Feature;

/// Receives committed features and tracks which ones are shown.
///
/// Chunks arrive in row order. Features are never modified once
/// committed; they only leave the store when it is cleared for a reload.
pub trait MarkerStore: Send {
    /// Appends a chunk of features, initially visible.
    fn commit_chunk(&mut self, chunk: Vec<Feature>);

    /// Iterates every committed feature in commit order.
    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_>;

    /// Recomputes per-feature visibility.
    fn apply_visibility(&mut self, is_visible: &dyn Fn(&Feature) -> bool);

    /// Removes every feature.
    fn clear(&mut self);

    /// Number of committed features.
    fn len(&self) -> usize;

    /// Whether the store holds no features.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`MarkerStore`] backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryMarkerStore {
    features: Vec<Feature>,
    visible: Vec<bool>,
    chunk_sizes: Vec<usize>,
}

impl InMemoryMarkerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of the chunks committed since the last clear, in order.
    #[must_use]
    pub fn chunk_sizes(&self) -> &[usize] {
        &self.chunk_sizes
    }

    /// Features currently shown.
    pub fn visible(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .zip(&self.visible)
            .filter_map(|(f, v)| v.then_some(f))
    }

    /// Number of features currently shown.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

impl MarkerStore for InMemoryMarkerStore {
    fn commit_chunk(&mut self, chunk: Vec<Feature>) {
        self.chunk_sizes.push(chunk.len());
        self.visible.extend(std::iter::repeat_n(true, chunk.len()));
        self.features.extend(chunk);
    }

    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_> {
        Box::new(self.features.iter())
    }

    fn apply_visibility(&mut self, is_visible: &dyn Fn(&Feature) -> bool) {
        for (feature, visible) in self.features.iter().zip(self.visible.iter_mut()) {
            *visible = is_visible(feature);
        }
    }

    fn clear(&mut self) {
        self.features.clear();
        self.visible.clear();
        self.chunk_sizes.clear();
    }

    fn len(&self) -> usize {
        self.features.len()
    }
}
