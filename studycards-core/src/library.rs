use crate::{DeckRepo, ProgressTracker, Storage};
use std::sync::Arc;

/// Deck repository and progress tracker over one shared store.
pub struct Library {
    pub decks: DeckRepo,
    pub progress: ProgressTracker,
}

impl Library {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            decks: DeckRepo::new(storage.clone()),
            progress: ProgressTracker::new(storage),
        }
    }
}
