use crate::storage::{Storage, DECKS_KEY};
use crate::{
    now_millis, seed, unique_id, CardDraft, CardId, Category, CoreError, Deck, DeckDraft, DeckId,
    DeckPatch,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What an edit did to the deck it was handed; unchanged edits skip the write.
enum Edit<R> {
    Changed(R),
    Unchanged(R),
}

/// CRUD over the deck collection, stored as one JSON array under [`DECKS_KEY`].
///
/// Every mutation is a read-modify-write of the whole collection. `writer`
/// serializes those cycles, so share one `DeckRepo` per store within a process.
pub struct DeckRepo {
    storage: Arc<dyn Storage>,
    writer: Mutex<()>,
}

impl DeckRepo {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            writer: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Option<Vec<Deck>>, CoreError> {
        match self.storage.read(DECKS_KEY).await? {
            Some(v) => {
                let mut decks: Vec<Deck> = serde_json::from_value(v)?;
                // Stored counts may be missing or stale.
                for d in decks.iter_mut() {
                    let cards = std::mem::take(&mut d.cards);
                    d.set_cards(cards);
                }
                Ok(Some(decks))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, decks: &[Deck]) -> Result<(), CoreError> {
        let value = serde_json::to_value(decks)?;
        self.storage.write(DECKS_KEY, value).await.map_err(|e| {
            warn!(error = %e, "failed to persist decks");
            e
        })
    }

    /// Writes the seed catalog if the collection has never been written.
    pub async fn initialize(&self) -> Result<bool, CoreError> {
        let _guard = self.writer.lock().await;
        if self.storage.read(DECKS_KEY).await?.is_some() {
            return Ok(false);
        }
        let decks = seed::catalog();
        self.save(&decks).await?;
        info!(decks = decks.len(), "storage seeded");
        Ok(true)
    }

    pub async fn list_all(&self) -> Result<Vec<Deck>, CoreError> {
        Ok(self.load().await?.unwrap_or_default())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Deck>, CoreError> {
        Ok(self.list_all().await?.into_iter().find(|d| d.id == id))
    }

    pub async fn list_featured(&self) -> Result<Vec<Deck>, CoreError> {
        Ok(crate::filters::featured(&self.list_all().await?))
    }

    pub async fn list_by_category(&self, category: Category) -> Result<Vec<Deck>, CoreError> {
        Ok(crate::filters::by_category(&self.list_all().await?, category))
    }

    /// Distinct categories in the order they first appear.
    pub async fn categories(&self) -> Result<Vec<Category>, CoreError> {
        let mut out = Vec::new();
        for d in self.list_all().await? {
            if !out.contains(&d.category) {
                out.push(d.category);
            }
        }
        Ok(out)
    }

    pub async fn create(&self, draft: DeckDraft) -> Result<DeckId, CoreError> {
        draft.validate()?;
        let _guard = self.writer.lock().await;
        let mut decks = self.list_all().await?;
        let now = now_millis();
        let id = unique_id("deck", now, |id| decks.iter().any(|d| d.id == id));
        decks.push(Deck::from_draft(id.clone(), draft, now));
        self.save(&decks).await?;
        debug!(deck_id = %id, "deck created");
        Ok(id)
    }

    /// A missing deck is reported before the patch is validated.
    pub async fn update(&self, id: &str, patch: DeckPatch) -> Result<(), CoreError> {
        let now = now_millis();
        self.edit(id, move |deck| {
            patch.validate()?;
            deck.apply(patch, now);
            Ok(Edit::Changed(()))
        })
        .await
    }

    /// Drops the deck with its cards. Unknown ids are ignored and nothing is written.
    pub async fn remove(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.writer.lock().await;
        let mut decks = self.list_all().await?;
        let before = decks.len();
        decks.retain(|d| d.id != id);
        if decks.len() == before {
            return Ok(());
        }
        self.save(&decks).await?;
        debug!(deck_id = %id, "deck removed");
        Ok(())
    }

    pub async fn add_card(&self, deck_id: &str, draft: CardDraft) -> Result<CardId, CoreError> {
        let now = now_millis();
        self.edit(deck_id, move |deck| {
            draft.validate()?;
            let id = unique_id("card", now, |c| deck.card(c).is_some());
            let mut cards = deck.cards.clone();
            cards.push(draft.into_card(id.clone(), now));
            deck.apply(
                DeckPatch {
                    cards: Some(cards),
                    ..Default::default()
                },
                now,
            );
            Ok(Edit::Changed(id))
        })
        .await
    }

    /// Flips one card's flag. An unknown `card_id` changes nothing.
    pub async fn set_card_learned(
        &self,
        deck_id: &str,
        card_id: &str,
        learned: bool,
    ) -> Result<(), CoreError> {
        let now = now_millis();
        self.edit(deck_id, move |deck| {
            if deck.card(card_id).is_none() {
                return Ok(Edit::Unchanged(()));
            }
            let cards = deck
                .cards
                .iter()
                .cloned()
                .map(|mut c| {
                    if c.id == card_id {
                        c.learned = learned;
                    }
                    c
                })
                .collect();
            deck.apply(
                DeckPatch {
                    cards: Some(cards),
                    ..Default::default()
                },
                now,
            );
            Ok(Edit::Changed(()))
        })
        .await
    }

    async fn edit<R, F>(&self, id: &str, f: F) -> Result<R, CoreError>
    where
        F: FnOnce(&mut Deck) -> Result<Edit<R>, CoreError> + Send,
        R: Send,
    {
        let _guard = self.writer.lock().await;
        let mut decks = self.list_all().await?;
        let deck = decks
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(CoreError::NotFound("deck"))?;
        match f(deck)? {
            Edit::Unchanged(out) => Ok(out),
            Edit::Changed(out) => {
                self.save(&decks).await?;
                Ok(out)
            }
        }
    }
}
