use crate::{now_millis, CardId, CoreError, DeckId, DeckRepo, ProgressPatch, ProgressTracker};
use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pass through a deck. Learned toggles go to the deck right away; the
/// user's progress record is only touched by [`finish`](Self::finish).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub deck_id: DeckId,
    #[serde(with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub cards_studied: Vec<CardId>,
    pub cards_learned: Vec<CardId>,
    #[serde(skip)]
    cards_unlearned: Vec<CardId>,
}

impl StudySession {
    pub fn start(deck_id: impl Into<DeckId>) -> Self {
        Self {
            deck_id: deck_id.into(),
            start_time: now_millis(),
            end_time: None,
            cards_studied: Vec::new(),
            cards_learned: Vec::new(),
            cards_unlearned: Vec::new(),
        }
    }

    pub fn study(&mut self, card_id: &str) {
        if !self.cards_studied.iter().any(|c| c == card_id) {
            self.cards_studied.push(card_id.to_string());
        }
    }

    pub async fn mark(&mut self, repo: &DeckRepo, card_id: &str, learned: bool) -> Result<(), CoreError> {
        repo.set_card_learned(&self.deck_id, card_id, learned).await?;
        self.study(card_id);
        let (add, other) = if learned {
            (&mut self.cards_learned, &mut self.cards_unlearned)
        } else {
            (&mut self.cards_unlearned, &mut self.cards_learned)
        };
        other.retain(|c| c != card_id);
        if !add.iter().any(|c| c == card_id) {
            add.push(card_id.to_string());
        }
        Ok(())
    }

    /// Closes the session and folds it into the user's progress for the deck,
    /// counting one more study session.
    pub async fn finish(mut self, tracker: &ProgressTracker, user_id: &str) -> Result<Self, CoreError> {
        self.end_time = Some(now_millis());
        let learned = self.cards_learned.clone();
        let unlearned = self.cards_unlearned.clone();
        tracker
            .update_with(user_id, &self.deck_id, move |existing| {
                let mut ids = existing.map(|p| p.cards_learned.clone()).unwrap_or_default();
                ids.retain(|id| !unlearned.contains(id));
                ids.extend(learned);
                ProgressPatch {
                    cards_learned: Some(ids),
                    total_study_sessions: Some(existing.map_or(0, |p| p.total_study_sessions) + 1),
                }
            })
            .await?;
        Ok(self)
    }
}
