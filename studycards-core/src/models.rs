use crate::CoreError;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type DeckId = String;
pub type CardId = String;
pub type UserId = String;

/// Current time at the millisecond precision records are persisted with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `<prefix>-<epoch ms>-<8 hex chars>`; the random tail keeps ids minted in the
/// same millisecond apart.
pub fn new_id(prefix: &str, now: DateTime<Utc>) -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}-{}", now.timestamp_millis(), &tail[..8])
}

/// Mints ids until one is not `taken`.
pub fn unique_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = new_id(prefix, now);
        if !taken(&id) {
            return id;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Animals,
    Colors,
    Alphabet,
    Numbers,
    Shapes,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Animals,
        Category::Colors,
        Category::Alphabet,
        Category::Numbers,
        Category::Shapes,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Animals => "animals",
            Category::Colors => "colors",
            Category::Alphabet => "alphabet",
            Category::Numbers => "numbers",
            Category::Shapes => "shapes",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let q = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == q)
            .ok_or(CoreError::Invalid("category"))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub learned: bool,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Card {
    #[cfg(test)]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: new_id("card", now),
            front: front.into(),
            back: back.into(),
            image_url: None,
            learned: false,
            created_at: now,
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        validate_faces(&self.front, &self.back)
    }
}

/// Payload for adding a card; the repository assigns everything else.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardDraft {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CardDraft {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            image_url: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_faces(&self.front, &self.back)
    }

    pub fn into_card(self, id: CardId, now: DateTime<Utc>) -> Card {
        Card {
            id,
            front: self.front,
            back: self.back,
            image_url: self.image_url,
            learned: false,
            created_at: now,
        }
    }
}

fn validate_faces(front: &str, back: &str) -> Result<(), CoreError> {
    if front.trim().is_empty() {
        return Err(CoreError::Invalid("card front is empty"));
    }
    if back.trim().is_empty() {
        return Err(CoreError::Invalid("card back is empty"));
    }
    Ok(())
}

fn validate_cards(cards: &[Card]) -> Result<(), CoreError> {
    for (i, c) in cards.iter().enumerate() {
        c.validate()?;
        if cards[..i].iter().any(|prev| prev.id == c.id) {
            return Err(CoreError::Invalid("duplicate card id"));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub card_count: usize,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl Deck {
    pub fn from_draft(id: DeckId, draft: DeckDraft, now: DateTime<Utc>) -> Self {
        let mut deck = Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            cards: Vec::new(),
            card_count: 0,
            created_at: now,
            updated_at: now,
            is_featured: draft.is_featured,
        };
        deck.set_cards(draft.cards);
        deck
    }

    /// Every change to the card list goes through here so `card_count` cannot drift.
    pub fn set_cards(&mut self, cards: Vec<Card>) {
        self.card_count = cards.len();
        self.cards = cards;
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn learned_count(&self) -> usize {
        self.cards.iter().filter(|c| c.learned).count()
    }

    /// Shallow merge: provided fields replace, omitted ones stay.
    pub fn apply(&mut self, patch: DeckPatch, now: DateTime<Utc>) {
        if let Some(t) = patch.title {
            self.title = t;
        }
        if let Some(d) = patch.description {
            self.description = d;
        }
        if let Some(c) = patch.category {
            self.category = c;
        }
        if let Some(f) = patch.is_featured {
            self.is_featured = Some(f);
        }
        if let Some(cards) = patch.cards {
            self.set_cards(cards);
        }
        self.updated_at = now;
    }
}

/// A deck as submitted for creation: no id, timestamps, or card count.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeckDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl DeckDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            cards: Vec::new(),
            is_featured: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Invalid("deck title is empty"));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::Invalid("deck description is empty"));
        }
        validate_cards(&self.cards)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeckPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl DeckPatch {
    pub fn validate(&self) -> Result<(), CoreError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(CoreError::Invalid("deck title is empty"));
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err(CoreError::Invalid("deck description is empty"));
        }
        if let Some(cards) = &self.cards {
            validate_cards(cards)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub deck_id: DeckId,
    #[serde(default)]
    pub cards_learned: Vec<CardId>,
    #[serde(with = "ts_milliseconds")]
    pub last_studied: DateTime<Utc>,
    #[serde(default)]
    pub total_study_sessions: u32,
}

impl UserProgress {
    pub fn new(deck_id: impl Into<DeckId>, now: DateTime<Utc>) -> Self {
        Self {
            deck_id: deck_id.into(),
            cards_learned: Vec::new(),
            last_studied: now,
            total_study_sessions: 0,
        }
    }

    pub fn apply(&mut self, patch: ProgressPatch, now: DateTime<Utc>) {
        if let Some(ids) = patch.cards_learned {
            self.cards_learned = dedup_ids(ids);
        }
        if let Some(n) = patch.total_study_sessions {
            self.total_study_sessions = self.total_study_sessions.max(n);
        }
        self.last_studied = now;
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards_learned: Option<Vec<CardId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_study_sessions: Option<u32>,
}

/// Keeps the first occurrence of every id.
pub fn dedup_ids(ids: Vec<CardId>) -> Vec<CardId> {
    let mut out: Vec<CardId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
