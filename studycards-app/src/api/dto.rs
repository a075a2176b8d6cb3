use serde::{Deserialize, Serialize};
use studycards_core::{Category, DeckId};

#[derive(Serialize, Deserialize)]
pub struct CreatedOut {
    pub id: String,
}

#[derive(Deserialize)]
pub struct LearnedIn {
    pub learned: bool,
}

/// `GET /decks` filters; both optional and combined when given together.
#[derive(Deserialize, Default)]
pub struct DeckQuery {
    pub category: Option<Category>,
    pub q: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAddedOut {
    pub id: String,
    pub deck_id: DeckId,
}
