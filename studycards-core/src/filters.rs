use crate::{Category, Deck};

pub fn featured(decks: &[Deck]) -> Vec<Deck> {
    decks.iter().filter(|d| d.is_featured()).cloned().collect()
}

pub fn by_category(decks: &[Deck], category: Category) -> Vec<Deck> {
    decks
        .iter()
        .filter(|d| d.category == category)
        .cloned()
        .collect()
}

pub fn by_text(decks: &[Deck], query: &str) -> Vec<Deck> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return decks.to_vec();
    }
    decks
        .iter()
        .filter(|d| d.title.to_lowercase().contains(&q) || d.description.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

/// Share of the deck's cards marked learned; 0.0 for an empty deck.
pub fn learned_ratio(deck: &Deck) -> f32 {
    if deck.cards.is_empty() {
        0.0
    } else {
        deck.learned_count() as f32 / deck.cards.len() as f32
    }
}
