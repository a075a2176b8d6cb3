//! Decks written into empty storage on first start.

use crate::{Card, Category, Deck};
use chrono::{DateTime, Utc};

const SEEDED_AT_MS: i64 = 1_704_067_200_000;

struct SeedDeck {
    key: &'static str,
    title: &'static str,
    description: &'static str,
    category: Category,
    featured: bool,
    cards: &'static [(&'static str, &'static str)],
}

const CATALOG: &[SeedDeck] = &[
    SeedDeck {
        key: "animals",
        title: "Animal Friends",
        description: "Meet the animals and learn their names",
        category: Category::Animals,
        featured: true,
        cards: &[
            ("🐶", "Dog"),
            ("🐱", "Cat"),
            ("🐮", "Cow"),
            ("🐷", "Pig"),
            ("🦁", "Lion"),
            ("🐘", "Elephant"),
        ],
    },
    SeedDeck {
        key: "colors",
        title: "Colors of the Rainbow",
        description: "Learn the basic colors",
        category: Category::Colors,
        featured: true,
        cards: &[
            ("🔴", "Red"),
            ("🟠", "Orange"),
            ("🟡", "Yellow"),
            ("🟢", "Green"),
            ("🔵", "Blue"),
            ("🟣", "Purple"),
        ],
    },
    SeedDeck {
        key: "alphabet",
        title: "ABC Adventure",
        description: "Letters and words that start with them",
        category: Category::Alphabet,
        featured: true,
        cards: &[
            ("A", "🍎 Apple"),
            ("B", "⚽ Ball"),
            ("C", "🐱 Cat"),
            ("D", "🐶 Dog"),
            ("E", "🐘 Elephant"),
        ],
    },
    SeedDeck {
        key: "numbers",
        title: "Counting Fun",
        description: "Count from one to five",
        category: Category::Numbers,
        featured: false,
        cards: &[
            ("1️⃣", "One"),
            ("2️⃣", "Two"),
            ("3️⃣", "Three"),
            ("4️⃣", "Four"),
            ("5️⃣", "Five"),
        ],
    },
    SeedDeck {
        key: "shapes",
        title: "Shape Explorer",
        description: "Spot the shapes around you",
        category: Category::Shapes,
        featured: false,
        cards: &[
            ("⚪", "Circle"),
            ("🟥", "Square"),
            ("🔺", "Triangle"),
            ("⭐", "Star"),
            ("❤️", "Heart"),
        ],
    },
];

pub fn catalog() -> Vec<Deck> {
    let at: DateTime<Utc> = DateTime::from_timestamp_millis(SEEDED_AT_MS).unwrap_or_default();
    CATALOG
        .iter()
        .map(|s| {
            let cards = s
                .cards
                .iter()
                .enumerate()
                .map(|(i, (front, back))| Card {
                    id: format!("card-{}-{}", s.key, i + 1),
                    front: (*front).to_string(),
                    back: (*back).to_string(),
                    image_url: None,
                    learned: false,
                    created_at: at,
                })
                .collect();
            let mut deck = Deck {
                id: format!("deck-{}", s.key),
                title: s.title.to_string(),
                description: s.description.to_string(),
                category: s.category,
                cards: Vec::new(),
                card_count: 0,
                created_at: at,
                updated_at: at,
                is_featured: Some(s.featured),
            };
            deck.set_cards(cards);
            deck
        })
        .collect()
}
