use std::sync::Arc;

use studycards_core::storage::DECKS_KEY;
use studycards_core::{
    seed, CardDraft, Category, CoreError, DeckDraft, DeckPatch, DeckRepo, DetachedStore,
    MemoryStore, Storage,
};

fn repo() -> (Arc<MemoryStore>, DeckRepo) {
    let store = Arc::new(MemoryStore::new());
    let repo = DeckRepo::new(store.clone());
    (store, repo)
}

#[tokio::test]
async fn initialize_seeds_once() {
    let (store, repo) = repo();

    assert!(repo.initialize().await.unwrap());
    let first = store.read(DECKS_KEY).await.unwrap();

    assert!(!repo.initialize().await.unwrap());
    assert_eq!(store.write_count(DECKS_KEY), 1);
    assert_eq!(store.read(DECKS_KEY).await.unwrap(), first);
    assert_eq!(repo.list_all().await.unwrap(), seed::catalog());
}

#[tokio::test]
async fn initialize_leaves_emptied_collection_alone() {
    let (_store, repo) = repo();
    repo.initialize().await.unwrap();
    for d in repo.list_all().await.unwrap() {
        repo.remove(&d.id).await.unwrap();
    }
    assert!(!repo.initialize().await.unwrap());
    assert!(repo.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let (_store, repo) = repo();
    let mut draft = DeckDraft::new("Spanish Vocab", "basics", Category::Other);
    draft.is_featured = Some(false);

    let id = repo.create(draft.clone()).await.unwrap();
    let deck = repo.get_by_id(&id).await.unwrap().expect("deck");

    assert!(id.starts_with("deck-"));
    assert_eq!(deck.id, id);
    assert_eq!(deck.title, draft.title);
    assert_eq!(deck.description, draft.description);
    assert_eq!(deck.category, draft.category);
    assert_eq!(deck.is_featured, draft.is_featured);
    assert!(deck.cards.is_empty());
    assert_eq!(deck.card_count, 0);
    assert_eq!(deck.created_at, deck.updated_at);
}

#[tokio::test]
async fn rapid_creates_get_distinct_ids() {
    let (_store, repo) = repo();
    let mut ids = Vec::new();
    for i in 0..20 {
        let d = DeckDraft::new(format!("Deck {i}"), "desc", Category::Numbers);
        ids.push(repo.create(d).await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(repo.list_all().await.unwrap().len(), 20);
}

#[tokio::test]
async fn create_rejects_blank_fields() {
    let (store, repo) = repo();
    let err = repo
        .create(DeckDraft::new("Title", "   ", Category::Other))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Invalid("deck description is empty"));
    assert_eq!(store.write_count(DECKS_KEY), 0);
}

#[tokio::test]
async fn spanish_vocab_scenario() {
    let (_store, repo) = repo();
    let deck_id = repo
        .create(DeckDraft::new("Spanish Vocab", "basics", Category::Other))
        .await
        .unwrap();

    let card_id = repo
        .add_card(&deck_id, CardDraft::new("Hola", "Hello"))
        .await
        .unwrap();
    assert!(card_id.starts_with("card-"));

    let deck = repo.get_by_id(&deck_id).await.unwrap().unwrap();
    assert_eq!(deck.cards.len(), 1);
    assert_eq!(deck.card_count, 1);
    assert!(!deck.cards[0].learned);

    repo.set_card_learned(&deck_id, &card_id, true).await.unwrap();
    let deck = repo.get_by_id(&deck_id).await.unwrap().unwrap();
    assert!(deck.cards[0].learned);

    repo.remove(&deck_id).await.unwrap();
    assert!(repo.get_by_id(&deck_id).await.unwrap().is_none());
}

#[tokio::test]
async fn add_card_keeps_count_in_step() {
    let (_store, repo) = repo();
    let deck_id = repo
        .create(DeckDraft::new("Colors", "Basic colors", Category::Colors))
        .await
        .unwrap();
    for (front, back) in [("🔴", "Red"), ("🟢", "Green"), ("🔵", "Blue")] {
        repo.add_card(&deck_id, CardDraft::new(front, back)).await.unwrap();
        let deck = repo.get_by_id(&deck_id).await.unwrap().unwrap();
        assert_eq!(deck.card_count, deck.cards.len());
    }
    let deck = repo.get_by_id(&deck_id).await.unwrap().unwrap();
    let backs: Vec<&str> = deck.cards.iter().map(|c| c.back.as_str()).collect();
    assert_eq!(backs, vec!["Red", "Green", "Blue"]);
    assert!(deck.updated_at >= deck.created_at);
}

#[tokio::test]
async fn add_card_to_missing_deck_is_not_found() {
    let (_store, repo) = repo();
    let err = repo
        .add_card("deck-missing", CardDraft::new("a", "b"))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("deck"));
}

#[tokio::test]
async fn update_merges_shallowly() {
    let (_store, repo) = repo();
    repo.initialize().await.unwrap();
    let before = repo.get_by_id("deck-animals").await.unwrap().unwrap();

    repo.update(
        "deck-animals",
        DeckPatch {
            title: Some("Zoo".into()),
            is_featured: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let after = repo.get_by_id("deck-animals").await.unwrap().unwrap();
    assert_eq!(after.title, "Zoo");
    assert!(!after.is_featured());
    assert_eq!(after.description, before.description);
    assert_eq!(after.cards, before.cards);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn update_missing_deck_is_not_found() {
    let (_store, repo) = repo();
    let err = repo
        .update("nope", DeckPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("deck"));
}

#[tokio::test]
async fn missing_deck_wins_over_invalid_input() {
    let (store, repo) = repo();
    repo.initialize().await.unwrap();

    let blank_title = DeckPatch {
        title: Some(" ".into()),
        ..Default::default()
    };
    let err = repo.update("nope", blank_title.clone()).await.unwrap_err();
    assert_eq!(err, CoreError::NotFound("deck"));
    let err = repo
        .add_card("nope", CardDraft::new("", "b"))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("deck"));

    let err = repo.update("deck-animals", blank_title).await.unwrap_err();
    assert_eq!(err, CoreError::Invalid("deck title is empty"));
    let err = repo
        .add_card("deck-animals", CardDraft::new("", "b"))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::Invalid("card front is empty"));
    assert_eq!(store.write_count(DECKS_KEY), 1);
}

#[tokio::test]
async fn card_count_is_rederived_on_read() {
    let (store, repo) = repo();
    let mut raw = serde_json::to_value(seed::catalog()).unwrap();
    let decks = raw.as_array_mut().unwrap();
    decks[0].as_object_mut().unwrap().remove("cardCount");
    decks[1]["cardCount"] = serde_json::json!(99);
    store.write(DECKS_KEY, raw).await.unwrap();

    let all = repo.list_all().await.unwrap();
    assert_eq!(all[0].card_count, 6);
    assert_eq!(all[1].card_count, 6);
    let colors = repo.get_by_id("deck-colors").await.unwrap().unwrap();
    assert_eq!(colors.card_count, colors.cards.len());
}

#[tokio::test]
async fn remove_unknown_id_changes_nothing() {
    let (store, repo) = repo();
    repo.initialize().await.unwrap();
    let before = store.read(DECKS_KEY).await.unwrap();

    repo.remove("deck-unknown").await.unwrap();

    assert_eq!(store.read(DECKS_KEY).await.unwrap(), before);
    assert_eq!(store.write_count(DECKS_KEY), 1);
}

#[tokio::test]
async fn unknown_card_toggle_is_a_no_op() {
    let (store, repo) = repo();
    repo.initialize().await.unwrap();
    let before = repo.get_by_id("deck-colors").await.unwrap().unwrap();

    repo.set_card_learned("deck-colors", "nonexistent", true)
        .await
        .unwrap();

    let after = repo.get_by_id("deck-colors").await.unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(store.write_count(DECKS_KEY), 1);
}

#[tokio::test]
async fn toggle_touches_only_the_target_card() {
    let (_store, repo) = repo();
    repo.initialize().await.unwrap();
    repo.set_card_learned("deck-shapes", "card-shapes-2", true)
        .await
        .unwrap();
    let deck = repo.get_by_id("deck-shapes").await.unwrap().unwrap();
    let learned: Vec<&str> = deck
        .cards
        .iter()
        .filter(|c| c.learned)
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(learned, vec!["card-shapes-2"]);

    let err = repo
        .set_card_learned("deck-gone", "card-shapes-2", true)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::NotFound("deck"));
}

#[tokio::test]
async fn featured_is_an_order_preserving_filter() {
    let (_store, repo) = repo();
    repo.initialize().await.unwrap();
    let mut d = DeckDraft::new("Extra", "featured late", Category::Other);
    d.is_featured = Some(true);
    repo.create(d).await.unwrap();

    let all = repo.list_all().await.unwrap();
    let expected: Vec<_> = all.iter().filter(|d| d.is_featured == Some(true)).cloned().collect();
    let featured = repo.list_featured().await.unwrap();
    assert_eq!(featured, expected);
    assert_eq!(featured.last().unwrap().title, "Extra");
}

#[tokio::test]
async fn category_views() {
    let (_store, repo) = repo();
    repo.initialize().await.unwrap();
    repo.create(DeckDraft::new("Planets", "space", Category::Other))
        .await
        .unwrap();
    repo.create(DeckDraft::new("More Colors", "shades", Category::Colors))
        .await
        .unwrap();

    let colors = repo.list_by_category(Category::Colors).await.unwrap();
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0].id, "deck-colors");

    assert_eq!(
        repo.categories().await.unwrap(),
        vec![
            Category::Animals,
            Category::Colors,
            Category::Alphabet,
            Category::Numbers,
            Category::Shapes,
            Category::Other,
        ]
    );
}

#[tokio::test]
async fn concurrent_adds_are_not_lost() {
    let (_store, repo) = repo();
    let repo = Arc::new(repo);
    let deck_id = repo
        .create(DeckDraft::new("Busy", "many writers", Category::Other))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let repo = repo.clone();
        let deck_id = deck_id.clone();
        handles.push(tokio::spawn(async move {
            repo.add_card(&deck_id, CardDraft::new(format!("q{i}"), format!("a{i}")))
                .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    let deck = repo.get_by_id(&deck_id).await.unwrap().unwrap();
    assert_eq!(deck.cards.len(), 16);
    assert_eq!(deck.card_count, 16);
}

#[tokio::test]
async fn detached_storage_reads_empty_and_refuses_writes() {
    let repo = DeckRepo::new(Arc::new(DetachedStore));
    assert!(repo.list_all().await.unwrap().is_empty());
    assert!(repo.get_by_id("deck-animals").await.unwrap().is_none());
    assert_eq!(
        repo.create(DeckDraft::new("T", "D", Category::Other))
            .await
            .unwrap_err(),
        CoreError::Unavailable("no storage environment")
    );
    assert!(matches!(
        repo.initialize().await,
        Err(CoreError::Unavailable(_))
    ));
}
