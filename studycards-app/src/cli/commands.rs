use crate::api::server as api_server;
use crate::cli::opts::*;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::io::{stdin, stdout, Write};
use std::sync::Arc;
use studycards_core::filters::{by_category, by_text, learned_ratio};
use studycards_core::{
    CardDraft, Category, Deck, DeckDraft, DeckPatch, Library, MemoryStore, Storage, StudySession,
};
use studycards_json::{paths::data_root, JsonStore};
use studycards_pg::PgTreeStore;
use studycards_sqlite::SqliteStore;

pub async fn run_cli(args: Cli) -> Result<()> {
    let lib = open_library(&args).await?;
    let seeded = lib.decks.initialize().await?;
    let user = args.user.clone();

    match args.cmd {
        Command::Init => {
            println!("{}", if seeded { "seeded" } else { "already initialized" });
            Ok(())
        }
        Command::Deck(cmd) => deck_cmd(&lib, cmd).await,
        Command::Card(cmd) => card_cmd(&lib, cmd).await,
        Command::Study { deck } => study_cmd(&lib, &deck, &user).await,
        Command::Progress(cmd) => progress_cmd(&lib, cmd, &user).await,
        Command::Export(cmd) => export_cmd(&lib, cmd).await,
        Command::Import(cmd) => import_cmd(&lib, cmd).await,
        Command::Api(api) => {
            let addr: std::net::SocketAddr = api.addr.parse()?;
            api_server::run(lib, addr).await
        }
    }
}

pub async fn open_library(args: &Cli) -> Result<Arc<Library>> {
    let storage: Arc<dyn Storage> = match args.store {
        StoreKind::Json => match &args.data_dir {
            Some(dir) => Arc::new(JsonStore::open_in(dir.clone()).await?),
            None => Arc::new(JsonStore::open_default().await?),
        },
        StoreKind::Sqlite => {
            let p = args
                .db_path
                .clone()
                .unwrap_or_else(|| {
                    let root = args.data_dir.clone().unwrap_or_else(data_root);
                    root.join("studycards.sqlite3")
                });
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            Arc::new(SqliteStore::open_file(&p).await?)
        }
        StoreKind::Pg => {
            let url = args
                .pg_url
                .as_deref()
                .ok_or_else(|| anyhow!("--pg-url (or STUDYCARDS_PG_URL) is required with --store pg"))?;
            Arc::new(PgTreeStore::connect(url).await?)
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(Arc::new(Library::new(storage)))
}

async fn deck_cmd(lib: &Library, cmd: DeckCmd) -> Result<()> {
    match cmd {
        DeckCmd::List { category, featured, search } => {
            let mut decks = if featured {
                lib.decks.list_featured().await?
            } else {
                lib.decks.list_all().await?
            };
            if let Some(c) = category {
                decks = by_category(&decks, c);
            }
            if let Some(q) = search {
                decks = by_text(&decks, &q);
            }
            for d in decks {
                println!(
                    "{}\t{}\t{}\t{} cards\t{:.0}% learned{}",
                    d.id,
                    d.title,
                    d.category,
                    d.card_count,
                    learned_ratio(&d) * 100.0,
                    if d.is_featured() { "\t*" } else { "" }
                );
            }
        }
        DeckCmd::Show { deck } => {
            let d = resolve_deck(lib, &deck).await?;
            println!("{} [{}]\n{}", d.title, d.category, d.description);
            for c in &d.cards {
                let mark = if c.learned { "[x]" } else { "[ ]" };
                println!("{}\t{}\t{}\t{}", c.id, mark, c.front, c.back);
            }
        }
        DeckCmd::Add(a) => {
            let title = a.title.trim();
            let description = a.description.trim();
            if title.is_empty() {
                bail!("please enter a deck title");
            }
            if description.is_empty() {
                bail!("please enter a deck description");
            }
            let cards: Vec<CardDraft> = a.cards.iter().filter_map(|s| parse_card(s)).collect();
            if cards.is_empty() {
                bail!("add at least one card with both front and back (--card front=back)");
            }

            let mut draft = DeckDraft::new(title, description, a.category);
            draft.is_featured = Some(a.featured);
            let id = lib.decks.create(draft).await?;
            for c in cards {
                lib.decks.add_card(&id, c).await?;
            }
            println!("{id}");
        }
        DeckCmd::Edit(e) => {
            let d = resolve_deck(lib, &e.deck).await?;
            let patch = DeckPatch {
                title: e.title.map(|t| t.trim().to_string()),
                description: e.description.map(|t| t.trim().to_string()),
                category: e.category,
                cards: None,
                is_featured: e.featured,
            };
            lib.decks.update(&d.id, patch).await?;
            println!("ok");
        }
        DeckCmd::Rm { deck } => {
            let id = match resolve_deck(lib, &deck).await {
                Ok(d) => d.id,
                Err(_) => deck,
            };
            lib.decks.remove(&id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn card_cmd(lib: &Library, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let deck = resolve_deck(lib, &a.deck).await?;
            let mut draft = CardDraft::new(a.front.trim(), a.back.trim());
            draft.image_url = a.image_url.filter(|u| !u.trim().is_empty());
            let id = lib.decks.add_card(&deck.id, draft).await?;
            println!("{id}");
        }
        CardCmd::Learn { deck, card_id, unlearn } => {
            let deck = resolve_deck(lib, &deck).await?;
            lib.decks
                .set_card_learned(&deck.id, &card_id, !unlearn)
                .await?;
            if deck.card(&card_id).is_none() {
                println!("no card {card_id} in {}; nothing changed", deck.id);
            } else {
                println!("ok");
            }
        }
    }
    Ok(())
}

async fn study_cmd(lib: &Library, sel: &str, user: &str) -> Result<()> {
    let deck = resolve_deck(lib, sel).await?;
    let n = deck.cards.len();
    if n == 0 {
        println!("deck has no cards");
        return Ok(());
    }

    let mut learned: Vec<bool> = deck.cards.iter().map(|c| c.learned).collect();
    let mut session = StudySession::start(deck.id.clone());
    let mut idx = 0usize;
    let mut flipped = false;

    println!("{} ({} cards)", deck.title, n);
    loop {
        let card = &deck.cards[idx];
        session.study(&card.id);
        let mark = if learned[idx] { "✓ " } else { "" };
        let face = if flipped { &card.back } else { &card.front };
        println!("\n[{}/{}] {}{}", idx + 1, n, mark, face);
        if flipped {
            if let Some(url) = &card.image_url {
                println!("image: {url}");
            }
        }

        let Some(line) = read_line("[enter=flip, l=learned, n=next, p=prev, q=quit]> ")? else {
            break;
        };
        match line.trim().to_lowercase().as_str() {
            "" | "f" | "flip" => flipped = !flipped,
            "l" | "learned" => {
                let now = !learned[idx];
                session.mark(&lib.decks, &card.id, now).await?;
                learned[idx] = now;
            }
            "n" | "next" => {
                if idx + 1 < n {
                    idx += 1;
                    flipped = false;
                } else {
                    println!("last card");
                }
            }
            "p" | "prev" => {
                if idx > 0 {
                    idx -= 1;
                    flipped = false;
                }
            }
            "q" | "quit" => break,
            _ => println!("enter, l, n, p, or q"),
        }
    }

    let done = session.finish(&lib.progress, user).await?;
    println!(
        "\nstudied {} card(s), {}/{} learned",
        done.cards_studied.len(),
        learned.iter().filter(|b| **b).count(),
        n
    );
    Ok(())
}

async fn progress_cmd(lib: &Library, cmd: ProgressCmd, user: &str) -> Result<()> {
    match cmd {
        ProgressCmd::Show { deck: Some(sel) } => {
            let deck = resolve_deck(lib, &sel).await?;
            match lib.progress.get(user, &deck.id).await? {
                Some(p) => println!(
                    "{}\tlearned={}\tsessions={}\tlast={}",
                    p.deck_id,
                    p.cards_learned.len(),
                    p.total_study_sessions,
                    p.last_studied.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                ),
                None => println!("no progress yet for {}", deck.id),
            }
        }
        ProgressCmd::Show { deck: None } => {
            let mut all = lib.progress.list_for_user(user).await?;
            all.sort_by_key(|p| std::cmp::Reverse(p.last_studied));
            if all.is_empty() {
                println!("no progress yet");
            }
            for p in all {
                println!(
                    "{}\tlearned={}\tsessions={}\tlast={}",
                    p.deck_id,
                    p.cards_learned.len(),
                    p.total_study_sessions,
                    p.last_studied.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
    Ok(())
}

async fn export_cmd(lib: &Library, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path } => {
            let decks = lib.decks.list_all().await?;
            let bundle = ExportBundle { version: 1, decks };
            let s = serde_json::to_string_pretty(&bundle)?;
            std::fs::write(&path, s)?;
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path, deck } => {
            let decks = match deck {
                Some(sel) => vec![resolve_deck(lib, &sel).await?],
                None => lib.decks.list_all().await?,
            };

            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["deck", "category", "front", "back", "image_url", "learned"])?;
            for d in decks {
                for c in d.cards {
                    wtr.write_record([
                        d.title.clone(),
                        d.category.to_string(),
                        c.front,
                        c.back,
                        c.image_url.unwrap_or_default(),
                        if c.learned { "1".to_string() } else { "0".to_string() },
                    ])?;
                }
            }
            wtr.flush()?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn import_cmd(lib: &Library, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path)?;
            let bundle: ExportBundle = serde_json::from_str(&data)?;
            let n = bundle.decks.len();
            for d in bundle.decks {
                let draft = DeckDraft {
                    title: d.title,
                    description: d.description,
                    category: d.category,
                    cards: d.cards,
                    is_featured: d.is_featured,
                };
                lib.decks.create(draft).await?;
            }
            println!("imported {n} deck(s)");
        }
        ImportCmd::Csv { path, deck } => {
            let mut rdr = csv::Reader::from_path(&path)?;
            let target = match deck {
                Some(sel) => Some(resolve_deck(lib, &sel).await?),
                None => None,
            };
            let mut added = 0usize;
            for rec in rdr.records() {
                let rec = rec?;
                let deck_title = rec.get(0).unwrap_or("").trim();
                let category = rec
                    .get(1)
                    .and_then(|s| s.parse::<Category>().ok())
                    .unwrap_or(Category::Other);
                let mut draft = CardDraft::new(
                    rec.get(2).unwrap_or("").trim(),
                    rec.get(3).unwrap_or("").trim(),
                );
                draft.image_url = rec
                    .get(4)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                let learned = matches!(rec.get(5).map(str::trim), Some("1") | Some("true"));
                if draft.validate().is_err() {
                    continue;
                }

                let deck_id = match &target {
                    Some(d) => d.id.clone(),
                    None => ensure_deck_by_title(lib, deck_title, category).await?.id,
                };
                let card_id = lib.decks.add_card(&deck_id, draft).await?;
                if learned {
                    lib.decks.set_card_learned(&deck_id, &card_id, true).await?;
                }
                added += 1;
            }
            println!("imported {added} card(s)");
        }
    }
    Ok(())
}

// ===== Helpers =====
fn parse_card(raw: &str) -> Option<CardDraft> {
    let (front, back) = raw.split_once('=')?;
    let draft = CardDraft::new(front.trim(), back.trim());
    draft.validate().ok()?;
    Some(draft)
}

async fn resolve_deck(lib: &Library, sel: &str) -> Result<Deck> {
    if let Some(d) = lib.decks.get_by_id(sel).await? {
        return Ok(d);
    }
    let decks = lib.decks.list_all().await?;
    if let Some(d) = decks.into_iter().find(|d| d.title.eq_ignore_ascii_case(sel)) {
        return Ok(d);
    }
    bail!("deck not found: {}", sel)
}

async fn ensure_deck_by_title(lib: &Library, title: &str, category: Category) -> Result<Deck> {
    if title.is_empty() {
        bail!("csv row without deck title");
    }
    let decks = lib.decks.list_all().await?;
    if let Some(d) = decks.into_iter().find(|d| d.title.eq_ignore_ascii_case(title)) {
        return Ok(d);
    }
    let id = lib
        .decks
        .create(DeckDraft::new(title, "Imported from CSV", category))
        .await?;
    lib.decks
        .get_by_id(&id)
        .await?
        .ok_or_else(|| anyhow!("deck vanished after create: {id}"))
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}

#[derive(Serialize, Deserialize)]
struct ExportBundle {
    version: u32,
    decks: Vec<Deck>,
}
