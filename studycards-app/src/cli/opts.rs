use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use studycards_core::Category;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
    Pg,
    Memory,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "studycards", version, about = "StudyCards CLI/API")]
pub struct Cli {
    /// Storage backend (applies to CLI/API)
    #[arg(long, value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// Data directory for the JSON store and default SQLite file
    #[arg(long, env = "STUDYCARDS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// SQLite DB path when --store sqlite (defaults to the data dir)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Postgres URL when --store pg
    #[arg(long, env = "STUDYCARDS_PG_URL")]
    pub pg_url: Option<String>,

    /// Whose progress to read and record
    #[arg(long, default_value = "local")]
    pub user: String,

    /// Log filter directive(s)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Seed empty storage with the starter decks
    Init,
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Flip through a deck
    Study { deck: String },
    /// Study progress
    #[command(subcommand)]
    Progress(ProgressCmd),
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
    /// Launch Axum HTTP API
    Api(ApiCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        search: Option<String>,
    },
    Show { deck: String },
    Add(DeckAdd),
    Edit(DeckEdit),
    Rm { deck: String },
}

#[derive(Debug, Args, Clone)]
pub struct DeckAdd {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "other")]
    pub category: Category,
    #[arg(long)]
    pub featured: bool,
    /// Card as `front=back`; repeatable
    #[arg(long = "card")]
    pub cards: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DeckEdit {
    pub deck: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub featured: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    Learn {
        deck: String,
        card_id: String,
        #[arg(long)]
        unlearn: bool,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: String,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ProgressCmd {
    Show { deck: Option<String> },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf, #[arg(long)] deck: Option<String> },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf, #[arg(long)] deck: Option<String> },
}

#[derive(Debug, Args, Clone)]
pub struct ApiCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}
