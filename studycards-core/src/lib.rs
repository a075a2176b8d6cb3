pub mod decks;
pub mod errors;
pub mod filters;
pub mod library;
pub mod models;
pub mod progress;
pub mod seed;
pub mod session;
pub mod storage;
pub mod tree;

pub use decks::*;
pub use errors::*;
pub use library::Library;
pub use models::*;
pub use progress::*;
pub use session::*;
pub use storage::{memory::DetachedStore, memory::MemoryStore, Storage};
