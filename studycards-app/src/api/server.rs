use axum::{
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::*;
use studycards_core::Library;

pub fn router(library: Arc<Library>) -> Router {
    let state = Arc::new(AppState { library });

    Router::new()
        .route("/decks", get(list_decks).post(create_deck))
        .route("/decks/featured", get(featured_decks))
        .route("/decks/:id", get(get_deck).patch(patch_deck).delete(delete_deck))
        .route("/decks/:id/cards", post(add_card))
        .route("/decks/:id/cards/:card_id/learned", put(set_learned))
        .route("/categories", get(categories))
        .route("/progress/:user/:deck", get(get_progress).patch(patch_progress))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(library: Arc<Library>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(library);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
