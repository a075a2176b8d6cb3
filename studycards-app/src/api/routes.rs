use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use studycards_core::filters::by_text;
use studycards_core::{
    CardDraft, Category, CoreError, Deck, DeckDraft, DeckPatch, Library, ProgressPatch,
    UserProgress,
};

use crate::api::dto::{CardAddedOut, CreatedOut, DeckQuery, ErrorOut, LearnedIn};

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
}

pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

pub fn status_for(e: &CoreError) -> StatusCode {
    match e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        CoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (status, Json(ErrorOut { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub async fn list_decks(
    State(st): State<Arc<AppState>>,
    Query(q): Query<DeckQuery>,
) -> ApiResult<Json<Vec<Deck>>> {
    let mut decks = match q.category {
        Some(c) => st.library.decks.list_by_category(c).await?,
        None => st.library.decks.list_all().await?,
    };
    if let Some(text) = q.q {
        decks = by_text(&decks, &text);
    }
    Ok(Json(decks))
}

pub async fn featured_decks(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<Deck>>> {
    Ok(Json(st.library.decks.list_featured().await?))
}

pub async fn categories(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(st.library.decks.categories().await?))
}

pub async fn get_deck(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deck>> {
    let deck = st
        .library
        .decks
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::NotFound("deck"))?;
    Ok(Json(deck))
}

pub async fn create_deck(
    State(st): State<Arc<AppState>>,
    Json(draft): Json<DeckDraft>,
) -> ApiResult<(StatusCode, Json<CreatedOut>)> {
    let id = st.library.decks.create(draft).await?;
    Ok((StatusCode::CREATED, Json(CreatedOut { id })))
}

pub async fn patch_deck(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<DeckPatch>,
) -> ApiResult<StatusCode> {
    st.library.decks.update(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_deck(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    st.library.decks.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_card(
    State(st): State<Arc<AppState>>,
    Path(deck_id): Path<String>,
    Json(draft): Json<CardDraft>,
) -> ApiResult<(StatusCode, Json<CardAddedOut>)> {
    let id = st.library.decks.add_card(&deck_id, draft).await?;
    Ok((StatusCode::CREATED, Json(CardAddedOut { id, deck_id })))
}

pub async fn set_learned(
    State(st): State<Arc<AppState>>,
    Path((deck_id, card_id)): Path<(String, String)>,
    Json(body): Json<LearnedIn>,
) -> ApiResult<StatusCode> {
    st.library
        .decks
        .set_card_learned(&deck_id, &card_id, body.learned)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_progress(
    State(st): State<Arc<AppState>>,
    Path((user_id, deck_id)): Path<(String, String)>,
) -> ApiResult<Json<UserProgress>> {
    let p = st
        .library
        .progress
        .get(&user_id, &deck_id)
        .await?
        .ok_or(CoreError::NotFound("progress"))?;
    Ok(Json(p))
}

pub async fn patch_progress(
    State(st): State<Arc<AppState>>,
    Path((user_id, deck_id)): Path<(String, String)>,
    Json(patch): Json<ProgressPatch>,
) -> ApiResult<Json<UserProgress>> {
    let progress = &st.library.progress;
    progress.update(&user_id, &deck_id, patch).await?;
    let p = progress
        .get(&user_id, &deck_id)
        .await?
        .ok_or(CoreError::NotFound("progress"))?;
    Ok(Json(p))
}
