use axum::Json;
use axum::extract::State;

use crate::flags::FlagSnapshot;
use crate::state::SharedState;

pub async fn snapshot(State(state): State<SharedState>) -> Json<FlagSnapshot> {
    Json(state.flags.snapshot().await)
}
