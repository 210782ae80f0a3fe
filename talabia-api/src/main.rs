//! Talabia Web API
//!
//! REST backend that owns a single game session and forwards move intents to
//! the rules engine in talabia-core. A frontend drives the game with discrete
//! requests: read the board, ask for move hints, attempt a move, reset, and
//! save or load the session through the engine's text format.
//!
//! The engine itself never touches the filesystem; the save/load endpoints
//! here do the blocking file I/O and keep the session unchanged whenever a
//! load fails to decode.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use talabia_core::{Color, Game, Pos, COLS, ROWS};

/// Where saves land when a request names no path.
const DEFAULT_SAVE_PATH: &str = "save.txt";

// =============================================================================
// Session State
// =============================================================================

/// Shared application state: one game session behind a single owner.
struct AppStateInner {
    game: Mutex<Game>,
}

type AppState = Arc<AppStateInner>;

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Serialize)]
struct PieceModel {
    kind: String,
    color: u8,
    col: u8,
    row: u8,
}

#[derive(Serialize)]
struct GameStateModel {
    /// 8 rows of 5 cells, row 0 first; empty cells are null.
    board: Vec<Vec<Option<PieceModel>>>,
    current_turn: u8,
    exchange_clock: u8,
    result: String,
}

#[derive(Serialize)]
struct MoveOutcomeModel {
    captured: bool,
    /// Winning color code, if this move ended the game.
    #[serde(skip_serializing_if = "Option::is_none")]
    winner: Option<u8>,
    state: GameStateModel,
}

#[derive(Deserialize)]
struct MoveRequest {
    from_col: u8,
    from_row: u8,
    to_col: u8,
    to_row: u8,
}

#[derive(Serialize)]
struct CellModel {
    col: u8,
    row: u8,
}

#[derive(Deserialize)]
struct FileRequest {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct SavedModel {
    path: String,
}

#[derive(Serialize)]
struct HealthModel {
    status: String,
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Result string for the session: "ongoing", "red_wins", or "blue_wins".
fn result_string(game: &Game) -> String {
    match game.winner() {
        None => "ongoing".to_string(),
        Some(Color::Red) => "red_wins".to_string(),
        Some(Color::Blue) => "blue_wins".to_string(),
    }
}

/// Convert Game to the JSON-serializable GameStateModel.
fn game_to_model(game: &Game) -> GameStateModel {
    let mut rows = Vec::with_capacity(ROWS as usize);
    for row in 0..ROWS {
        let mut cells = Vec::with_capacity(COLS as usize);
        for col in 0..COLS {
            cells.push(game.piece_at(Pos::new(col, row)).map(|piece| PieceModel {
                kind: piece.kind.name().to_string(),
                color: piece.color.code(),
                col: piece.pos.col,
                row: piece.pos.row,
            }));
        }
        rows.push(cells);
    }

    GameStateModel {
        board: rows,
        current_turn: game.current_turn().code(),
        exchange_clock: game.exchange_clock(),
        result: result_string(game),
    }
}

fn bad_request(detail: impl Into<String>) -> (StatusCode, Json<ErrorModel>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorModel {
            detail: detail.into(),
        }),
    )
}

// =============================================================================
// API Endpoints
// =============================================================================

async fn get_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let game = state.game.lock().unwrap();
    Json(game_to_model(&game))
}

async fn get_moves(
    State(state): State<AppState>,
    Path((col, row)): Path<(u8, u8)>,
) -> Result<Json<Vec<CellModel>>, (StatusCode, Json<ErrorModel>)> {
    let game = state.game.lock().unwrap();

    let id = game
        .select_piece(Pos::new(col, row))
        .ok_or_else(|| bad_request("No piece of the side to move at that cell"))?;

    let cells = game
        .legal_destinations(id)
        .into_iter()
        .map(|pos| CellModel {
            col: pos.col,
            row: pos.row,
        })
        .collect();
    Ok(Json(cells))
}

async fn make_move(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveOutcomeModel>, (StatusCode, Json<ErrorModel>)> {
    let mut game = state.game.lock().unwrap();

    if game.is_over() {
        return Err(bad_request("Game is already over"));
    }

    let id = game
        .select_piece(Pos::new(req.from_col, req.from_row))
        .ok_or_else(|| bad_request("No piece of the side to move at that cell"))?;

    let result = game.attempt_move(id, Pos::new(req.to_col, req.to_row));
    if !result.moved {
        return Err(bad_request("Illegal move"));
    }

    if let Some(winner) = result.winner {
        println!("{} wins!", winner.name());
    }

    Ok(Json(MoveOutcomeModel {
        captured: result.captured,
        winner: result.winner.map(|color| color.code()),
        state: game_to_model(&game),
    }))
}

async fn reset_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let mut game = state.game.lock().unwrap();
    *game = Game::new();
    Json(game_to_model(&game))
}

async fn save_game(
    State(state): State<AppState>,
    Json(req): Json<FileRequest>,
) -> Result<Json<SavedModel>, (StatusCode, Json<ErrorModel>)> {
    let path = req.path.unwrap_or_else(|| DEFAULT_SAVE_PATH.to_string());

    let text = {
        let game = state.game.lock().unwrap();
        game.save_text()
    };

    std::fs::write(&path, text).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorModel {
                detail: format!("Failed to save the game: {}", e),
            }),
        )
    })?;

    println!("Game saved to {}", path);
    Ok(Json(SavedModel { path }))
}

async fn load_game(
    State(state): State<AppState>,
    Json(req): Json<FileRequest>,
) -> Result<Json<GameStateModel>, (StatusCode, Json<ErrorModel>)> {
    let path = req.path.unwrap_or_else(|| DEFAULT_SAVE_PATH.to_string());

    let text = std::fs::read_to_string(&path)
        .map_err(|e| bad_request(format!("Failed to read {}: {}", path, e)))?;

    // All-or-nothing: a decode failure leaves the running session as it was.
    let loaded = Game::load_text(&text).map_err(|e| bad_request(e.to_string()))?;

    let mut game = state.game.lock().unwrap();
    *game = loaded;
    println!("Game loaded from {}; {}'s turn", path, game.current_turn().name());

    Ok(Json(game_to_model(&game)))
}

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    let state: AppState = Arc::new(AppStateInner {
        game: Mutex::new(Game::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/game", get(get_game))
        .route("/moves/{col}/{row}", get(get_moves))
        .route("/move", post(make_move))
        .route("/reset", post(reset_game))
        .route("/save", post(save_game))
        .route("/load", post(load_game))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
    println!("Talabia API running on http://localhost:8000");
    axum::serve(listener, app).await.unwrap();
}
