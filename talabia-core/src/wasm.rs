//! WASM bindings for talabia-core
//!
//! Provides a JavaScript-friendly API for the game logic.

use crate::{Game, Pos};
use wasm_bindgen::prelude::*;

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game with the standard layout
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { inner: Game::new() }
    }

    /// Current turn code (0 = Red, 1 = Blue)
    #[wasm_bindgen(js_name = currentTurn)]
    pub fn current_turn(&self) -> u8 {
        self.inner.current_turn().code()
    }

    /// Rounds counted toward the next Tor/Xor exchange
    #[wasm_bindgen(js_name = exchangeClock)]
    pub fn exchange_clock(&self) -> u8 {
        self.inner.exchange_clock()
    }

    /// Check if the game is over
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_over()
    }

    /// Get game result: "ongoing", "red_wins", or "blue_wins"
    pub fn result(&self) -> String {
        match self.inner.winner() {
            None => "ongoing".to_string(),
            Some(crate::Color::Red) => "red_wins".to_string(),
            Some(crate::Color::Blue) => "blue_wins".to_string(),
        }
    }

    /// All pieces as a JSON array
    /// Each piece is { kind, color, col, row }
    pub fn pieces(&self) -> JsValue {
        let pieces: Vec<PieceView> = self.inner.pieces().iter().map(PieceView::from).collect();
        serde_wasm_bindgen::to_value(&pieces).unwrap()
    }

    /// Legal destinations for the piece of the side to move at (col, row),
    /// as a JSON array of { col, row }. Empty when nothing is selectable.
    #[wasm_bindgen(js_name = legalDestinations)]
    pub fn legal_destinations(&self, col: u8, row: u8) -> JsValue {
        let cells: Vec<CellView> = match self.inner.select_piece(Pos::new(col, row)) {
            Some(id) => self
                .inner
                .legal_destinations(id)
                .into_iter()
                .map(|pos| CellView {
                    col: pos.col,
                    row: pos.row,
                })
                .collect(),
            None => Vec::new(),
        };
        serde_wasm_bindgen::to_value(&cells).unwrap()
    }

    /// Attempt a move for the side to move.
    /// Returns { moved, captured, winner } with winner as a color code or null.
    #[wasm_bindgen(js_name = attemptMove)]
    pub fn attempt_move(&mut self, from_col: u8, from_row: u8, to_col: u8, to_row: u8) -> JsValue {
        let outcome = match self.inner.select_piece(Pos::new(from_col, from_row)) {
            Some(id) => {
                let result = self.inner.attempt_move(id, Pos::new(to_col, to_row));
                OutcomeView {
                    moved: result.moved,
                    captured: result.captured,
                    winner: result.winner.map(|color| color.code()),
                }
            }
            None => OutcomeView {
                moved: false,
                captured: false,
                winner: None,
            },
        };
        serde_wasm_bindgen::to_value(&outcome).unwrap()
    }

    /// Serialize the game to the save format
    #[wasm_bindgen(js_name = saveText)]
    pub fn save_text(&self) -> String {
        self.inner.save_text()
    }

    /// Replace the game with a decoded save. Returns false (and keeps the
    /// current game) if the text does not parse.
    #[wasm_bindgen(js_name = loadText)]
    pub fn load_text(&mut self, text: &str) -> bool {
        match Game::load_text(text) {
            Ok(game) => {
                self.inner = game;
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable piece for JavaScript
#[derive(serde::Serialize)]
struct PieceView {
    kind: &'static str,
    color: u8,
    col: u8,
    row: u8,
}

impl From<&crate::Piece> for PieceView {
    fn from(piece: &crate::Piece) -> Self {
        PieceView {
            kind: piece.kind.name(),
            color: piece.color.code(),
            col: piece.pos.col,
            row: piece.pos.row,
        }
    }
}

#[derive(serde::Serialize)]
struct CellView {
    col: u8,
    row: u8,
}

#[derive(serde::Serialize)]
struct OutcomeView {
    moved: bool,
    captured: bool,
    winner: Option<u8>,
}
