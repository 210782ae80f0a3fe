//! Talabia game logic: piece movement rules, turn sequencing, the periodic
//! Tor/Xor exchange, win detection, and the textual save format.
//!
//! # Board Layout
//!
//! ```text
//! 5 columns × 8 rows, addressed as (col, row) with col in 0..5, row in 0..8.
//! Row 0 is Red's back rank, row 7 is Blue's back rank.
//!
//! Starting position (uppercase = Red, lowercase = Blue):
//!
//!   row 0:  T B S B X     Tor, Biz, Sau, Biz, Xor
//!   row 1:  R R R R R     five Rams
//!   row 6:  r r r r r     five rams
//!   row 7:  t b s b x     tor, biz, sau, biz, xor
//! ```
//!
//! The piece list is the sole source of truth; the `Board` grid is a cheap
//! occupancy snapshot rebuilt from it whenever the rules need cell lookups.
//!
//! # Save Format (line-oriented text)
//!
//! ```text
//! <exchange_clock>,<current_turn_code>
//! <kind_name>,<color_code>,<col>,<row>      one line per piece, any order
//! ```
//!
//! Kind names: Tor, Xor, Biz, Sau, Ram. Color codes: 0 = Red, 1 = Blue.
//! Per-kind state (Ram heading, slider move counts) is not persisted and
//! restarts at the starting value for the piece's color on load.

#[cfg(feature = "wasm")]
pub mod wasm;

use std::fmt;

/// Board width in cells.
pub const COLS: u8 = 5;
/// Board height in cells.
pub const ROWS: u8 = 8;

/// Side identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Blue = 1,
}

impl Color {
    /// Get the opposing side.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    /// Convert from the save-format code (0 or 1).
    #[inline]
    pub fn from_code(code: u8) -> Option<Color> {
        match code {
            0 => Some(Color::Red),
            1 => Some(Color::Blue),
            _ => None,
        }
    }

    /// The save-format code for this side.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Display name ("Red" or "Blue").
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
        }
    }
}

/// Position on the 5×8 board.
///
/// Freely constructible; anything outside the grid is rejected by the move
/// rules and the save codec rather than at construction time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Pos {
    pub col: u8,
    pub row: u8,
}

impl Pos {
    /// Create a position from column and row.
    #[inline]
    pub fn new(col: u8, row: u8) -> Pos {
        Pos { col, row }
    }

    /// Check that the position lies on the board.
    #[inline]
    pub fn in_bounds(self) -> bool {
        self.col < COLS && self.row < ROWS
    }

    /// Offset by (dcol, drow). Returns None if the result is off the board.
    pub fn offset(self, dcol: i16, drow: i16) -> Option<Pos> {
        let col = self.col as i16 + dcol;
        let row = self.row as i16 + drow;
        if (0..COLS as i16).contains(&col) && (0..ROWS as i16).contains(&row) {
            Some(Pos::new(col as u8, row as u8))
        } else {
            None
        }
    }

    /// Iterate over all 40 cells, row by row.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Pos::new(col, row)))
    }
}

/// Piece kind together with its per-kind state.
///
/// `Tor` and `Xor` carry the number of moves the piece has made since the
/// last exchange; `Ram` carries its heading (`forward` = toward higher rows).
/// The global exchange, not the per-piece count, is what swaps Tor and Xor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    /// Orthogonal slider, exchange partner of Xor.
    Tor { moves: u8 },
    /// Diagonal slider, exchange partner of Tor.
    Xor { moves: u8 },
    /// L-shaped jumper; ignores intervening pieces.
    Biz,
    /// One-step omnidirectional mover; losing it loses the game.
    Sau,
    /// One-step mover along its heading; the heading inverts at the far edge.
    Ram { forward: bool },
}

impl Kind {
    /// A Ram with the starting heading for `color`: Red advances toward
    /// higher rows, Blue toward lower rows.
    #[inline]
    pub fn ram(color: Color) -> Kind {
        Kind::Ram {
            forward: color == Color::Red,
        }
    }

    /// Kind name as written in the save format.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Tor { .. } => "Tor",
            Kind::Xor { .. } => "Xor",
            Kind::Biz => "Biz",
            Kind::Sau => "Sau",
            Kind::Ram { .. } => "Ram",
        }
    }

    /// Reconstruct a kind from its save-format name. Per-kind state is not
    /// persisted, so sliders come back with a zero move count and Rams with
    /// the starting heading for `color`.
    pub fn from_name(name: &str, color: Color) -> Option<Kind> {
        match name {
            "Tor" => Some(Kind::Tor { moves: 0 }),
            "Xor" => Some(Kind::Xor { moves: 0 }),
            "Biz" => Some(Kind::Biz),
            "Sau" => Some(Kind::Sau),
            "Ram" => Some(Kind::ram(color)),
            _ => None,
        }
    }
}

/// Stable piece handle. Ids survive captures of other pieces and the
/// Tor/Xor exchange, so a held reference keeps meaning "this piece".
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct PieceId(pub u32);

/// A piece on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub kind: Kind,
    pub pos: Pos,
}

// ========== Board Snapshot ==========

/// What sits on a cell: the owner's color and the piece's index in the list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Occupant {
    pub color: Color,
    pub index: usize,
}

/// Occupancy snapshot derived from the piece list.
///
/// Rebuilt on demand and never stored across mutations; the piece list stays
/// the single source of truth.
pub struct Board {
    cells: [[Option<Occupant>; COLS as usize]; ROWS as usize],
}

impl Board {
    /// Build the grid from a piece list.
    pub fn from_pieces(pieces: &[Piece]) -> Board {
        let mut cells = [[None; COLS as usize]; ROWS as usize];
        for (index, piece) in pieces.iter().enumerate() {
            cells[piece.pos.row as usize][piece.pos.col as usize] = Some(Occupant {
                color: piece.color,
                index,
            });
        }
        Board { cells }
    }

    /// The occupant of a cell, if any. Off-board positions read as empty.
    #[inline]
    pub fn occupant(&self, pos: Pos) -> Option<Occupant> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells[pos.row as usize][pos.col as usize]
    }

    /// The color occupying a cell, if any.
    #[inline]
    pub fn color_at(&self, pos: Pos) -> Option<Color> {
        self.occupant(pos).map(|occ| occ.color)
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.occupant(pos).is_none()
    }
}

// ========== Move Rules ==========

/// Every cell strictly between `from` and `to` along a rank, file, or
/// diagonal must be empty; `to` itself is not examined.
fn path_clear(board: &Board, from: Pos, to: Pos) -> bool {
    let dcol = to.col as i16 - from.col as i16;
    let drow = to.row as i16 - from.row as i16;
    let steps = dcol.abs().max(drow.abs());
    let col_step = dcol.signum();
    let row_step = drow.signum();

    for i in 1..steps {
        let between = Pos::new(
            (from.col as i16 + i * col_step) as u8,
            (from.row as i16 + i * row_step) as u8,
        );
        if !board.is_empty(between) {
            return false;
        }
    }
    true
}

impl Piece {
    /// Check whether this piece may move to `to` on the given board.
    ///
    /// Covers geometry, path blocking, bounds, and the friendly-occupancy
    /// rule. An enemy-occupied destination counts as legal (a capture).
    pub fn can_move_to(&self, to: Pos, board: &Board) -> bool {
        if !to.in_bounds() || to == self.pos {
            return false;
        }
        if board.color_at(to) == Some(self.color) {
            return false;
        }

        let dcol = (to.col as i16 - self.pos.col as i16).abs();
        let drow = (to.row as i16 - self.pos.row as i16).abs();

        match self.kind {
            Kind::Biz => (drow == 2 && dcol == 1) || (drow == 1 && dcol == 2),
            Kind::Sau => drow <= 1 && dcol <= 1,
            Kind::Ram { forward } => {
                let step: i16 = if forward { 1 } else { -1 };
                to.col == self.pos.col && to.row as i16 == self.pos.row as i16 + step
            }
            Kind::Tor { .. } => (dcol == 0 || drow == 0) && path_clear(board, self.pos, to),
            Kind::Xor { .. } => dcol == drow && path_clear(board, self.pos, to),
        }
    }
}

// ========== Game State ==========

/// Outcome of an attempted move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveResult {
    /// Whether the move was applied. On `false` the game is unchanged.
    pub moved: bool,
    /// Whether an enemy piece was captured.
    pub captured: bool,
    /// The winner, if the game is over after this move.
    pub winner: Option<Color>,
}

impl MoveResult {
    /// A rejected move: nothing happened.
    #[inline]
    const fn rejected() -> MoveResult {
        MoveResult {
            moved: false,
            captured: false,
            winner: None,
        }
    }
}

/// Full game state: the piece list, whose turn it is, the shared exchange
/// clock, and the winner once a Sau has been captured.
///
/// All mutation goes through [`Game::attempt_move`]; a move either fully
/// applies or leaves the state untouched.
#[derive(Clone, Debug)]
pub struct Game {
    pieces: Vec<Piece>,
    next_id: u32,
    current_turn: Color,
    exchange_clock: u8,
    winner: Option<Color>,
}

impl Game {
    /// Completed Blue/Red rounds between global Tor/Xor exchanges. The
    /// per-piece slider move count wraps at the same threshold.
    pub const EXCHANGE_ROUNDS: u8 = 2;

    /// A fresh game with the standard layout. Blue moves first.
    pub fn new() -> Game {
        let mut game = Game {
            pieces: Vec::with_capacity(20),
            next_id: 0,
            current_turn: Color::Blue,
            exchange_clock: 0,
            winner: None,
        };

        let back_rank = [
            Kind::Tor { moves: 0 },
            Kind::Biz,
            Kind::Sau,
            Kind::Biz,
            Kind::Xor { moves: 0 },
        ];
        for (col, &kind) in back_rank.iter().enumerate() {
            game.spawn(Color::Red, kind, Pos::new(col as u8, 0));
        }
        for col in 0..COLS {
            game.spawn(Color::Red, Kind::ram(Color::Red), Pos::new(col, 1));
        }
        for col in 0..COLS {
            game.spawn(Color::Blue, Kind::ram(Color::Blue), Pos::new(col, 6));
        }
        for (col, &kind) in back_rank.iter().enumerate() {
            game.spawn(Color::Blue, kind, Pos::new(col as u8, 7));
        }
        game
    }

    fn spawn(&mut self, color: Color, kind: Kind, pos: Pos) {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.pieces.push(Piece {
            id,
            color,
            kind,
            pos,
        });
    }

    /// All pieces still on the board.
    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// The side to move.
    #[inline]
    pub fn current_turn(&self) -> Color {
        self.current_turn
    }

    /// Rounds counted toward the next Tor/Xor exchange.
    #[inline]
    pub fn exchange_clock(&self) -> u8 {
        self.exchange_clock
    }

    /// The winner, if the game is over.
    #[inline]
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Check if the game has ended.
    #[inline]
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Build the occupancy snapshot for the current piece list.
    #[inline]
    pub fn board(&self) -> Board {
        Board::from_pieces(&self.pieces)
    }

    /// Look up a piece by id.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.id == id)
    }

    /// The piece occupying a cell, regardless of side.
    pub fn piece_at(&self, pos: Pos) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.pos == pos)
    }

    fn index_of(&self, id: PieceId) -> Option<usize> {
        self.pieces.iter().position(|piece| piece.id == id)
    }

    fn sau_present(&self, color: Color) -> bool {
        self.pieces
            .iter()
            .any(|piece| piece.color == color && matches!(piece.kind, Kind::Sau))
    }

    /// The piece at the cell, if it belongs to the side to move.
    ///
    /// Returns None once the game is over; a finished game accepts no input.
    pub fn select_piece(&self, pos: Pos) -> Option<PieceId> {
        if self.winner.is_some() {
            return None;
        }
        self.pieces
            .iter()
            .find(|piece| piece.pos == pos && piece.color == self.current_turn)
            .map(|piece| piece.id)
    }

    /// Every cell the piece may legally move to. Used for move-hint
    /// highlighting. Empty for unknown ids and for finished games.
    pub fn legal_destinations(&self, id: PieceId) -> Vec<Pos> {
        if self.winner.is_some() {
            return Vec::new();
        }
        let Some(piece) = self.piece(id) else {
            return Vec::new();
        };
        let board = self.board();
        Pos::all()
            .filter(|&to| piece.can_move_to(to, &board))
            .collect()
    }

    /// Validate and apply a move.
    ///
    /// On success: the captured enemy (if any) leaves the piece list, the
    /// mover relocates and updates its per-kind state, the turn flips, the
    /// exchange clock advances, and both Saus are checked for the win.
    /// On failure nothing changes and `MoveResult::moved` is false.
    pub fn attempt_move(&mut self, id: PieceId, to: Pos) -> MoveResult {
        if self.winner.is_some() {
            return MoveResult::rejected();
        }
        let Some(mut index) = self.index_of(id) else {
            return MoveResult::rejected();
        };
        let mover = self.pieces[index];
        if mover.color != self.current_turn {
            return MoveResult::rejected();
        }

        let board = self.board();
        if !mover.can_move_to(to, &board) {
            return MoveResult::rejected();
        }

        // Capture first so the two pieces never share a cell; the removal
        // can shift the mover's slot in the list.
        let mut captured = false;
        if let Some(occupant) = board.occupant(to) {
            self.pieces.remove(occupant.index);
            if occupant.index < index {
                index -= 1;
            }
            captured = true;
        }

        let piece = &mut self.pieces[index];
        piece.pos = to;
        match &mut piece.kind {
            Kind::Ram { forward } => {
                if to.row == 0 || to.row == ROWS - 1 {
                    *forward = !*forward;
                }
            }
            Kind::Tor { moves } | Kind::Xor { moves } => {
                *moves += 1;
                if *moves >= Self::EXCHANGE_ROUNDS {
                    *moves = 0;
                }
            }
            _ => {}
        }

        // The clock ticks each time the turn returns to Red, i.e. once per
        // completed Blue/Red round.
        self.current_turn = self.current_turn.opponent();
        if self.current_turn == Color::Red {
            self.exchange_clock += 1;
            if self.exchange_clock >= Self::EXCHANGE_ROUNDS {
                self.exchange_sliders();
                self.exchange_clock = 0;
            }
        }

        if !self.sau_present(Color::Red) {
            self.winner = Some(Color::Blue);
        } else if !self.sau_present(Color::Blue) {
            self.winner = Some(Color::Red);
        }

        MoveResult {
            moved: true,
            captured,
            winner: self.winner,
        }
    }

    /// Swap every Tor to a Xor and vice versa, for both colors at once,
    /// keeping color, position, and id. Move counts restart.
    fn exchange_sliders(&mut self) {
        for piece in &mut self.pieces {
            piece.kind = match piece.kind {
                Kind::Tor { .. } => Kind::Xor { moves: 0 },
                Kind::Xor { .. } => Kind::Tor { moves: 0 },
                other => other,
            };
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Save Format ==========

/// Error from decoding a saved game.
///
/// Decoding is all-or-nothing: any bad line rejects the whole document, so a
/// caller that holds a live game keeps it unchanged.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LoadError {
    /// The document is empty or the clock/turn header line is missing.
    MissingHeader,
    /// A line with the wrong field count or an unparsable number.
    /// Carries the 1-based line number.
    Malformed(usize),
    /// A piece line naming a kind that does not exist.
    UnknownKind { line: usize, name: String },
    /// A piece line with coordinates outside the 5×8 board.
    OutOfBounds { line: usize },
    /// A piece line targeting a cell an earlier line already filled.
    DuplicateCell { line: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingHeader => {
                write!(f, "save data is empty or missing the clock/turn header")
            }
            LoadError::Malformed(line) => write!(f, "malformed save data on line {}", line),
            LoadError::UnknownKind { line, name } => {
                write!(f, "unknown piece kind {:?} on line {}", name, line)
            }
            LoadError::OutOfBounds { line } => {
                write!(f, "coordinates off the board on line {}", line)
            }
            LoadError::DuplicateCell { line } => {
                write!(f, "two pieces on one cell on line {}", line)
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl Game {
    /// Serialize to the line-oriented save format.
    pub fn save_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{},{}\n",
            self.exchange_clock,
            self.current_turn.code()
        ));
        for piece in &self.pieces {
            out.push_str(&format!(
                "{},{},{},{}\n",
                piece.kind.name(),
                piece.color.code(),
                piece.pos.col,
                piece.pos.row
            ));
        }
        out
    }

    /// Parse a saved game. Blank lines are ignored; everything else must be
    /// well formed or the whole document is rejected.
    ///
    /// A decoded position that is already missing a Sau comes back finished,
    /// with the winner set.
    pub fn load_text(text: &str) -> Result<Game, LoadError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (h, header) = lines.next().ok_or(LoadError::MissingHeader)?;
        let header_line = h + 1;
        let fields: Vec<&str> = header.split(',').map(str::trim).collect();
        if fields.len() != 2 {
            return Err(LoadError::Malformed(header_line));
        }
        let exchange_clock: u8 = fields[0]
            .parse()
            .map_err(|_| LoadError::Malformed(header_line))?;
        let current_turn = fields[1]
            .parse::<u8>()
            .ok()
            .and_then(Color::from_code)
            .ok_or(LoadError::Malformed(header_line))?;

        let mut game = Game {
            pieces: Vec::new(),
            next_id: 0,
            current_turn,
            exchange_clock,
            winner: None,
        };
        let mut taken = [[false; COLS as usize]; ROWS as usize];

        for (i, line) in lines {
            let n = i + 1;
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 4 {
                return Err(LoadError::Malformed(n));
            }
            let color = fields[1]
                .parse::<u8>()
                .ok()
                .and_then(Color::from_code)
                .ok_or(LoadError::Malformed(n))?;
            let col: u8 = fields[2].parse().map_err(|_| LoadError::Malformed(n))?;
            let row: u8 = fields[3].parse().map_err(|_| LoadError::Malformed(n))?;
            if col >= COLS || row >= ROWS {
                return Err(LoadError::OutOfBounds { line: n });
            }
            let kind = Kind::from_name(fields[0], color).ok_or_else(|| LoadError::UnknownKind {
                line: n,
                name: fields[0].to_string(),
            })?;
            if taken[row as usize][col as usize] {
                return Err(LoadError::DuplicateCell { line: n });
            }
            taken[row as usize][col as usize] = true;
            game.spawn(color, kind, Pos::new(col, row));
        }

        if !game.sau_present(Color::Red) {
            game.winner = Some(Color::Blue);
        } else if !game.sau_present(Color::Blue) {
            game.winner = Some(Color::Red);
        }
        Ok(game)
    }
}
