//! Chess board wrapper over `shakmaty`.
//!
//! Boards travel through the store and the actor contract as FEN text; this
//! module is the only place that parses or renders it.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role};

use crate::errors::domain::{DomainError, ValidationKind};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Side to move, as encoded in the second FEN field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Single-letter tag (`w`/`b`), matching the FEN field.
    pub fn as_char(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }
}

impl From<Color> for Side {
    fn from(c: Color) -> Self {
        match c {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(s: Side) -> Self {
        match s {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// Read the side to move without parsing the whole position.
pub fn side_to_move(fen: &str) -> Result<Side, DomainError> {
    match fen.split_whitespace().nth(1) {
        Some("w") => Ok(Side::White),
        Some("b") => Ok(Side::Black),
        Some(other) => Err(DomainError::validation(
            ValidationKind::InvalidBoardEncoding,
            format!("unrecognized side-to-move token '{other}'"),
        )),
        None => Err(DomainError::validation(
            ValidationKind::InvalidBoardEncoding,
            "board encoding has no side-to-move field",
        )),
    }
}

/// A played move: canonical SAN (with `+`/`#` suffix) and the position after it.
#[derive(Debug, Clone)]
pub struct Played {
    pub san: String,
    pub board: Board,
}

#[derive(Debug, Clone)]
pub struct Board {
    pos: Chess,
}

impl Default for Board {
    fn default() -> Self {
        Self::start()
    }
}

impl Board {
    pub fn start() -> Self {
        Self {
            pos: Chess::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, DomainError> {
        let parsed: Fen = fen.trim().parse().map_err(|e| {
            DomainError::validation(
                ValidationKind::InvalidBoardEncoding,
                format!("unparseable board '{fen}': {e}"),
            )
        })?;
        let pos: Chess = parsed.into_position(CastlingMode::Standard).map_err(|e| {
            DomainError::validation(
                ValidationKind::InvalidBoardEncoding,
                format!("impossible position '{fen}': {e}"),
            )
        })?;
        Ok(Self { pos })
    }

    pub fn to_fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn side_to_move(&self) -> Side {
        self.pos.turn().into()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.pos.legal_moves().into_iter().collect()
    }

    /// Legal moves in canonical SAN, in generation order.
    pub fn legal_sans(&self) -> Vec<String> {
        self.legal_moves().iter().map(|m| self.play(m).san).collect()
    }

    /// Play a legal move. Callers pass moves obtained from `legal_moves`.
    pub fn play(&self, m: &Move) -> Played {
        let mut next = self.pos.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut next, m);
        Played {
            san: san.to_string(),
            board: Board { pos: next },
        }
    }

    /// Parse SAN (check/mate suffix optional) and play it.
    pub fn play_san(&self, san: &str) -> Result<Played, DomainError> {
        let trimmed = san.trim();
        let parsed: SanPlus = trimmed.parse().map_err(|_| {
            DomainError::validation(
                ValidationKind::IllegalMove,
                format!("'{trimmed}' is not algebraic notation"),
            )
        })?;
        let m = parsed.san.to_move(&self.pos).map_err(|_| {
            DomainError::validation(
                ValidationKind::IllegalMove,
                format!("'{trimmed}' is not legal in {}", self.to_fen()),
            )
        })?;
        Ok(self.play(&m))
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.pos.is_insufficient_material()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.pos.halfmoves()
    }

    /// Material of `side` minus material of the opponent, in centipawns.
    pub fn material_balance(&self, side: Side) -> i32 {
        let us: Color = side.into();
        material_score(&self.pos, us) - material_score(&self.pos, us.other())
    }
}

const PIECE_VALUES: [(Role, i32); 5] = [
    (Role::Pawn, 100),
    (Role::Knight, 320),
    (Role::Bishop, 330),
    (Role::Rook, 500),
    (Role::Queen, 900),
];

/// Non-king material of one color, in centipawns.
pub fn material_score(pos: &Chess, color: Color) -> i32 {
    let board = pos.board();
    PIECE_VALUES
        .iter()
        .map(|(role, value)| (board.by_color(color) & board.by_role(*role)).count() as i32 * value)
        .sum()
}

/// Re-render a FEN through the parser so textual variants compare equal.
pub fn normalize_fen(fen: &str) -> Result<String, DomainError> {
    Ok(Board::from_fen(fen)?.to_fen())
}
