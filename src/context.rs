use anyhow::{bail, Result};

use crate::types::{CastlingSide, Color, Move, Piece, Position};

bitflags::bitflags! {
    /// Which castles each player may still perform. A player loses both bits
    /// when their king moves and one bit when the matching rook moves or is
    /// captured. The king's castling rule reads this instead of tracking any
    /// per-piece moved flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CastlingAvailability: u8 {
        const WHITE_KINGSIDE = 0b1000;
        const WHITE_QUEENSIDE = 0b0100;
        const BLACK_KINGSIDE = 0b0010;
        const BLACK_QUEENSIDE = 0b0001;
    }
}

impl CastlingAvailability {
    /// Parse the FEN castling field, `KQkq` letters or `-`.
    pub fn from_fen_field(field: &str) -> Result<CastlingAvailability> {
        if field == "-" {
            return Ok(Self::empty());
        }
        let mut availability = Self::empty();
        for c in field.chars() {
            availability |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                other => bail!("unknown castling availability char `{other}`"),
            };
        }
        Ok(availability)
    }

    fn bit(color: Color, side: CastlingSide) -> CastlingAvailability {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => Self::WHITE_KINGSIDE,
            (Color::White, CastlingSide::Queenside) => Self::WHITE_QUEENSIDE,
            (Color::Black, CastlingSide::Kingside) => Self::BLACK_KINGSIDE,
            (Color::Black, CastlingSide::Queenside) => Self::BLACK_QUEENSIDE,
        }
    }

    pub fn allows(&self, color: Color, side: CastlingSide) -> bool {
        self.contains(Self::bit(color, side))
    }

    pub fn without(&self, color: Color, side: CastlingSide) -> CastlingAvailability {
        *self & !Self::bit(color, side)
    }

    pub fn without_color(&self, color: Color) -> CastlingAvailability {
        self.without(color, CastlingSide::Kingside)
            .without(color, CastlingSide::Queenside)
    }
}

/// The files involved in one castling direction. Ranks are implied by the
/// castling player's home rank, so one geometry serves both the square the
/// king starts on and where king and rook end up. Nothing here is hardcoded
/// to the standard e/h/g/f layout; boards with shuffled home files supply
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingGeometry {
    pub king_file: u8,
    pub rook_file: u8,
    pub king_target_file: u8,
    pub rook_target_file: u8,
}

impl CastlingGeometry {
    pub fn standard(side: CastlingSide) -> CastlingGeometry {
        match side {
            CastlingSide::Kingside => CastlingGeometry {
                king_file: 5,
                rook_file: 8,
                king_target_file: 7,
                rook_target_file: 6,
            },
            CastlingSide::Queenside => CastlingGeometry {
                king_file: 5,
                rook_file: 1,
                king_target_file: 3,
                rook_target_file: 4,
            },
        }
    }
}

/// Everything the movement rules need to know about the game they are asked
/// about. The rules never mutate the context; `would_be_in_check_after` must
/// answer its hypothetical without leaving the board changed.
pub trait BoardContext {
    fn piece_at(&self, pos: Position) -> Option<Piece>;

    fn width(&self) -> u8;

    fn height(&self) -> u8;

    fn castling_geometry(&self, color: Color, side: CastlingSide) -> CastlingGeometry;

    /// Current castling availability for one player and direction.
    fn can_castle(&self, color: Color, side: CastlingSide) -> bool;

    fn is_in_check(&self, color: Color) -> bool;

    /// Would `color` stand in check once `mv` is played? Pure: implementors
    /// answer on a copy or otherwise undo any probing.
    fn would_be_in_check_after(&self, mv: &Move, color: Color) -> bool;

    /// All moves played so far, oldest first. En passant eligibility is read
    /// off the last entry.
    fn moves(&self) -> &[Move];

    /// Resolve a PGN-style piece letter (either case) to a piece owned by
    /// `color`.
    fn piece_from_pgn(&self, c: char, color: Color) -> Option<Piece>;

    fn contains(&self, pos: Position) -> bool {
        pos.file >= 1 && pos.rank >= 1 && pos.file <= self.width() && pos.rank <= self.height()
    }

    fn home_rank(&self, color: Color) -> u8 {
        match color {
            Color::White => 1,
            Color::Black => self.height(),
        }
    }

    /// The rank a pawn of `color` promotes on.
    fn last_rank(&self, color: Color) -> u8 {
        match color {
            Color::White => self.height(),
            Color::Black => 1,
        }
    }

    fn pawn_starting_rank(&self, color: Color) -> u8 {
        match color {
            Color::White => 2,
            Color::Black => self.height() - 1,
        }
    }
}

/// Caller-supplied legality filter applied to every pseudo-legal candidate
/// during generation. Typically wraps a "would this leave my king in check"
/// query; a single-method strategy trait so non-closure implementations are
/// possible too.
pub trait MoveFilter {
    fn allows(&self, mv: &Move) -> bool;
}

impl<F> MoveFilter for F
where
    F: Fn(&Move) -> bool,
{
    fn allows(&self, mv: &Move) -> bool {
        self(mv)
    }
}

/// Accepts every candidate. Useful when only the geometry matters.
pub struct AcceptAll;

impl MoveFilter for AcceptAll {
    fn allows(&self, _mv: &Move) -> bool {
        true
    }
}
