use anyhow::{bail, Context, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::context::{BoardContext, CastlingAvailability, CastlingGeometry};
use crate::rules::castling_side;
use crate::types::{CastlingSide, Color, Move, Piece, PieceKind, Position};

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

static STARTING_BOARD: Lazy<Board> =
    Lazy::new(|| Board::from_fen(STARTING_POSITION_FEN).expect("the starting position FEN parses"));

/// Dimensions and castling file configuration of a board. The geometry is
/// kept per player and per direction so shuffled starting setups can differ
/// between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub width: u8,
    pub height: u8,
    white_kingside: CastlingGeometry,
    white_queenside: CastlingGeometry,
    black_kingside: CastlingGeometry,
    black_queenside: CastlingGeometry,
}

impl BoardLayout {
    pub fn standard() -> BoardLayout {
        BoardLayout::with_size(8, 8)
    }

    /// A `width`×`height` board with the standard castling files.
    pub fn with_size(width: u8, height: u8) -> BoardLayout {
        BoardLayout {
            width,
            height,
            white_kingside: CastlingGeometry::standard(CastlingSide::Kingside),
            white_queenside: CastlingGeometry::standard(CastlingSide::Queenside),
            black_kingside: CastlingGeometry::standard(CastlingSide::Kingside),
            black_queenside: CastlingGeometry::standard(CastlingSide::Queenside),
        }
    }

    /// Replace the castling files for one player and direction.
    pub fn with_geometry(
        mut self,
        color: Color,
        side: CastlingSide,
        geometry: CastlingGeometry,
    ) -> BoardLayout {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => self.white_kingside = geometry,
            (Color::White, CastlingSide::Queenside) => self.white_queenside = geometry,
            (Color::Black, CastlingSide::Kingside) => self.black_kingside = geometry,
            (Color::Black, CastlingSide::Queenside) => self.black_queenside = geometry,
        }
        self
    }

    pub fn geometry(&self, color: Color, side: CastlingSide) -> CastlingGeometry {
        match (color, side) {
            (Color::White, CastlingSide::Kingside) => self.white_kingside,
            (Color::White, CastlingSide::Queenside) => self.white_queenside,
            (Color::Black, CastlingSide::Kingside) => self.black_kingside,
            (Color::Black, CastlingSide::Queenside) => self.black_queenside,
        }
    }
}

/// A concrete [`BoardContext`]: a mailbox list of placed pieces plus the
/// state the movement rules query (castling availability, move history).
/// Playing a move produces a new board; nothing here mutates in place, which
/// is what lets the hypothetical-check query work on a throwaway copy.
#[derive(Debug, Clone)]
pub struct Board {
    pieces: Vec<(Position, Piece)>,
    layout: BoardLayout,
    // who's move it is
    active_color: Color,
    castling: CastlingAvailability,
    moves: Vec<Move>,
    // number of half moves since last capture or pawn advance
    halfmove_clock: u32,
    // number of full moves. Starts at 1, and gets incremented after every black move
    fullmove_clock: u32,
}

impl Board {
    /// The standard starting position.
    pub fn starting() -> Board {
        STARTING_BOARD.clone()
    }

    /// Build a board from a FEN string. The board's width and height are
    /// read off the piece placement field, so FENs for larger boards work
    /// too (empty-square runs may be multi-digit). The en-passant field is
    /// bridged into the move-history representation the rules read: it
    /// implies the opponent just double-stepped over that square.
    pub fn from_fen(fen_string: &str) -> Result<Board> {
        let (placement, active, castling_field, en_passant, halfmove, fullmove) = fen_string
            .split_whitespace()
            .collect_tuple()
            .context("FEN string must have 6 fields, space delimited")?;

        let rows: Vec<&str> = placement.split('/').collect();
        let height = rows.len() as u8;
        let mut pieces: Vec<(Position, Piece)> = vec![];
        let mut width: u8 = 0;
        for (row_index, row) in rows.iter().enumerate() {
            let rank = height - row_index as u8;
            let mut file: u32 = 1;
            let mut empty_run: u32 = 0;
            for c in row.chars() {
                if let Some(digit) = c.to_digit(10) {
                    empty_run = empty_run * 10 + digit;
                    continue;
                }
                file += empty_run;
                empty_run = 0;
                if file > u8::MAX as u32 {
                    bail!("FEN row is wider than a board can be");
                }
                pieces.push((
                    Position::new(file as u8, rank),
                    Piece::from_char(c).with_context(|| format!("bad FEN piece char `{c}`"))?,
                ));
                file += 1;
            }
            file += empty_run;
            let row_width = file - 1;
            if row_width == 0 || row_width > u8::MAX as u32 {
                bail!("FEN row describes an impossible width of {row_width}");
            }
            if width == 0 {
                width = row_width as u8;
            } else if width != row_width as u8 {
                bail!("FEN rows describe differing widths");
            }
        }

        let active_color = Color::from_char(
            active
                .chars()
                .next()
                .context("FEN active color field is empty")?,
        )?;
        let castling = CastlingAvailability::from_fen_field(castling_field)?;
        let layout = BoardLayout::with_size(width, height);

        let mut moves: Vec<Move> = vec![];
        if en_passant != "-" {
            let target = Position::from_algebraic(en_passant)?;
            if target.rank < 2 || target.rank >= height {
                bail!("en-passant square `{en_passant}` cannot sit next to a board edge");
            }
            let mover = active_color.other_color();
            let (from_rank, to_rank) = match mover {
                Color::White => (target.rank - 1, target.rank + 1),
                Color::Black => (target.rank + 1, target.rank - 1),
            };
            moves.push(Move::new(
                Position::new(target.file, from_rank),
                Position::new(target.file, to_rank),
                mover,
            ));
        }

        let halfmove_clock: u32 = halfmove.parse().context("halfmove clock should be a u32")?;
        let fullmove_clock: u32 = fullmove.parse().context("fullmove clock should be a u32")?;

        Ok(Board {
            pieces,
            layout,
            active_color,
            castling,
            moves,
            halfmove_clock,
            fullmove_clock,
        })
    }

    /// Swap in a different layout (custom castling geometry, mostly).
    /// Callers keep the piece placement consistent with it.
    pub fn with_layout(mut self, layout: BoardLayout) -> Board {
        self.layout = layout;
        self
    }

    /// Get the color of the side to move
    pub fn active_color(&self) -> Color {
        self.active_color
    }

    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    fn king_position(&self, color: Color) -> Position {
        self.pieces
            .iter()
            .find(|(_, piece)| piece.color == color && piece.kind == PieceKind::King)
            .map(|(pos, _)| *pos)
            .expect("king should always be on the board")
    }

    /// Play `mv` and return the resulting board. The move is assumed to be
    /// valid; garbage input is a caller bug. Castling relocates the rook,
    /// an en-passant capture removes the passed pawn, and a promotion swaps
    /// the pawn for the piece its designator names.
    pub fn execute_move(&self, mv: &Move) -> Board {
        let piece = self
            .piece_at(mv.from)
            .expect("no piece on the move's origin square");
        // an own piece on the destination is no capture; it is the rook of a
        // castle written in the king-takes-rook notation
        let capture = self.piece_at(mv.to).filter(|p| p.color != piece.color);
        if capture.is_some_and(|p| p.kind == PieceKind::King) {
            panic!("King cannot be captured, something is amiss");
        }

        let home_rank = self.home_rank(piece.color);
        let mut removals: Vec<Position> = vec![mv.from, mv.to];
        let mut placements: Vec<(Position, Piece)> = vec![];

        let castle = if piece.kind == PieceKind::King {
            castling_side(mv, self)
        } else {
            None
        };
        match castle {
            Some(side) => {
                let geometry = self.castling_geometry(piece.color, side);
                let rook_home = Position::new(geometry.rook_file, home_rank);
                let rook = self
                    .piece_at(rook_home)
                    .expect("castling with no rook on its home square");
                removals.push(rook_home);
                placements.push((Position::new(geometry.king_target_file, home_rank), piece));
                placements.push((Position::new(geometry.rook_target_file, home_rank), rook));
            }
            None => {
                // a pawn sliding diagonally onto an empty square is an
                // en-passant capture; the passed pawn sits behind the
                // destination
                if piece.kind == PieceKind::Pawn && mv.from.file != mv.to.file && capture.is_none()
                {
                    removals.push(Position::new(mv.to.file, mv.from.rank));
                }
                let landed = match mv.promotion {
                    Some(c)
                        if piece.kind == PieceKind::Pawn
                            && mv.to.rank == self.last_rank(piece.color) =>
                    {
                        self.piece_from_pgn(c, piece.color)
                            .expect("promotion designator must name a piece")
                            .as_promotion()
                            .expect("promotion designator must name a promotable piece")
                    }
                    _ => piece,
                };
                placements.push((mv.to, landed));
            }
        }

        // castling bookkeeping: a king move clears both of its sides, moving
        // a rook off its home square or capturing it there clears that side
        let mut castling = self.castling;
        if piece.kind == PieceKind::King {
            castling = castling.without_color(piece.color);
        }
        for color in [Color::White, Color::Black] {
            for side in [CastlingSide::Kingside, CastlingSide::Queenside] {
                let geometry = self.castling_geometry(color, side);
                let rook_home = Position::new(geometry.rook_file, self.home_rank(color));
                if mv.from == rook_home || mv.to == rook_home {
                    castling = castling.without(color, side);
                }
            }
        }

        let pieces: Vec<(Position, Piece)> = self
            .pieces
            .iter()
            .copied()
            .filter(|(pos, _)| !removals.contains(pos))
            .chain(placements)
            .collect();

        let mut moves = self.moves.clone();
        moves.push(*mv);

        Board {
            pieces,
            layout: self.layout,
            active_color: self.active_color.other_color(),
            castling,
            moves,
            halfmove_clock: if capture.is_some() || piece.kind == PieceKind::Pawn {
                0
            } else {
                self.halfmove_clock + 1
            },
            fullmove_clock: self.fullmove_clock + u32::from(piece.color == Color::Black),
        }
    }

    /// All fully legal moves for `color`: pseudo-legal generation run
    /// through a filter that rejects landing on an own piece and leaving the
    /// own king in check. Each castle shows up once, in its two-file
    /// notation, because the rook-targeting form lands on an own piece.
    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        let filter = |m: &Move| {
            self.piece_at(m.to).map_or(true, |p| p.color != color)
                && !self.would_be_in_check_after(m, color)
        };
        self.pieces
            .iter()
            .filter(|(_, piece)| piece.color == color)
            .flat_map(|(pos, piece)| piece.valid_moves(*pos, false, self, &filter))
            .collect()
    }

    /// Existence query behind mate/stalemate style questions: stops at the
    /// first legal move instead of enumerating them all.
    pub fn has_any_legal_move(&self, color: Color) -> bool {
        let filter = |m: &Move| {
            self.piece_at(m.to).map_or(true, |p| p.color != color)
                && !self.would_be_in_check_after(m, color)
        };
        self.pieces
            .iter()
            .filter(|(_, piece)| piece.color == color)
            .any(|(pos, piece)| !piece.valid_moves(*pos, true, self, &filter).is_empty())
    }

    pub fn draw_board(&self) -> String {
        let mut string = String::new();
        for rank in (1..=self.layout.height).rev() {
            for file in 1..=self.layout.width {
                let p = self.piece_at(Position::new(file, rank));
                string = format!(
                    "{} {}",
                    string,
                    match p {
                        Some(pp) => pp.to_symbol().to_string(),
                        None => ".".to_string(),
                    }
                );
            }
            string = format!("{}\n", string);
        }
        string
    }

    pub fn draw_to_terminal(&self) {
        println!("{}", self.draw_board());
    }
}

impl BoardContext for Board {
    fn piece_at(&self, pos: Position) -> Option<Piece> {
        // TODO: keep a square-indexed lookaside if the linear scan ever
        // shows up in profiles
        self.pieces
            .iter()
            .find(|(p, _)| *p == pos)
            .map(|(_, piece)| *piece)
    }

    fn width(&self) -> u8 {
        self.layout.width
    }

    fn height(&self) -> u8 {
        self.layout.height
    }

    fn castling_geometry(&self, color: Color, side: CastlingSide) -> CastlingGeometry {
        self.layout.geometry(color, side)
    }

    fn can_castle(&self, color: Color, side: CastlingSide) -> bool {
        self.castling.allows(color, side)
    }

    fn is_in_check(&self, color: Color) -> bool {
        let king_pos = self.king_position(color);
        self.pieces
            .iter()
            .filter(|(_, piece)| piece.color == color.other_color())
            .any(|(pos, piece)| {
                // a pawn attacking the last rank needs a designator for its
                // capture to be well formed
                let attack = if piece.kind == PieceKind::Pawn
                    && king_pos.rank == self.last_rank(piece.color)
                {
                    Move::promoting(*pos, king_pos, piece.color, 'Q')
                } else {
                    Move::new(*pos, king_pos, piece.color)
                };
                piece.is_valid_move(&attack, self)
            })
    }

    fn would_be_in_check_after(&self, mv: &Move, color: Color) -> bool {
        // answered on a copy; the board itself never moves
        self.execute_move(mv).is_in_check(color)
    }

    fn moves(&self) -> &[Move] {
        &self.moves
    }

    fn piece_from_pgn(&self, c: char, color: Color) -> Option<Piece> {
        PieceKind::from_char(c).ok().map(|kind| Piece::new(color, kind))
    }
}
