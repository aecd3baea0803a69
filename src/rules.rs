//! The per-piece movement rules: `is_valid_move` answers whether a candidate
//! move is shaped correctly for the piece and consistent with board
//! occupancy and the special-rule preconditions (castling, en passant,
//! promotion); `valid_moves` enumerates the pseudo-legal candidates and runs
//! each through the caller's legality filter.
//!
//! Everything here is a pure function of the move and the [`BoardContext`]
//! snapshot. Whether a move would leave the mover's own king in check is the
//! filter's business, not ours.

use crate::context::{BoardContext, CastlingGeometry, MoveFilter};
use crate::types::{CastlingSide, Color, Move, Piece, PieceKind, Position, PROMOTABLE};

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

impl Piece {
    /// Is `mv` a permissible move for this piece? Illegality is an expected
    /// outcome and reported as `false`, never as an error; that includes
    /// moves whose mover does not match the piece's owner and moves with an
    /// endpoint off the board.
    pub fn is_valid_move(&self, mv: &Move, ctx: &impl BoardContext) -> bool {
        if mv.color != self.color {
            return false;
        }
        if !ctx.contains(mv.from) || !ctx.contains(mv.to) {
            return false;
        }
        match self.kind {
            PieceKind::Rook => is_valid_rook_move(mv, ctx),
            PieceKind::Bishop => is_valid_bishop_move(mv, ctx),
            // a queen moves like a rook or like a bishop; nothing more
            PieceKind::Queen => is_valid_rook_move(mv, ctx) || is_valid_bishop_move(mv, ctx),
            PieceKind::Knight => is_valid_knight_move(mv),
            PieceKind::King => is_valid_king_move(mv, ctx),
            PieceKind::Pawn => is_valid_pawn_move(mv, ctx),
        }
    }

    /// Enumerate this piece's moves from `from`, keeping those `filter`
    /// accepts. With `return_if_any` set, generation stops at the first
    /// accepted move, which keeps "does any legal move exist" queries cheap.
    /// Candidates falling off the board are skipped silently. The order of
    /// the returned moves is deterministic but not part of the contract.
    pub fn valid_moves(
        &self,
        from: Position,
        return_if_any: bool,
        ctx: &impl BoardContext,
        filter: &impl MoveFilter,
    ) -> Vec<Move> {
        match self.kind {
            PieceKind::Rook => self.slider_moves(from, &ROOK_DIRECTIONS, return_if_any, ctx, filter),
            PieceKind::Bishop => {
                self.slider_moves(from, &BISHOP_DIRECTIONS, return_if_any, ctx, filter)
            }
            PieceKind::Queen => {
                let mut moves =
                    self.slider_moves(from, &ROOK_DIRECTIONS, return_if_any, ctx, filter);
                if return_if_any && !moves.is_empty() {
                    // the rook half already proved existence
                    return moves;
                }
                moves.extend(self.slider_moves(from, &BISHOP_DIRECTIONS, return_if_any, ctx, filter));
                moves
            }
            PieceKind::Knight => self.knight_moves(from, return_if_any, ctx, filter),
            PieceKind::King => self.king_moves(from, return_if_any, ctx, filter),
            PieceKind::Pawn => self.pawn_moves(from, return_if_any, ctx, filter),
        }
    }

    fn slider_moves(
        &self,
        from: Position,
        directions: &[(i8, i8)],
        return_if_any: bool,
        ctx: &impl BoardContext,
        filter: &impl MoveFilter,
    ) -> Vec<Move> {
        let mut moves: Vec<Move> = vec![];
        for &(file_step, rank_step) in directions {
            let mut square = from;
            loop {
                square = match square.offset(file_step, rank_step) {
                    Some(next) if ctx.contains(next) => next,
                    _ => break,
                };
                let candidate = Move::new(from, square, self.color);
                if self.is_valid_move(&candidate, ctx) && filter.allows(&candidate) {
                    moves.push(candidate);
                    if return_if_any {
                        return moves;
                    }
                }
                // anything past the first occupied square is blocked
                if ctx.piece_at(square).is_some() {
                    break;
                }
            }
        }
        moves
    }

    fn knight_moves(
        &self,
        from: Position,
        return_if_any: bool,
        ctx: &impl BoardContext,
        filter: &impl MoveFilter,
    ) -> Vec<Move> {
        let mut moves: Vec<Move> = vec![];
        for (file_delta, rank_delta) in
            std::iter::zip([-2i8, -2, -1, -1, 1, 1, 2, 2], [-1i8, 1, -2, 2, -2, 2, -1, 1])
        {
            let to = match from.offset(file_delta, rank_delta) {
                Some(to) if ctx.contains(to) => to,
                _ => continue,
            };
            let candidate = Move::new(from, to, self.color);
            if self.is_valid_move(&candidate, ctx) && filter.allows(&candidate) {
                moves.push(candidate);
                if return_if_any {
                    return moves;
                }
            }
        }
        moves
    }

    fn king_moves(
        &self,
        from: Position,
        return_if_any: bool,
        ctx: &impl BoardContext,
        filter: &impl MoveFilter,
    ) -> Vec<Move> {
        let mut moves: Vec<Move> = vec![];
        for (file_delta, rank_delta) in
            std::iter::zip([-1i8, -1, -1, 0, 0, 1, 1, 1], [-1i8, 0, 1, -1, 1, -1, 0, 1])
        {
            let to = match from.offset(file_delta, rank_delta) {
                Some(to) if ctx.contains(to) => to,
                _ => continue,
            };
            let candidate = Move::new(from, to, self.color);
            if self.is_valid_move(&candidate, ctx) && filter.allows(&candidate) {
                moves.push(candidate);
                if return_if_any {
                    return moves;
                }
            }
        }
        // castling candidates only arise with the king on its home square:
        // the post-castle-file step, plus targeting the rook directly when
        // the rook stands next to the king
        for side in [CastlingSide::Kingside, CastlingSide::Queenside] {
            let geometry = ctx.castling_geometry(self.color, side);
            let home = Position::new(geometry.king_file, ctx.home_rank(self.color));
            if from != home {
                continue;
            }
            let mut targets = vec![Position::new(geometry.king_target_file, home.rank)];
            if geometry.king_file.abs_diff(geometry.rook_file) == 1 {
                targets.push(Position::new(geometry.rook_file, home.rank));
            }
            for to in targets {
                if to == from || !ctx.contains(to) {
                    continue;
                }
                let candidate = Move::new(from, to, self.color);
                if moves.contains(&candidate) {
                    continue;
                }
                if self.is_valid_move(&candidate, ctx) && filter.allows(&candidate) {
                    moves.push(candidate);
                    if return_if_any {
                        return moves;
                    }
                }
            }
        }
        moves
    }

    fn pawn_moves(
        &self,
        from: Position,
        return_if_any: bool,
        ctx: &impl BoardContext,
        filter: &impl MoveFilter,
    ) -> Vec<Move> {
        let mut moves: Vec<Move> = vec![];
        let step = forward(self.color);
        for (file_delta, rank_delta) in [(0i8, step), (0, 2 * step), (-1, step), (1, step)] {
            let to = match from.offset(file_delta, rank_delta) {
                Some(to) if ctx.contains(to) => to,
                _ => continue,
            };
            // a landing on the last rank fans out into one candidate per
            // promotable kind
            let candidates: Vec<Move> = if to.rank == ctx.last_rank(self.color) {
                PROMOTABLE
                    .iter()
                    .map(|kind| Move::promoting(from, to, self.color, kind.to_char()))
                    .collect()
            } else {
                vec![Move::new(from, to, self.color)]
            };
            for candidate in candidates {
                if self.is_valid_move(&candidate, ctx) && filter.allows(&candidate) {
                    moves.push(candidate);
                    if return_if_any {
                        return moves;
                    }
                }
            }
        }
        moves
    }
}

/// Direction of pawn movement for given color
fn forward(color: Color) -> i8 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

fn is_valid_rook_move(mv: &Move, ctx: &impl BoardContext) -> bool {
    let d = mv.from.distance_to(&mv.to);
    ((d.file == 0) != (d.rank == 0)) && path_is_clear(mv.from, mv.to, ctx)
}

fn is_valid_bishop_move(mv: &Move, ctx: &impl BoardContext) -> bool {
    let d = mv.from.distance_to(&mv.to);
    d.file == d.rank && d.file > 0 && path_is_clear(mv.from, mv.to, ctx)
}

fn is_valid_knight_move(mv: &Move) -> bool {
    let d = mv.from.distance_to(&mv.to);
    matches!((d.file, d.rank), (1, 2) | (2, 1))
}

/// Every square strictly between `from` and `to` must be empty. Callers
/// guarantee the endpoints share a rank, a file or a diagonal. Destination
/// occupancy is deliberately not inspected here; whether a capture is
/// acceptable belongs to the filter layer.
fn path_is_clear(from: Position, to: Position, ctx: &impl BoardContext) -> bool {
    let file_step = (to.file as i16 - from.file as i16).signum();
    let rank_step = (to.rank as i16 - from.rank as i16).signum();
    let mut file = from.file as i16 + file_step;
    let mut rank = from.rank as i16 + rank_step;
    while (file, rank) != (to.file as i16, to.rank as i16) {
        if ctx.piece_at(Position::new(file as u8, rank as u8)).is_some() {
            return false;
        }
        file += file_step;
        rank += rank_step;
    }
    true
}

fn is_valid_king_move(mv: &Move, ctx: &impl BoardContext) -> bool {
    let d = mv.from.distance_to(&mv.to);
    let adjacent = matches!((d.file, d.rank), (1, 0) | (0, 1) | (1, 1))
        && ctx.piece_at(mv.to).map_or(true, |other| other.color != mv.color);
    if adjacent {
        return true;
    }
    match castling_side(mv, ctx) {
        Some(side) => is_valid_castling(mv, side, ctx),
        None => false,
    }
}

/// Does `mv` read as a castling request? Either the king steps onto its
/// configured post-castle file along the home rank, or it targets its own
/// rook's square directly (the "capture your rook" notation).
pub(crate) fn castling_side(mv: &Move, ctx: &impl BoardContext) -> Option<CastlingSide> {
    let home_rank = ctx.home_rank(mv.color);
    if mv.from.rank != home_rank || mv.to.rank != home_rank {
        return None;
    }
    for side in [CastlingSide::Kingside, CastlingSide::Queenside] {
        let geometry = ctx.castling_geometry(mv.color, side);
        if mv.from.file != geometry.king_file {
            continue;
        }
        if mv.to.file == geometry.king_target_file {
            return Some(side);
        }
        let targets_own_rook = mv.to.file == geometry.rook_file
            && ctx
                .piece_at(mv.to)
                .is_some_and(|p| p.color == mv.color && p.kind == PieceKind::Rook);
        if targets_own_rook {
            return Some(side);
        }
    }
    None
}

fn is_valid_castling(mv: &Move, side: CastlingSide, ctx: &impl BoardContext) -> bool {
    let color = mv.color;
    let home_rank = ctx.home_rank(color);
    let geometry: CastlingGeometry = ctx.castling_geometry(color, side);
    let rook_home = Position::new(geometry.rook_file, home_rank);

    // availability already encodes "neither king nor rook has moved"
    if !ctx.can_castle(color, side) {
        return false;
    }
    // the rook must actually stand on its home square
    let rook_present = ctx
        .piece_at(rook_home)
        .is_some_and(|p| p.color == color && p.kind == PieceKind::Rook);
    if !rook_present {
        return false;
    }
    // castling out of check is never allowed
    if ctx.is_in_check(color) {
        return false;
    }

    // the king's walk up to and including its destination must be over empty
    // squares (the castling rook itself does not block) and must never pass
    // through check
    for file in files_between(geometry.king_file, geometry.king_target_file, true) {
        let square = Position::new(file, home_rank);
        if square != rook_home && ctx.piece_at(square).is_some() {
            return false;
        }
        if ctx.would_be_in_check_after(&Move::new(mv.from, square, color), color) {
            return false;
        }
    }

    // the rook's path must be free as well; the king on its own home square
    // does not block, and the rook's destination square is covered by the
    // king scan wherever the two overlap
    for file in files_between(geometry.rook_file, geometry.rook_target_file, false) {
        let square = Position::new(file, home_rank);
        if square == mv.from {
            continue;
        }
        if ctx.piece_at(square).is_some() {
            return false;
        }
    }
    true
}

/// Files strictly after `from` stepping toward `to`; `inclusive` keeps `to`
/// itself.
fn files_between(from: u8, to: u8, inclusive: bool) -> Vec<u8> {
    let mut files: Vec<u8> = if from <= to {
        (from + 1..=to).collect()
    } else {
        (to..from).rev().collect()
    };
    if !inclusive {
        files.pop();
    }
    files
}

fn is_valid_pawn_move(mv: &Move, ctx: &impl BoardContext) -> bool {
    let d = mv.from.distance_to(&mv.to);
    if !matches!((d.file, d.rank), (0, 1) | (1, 1) | (0, 2)) {
        return false;
    }
    // pawns only ever advance toward the opponent
    let advancing = match mv.color {
        Color::White => mv.to.rank > mv.from.rank,
        Color::Black => mv.to.rank < mv.from.rank,
    };
    if !advancing {
        return false;
    }
    // a landing on the last rank must name a promotable piece of the mover
    if mv.to.rank == ctx.last_rank(mv.color) && !has_valid_promotion(mv, ctx) {
        return false;
    }
    match (d.file, d.rank) {
        (0, 1) => ctx.piece_at(mv.to).is_none(),
        (0, 2) => {
            mv.from.rank == ctx.pawn_starting_rank(mv.color)
                && mv
                    .from
                    .offset(0, forward(mv.color))
                    .is_some_and(|sq| ctx.piece_at(sq).is_none())
                && ctx.piece_at(mv.to).is_none()
        }
        (1, 1) => match ctx.piece_at(mv.to) {
            Some(other) => other.color != mv.color,
            None => is_en_passant_capture(mv, ctx),
        },
        _ => unreachable!("pawn shape was checked above"),
    }
}

fn has_valid_promotion(mv: &Move, ctx: &impl BoardContext) -> bool {
    mv.promotion
        .and_then(|c| ctx.piece_from_pgn(c, mv.color))
        .is_some_and(|p| p.color == mv.color && PROMOTABLE.contains(&p.kind))
}

/// The capture of a pawn that just advanced two ranks, taken as though it
/// had advanced one. Only the immediately preceding move qualifies: the
/// capturer stands on the double step's landing rank and lands behind it on
/// the same file.
fn is_en_passant_capture(mv: &Move, ctx: &impl BoardContext) -> bool {
    let last = match ctx.moves().last() {
        Some(last) => *last,
        None => return false,
    };
    if last.color != mv.color.other_color() {
        return false;
    }
    let last_distance = last.from.distance_to(&last.to);
    let was_double_step = last_distance.file == 0 && last_distance.rank == 2;
    was_double_step
        && ctx
            .piece_at(last.to)
            .is_some_and(|p| p.kind == PieceKind::Pawn && p.color == last.color)
        && last.to.rank == mv.from.rank
        && last.to.file == mv.to.file
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::board::Board;
    use crate::context::AcceptAll;

    fn white(kind: PieceKind) -> Piece {
        Piece::new(Color::White, kind)
    }

    fn mv(from: &str, to: &str, color: Color) -> Move {
        Move::new(
            Position::from_algebraic(from).unwrap(),
            Position::from_algebraic(to).unwrap(),
            color,
        )
    }

    #[test]
    fn test_rook_moves_straight_lines_only() {
        let b = Board::from_fen("4k3/8/8/8/3R4/8/8/4K3 w - - 0 1").unwrap();
        let rook = white(PieceKind::Rook);
        assert!(rook.is_valid_move(&mv("d4", "d8", Color::White), &b));
        assert!(rook.is_valid_move(&mv("d4", "a4", Color::White), &b));
        assert!(rook.is_valid_move(&mv("d4", "h4", Color::White), &b));
        assert!(!rook.is_valid_move(&mv("d4", "e5", Color::White), &b));
        assert!(!rook.is_valid_move(&mv("d4", "d4", Color::White), &b));
        // owner mismatch is "not valid", not an error
        assert!(!rook.is_valid_move(&mv("d4", "d8", Color::Black), &b));
    }

    #[test]
    fn test_sliders_cannot_jump() {
        // the scan rejects occupied in-between squares of either color
        // . . . . ♚ . . .
        // . . . . . . . .
        // . . . ♞ . . . .
        // . . . . . . . .
        // . . . ♖ . . ♙ .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . ♔ . . .
        let b = Board::from_fen("4k3/8/3n4/8/3R2P1/8/8/4K3 w - - 0 1").unwrap();
        let rook = white(PieceKind::Rook);
        assert!(rook.is_valid_move(&mv("d4", "d6", Color::White), &b));
        assert!(!rook.is_valid_move(&mv("d4", "d8", Color::White), &b));
        assert!(rook.is_valid_move(&mv("d4", "g4", Color::White), &b));
        assert!(!rook.is_valid_move(&mv("d4", "h4", Color::White), &b));
    }

    #[test]
    fn test_bishop_moves_diagonals_only() {
        let b = Board::from_fen("4k3/8/8/8/3B4/8/8/4K3 w - - 0 1").unwrap();
        let bishop = white(PieceKind::Bishop);
        assert!(bishop.is_valid_move(&mv("d4", "h8", Color::White), &b));
        assert!(bishop.is_valid_move(&mv("d4", "a1", Color::White), &b));
        assert!(bishop.is_valid_move(&mv("d4", "a7", Color::White), &b));
        assert!(!bishop.is_valid_move(&mv("d4", "d8", Color::White), &b));
        assert!(!bishop.is_valid_move(&mv("d4", "e6", Color::White), &b));
    }

    #[test]
    fn test_bishop_blocked_diagonal() {
        let b = Board::from_fen("4k3/8/5p2/8/3B4/8/8/4K3 w - - 0 1").unwrap();
        let bishop = white(PieceKind::Bishop);
        assert!(bishop.is_valid_move(&mv("d4", "f6", Color::White), &b));
        assert!(!bishop.is_valid_move(&mv("d4", "g7", Color::White), &b));
    }

    #[test]
    fn test_queen_is_rook_or_bishop() {
        let b = Board::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let queen = white(PieceKind::Queen);
        assert!(queen.is_valid_move(&mv("d4", "d8", Color::White), &b));
        assert!(queen.is_valid_move(&mv("d4", "h8", Color::White), &b));
        assert!(queen.is_valid_move(&mv("d4", "a4", Color::White), &b));
        assert!(!queen.is_valid_move(&mv("d4", "e6", Color::White), &b));
        assert!(!queen.is_valid_move(&mv("d4", "c7", Color::White), &b));
    }

    #[test]
    fn test_knight_jumps() {
        // knights ignore the blocking pawns entirely
        let b = Board::from_fen("4k3/8/8/2ppp3/2pNp3/2ppp3/8/4K3 w - - 0 1").unwrap();
        let knight = white(PieceKind::Knight);
        for to in ["b3", "b5", "c2", "c6", "e2", "e6", "f3", "f5"] {
            assert!(knight.is_valid_move(&mv("d4", to, Color::White), &b));
        }
        assert!(!knight.is_valid_move(&mv("d4", "d5", Color::White), &b));
        assert!(!knight.is_valid_move(&mv("d4", "f4", Color::White), &b));
    }

    #[test]
    fn test_knight_candidates_on_d4() {
        let b = Board::from_fen("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1").unwrap();
        let moves = white(PieceKind::Knight).valid_moves(
            Position::from_algebraic("d4").unwrap(),
            false,
            &b,
            &AcceptAll,
        );
        assert_eq!(moves.len(), 8);
        for m in &moves {
            assert!(b.contains(m.to));
        }
    }

    #[test]
    fn test_knight_candidates_in_corner() {
        let b = Board::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
        let moves = white(PieceKind::Knight).valid_moves(
            Position::from_algebraic("a1").unwrap(),
            false,
            &b,
            &AcceptAll,
        );
        // off-board candidates are skipped, not errors
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn test_king_adjacency() {
        let b = Board::from_fen("4k3/8/8/8/3pK3/8/8/8 w - - 0 1").unwrap();
        let king = white(PieceKind::King);
        assert!(king.is_valid_move(&mv("e4", "e5", Color::White), &b));
        assert!(king.is_valid_move(&mv("e4", "d5", Color::White), &b));
        assert!(king.is_valid_move(&mv("e4", "d4", Color::White), &b)); // capture
        assert!(!king.is_valid_move(&mv("e4", "e6", Color::White), &b));
        assert!(!king.is_valid_move(&mv("e4", "c4", Color::White), &b));
    }

    #[test]
    fn test_king_cannot_land_on_own_piece() {
        let b = Board::from_fen("4k3/8/8/8/3PK3/8/8/8 w - - 0 1").unwrap();
        let king = white(PieceKind::King);
        assert!(!king.is_valid_move(&mv("e4", "d4", Color::White), &b));
    }

    #[test]
    fn test_castling_both_notations() {
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let king = white(PieceKind::King);
        // two-file king step
        assert!(king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        assert!(king.is_valid_move(&mv("e1", "c1", Color::White), &b));
        // targeting the rook's square means the same thing
        assert!(king.is_valid_move(&mv("e1", "h1", Color::White), &b));
        assert!(king.is_valid_move(&mv("e1", "a1", Color::White), &b));
        let black_king = Piece::new(Color::Black, PieceKind::King);
        assert!(black_king.is_valid_move(&mv("e8", "g8", Color::Black), &b));
        assert!(black_king.is_valid_move(&mv("e8", "c8", Color::Black), &b));
    }

    #[test]
    fn test_castling_requires_availability() {
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1").unwrap();
        let king = white(PieceKind::King);
        assert!(!king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        assert!(king.is_valid_move(&mv("e1", "c1", Color::White), &b));
    }

    #[test]
    fn test_castling_requires_rook_on_home_square() {
        // availability flags may be stale; the rook is simply gone
        let b = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let king = white(PieceKind::King);
        assert!(king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        let without_rook = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1").unwrap();
        assert!(!king.is_valid_move(&mv("e1", "g1", Color::White), &without_rook));
    }

    #[test]
    fn test_castling_illegal_while_in_check() {
        // . . . . ♚ . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . ♜ . . .
        // . . . . . . . .
        // . . . . . . . .
        // ♖ . . . ♔ . . ♖
        let b = Board::from_fen("4k3/8/8/8/4r3/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(b.is_in_check(Color::White));
        let king = white(PieceKind::King);
        assert!(!king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        assert!(!king.is_valid_move(&mv("e1", "c1", Color::White), &b));
    }

    #[test]
    fn test_castling_path_must_not_be_attacked() {
        // the black rook covers f1, so kingside transit is poisoned while
        // queenside stays fine
        let b = Board::from_fen("4k3/8/8/8/5r2/8/8/R3K2R w KQ - 0 1").unwrap();
        let king = white(PieceKind::King);
        assert!(!king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        assert!(king.is_valid_move(&mv("e1", "c1", Color::White), &b));
    }

    #[test]
    fn test_castling_path_must_be_empty() {
        let b = Board::starting();
        let king = white(PieceKind::King);
        assert!(!king.is_valid_move(&mv("e1", "g1", Color::White), &b));
        assert!(!king.is_valid_move(&mv("e1", "c1", Color::White), &b));
        // only the b-file is blocked: the king's walk is clear but the
        // rook's is not
        let b = Board::from_fen("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").unwrap();
        assert!(!king.is_valid_move(&mv("e1", "c1", Color::White), &b));
    }

    #[test]
    fn test_pawn_pushes() {
        let b = Board::starting();
        let pawn = white(PieceKind::Pawn);
        assert!(pawn.is_valid_move(&mv("e2", "e3", Color::White), &b));
        assert!(pawn.is_valid_move(&mv("e2", "e4", Color::White), &b));
        assert!(!pawn.is_valid_move(&mv("e2", "e5", Color::White), &b));
        // no sideways, no backwards
        assert!(!pawn.is_valid_move(&mv("e2", "d2", Color::White), &b));
        assert!(!pawn.is_valid_move(&mv("e2", "e1", Color::White), &b));
        let black_pawn = Piece::new(Color::Black, PieceKind::Pawn);
        assert!(black_pawn.is_valid_move(&mv("e7", "e5", Color::Black), &b));
        assert!(!black_pawn.is_valid_move(&mv("e7", "e8", Color::Black), &b));
    }

    #[test]
    fn test_pawn_double_step_needs_clear_intermediate() {
        // knight on e3 blocks both e2-e3 and e2-e4
        let b = Board::from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1").unwrap();
        let pawn = white(PieceKind::Pawn);
        assert!(!pawn.is_valid_move(&mv("e2", "e3", Color::White), &b));
        assert!(!pawn.is_valid_move(&mv("e2", "e4", Color::White), &b));
    }

    #[test]
    fn test_pawn_double_step_only_from_starting_rank() {
        let b = Board::from_fen("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1").unwrap();
        let pawn = white(PieceKind::Pawn);
        assert!(pawn.is_valid_move(&mv("e3", "e4", Color::White), &b));
        assert!(!pawn.is_valid_move(&mv("e3", "e5", Color::White), &b));
    }

    #[test]
    fn test_pawn_diagonal_requires_capture() {
        let b = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let pawn = white(PieceKind::Pawn);
        assert!(pawn.is_valid_move(&mv("e4", "d5", Color::White), &b));
        // empty diagonal with no en-passant history
        assert!(!pawn.is_valid_move(&mv("e4", "f5", Color::White), &b));
        // straight moves never capture
        let blocked = Board::from_fen("4k3/8/8/4p3/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert!(!pawn.is_valid_move(&mv("e4", "e5", Color::White), &blocked));
    }

    #[test]
    fn test_en_passant_from_move_history() {
        // black just played d7-d5 past the white e5 pawn
        let b = Board::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
            .unwrap();
        let pawn = white(PieceKind::Pawn);
        assert!(pawn.is_valid_move(&mv("e5", "d6", Color::White), &b));
        // the f-file diagonal is still just an empty square
        assert!(!pawn.is_valid_move(&mv("e5", "f6", Color::White), &b));
    }

    #[test]
    fn test_en_passant_expires() {
        // same pawns, but the double step was not the most recent move
        let b = Board::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 4")
            .unwrap();
        let pawn = white(PieceKind::Pawn);
        assert!(!pawn.is_valid_move(&mv("e5", "d6", Color::White), &b));
    }

    #[test]
    fn test_promotion_needs_designator() {
        let b = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let pawn = white(PieceKind::Pawn);
        let a7 = Position::from_algebraic("a7").unwrap();
        let a8 = Position::from_algebraic("a8").unwrap();
        assert!(pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'Q'), &b));
        // either case is accepted
        assert!(pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'q'), &b));
        assert!(pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'n'), &b));
        assert!(!pawn.is_valid_move(&Move::new(a7, a8, Color::White), &b));
        // kings and pawns are not promotable
        assert!(!pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'K'), &b));
        assert!(!pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'P'), &b));
        assert!(!pawn.is_valid_move(&Move::promoting(a7, a8, Color::White, 'x'), &b));
    }

    #[test]
    fn test_promotion_expansion_in_generation() {
        let b = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let moves = white(PieceKind::Pawn).valid_moves(
            Position::from_algebraic("a7").unwrap(),
            false,
            &b,
            &AcceptAll,
        );
        // one candidate per promotable kind
        assert_eq!(moves.len(), 4);
        let mut designators: Vec<char> = moves.iter().filter_map(|m| m.promotion).collect();
        designators.sort_unstable();
        assert_eq!(designators, vec!['B', 'N', 'Q', 'R']);
    }

    #[test]
    fn test_return_if_any_matches_full_generation() {
        let b = Board::starting();
        for (piece, square) in [
            (white(PieceKind::Knight), "b1"),
            (white(PieceKind::Rook), "a1"),
            (white(PieceKind::Pawn), "e2"),
            (white(PieceKind::Queen), "d1"),
            (white(PieceKind::King), "e1"),
        ] {
            let from = Position::from_algebraic(square).unwrap();
            let all = piece.valid_moves(from, false, &b, &AcceptAll);
            let any = piece.valid_moves(from, true, &b, &AcceptAll);
            assert_eq!(all.is_empty(), any.is_empty(), "disagreement for {square}");
            if !any.is_empty() {
                assert_eq!(any.len(), 1);
            }
        }
    }

    #[test]
    fn test_generation_agrees_with_validity() {
        let b = Board::starting();
        let knight = white(PieceKind::Knight);
        let from = Position::from_algebraic("b1").unwrap();
        for m in knight.valid_moves(from, false, &b, &AcceptAll) {
            assert!(knight.is_valid_move(&m, &b));
        }
    }

    #[test]
    fn test_rotation_symmetry_for_shape_only_pieces() {
        // rotating the board 180° must not change the verdict for pieces
        // whose rules are purely shape and path
        let b = Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        let rotate = |p: Position| Position::new(9 - p.file, 9 - p.rank);
        let squares = ["a1", "d4", "e6", "h8", "b7", "g2"];
        for kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            let piece = white(kind);
            for from in squares {
                for to in squares {
                    let from = Position::from_algebraic(from).unwrap();
                    let to = Position::from_algebraic(to).unwrap();
                    let straight = Move::new(from, to, Color::White);
                    let rotated = Move::new(rotate(from), rotate(to), Color::White);
                    assert_eq!(
                        piece.is_valid_move(&straight, &b),
                        piece.is_valid_move(&rotated, &b),
                        "{kind:?} {} vs rotated",
                        straight.to_algebraic(),
                    );
                }
            }
        }
    }

    #[test]
    fn test_files_between() {
        assert_eq!(files_between(5, 7, true), vec![6, 7]);
        assert_eq!(files_between(5, 7, false), vec![6]);
        assert_eq!(files_between(5, 3, true), vec![4, 3]);
        assert_eq!(files_between(8, 6, false), vec![7]);
        assert_eq!(files_between(1, 4, false), vec![2, 3]);
        assert!(files_between(5, 5, true).is_empty());
    }
}
