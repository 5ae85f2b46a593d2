//! Provides fully-specified [Chess Position] implementation: stores
//! information about the board and tracks the state of castling, 50-move rule
//! draw, etc.
//!
//! The core of the move generator and the make-move state transition is also
//! implemented here as the only way of mutating a [`Position`].
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;
use std::num::NonZeroU16;

use anyhow::{bail, Context};
use itertools::Itertools;

use crate::chess::attacks;
use crate::chess::bitboard::{Bitboard, Board};
use crate::chess::core::{
    CastleRights, File, Move, MoveList, Piece, PieceKind, Player, Rank, Square, BOARD_WIDTH,
};
use crate::chess::zobrist::{self, Key};

/// State of the chess game: board, half-move counters, castling rights and
/// en passant square. It has 1:1 relationship with [Forsyth-Edwards Notation]
/// (FEN).
///
/// [`Position::try_from()`] provides a convenient interface for creating a
/// [`Position`]: it cleans up the input and accepts both FEN and a version of
/// [Extended Position Description] (EPD) without Operations, which is how
/// some databases provide trimmed FEN lines.
///
/// A position is never mutated in place: [`Position::make_move`] returns a
/// fresh copy with the move applied, so concurrent readers of a shared
/// position need no synchronization.
///
/// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
/// [Extended Position Description]: https://www.chessprogramming.org/Extended_Position_Description
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
    castling: CastleRights,
    side_to_move: Player,
    /// [Halfmove Clock] keeps track of the number of half-moves since the
    /// last capture or pawn move and is used to enforce the fifty-move draw
    /// rule.
    ///
    /// [Halfmove Clock]: https://www.chessprogramming.org/Halfmove_Clock
    halfmove_clock: u8,
    fullmove_counter: NonZeroU16,
    en_passant_square: Option<Square>,
    key: Key,
}

impl Position {
    /// Creates the starting position of the standard chess variant.
    ///
    /// ```
    /// use tabia::chess::position::Position;
    ///
    /// let starting_position = Position::starting();
    /// assert_eq!(
    ///     &starting_position.to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        let mut position = Self {
            board: Board::starting(),
            castling: CastleRights::ALL,
            ..Self::empty()
        };
        position.key = zobrist::compute(&position);
        position
    }

    // Creates an empty board to be filled by the parser.
    fn empty() -> Self {
        Self {
            board: Board::empty(),
            castling: CastleRights::NONE,
            side_to_move: Player::White,
            halfmove_clock: 0,
            fullmove_counter: NonZeroU16::MIN,
            en_passant_square: None,
            key: 0,
        }
    }

    /// The player to move.
    #[must_use]
    pub fn us(&self) -> Player {
        self.side_to_move
    }

    /// The player waiting for their turn.
    #[must_use]
    pub fn them(&self) -> Player {
        self.us().opponent()
    }

    /// Castling abilities of both players.
    #[must_use]
    pub fn castle_rights(&self) -> CastleRights {
        self.castling
    }

    /// The en passant target square recorded after the last double pawn
    /// push, if any.
    #[must_use]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    /// The incrementally maintained Zobrist key of the position. Always
    /// agrees with [`zobrist::compute`].
    #[must_use]
    pub fn hash(&self) -> Key {
        self.key
    }

    /// The contents of a square, or `None` for an empty square. White
    /// occupancy is probed first, then each piece set in a fixed order; this
    /// is the canonical disambiguator used to fill the captured-piece field
    /// of generated moves.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        self.board.at(square)
    }

    /// Serializes the position in FEN.
    #[must_use]
    pub fn fen(&self) -> String {
        self.to_string()
    }

    /// Parses a position from Forsyth-Edwards Notation.
    ///
    /// FEN ::=
    ///       Piece Placement
    ///   ' ' Side to move
    ///   ' ' Castling ability
    ///   ' ' En passant target square
    ///   ' ' Halfmove clock
    ///   ' ' Fullmove counter
    ///
    /// The parser rejects positions that violate the board invariants: both
    /// sides need exactly one king, pawns can not stand on the backranks, a
    /// castling right requires the king and the rook on their home squares
    /// and the en passant square has to be consistent with a just-made
    /// double pawn push.
    pub fn from_fen(fen: &str) -> anyhow::Result<Self> {
        let (
            pieces_placement,
            side_to_move,
            castling_ability,
            en_passant_square,
            halfmove_clock,
            fullmove_counter,
        ) = match fen.split_ascii_whitespace().collect_tuple() {
            Some(parts) => parts,
            None => bail!(
                "incorrect FEN: expected 6 parts, got {}",
                fen.split_ascii_whitespace().count()
            ),
        };
        let mut result = Self::empty();
        let mut rank_id = BOARD_WIDTH;
        for rank_fen in pieces_placement.split('/') {
            if rank_id == 0 {
                bail!("incorrect FEN: expected 8 ranks, got {pieces_placement}");
            }
            rank_id -= 1;
            let rank = Rank::try_from(rank_id)?;
            let mut file: u8 = 0;
            for symbol in rank_fen.chars() {
                if let Some(increment) = symbol.to_digit(10) {
                    if increment == 0 {
                        bail!("incorrect FEN: empty square run can not be 0 in {rank_fen}");
                    }
                    file += increment as u8;
                    if file > BOARD_WIDTH {
                        bail!("incorrect FEN: rank {rank_fen} is longer than {BOARD_WIDTH}");
                    }
                    continue;
                }
                if file >= BOARD_WIDTH {
                    bail!("incorrect FEN: rank {rank_fen} is longer than {BOARD_WIDTH}");
                }
                let piece = Piece::try_from(symbol)?;
                let square = Square::new(File::try_from(file)?, rank);
                *result
                    .board
                    .player_pieces_mut(piece.owner)
                    .bitboard_for_mut(piece.kind) |= Bitboard::from(square);
                file += 1;
            }
            if file != BOARD_WIDTH {
                bail!(
                    "incorrect FEN: rank size should be exactly {BOARD_WIDTH}, \
                     got {rank_fen} of length {file}"
                );
            }
        }
        if rank_id != 0 {
            bail!("incorrect FEN: there should be 8 ranks, got {pieces_placement}");
        }
        result.side_to_move = side_to_move.try_into()?;
        result.castling = castling_ability.try_into()?;
        if en_passant_square != "-" {
            result.en_passant_square = Some(en_passant_square.try_into()?);
        }
        result.halfmove_clock = halfmove_clock.parse::<u8>().with_context(|| {
            format!("incorrect FEN: halfmove clock can not be parsed {halfmove_clock}")
        })?;
        result.fullmove_counter = fullmove_counter.parse::<NonZeroU16>().with_context(|| {
            format!("incorrect FEN: fullmove counter can not be parsed {fullmove_counter}")
        })?;
        result.validate()?;
        result.key = zobrist::compute(&result);
        Ok(result)
    }

    // Checks the board invariants the rest of the core relies on. Any
    // position handed out by the public constructors satisfies them.
    fn validate(&self) -> anyhow::Result<()> {
        for (player, name) in [(Player::White, "white"), (Player::Black, "black")] {
            let pieces = self.board.player_pieces(player);
            let kings = pieces.king.count_ones();
            if kings != 1 {
                bail!("expected 1 {name} king, got {kings}");
            }
            let pawns = pieces.pawns.count_ones();
            if pawns > 8 {
                bail!("expected <= 8 {name} pawns, got {pawns}");
            }
        }
        if !(self.board.white_pieces.all() & self.board.black_pieces.all()).is_empty() {
            bail!("white and black pieces can not overlap");
        }
        let pawns = self.board.white_pieces.pawns | self.board.black_pieces.pawns;
        let backranks = Bitboard::rank_mask(Rank::One) | Bitboard::rank_mask(Rank::Eight);
        if !(pawns & backranks).is_empty() {
            bail!("pawns can not be placed on backranks");
        }
        for (right, player, king_square, rook_square) in [
            (CastleRights::WHITE_SHORT, Player::White, Square::E1, Square::H1),
            (CastleRights::WHITE_LONG, Player::White, Square::E1, Square::A1),
            (CastleRights::BLACK_SHORT, Player::Black, Square::E8, Square::H8),
            (CastleRights::BLACK_LONG, Player::Black, Square::E8, Square::A8),
        ] {
            if !self.castling.contains(right) {
                continue;
            }
            let pieces = self.board.player_pieces(player);
            if !pieces.king.is_set(king_square) || !pieces.rooks.is_set(rook_square) {
                bail!(
                    "castling right '{right}' requires the king on {king_square} \
                     and a rook on {rook_square}"
                );
            }
        }
        if let Some(square) = self.en_passant_square {
            let expected_rank = match self.side_to_move {
                Player::White => Rank::Six,
                Player::Black => Rank::Three,
            };
            if square.rank() != expected_rank {
                bail!(
                    "expected en passant square to be on rank {}, got {}",
                    expected_rank as u8 + 1,
                    square.rank() as u8 + 1
                );
            }
            // The pushed pawn sits behind the en passant square, the square
            // itself and the origin in front of it are empty.
            let (pawn_square, origin_square) = match self.side_to_move {
                Player::White => (square as u8 - BOARD_WIDTH, square as u8 + BOARD_WIDTH),
                Player::Black => (square as u8 + BOARD_WIDTH, square as u8 - BOARD_WIDTH),
            };
            let pawn_square = Square::from_index_unchecked(pawn_square);
            let origin_square = Square::from_index_unchecked(origin_square);
            if !self
                .board
                .player_pieces(self.them())
                .pawns
                .is_set(pawn_square)
            {
                bail!("en passant square is not beyond pushed pawn");
            }
            if self.at(square).is_some() || self.at(origin_square).is_some() {
                bail!("en passant square and the square behind it must be empty");
            }
        }
        Ok(())
    }

    /// Returns true if `square` is attacked by any piece of `attacker`.
    #[must_use]
    pub fn attacked_by(&self, square: Square, attacker: Player) -> bool {
        let pieces = self.board.player_pieces(attacker);
        if !(attacks::knight_attacks(square) & pieces.knights).is_empty() {
            return true;
        }
        if !(attacks::king_attacks(square) & pieces.king).is_empty() {
            return true;
        }
        // A pawn attacks this square iff a defender-colored pawn standing
        // here would attack the pawn's square: the direction is inverted
        // relative to the attacker.
        if !(attacks::pawn_attacks(attacker.opponent(), square) & pieces.pawns).is_empty() {
            return true;
        }
        let occupancy = self.board.white_pieces.all() | self.board.black_pieces.all();
        if !(attacks::bishop_attacks(square, occupancy) & (pieces.bishops | pieces.queens))
            .is_empty()
        {
            return true;
        }
        !(attacks::rook_attacks(square, occupancy) & (pieces.rooks | pieces.queens)).is_empty()
    }

    /// Returns true if the king of `player` is attacked by the opponent.
    #[must_use]
    pub fn is_in_check(&self, player: Player) -> bool {
        self.attacked_by(
            self.board.player_pieces(player).king_square(),
            player.opponent(),
        )
    }

    /// Returns true if the side to move is in check.
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.is_in_check(self.us())
    }

    /// Returns true if the side to move has at least one legal move.
    /// Together with [`Position::in_check`] this distinguishes checkmate
    /// from stalemate.
    #[must_use]
    pub fn has_moves(&self) -> bool {
        self.pseudo_legal_moves(false)
            .iter()
            .any(|m| !self.make_move(*m).is_in_check(self.us()))
    }

    /// Produces a list of legal moves: the pseudo-legal moves that do not
    /// leave our king in check.
    ///
    /// This is a performance and correctness-critical path: every
    /// modification should be benchmarked and carefully tested.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        let mut legal = MoveList::new();
        for m in self.pseudo_legal_moves(false) {
            if !self.make_move(m).is_in_check(self.us()) {
                legal.push(m);
            }
        }
        legal
    }

    /// Produces the pseudo-legal tactical moves: captures (including en
    /// passant) and capturing promotions. Used by quiescence-style callers
    /// that resolve captures only.
    #[must_use]
    pub fn generate_tactical_moves(&self) -> MoveList {
        self.pseudo_legal_moves(true)
    }

    // Pseudo-legal move generation in a stable order: king moves (castling
    // last among them), knight moves, pawn moves, then slider moves. A move
    // may leave our own king in check; the caller filters.
    fn pseudo_legal_moves(&self, tactical_only: bool) -> MoveList {
        let mut moves = MoveList::new();
        let us = self.us();
        let our = self.board.player_pieces(us);
        let their = self.board.player_pieces(self.them());
        let our_occupancy = our.all();
        let their_occupancy = their.all();
        let occupancy = our_occupancy | their_occupancy;
        let targets = if tactical_only {
            their_occupancy
        } else {
            !our_occupancy
        };

        let king = Piece {
            owner: us,
            kind: PieceKind::King,
        };
        let king_square = our.king_square();
        for to in (attacks::king_attacks(king_square) & targets).iter() {
            moves.push(Move::new(king_square, to, king, self.at(to), None));
        }
        if !tactical_only {
            self.castle_moves(&mut moves, king_square, occupancy);
        }

        let knight = Piece {
            owner: us,
            kind: PieceKind::Knight,
        };
        for from in our.knights.iter() {
            for to in (attacks::knight_attacks(from) & targets).iter() {
                moves.push(Move::new(from, to, knight, self.at(to), None));
            }
        }

        let pawn = Piece {
            owner: us,
            kind: PieceKind::Pawn,
        };
        // The en passant square counts as a capture target even though it is
        // empty.
        let mut capture_targets = their_occupancy;
        if let Some(square) = self.en_passant_square {
            capture_targets |= Bitboard::from(square);
        }
        for from in our.pawns.iter() {
            let mut pawn_targets = Bitboard::empty();
            if !tactical_only {
                pawn_targets = attacks::pawn_pushes(us, from) & !occupancy;
                // The double push requires the transit square to be empty.
                if !pawn_targets.is_empty() {
                    pawn_targets |= attacks::pawn_double_pushes(us, from) & !occupancy;
                }
            }
            pawn_targets |= attacks::pawn_attacks(us, from) & capture_targets;
            for to in pawn_targets.iter() {
                let captured = self.at(to);
                if to.rank() == Rank::One || to.rank() == Rank::Eight {
                    for kind in [
                        PieceKind::Queen,
                        PieceKind::Rook,
                        PieceKind::Bishop,
                        PieceKind::Knight,
                    ] {
                        moves.push(Move::new(
                            from,
                            to,
                            pawn,
                            captured,
                            Some(Piece { owner: us, kind }),
                        ));
                    }
                } else {
                    moves.push(Move::new(from, to, pawn, captured, None));
                }
            }
        }

        for from in (our.queens | our.rooks | our.bishops).iter() {
            let kind = if our.queens.is_set(from) {
                PieceKind::Queen
            } else if our.rooks.is_set(from) {
                PieceKind::Rook
            } else {
                PieceKind::Bishop
            };
            let piece = Piece { owner: us, kind };
            let slider_targets = match kind {
                PieceKind::Queen => attacks::queen_attacks(from, occupancy),
                PieceKind::Rook => attacks::rook_attacks(from, occupancy),
                _ => attacks::bishop_attacks(from, occupancy),
            } & targets;
            for to in slider_targets.iter() {
                moves.push(Move::new(from, to, piece, self.at(to), None));
            }
        }
        moves
    }

    // Castling is gated on the right being present, the path being empty and
    // neither the king square nor the transit square being attacked. The
    // destination square is deliberately not probed here: castling into
    // check is caught by the post-move legality filter like any other king
    // move.
    fn castle_moves(&self, moves: &mut MoveList, king_square: Square, occupancy: Bitboard) {
        let us = self.us();
        let them = self.them();
        let short = CastleRights::short(us);
        let long = CastleRights::long(us);
        if !self.castling.contains(short) && !self.castling.contains(long) {
            return;
        }
        if self.attacked_by(king_square, them) {
            return;
        }
        let king = Piece {
            owner: us,
            kind: PieceKind::King,
        };
        let (short_path, long_path, short_transit, short_target, long_transit, long_target) =
            match us {
                Player::White => (
                    attacks::WHITE_SHORT_CASTLE_PATH,
                    attacks::WHITE_LONG_CASTLE_PATH,
                    Square::F1,
                    Square::G1,
                    Square::D1,
                    Square::C1,
                ),
                Player::Black => (
                    attacks::BLACK_SHORT_CASTLE_PATH,
                    attacks::BLACK_LONG_CASTLE_PATH,
                    Square::F8,
                    Square::G8,
                    Square::D8,
                    Square::C8,
                ),
            };
        if self.castling.contains(short)
            && (occupancy & short_path).is_empty()
            && !self.attacked_by(short_transit, them)
        {
            moves.push(Move::new(king_square, short_target, king, None, None));
        }
        if self.castling.contains(long)
            && (occupancy & long_path).is_empty()
            && !self.attacked_by(long_transit, them)
        {
            moves.push(Move::new(king_square, long_target, king, None, None));
        }
    }

    // Removes the right if it is still present and updates the key.
    fn clear_castle_right(&mut self, right: CastleRights) {
        if self.castling.contains(right) {
            self.castling.remove(right);
            self.key ^= zobrist::castle_right_key(right);
        }
    }

    // Home squares of the (kingside, queenside) rooks: moving a rook off its
    // home square or capturing it there invalidates the corresponding right.
    fn rook_home_squares(player: Player) -> (Square, Square) {
        match player {
            Player::White => (Square::H1, Square::A1),
            Player::Black => (Square::H8, Square::A8),
        }
    }

    /// Applies the move and returns the resulting position; `self` is left
    /// untouched. The Zobrist key is maintained incrementally, so the result
    /// always agrees with a from-scratch [`zobrist::compute`].
    ///
    /// The move is trusted to come from the move generator (or
    /// [`Position::parse_move`] on this very position): no validation is
    /// performed, and a handcrafted illegal move yields an undefined but
    /// memory-safe position.
    #[must_use]
    pub fn make_move(&self, m: Move) -> Self {
        let mut next = *self;
        let us = self.us();
        let them = self.them();
        let piece = m.piece();
        let from = m.from();
        let to = m.to();
        let move_bits = Bitboard::from(from) | Bitboard::from(to);
        debug_assert_eq!(piece.owner, us, "move {m} is not ours to make");

        // The recorded en passant possibility expires after any move; a
        // double pawn push below may introduce a new one.
        if let Some(square) = next.en_passant_square.take() {
            next.key ^= zobrist::en_passant_key(square.file());
        }

        let mut reset_halfmove_clock = false;
        match piece.kind {
            PieceKind::Queen | PieceKind::Bishop | PieceKind::Knight => {
                *next
                    .board
                    .player_pieces_mut(us)
                    .bitboard_for_mut(piece.kind) ^= move_bits;
                next.key ^=
                    zobrist::piece_square_key(piece, from) ^ zobrist::piece_square_key(piece, to);
            },
            PieceKind::Rook => {
                next.board.player_pieces_mut(us).rooks ^= move_bits;
                next.key ^=
                    zobrist::piece_square_key(piece, from) ^ zobrist::piece_square_key(piece, to);
                let (short_rook, long_rook) = Self::rook_home_squares(us);
                if from == short_rook {
                    next.clear_castle_right(CastleRights::short(us));
                } else if from == long_rook {
                    next.clear_castle_right(CastleRights::long(us));
                }
            },
            PieceKind::King => {
                next.board.player_pieces_mut(us).king ^= move_bits;
                next.key ^=
                    zobrist::piece_square_key(piece, from) ^ zobrist::piece_square_key(piece, to);
                next.clear_castle_right(CastleRights::short(us));
                next.clear_castle_right(CastleRights::long(us));
                // A two-file king move is castling: the rook jumps over.
                if (from.file() as i8 - to.file() as i8).abs() == 2 {
                    let rook = Piece {
                        owner: us,
                        kind: PieceKind::Rook,
                    };
                    let (rook_from, rook_to) = match (us, to.file()) {
                        (Player::White, File::G) => (Square::H1, Square::F1),
                        (Player::White, _) => (Square::A1, Square::D1),
                        (Player::Black, File::G) => (Square::H8, Square::F8),
                        (Player::Black, _) => (Square::A8, Square::D8),
                    };
                    next.board.player_pieces_mut(us).rooks ^=
                        Bitboard::from(rook_from) | Bitboard::from(rook_to);
                    next.key ^= zobrist::piece_square_key(rook, rook_from)
                        ^ zobrist::piece_square_key(rook, rook_to);
                }
            },
            PieceKind::Pawn => {
                reset_halfmove_clock = true;
                match m.promotion() {
                    None => {
                        next.board.player_pieces_mut(us).pawns ^= move_bits;
                        next.key ^= zobrist::piece_square_key(piece, from)
                            ^ zobrist::piece_square_key(piece, to);
                    },
                    Some(promotion) => {
                        debug_assert_eq!(promotion.owner, us);
                        next.board.player_pieces_mut(us).pawns ^= Bitboard::from(from);
                        *next
                            .board
                            .player_pieces_mut(us)
                            .bitboard_for_mut(promotion.kind) ^= Bitboard::from(to);
                        next.key ^= zobrist::piece_square_key(piece, from)
                            ^ zobrist::piece_square_key(promotion, to);
                    },
                }
                if self.en_passant_square == Some(to) {
                    // The en passant victim is not on the to-square.
                    let victim_square = Square::from_index_unchecked(match us {
                        Player::White => to as u8 - BOARD_WIDTH,
                        Player::Black => to as u8 + BOARD_WIDTH,
                    });
                    let victim = Piece {
                        owner: them,
                        kind: PieceKind::Pawn,
                    };
                    next.board.player_pieces_mut(them).pawns ^= Bitboard::from(victim_square);
                    next.key ^= zobrist::piece_square_key(victim, victim_square);
                }
                if (from.rank() as i8 - to.rank() as i8).abs() == 2 {
                    let square = Square::from_index_unchecked((from as u8 + to as u8) / 2);
                    next.en_passant_square = Some(square);
                    next.key ^= zobrist::en_passant_key(square.file());
                }
            },
        }

        if let Some(captured) = m.captured() {
            debug_assert_eq!(captured.owner, them, "move {m} captures own piece");
            reset_halfmove_clock = true;
            *next
                .board
                .player_pieces_mut(them)
                .bitboard_for_mut(captured.kind) ^= Bitboard::from(to);
            next.key ^= zobrist::piece_square_key(captured, to);
            // Capturing a rook on its home square takes the opponent's
            // castling right with it.
            if captured.kind == PieceKind::Rook {
                let (short_rook, long_rook) = Self::rook_home_squares(them);
                if to == short_rook {
                    next.clear_castle_right(CastleRights::short(them));
                } else if to == long_rook {
                    next.clear_castle_right(CastleRights::long(them));
                }
            }
        }

        next.halfmove_clock = if reset_halfmove_clock {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if us == Player::Black {
            next.fullmove_counter = next.fullmove_counter.saturating_add(1);
        }
        next.side_to_move = them;
        next.key ^= zobrist::black_to_move_key();
        next
    }

    /// Flips the side to move without moving anything, expiring the en
    /// passant possibility. The clocks are left untouched. Callers
    /// implementing null-move style heuristics must not use this while in
    /// check or twice in a row.
    #[must_use]
    pub fn make_null_move(&self) -> Self {
        let mut next = *self;
        if let Some(square) = next.en_passant_square.take() {
            next.key ^= zobrist::en_passant_key(square.file());
        }
        next.side_to_move = self.them();
        next.key ^= zobrist::black_to_move_key();
        next
    }

    /// Parses a move string (`<from><to>[promotion]`, e.g. `e2e4` or
    /// `b7b8q`) in the context of this position, filling the moving and
    /// captured piece fields by probing the board. The promotion letter is
    /// accepted in either case.
    pub fn parse_move(&self, input: &str) -> anyhow::Result<Move> {
        if !(4..=5).contains(&input.bytes().len()) {
            bail!("move string should be 4 or 5 chars, got '{input}'");
        }
        let from: Square = input
            .get(0..2)
            .context("move string is not ASCII")?
            .try_into()?;
        let to: Square = input
            .get(2..4)
            .context("move string is not ASCII")?
            .try_into()?;
        let piece = match self.at(from) {
            Some(piece) => piece,
            None => bail!("no piece on {from} to move"),
        };
        let promotion = match input.chars().nth(4) {
            Some(symbol) => {
                let kind = match symbol.to_ascii_lowercase() {
                    'q' => PieceKind::Queen,
                    'r' => PieceKind::Rook,
                    'b' => PieceKind::Bishop,
                    'n' => PieceKind::Knight,
                    _ => bail!("unknown promotion piece: expected within \"qrbn\", got '{symbol}'"),
                };
                Some(Piece {
                    owner: piece.owner,
                    kind,
                })
            },
            None => None,
        };
        Ok(Move::new(from, to, piece, self.at(to), promotion))
    }

    /// Normalizes a serialized position into a full 6-part FEN: trims
    /// whitespace, strips an optional `fen`/`epd` tag, collapses repeated
    /// separators and patches an EPD body with the default clocks. This is
    /// the cleanup [`Position::try_from`] runs before parsing; tests use it
    /// to compare produced FEN against arbitrary input.
    pub fn sanitize_fen(input: &str) -> anyhow::Result<String> {
        let input = input.trim();
        let input = input
            .strip_prefix("fen ")
            .or_else(|| input.strip_prefix("epd "))
            .unwrap_or(input);
        let parts: Vec<&str> = input.split_ascii_whitespace().collect();
        match parts.len() {
            6 => Ok(parts.join(" ")),
            4 => Ok(parts.join(" ") + " 0 1"),
            count => bail!(
                "incorrect board representation: expected either FEN (6 parts) or EPD body \
                 (4 parts), got: {count}"
            ),
        }
    }

    /// Renders the move in [Standard Algebraic Notation]: piece letter with
    /// file/rank disambiguation, `x` for captures, `=Q` for promotions,
    /// `O-O`/`O-O-O` for castling and a `+`/`#` suffix when the move gives
    /// check or mates.
    ///
    /// [Standard Algebraic Notation]: https://en.wikipedia.org/wiki/Algebraic_notation_(chess)
    #[must_use]
    pub fn san(&self, m: Move) -> String {
        let piece = m.piece();
        let from = m.from();
        let to = m.to();
        let is_castle =
            piece.kind == PieceKind::King && (from.file() as i8 - to.file() as i8).abs() == 2;
        let mut notation = if is_castle {
            if to.file() == File::G {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            }
        } else {
            let mut notation = String::new();
            if piece.kind != PieceKind::Pawn {
                notation.push(piece.algebraic_symbol().to_ascii_uppercase());
                notation += &self.san_disambiguation(m);
            }
            let is_capture = m.captured().is_some()
                || (piece.kind == PieceKind::Pawn && self.en_passant_square == Some(to));
            if is_capture {
                if piece.kind == PieceKind::Pawn {
                    notation += &from.file().to_string();
                }
                notation.push('x');
            }
            notation += &to.to_string();
            if let Some(promotion) = m.promotion() {
                notation.push('=');
                notation.push(promotion.algebraic_symbol().to_ascii_uppercase());
            }
            notation
        };
        let next = self.make_move(m);
        if next.in_check() {
            notation.push(if next.has_moves() { '+' } else { '#' });
        }
        notation
    }

    // The file (or rank, or both) of the origin square when several pieces
    // of the same kind could land on the same target square.
    fn san_disambiguation(&self, m: Move) -> String {
        let piece = m.piece();
        let from = m.from();
        let to = m.to();
        let occupancy = self.board.white_pieces.all() | self.board.black_pieces.all();
        let candidates = match piece.kind {
            PieceKind::Knight => attacks::knight_attacks(to),
            PieceKind::Bishop => attacks::bishop_attacks(to, occupancy),
            PieceKind::Rook => attacks::rook_attacks(to, occupancy),
            PieceKind::Queen => attacks::queen_attacks(to, occupancy),
            PieceKind::King | PieceKind::Pawn => return String::new(),
        } & self
            .board
            .player_pieces(piece.owner)
            .bitboard_for(piece.kind);
        let others = candidates - Bitboard::from(from);
        if others.is_empty() {
            return String::new();
        }
        if (others & Bitboard::file_mask(from.file())).is_empty() {
            from.file().to_string()
        } else if (others & Bitboard::rank_mask(from.rank())).is_empty() {
            from.rank().to_string()
        } else {
            from.file().to_string() + &from.rank().to_string()
        }
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    /// Runs [`Position::sanitize_fen`] on the input and parses the result:
    /// accepts a full FEN or an EPD body with the clocks defaulted to "0 1".
    fn try_from(input: &str) -> Result<Self, Self::Error> {
        Self::from_fen(&Self::sanitize_fen(input)?)
    }
}

impl fmt::Display for Position {
    /// Prints the position in Forsyth-Edwards Notation.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} ", self.board, self.side_to_move, self.castling)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{square}")?,
            None => write!(f, "-")?,
        };
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_counter)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:?}", self.board)?;
        writeln!(f, "Player to move: {:?}", self.side_to_move)?;
        writeln!(f, "Fullmove counter: {}", self.fullmove_counter)?;
        writeln!(f, "En passant: {:?}", self.en_passant_square)?;
        writeln!(f, "Castling rights: {}", self.castling)?;
        writeln!(f, "FEN: {self}")?;
        Ok(())
    }
}

/// [Perft] (*per*formance *t*esting) is the canonical correctness harness
/// for move generation and make-move: it counts the leaves of the legal move
/// tree at a fixed depth.
///
/// [Perft]: https://www.chessprogramming.org/Perft
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in position.pseudo_legal_moves(false) {
        let next = position.make_move(m);
        if next.is_in_check(position.us()) {
            continue;
        }
        nodes += if depth == 1 {
            1
        } else {
            perft(&next, depth - 1)
        };
    }
    nodes
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{perft, Position};

    fn check_correct_fen(fen: &str) {
        let position = Position::from_fen(fen);
        assert!(position.is_ok(), "input: {fen}");
        let position = position.unwrap();
        assert_eq!(position.to_string(), fen, "input: {fen}");
    }

    #[test]
    fn correct_fen() {
        check_correct_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        check_correct_fen("2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34");
        check_correct_fen("rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7");
        check_correct_fen(
            "r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7",
        );
        check_correct_fen("r3k3/5p2/2p5/p7/P3r3/2N2n2/1PP2P2/2K2B2 w q - 0 24");
    }

    #[test]
    fn correct_epd() {
        let epd = "rnbqkb1r/pp2pppp/3p1n2/8/3NP3/2N5/PPP2PPP/R1BQKB1R b KQkq -";
        assert!(Position::from_fen(epd).is_err());
        assert!(Position::try_from(epd).is_ok());
    }

    #[test]
    fn starting_position_basics() {
        let position = Position::starting();
        assert_eq!(
            position.fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert!(!position.in_check());
        assert_eq!(position.generate_moves().len(), 20);
        assert_eq!(perft(&position, 2), 400);
    }

    #[test]
    fn tactical_moves_only() {
        // One ordinary capture, one en passant capture and no quiet moves.
        let position = Position::try_from("4k3/7r/8/3pP1N1/8/8/8/4K3 w - d6 0 1").unwrap();
        let tactical: Vec<_> = position
            .generate_tactical_moves()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(tactical, vec!["g5h7".to_string(), "e5d6".to_string()]);
    }

    #[test]
    fn key_changes_with_state() {
        let position = Position::starting();
        let e4 = position.make_move(position.parse_move("e2e4").unwrap());
        assert_ne!(position.hash(), e4.hash());
        // Different en passant files hash differently even with the same
        // placement mirror-image.
        let d4 = position.make_move(position.parse_move("d2d4").unwrap());
        assert_ne!(e4.hash(), d4.hash());
    }
}
