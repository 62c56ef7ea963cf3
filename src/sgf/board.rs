use std::collections::HashSet;

use thiserror::Error;
use tracing::trace;

use crate::sgf::{
    game_info::GameInfo,
    node::GameNode,
    property::Property,
    types::{Color, Coord, Line, Mark, Move, SimpleText},
};

pub const DEFAULT_SIZE: u8 = 19;

/// Why a move attempt was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("point is outside the board")]
    OutOfBounds,
    #[error("point is occupied by a {0} stone")]
    Overwrite(Color),
    #[error("move would leave its own group without liberties")]
    Suicide,
}

#[derive(Debug, Copy, Clone)]
pub struct MoveParams {
    pub allow_suicide: bool,
    pub allow_overwrite: bool,
}

impl MoveParams {
    /// Rule enforcement for caller-initiated moves.
    pub fn standard() -> Self {
        Self {
            allow_suicide: false,
            allow_overwrite: false,
        }
    }

    /// Replay of recorded games: accept whatever the record says.
    pub fn permissive() -> Self {
        Self {
            allow_suicide: true,
            allow_overwrite: true,
        }
    }
}

/// Everything known about a single intersection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CoordState {
    pub star: bool,
    pub stone: Option<Color>,
    pub mark: Option<Mark>,
    pub visible: bool,
    pub dimmed: bool,
}

impl CoordState {
    fn empty(star: bool) -> Self {
        Self {
            star,
            stone: None,
            mark: None,
            visible: true,
            dimmed: false,
        }
    }
}

/// The derived position at one node of the game tree: the grid plus
/// per-node markup, the move counter, whose turn it is, capture tallies,
/// and the accumulated game info.
///
/// `grid[y][x]`, 0-indexed from the top-left corner, matching the SGF
/// convention that `a` on each axis maps to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    grid: Vec<Vec<CoordState>>,
    pub arrows: Vec<(Coord, Coord)>,
    pub lines: Vec<Line>,
    pub labels: Vec<(Coord, SimpleText)>,
    pub move_number: u32,
    pub player_turn: Color,
    /// Stones captured by black.
    pub captures_black: u32,
    /// Stones captured by white.
    pub captures_white: u32,
    pub game_info: GameInfo,
    has_invisible: bool,
    has_dimmed: bool,
    has_marks: bool,
}

/// Star points for a board. 13x13 keeps the traditional five-point
/// pattern; the general rule below would also mark its edge midpoints.
fn star_coords(width: u8, height: u8) -> Vec<(u8, u8)> {
    if width == 13 && height == 13 {
        return vec![(3, 3), (9, 3), (3, 9), (9, 9), (6, 6)];
    }

    let edge = |n: u8| -> u8 { if n >= 13 { 3 } else { 2 } };
    let (ex, ey) = (edge(width), edge(height));

    let mut points = Vec::new();
    if width > 2 * ex && height > 2 * ey {
        for x in [ex, width - 1 - ex] {
            for y in [ey, height - 1 - ey] {
                points.push((x, y));
            }
        }
        if width >= 13 && height >= 13 && width % 2 == 1 && height % 2 == 1 {
            points.push((width / 2, ey));
            points.push((width / 2, height - 1 - ey));
            points.push((ex, height / 2));
            points.push((width - 1 - ex, height / 2));
        }
    }
    if width % 2 == 1 && height % 2 == 1 && width >= 9 && height >= 9 {
        points.push((width / 2, height / 2));
    }
    points
}

impl BoardState {
    pub fn empty(width: u8, height: u8) -> Self {
        let mut grid =
            vec![vec![CoordState::empty(false); width as usize]; height as usize];
        for (x, y) in star_coords(width, height) {
            grid[y as usize][x as usize].star = true;
        }
        Self {
            grid,
            arrows: Vec::new(),
            lines: Vec::new(),
            labels: Vec::new(),
            move_number: 0,
            player_turn: Color::Black,
            captures_black: 0,
            captures_white: 0,
            game_info: GameInfo::new(width, height),
            has_invisible: false,
            has_dimmed: false,
            has_marks: false,
        }
    }

    pub fn width(&self) -> u8 {
        self.grid.first().map(|row| row.len() as u8).unwrap_or(0)
    }

    pub fn height(&self) -> u8 {
        self.grid.len() as u8
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x() < self.width() && coord.y() < self.height()
    }

    /// The state of one intersection. The coordinate must be in bounds.
    pub fn at(&self, coord: Coord) -> &CoordState {
        &self.grid[coord.y() as usize][coord.x() as usize]
    }

    pub fn stone(&self, coord: Coord) -> Option<Color> {
        self.at(coord).stone
    }

    fn cell_mut(&mut self, coord: Coord) -> &mut CoordState {
        &mut self.grid[coord.y() as usize][coord.x() as usize]
    }

    /// Dirty flags: when false, no intersection has the matching state, so
    /// full-grid passes can be skipped.
    pub fn has_invisible(&self) -> bool {
        self.has_invisible
    }

    pub fn has_dimmed(&self) -> bool {
        self.has_dimmed
    }

    pub fn has_marks(&self) -> bool {
        self.has_marks
    }

    /// Orthogonal in-bounds neighbors.
    pub fn neighbors(&self, coord: Coord) -> Vec<Coord> {
        let (x, y) = (coord.x(), coord.y());
        let mut out = Vec::with_capacity(4);
        if y > 0 {
            out.push(Coord::from_xy(x, y - 1));
        }
        if y < self.height() - 1 {
            out.push(Coord::from_xy(x, y + 1));
        }
        if x > 0 {
            out.push(Coord::from_xy(x - 1, y));
        }
        if x < self.width() - 1 {
            out.push(Coord::from_xy(x + 1, y));
        }
        out
    }

    /// The connected group containing `seed`: flood fill over orthogonal
    /// neighbors holding the same stone value.
    pub fn group(&self, seed: Coord) -> Vec<Coord> {
        let target = self.stone(seed);
        let mut seen: HashSet<Coord> = HashSet::new();
        let mut stack = vec![seed];
        let mut group = Vec::new();
        while let Some(coord) = stack.pop() {
            if !seen.insert(coord) {
                continue;
            }
            if self.stone(coord) != target {
                continue;
            }
            group.push(coord);
            stack.extend(self.neighbors(coord));
        }
        group
    }

    /// Distinct empty points adjacent to any stone of the group.
    pub fn liberties(&self, group: &[Coord]) -> usize {
        let mut libs: HashSet<Coord> = HashSet::new();
        for &coord in group {
            for n in self.neighbors(coord) {
                if self.stone(n).is_none() {
                    libs.insert(n);
                }
            }
        }
        libs.len()
    }

    /// Attempt a move and return the resulting board. The receiver is never
    /// modified; on error nothing has happened.
    pub fn apply_move(
        &self,
        color: Color,
        at: Coord,
        params: MoveParams,
    ) -> Result<BoardState, MoveError> {
        if !self.in_bounds(at) {
            return Err(MoveError::OutOfBounds);
        }
        if let Some(existing) = self.stone(at)
            && !params.allow_overwrite
        {
            return Err(MoveError::Overwrite(existing));
        }

        let mut next = self.clone();
        next.cell_mut(at).stone = Some(color);

        let mut captured = 0u32;
        for n in next.neighbors(at) {
            if next.stone(n) != Some(color.other()) {
                continue;
            }
            let group = next.group(n);
            if next.liberties(&group) == 0 {
                captured += group.len() as u32;
                for coord in group {
                    next.cell_mut(coord).stone = None;
                }
            }
        }

        let own = next.group(at);
        if next.liberties(&own) == 0 {
            // a captured neighbor group would have freed a liberty next to
            // the played stone
            debug_assert_eq!(captured, 0, "capture and suicide cannot coincide");
            if !params.allow_suicide {
                return Err(MoveError::Suicide);
            }
            let own_size = own.len() as u32;
            for coord in own {
                next.cell_mut(coord).stone = None;
            }
            match color {
                Color::Black => next.captures_white += own_size,
                Color::White => next.captures_black += own_size,
            }
        }

        if captured > 0 {
            trace!(color = %color, at = %at, captured, "stones captured");
            match color {
                Color::Black => next.captures_black += captured,
                Color::White => next.captures_white += captured,
            }
        }
        Ok(next)
    }

    /// Would the move be legal under standard rules (no suicide, no
    /// overwrite)?
    pub fn is_valid_move(&self, color: Color, at: Coord) -> bool {
        self.apply_move(color, at, MoveParams::standard()).is_ok()
    }

    /// Apply a recorded B/W property. Records may contain positions our
    /// rules would reject; viewing them must not fail, so an illegal move
    /// leaves the stones untouched while the move counter and turn still
    /// advance.
    fn play_record(&mut self, color: Color, mv: Move) {
        let target = match mv {
            Move::Pass => None,
            Move::Play(at) => {
                // FF[3] wrote passes as [tt] on boards up to 19x19
                if at.x() == 19 && at.y() == 19 && self.width() <= 19 && self.height() <= 19 {
                    None
                } else {
                    Some(at)
                }
            }
        };
        if let Some(at) = target
            && let Ok(next) = self.apply_move(color, at, MoveParams::permissive())
        {
            *self = next;
        }
        self.move_number += 1;
        self.player_turn = color.other();
    }

    fn set_stones(&mut self, coords: &[Coord], stone: Option<Color>) {
        for &coord in coords {
            if self.in_bounds(coord) {
                self.cell_mut(coord).stone = stone;
            }
        }
    }

    fn set_marks(&mut self, coords: &[Coord], mark: Mark) {
        for &coord in coords {
            if self.in_bounds(coord) {
                self.cell_mut(coord).mark = Some(mark);
                self.has_marks = true;
            }
        }
    }

    /// Fold one property into the position.
    pub fn apply_property(&mut self, property: &Property) {
        match property {
            Property::B(mv) => self.play_record(Color::Black, *mv),
            Property::W(mv) => self.play_record(Color::White, *mv),
            Property::AB(list) => self.set_stones(&list.expand(), Some(Color::Black)),
            Property::AW(list) => self.set_stones(&list.expand(), Some(Color::White)),
            Property::AE(list) => self.set_stones(&list.expand(), None),
            Property::PL(color) => self.player_turn = *color,
            Property::MN(n) => self.move_number = (*n).max(0) as u32,

            Property::CR(list) => self.set_marks(&list.expand(), Mark::Circle),
            Property::MA(list) => self.set_marks(&list.expand(), Mark::X),
            Property::SL(list) => self.set_marks(&list.expand(), Mark::Selected),
            Property::SQ(list) => self.set_marks(&list.expand(), Mark::Square),
            Property::TR(list) => self.set_marks(&list.expand(), Mark::Triangle),

            Property::AR(pairs) => self.arrows.extend_from_slice(pairs),
            Property::LN(lines) => self.lines.extend_from_slice(lines),
            Property::LB(labels) => self.labels.extend(labels.iter().cloned()),

            Property::DD(list) => {
                // inherited: the most recent DD replaces any earlier dimming
                if self.has_dimmed {
                    for row in &mut self.grid {
                        for cell in row {
                            cell.dimmed = false;
                        }
                    }
                    self.has_dimmed = false;
                }
                for coord in list.expand() {
                    if self.in_bounds(coord) {
                        self.cell_mut(coord).dimmed = true;
                        self.has_dimmed = true;
                    }
                }
            }
            Property::VW(list) => {
                if list.is_empty() {
                    if self.has_invisible {
                        for row in &mut self.grid {
                            for cell in row {
                                cell.visible = true;
                            }
                        }
                        self.has_invisible = false;
                    }
                } else {
                    for row in &mut self.grid {
                        for cell in row {
                            cell.visible = false;
                        }
                    }
                    for coord in list.expand() {
                        if self.in_bounds(coord) {
                            self.cell_mut(coord).visible = true;
                        }
                    }
                    self.has_invisible = true;
                }
            }

            Property::ST(mode) => self.game_info.root_info.variation_mode = *mode,

            Property::AN(t) => self.game_info.annotator = Some(t.clone()),
            Property::BR(t) => self.game_info.black_rank = Some(t.clone()),
            Property::BT(t) => self.game_info.black_team = Some(t.clone()),
            Property::CP(t) => self.game_info.copyright = Some(t.clone()),
            Property::DT(t) => self.game_info.date = Some(t.clone()),
            Property::EV(t) => self.game_info.event = Some(t.clone()),
            Property::GC(t) => self.game_info.game_comment = Some(t.clone()),
            Property::GN(t) => self.game_info.game_name = Some(t.clone()),
            Property::ON(t) => self.game_info.opening = Some(t.clone()),
            Property::OT(t) => self.game_info.overtime = Some(t.clone()),
            Property::PB(t) => self.game_info.black_player = Some(t.clone()),
            Property::PC(t) => self.game_info.place = Some(t.clone()),
            Property::PW(t) => self.game_info.white_player = Some(t.clone()),
            Property::RE(r) => self.game_info.result = Some(r.clone()),
            Property::RO(t) => self.game_info.round = Some(t.clone()),
            Property::RU(r) => self.game_info.ruleset = Some(r.clone()),
            Property::SO(t) => self.game_info.source = Some(t.clone()),
            Property::TM(v) => self.game_info.time_limit = Some(*v),
            Property::US(t) => self.game_info.entered_by = Some(t.clone()),
            Property::WR(t) => self.game_info.white_rank = Some(t.clone()),
            Property::HA(n) => self.game_info.handicap = Some(*n),
            Property::KM(v) => self.game_info.komi = Some(*v),

            // annotations, timing, territory, ko markers, and structural
            // root tags do not touch the position; SZ is fixed at
            // construction
            Property::KO
            | Property::C(_)
            | Property::DM(_)
            | Property::GB(_)
            | Property::GW(_)
            | Property::HO(_)
            | Property::N(_)
            | Property::UC(_)
            | Property::V(_)
            | Property::BM(_)
            | Property::DO
            | Property::IT
            | Property::TE(_)
            | Property::AP(_, _)
            | Property::CA(_)
            | Property::FF(_)
            | Property::GM(_)
            | Property::SZ(_, _)
            | Property::BL(_)
            | Property::OB(_)
            | Property::OW(_)
            | Property::WL(_)
            | Property::TB(_)
            | Property::TW(_)
            | Property::Unknown(_, _) => {}
        }
    }

    /// The board for a child node: marks, arrows, lines, and labels are
    /// per-node and reset; visibility and dimming are inherited.
    pub fn child_board(&self, child: &GameNode) -> BoardState {
        let mut board = self.clone();
        if board.has_marks {
            for row in &mut board.grid {
                for cell in row {
                    cell.mark = None;
                }
            }
            board.has_marks = false;
        }
        board.arrows.clear();
        board.lines.clear();
        board.labels.clear();
        for property in &child.properties {
            board.apply_property(property);
        }
        board
    }
}

/// Build the board for a game's root node: read SZ (19x19 when absent),
/// mark the star points, then fold all root properties.
pub fn root_board_state(root: &GameNode) -> BoardState {
    let (width, height) = match root.find_property("SZ") {
        Some(Property::SZ(w, h)) => (*w, *h),
        _ => (DEFAULT_SIZE, DEFAULT_SIZE),
    };
    let mut board = BoardState::empty(width, height);
    for property in &root.properties {
        board.apply_property(property);
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::parser::parse_sgf;

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    /// Walk the main line from the root, returning the board at the end.
    fn board_at_mainline_end(sgf: &str) -> BoardState {
        let collection = parse_sgf(sgf).unwrap();
        let mut node = &collection.games[0];
        let mut board = root_board_state(node);
        while let Some(child) = node.children.first() {
            board = board.child_board(child);
            node = child;
        }
        board
    }

    #[test]
    fn root_defaults() {
        let collection = parse_sgf("(;FF[4]GM[1]SZ[9])").unwrap();
        let board = root_board_state(&collection.games[0]);
        assert_eq!(board.width(), 9);
        assert_eq!(board.height(), 9);
        assert_eq!(board.move_number, 0);
        assert_eq!(board.player_turn, Color::Black);
    }

    #[test]
    fn missing_size_defaults_to_19() {
        let collection = parse_sgf("(;FF[4])").unwrap();
        let board = root_board_state(&collection.games[0]);
        assert_eq!((board.width(), board.height()), (19, 19));
    }

    #[test]
    fn star_points_standard_boards() {
        let b19 = BoardState::empty(19, 19);
        for c in ["dd", "pd", "dp", "pp", "jj", "jd", "dj", "pj", "jp"] {
            assert!(b19.at(coord(c)).star, "19x19 missing star at {}", c);
        }
        let b13 = BoardState::empty(13, 13);
        assert!(b13.at(coord("dd")).star);
        assert!(b13.at(coord("gg")).star);
        assert!(!b13.at(coord("gd")).star, "13x13 has no side stars");
        let b9 = BoardState::empty(9, 9);
        assert!(b9.at(coord("cc")).star);
        assert!(b9.at(coord("ee")).star);
    }

    #[test]
    fn pass_and_play() {
        let board = board_at_mainline_end("(;SZ[19];B[];W[dd])");
        assert_eq!(board.move_number, 2);
        assert_eq!(board.stone(coord("dd")), Some(Color::White));
        assert_eq!(board.player_turn, Color::Black);
        assert_eq!(board.captures_black, 0);
        assert_eq!(board.captures_white, 0);
    }

    #[test]
    fn corner_capture() {
        // aa starts with liberties {ab, ba}; B takes both.
        let board = board_at_mainline_end("(;SZ[9];B[ba];W[aa];B[ab])");
        assert_eq!(board.stone(coord("aa")), None);
        assert_eq!(board.captures_black, 1);
        assert_eq!(board.captures_white, 0);
        assert_eq!(board.move_number, 3);
    }

    #[test]
    fn capture_count_matches_stones_removed() {
        // two-stone white group in the corner
        let board =
            board_at_mainline_end("(;SZ[9]AW[aa][ba]AB[ca][ab];B[bb])");
        assert_eq!(board.stone(coord("aa")), None);
        assert_eq!(board.stone(coord("ba")), None);
        assert_eq!(board.captures_black, 2);
    }

    #[test]
    fn suicide_rejected_but_replayed() {
        let collection = parse_sgf("(;SZ[9]AB[ba][ab])").unwrap();
        let board = root_board_state(&collection.games[0]);
        // standard rules refuse the move
        assert!(!board.is_valid_move(Color::White, coord("aa")));
        assert_eq!(
            board.apply_move(Color::White, coord("aa"), MoveParams::standard()),
            Err(MoveError::Suicide)
        );
        // replaying the same move from a record silently removes the group
        let replayed = board_at_mainline_end("(;SZ[9]AB[ba][ab];W[aa])");
        assert_eq!(replayed.stone(coord("aa")), None);
        assert_eq!(replayed.captures_black, 1);
        assert_eq!(replayed.move_number, 1);
    }

    #[test]
    fn overwrite_rejected() {
        let collection = parse_sgf("(;SZ[9]AB[cc])").unwrap();
        let board = root_board_state(&collection.games[0]);
        assert_eq!(
            board.apply_move(Color::White, coord("cc"), MoveParams::standard()),
            Err(MoveError::Overwrite(Color::Black))
        );
        assert!(!board.is_valid_move(Color::White, coord("cc")));
    }

    #[test]
    fn valid_move_implies_apply_succeeds() {
        let board = BoardState::empty(9, 9);
        assert!(board.is_valid_move(Color::Black, coord("ee")));
        let next = board
            .apply_move(Color::Black, coord("ee"), MoveParams::standard())
            .unwrap();
        assert_eq!(next.stone(coord("ee")), Some(Color::Black));
        // the attempt left the original untouched
        assert_eq!(board.stone(coord("ee")), None);
    }

    #[test]
    fn tt_is_pass_on_small_boards() {
        let small = board_at_mainline_end("(;SZ[9];B[tt])");
        assert_eq!(small.move_number, 1);
        assert_eq!(small.player_turn, Color::White);
        assert!(small.grid.iter().flatten().all(|c| c.stone.is_none()));
        // on a big board tt is a regular point (FF[4])
        let big = board_at_mainline_end("(;SZ[21];B[tt])");
        assert_eq!(big.stone(coord("tt")), Some(Color::Black));
    }

    #[test]
    fn setup_then_clear_restores_empty() {
        let board = board_at_mainline_end("(;SZ[9]AB[cc];AE[cc])");
        assert_eq!(board.stone(coord("cc")), None);
        assert_eq!(board.move_number, 0);
    }

    #[test]
    fn illegal_recorded_move_keeps_position_but_advances() {
        // B plays onto its own stone; permissive overwrite succeeds, so
        // force the pathological case with an out-of-bounds coordinate
        let board = board_at_mainline_end("(;SZ[9];B[zz])");
        assert_eq!(board.move_number, 1);
        assert_eq!(board.player_turn, Color::White);
    }

    #[test]
    fn player_turn_override() {
        let collection = parse_sgf("(;SZ[9]AB[cc]PL[W])").unwrap();
        let board = root_board_state(&collection.games[0]);
        assert_eq!(board.player_turn, Color::White);
    }

    #[test]
    fn move_number_override() {
        let board = board_at_mainline_end("(;SZ[9];B[aa]MN[10])");
        assert_eq!(board.move_number, 10);
    }

    #[test]
    fn marks_reset_between_nodes() {
        let collection = parse_sgf("(;SZ[9]TR[cc]AR[aa:cc]LB[dd:x];C[next])").unwrap();
        let root_board = root_board_state(&collection.games[0]);
        assert_eq!(root_board.at(coord("cc")).mark, Some(Mark::Triangle));
        assert!(root_board.has_marks());
        assert_eq!(root_board.arrows.len(), 1);
        assert_eq!(root_board.labels.len(), 1);

        let child = root_board.child_board(&collection.games[0].children[0]);
        assert_eq!(child.at(coord("cc")).mark, None);
        assert!(!child.has_marks());
        assert!(child.arrows.is_empty());
        assert!(child.labels.is_empty());
    }

    #[test]
    fn mark_overwrites_previous_mark() {
        let collection = parse_sgf("(;SZ[9]TR[cc]SQ[cc])").unwrap();
        let board = root_board_state(&collection.games[0]);
        assert_eq!(board.at(coord("cc")).mark, Some(Mark::Square));
    }

    #[test]
    fn dimming_inherits_until_replaced() {
        let collection = parse_sgf("(;SZ[9]DD[aa];C[kept];DD[bb];DD[])").unwrap();
        let root = &collection.games[0];
        let b0 = root_board_state(root);
        assert!(b0.at(coord("aa")).dimmed);

        let n1 = &root.children[0];
        let b1 = b0.child_board(n1);
        assert!(b1.at(coord("aa")).dimmed, "dimming is inherited");

        let n2 = &n1.children[0];
        let b2 = b1.child_board(n2);
        assert!(!b2.at(coord("aa")).dimmed, "new DD replaces the old set");
        assert!(b2.at(coord("bb")).dimmed);

        let b3 = b2.child_board(&n2.children[0]);
        assert!(!b3.has_dimmed());
        assert!(!b3.at(coord("bb")).dimmed);
    }

    #[test]
    fn visibility_toggles() {
        let collection = parse_sgf("(;SZ[9]VW[aa:bb];VW[])").unwrap();
        let root = &collection.games[0];
        let b0 = root_board_state(root);
        assert!(b0.has_invisible());
        assert!(b0.at(coord("aa")).visible);
        assert!(!b0.at(coord("cc")).visible);

        let b1 = b0.child_board(&root.children[0]);
        assert!(!b1.has_invisible());
        assert!(b1.at(coord("cc")).visible);
    }

    #[test]
    fn game_info_collected() {
        let collection =
            parse_sgf("(;SZ[19]PB[Shusaku]PW[Gennan]KM[0]RE[B+2]HA[2]RU[Japanese])").unwrap();
        let board = root_board_state(&collection.games[0]);
        let info = &board.game_info;
        assert_eq!(info.black_player.as_ref().unwrap().as_str(), "Shusaku");
        assert_eq!(info.white_player.as_ref().unwrap().as_str(), "Gennan");
        assert_eq!(info.komi, Some(0.0));
        assert_eq!(info.handicap, Some(2));
        assert_eq!(info.ruleset, Some(crate::sgf::types::Ruleset::Japanese));
    }
}
