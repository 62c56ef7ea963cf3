use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use anyhow::{Context, Result, bail, ensure};

/// Largest board dimension addressable in SGF: letters a-z then A-Z.
pub const MAX_COORD: u8 = 52;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn other(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "B" => Ok(Color::Black),
            "W" => Ok(Color::White),
            _ => bail!("color must be B or W, got {:?}", s),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => write!(f, "B"),
            Color::White => write!(f, "W"),
        }
    }
}

/// Encodes board coordinates as two letters, a-z for 0-25 and A-Z for 26-51.
/// Stored as two 6-bit values packed into a u16:
/// bits [5:0] = x (first letter, column)
/// bits [11:6] = y (second letter, row)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Coord(u16);

impl Coord {
    pub fn new(x: u8, y: u8) -> Result<Self> {
        ensure!(
            x < MAX_COORD && y < MAX_COORD,
            "coordinate ({}, {}) outside the SGF 52x52 limit",
            x,
            y
        );
        Ok(Self(x as u16 | ((y as u16) << 6)))
    }

    pub fn from_chars(a: char, b: char) -> Result<Self> {
        let encode = |c: char| -> Option<u16> {
            match c {
                'a'..='z' => Some(c as u16 - 'a' as u16),
                'A'..='Z' => Some(c as u16 - 'A' as u16 + 26),
                _ => None,
            }
        };

        let a = encode(a).context(format!("invalid coordinate: first char {:?}", a))?;
        let b = encode(b).context(format!("invalid coordinate: second char {:?}", b))?;

        Ok(Self(a | (b << 6)))
    }

    /// Internal constructor for coordinates already known to be in range.
    pub(crate) fn from_xy(x: u8, y: u8) -> Self {
        debug_assert!(x < MAX_COORD && y < MAX_COORD);
        Self(x as u16 | ((y as u16) << 6))
    }

    pub fn x(self) -> u8 {
        (self.0 & 0x3f) as u8
    }

    pub fn y(self) -> u8 {
        ((self.0 >> 6) & 0x3f) as u8
    }

    fn letter(v: u8) -> char {
        if v < 26 {
            (b'a' + v) as char
        } else {
            (b'A' + v - 26) as char
        }
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::letter(self.x()), Self::letter(self.y()))
    }
}

impl FromStr for Coord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let a = chars
            .next()
            .context(format!("invalid coordinate {:?}: too short", s))?;
        let b = chars
            .next()
            .context(format!("invalid coordinate {:?}: too short", s))?;

        ensure!(
            chars.next().is_none(),
            format!("invalid coordinate {:?}: too long", s)
        );

        Self::from_chars(a, b)
    }
}

/// A move value: an empty payload is a pass, anything else a stone placement.
/// `tt` is parsed as a regular coordinate; the board engine reinterprets it
/// as a pass on boards up to 19x19 (FF[3] compatibility).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Pass,
    Play(Coord),
}

impl FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            Ok(Move::Pass)
        } else {
            Ok(Move::Play(s.parse()?))
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Pass => Ok(()),
            Move::Play(coord) => write!(f, "{}", coord),
        }
    }
}

/// One item of a point list: either a single coordinate or a compressed
/// rectangle. Rectangle corners are normalized to (min, max) per axis when
/// parsed, so `cc:aa` and `aa:cc` compare equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordSpan {
    Single(Coord),
    Rect(Coord, Coord),
}

impl CoordSpan {
    pub fn expand(self) -> Vec<Coord> {
        match self {
            CoordSpan::Single(coord) => vec![coord],
            CoordSpan::Rect(a, b) => {
                let mut coords = Vec::new();
                for y in a.y()..=b.y() {
                    for x in a.x()..=b.x() {
                        // both axes already < MAX_COORD
                        if let Ok(c) = Coord::new(x, y) {
                            coords.push(c);
                        }
                    }
                }
                coords
            }
        }
    }
}

impl FromStr for CoordSpan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            None => Ok(CoordSpan::Single(s.parse()?)),
            Some((a, b)) => {
                let a: Coord = a.parse()?;
                let b: Coord = b.parse()?;
                let lo = Coord::new(a.x().min(b.x()), a.y().min(b.y()))?;
                let hi = Coord::new(a.x().max(b.x()), a.y().max(b.y()))?;
                Ok(CoordSpan::Rect(lo, hi))
            }
        }
    }
}

impl Display for CoordSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordSpan::Single(coord) => write!(f, "{}", coord),
            CoordSpan::Rect(a, b) => write!(f, "{}:{}", a, b),
        }
    }
}

/// An ordered list of point-list items. An empty list renders as `[]` and is
/// only legal for elist-typed properties (AE, DD, VW, TB, TW).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoordList {
    spans: Vec<CoordSpan>,
}

impl CoordList {
    pub fn new(spans: Vec<CoordSpan>) -> Self {
        Self { spans }
    }

    pub fn empty() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn from_coords(coords: impl IntoIterator<Item = Coord>) -> Self {
        Self {
            spans: coords.into_iter().map(CoordSpan::Single).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[CoordSpan] {
        &self.spans
    }

    /// All covered coordinates in row-major order per item, duplicates
    /// dropped, first occurrence kept.
    pub fn expand(&self) -> Vec<Coord> {
        let mut seen = std::collections::HashSet::new();
        let mut coords = Vec::new();
        for span in &self.spans {
            for coord in span.expand() {
                if seen.insert(coord) {
                    coords.push(coord);
                }
            }
        }
        coords
    }
}

/// Decode the raw text between brackets: resolve backslash escapes, drop
/// line continuations, and normalize whitespace. `keep_newlines` selects
/// Text semantics over SimpleText.
fn decode_text(raw: &str, keep_newlines: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                // a backslash before a newline removes both
                Some('\n') => {
                    if chars.peek() == Some(&'\r') {
                        chars.next();
                    }
                }
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                Some(esc) => out.push(esc),
                None => {}
            },
            '\n' | '\r' => {
                let pair = if c == '\n' { '\r' } else { '\n' };
                if chars.peek() == Some(&pair) {
                    chars.next();
                }
                out.push(if keep_newlines { '\n' } else { ' ' });
            }
            '\t' | '\x0b' | '\x0c' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

fn encode_text(s: &str, escape_colon: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ']' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ':' if escape_colon => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// SGF SimpleText: no newlines, all whitespace is a single space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SimpleText(String);

impl SimpleText {
    /// Build from already-decoded text, normalizing any whitespace to spaces
    /// so the value stays in the SimpleText domain.
    pub fn new(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Self(
            s.chars()
                .map(|c| if c.is_whitespace() { ' ' } else { c })
                .collect(),
        )
    }

    /// Decode the raw text between brackets.
    pub fn from_raw(raw: &str) -> Self {
        Self(decode_text(raw, false))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Escape for rendering inside brackets.
    pub fn to_raw(&self) -> String {
        encode_text(&self.0, false)
    }

    /// Escape for rendering as half of a composed value, where `:` must be
    /// escaped as well.
    pub fn to_raw_composed(&self) -> String {
        encode_text(&self.0, true)
    }
}

impl Display for SimpleText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SGF Text: newlines are preserved, other whitespace becomes a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Text(String);

impl Text {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn from_raw(raw: &str) -> Self {
        Self(decode_text(raw, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_raw(&self) -> String {
        encode_text(&self.0, false)
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SGF double value: 1 for "normal", 2 for "emphasized".
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Double {
    One,
    Two,
}

impl FromStr for Double {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" => Ok(Double::One),
            "2" => Ok(Double::Two),
            _ => bail!("double value must be 1 or 2, got {:?}", s),
        }
    }
}

impl Display for Double {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Double::One => write!(f, "1"),
            Double::Two => write!(f, "2"),
        }
    }
}

/// Board markup kinds, one per markup property tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mark {
    Circle,
    Square,
    Triangle,
    X,
    Selected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WinReason {
    Score(f64),
    Resignation,
    Time,
    Forfeit,
    Unspecified,
}

/// A parsed RE value. Unrecognized results are preserved verbatim in
/// `Other` so they survive a round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum GameResult {
    Win(Color, WinReason),
    Draw,
    Void,
    Unknown,
    Other(String),
}

impl FromStr for GameResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "0" | "Draw" => GameResult::Draw,
            "Void" => GameResult::Void,
            "?" => GameResult::Unknown,
            _ => match s.split_once('+') {
                Some(("B", reason)) => win(Color::Black, reason, s),
                Some(("W", reason)) => win(Color::White, reason, s),
                _ => GameResult::Other(s.to_string()),
            },
        })
    }
}

fn win(color: Color, reason: &str, original: &str) -> GameResult {
    let reason = match reason {
        "" => WinReason::Unspecified,
        "R" | "Resign" => WinReason::Resignation,
        "T" | "Time" => WinReason::Time,
        "F" | "Forfeit" => WinReason::Forfeit,
        score => match score.parse::<f64>() {
            Ok(points) => WinReason::Score(points),
            Err(_) => return GameResult::Other(original.to_string()),
        },
    };
    GameResult::Win(color, reason)
}

impl Display for GameResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Draw => write!(f, "0"),
            GameResult::Void => write!(f, "Void"),
            GameResult::Unknown => write!(f, "?"),
            GameResult::Other(s) => write!(f, "{}", s),
            GameResult::Win(color, reason) => {
                write!(f, "{}+", color)?;
                match reason {
                    WinReason::Score(points) => write!(f, "{}", format_real(*points)),
                    WinReason::Resignation => write!(f, "R"),
                    WinReason::Time => write!(f, "T"),
                    WinReason::Forfeit => write!(f, "F"),
                    WinReason::Unspecified => Ok(()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ruleset {
    Aga,
    Goe,
    Japanese,
    NewZealand,
    Other(String),
}

impl FromStr for Ruleset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "AGA" => Ruleset::Aga,
            "GOE" => Ruleset::Goe,
            "Japanese" => Ruleset::Japanese,
            "NZ" => Ruleset::NewZealand,
            _ => Ruleset::Other(s.to_string()),
        })
    }
}

impl Display for Ruleset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ruleset::Aga => write!(f, "AGA"),
            Ruleset::Goe => write!(f, "GOE"),
            Ruleset::Japanese => write!(f, "Japanese"),
            Ruleset::NewZealand => write!(f, "NZ"),
            Ruleset::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VariationSource {
    /// Show variations of the successor node.
    Children,
    /// Show variations of the current node.
    Siblings,
}

/// The ST root property: which node's variations to show, and whether to
/// mark them on the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VariationMode {
    pub source: VariationSource,
    pub board_markup: bool,
}

impl VariationMode {
    pub fn from_int(n: u8) -> Result<Self> {
        ensure!(n < 4, "variation mode must be 0-3, got {}", n);
        Ok(Self {
            source: if n & 1 == 0 {
                VariationSource::Children
            } else {
                VariationSource::Siblings
            },
            board_markup: n < 2,
        })
    }

    pub fn to_int(self) -> u8 {
        let mut n = 0;
        if self.source == VariationSource::Siblings {
            n += 1;
        }
        if !self.board_markup {
            n += 2;
        }
        n
    }
}

impl Default for VariationMode {
    fn default() -> Self {
        Self {
            source: VariationSource::Children,
            board_markup: true,
        }
    }
}

/// An LN line between two points. Direction is not meaningful, so the
/// endpoints are stored in a fixed row-major order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Line(Coord, Coord);

impl Line {
    pub fn new(a: Coord, b: Coord) -> Self {
        if (b.y(), b.x()) < (a.y(), a.x()) {
            Self(b, a)
        } else {
            Self(a, b)
        }
    }

    pub fn endpoints(self) -> (Coord, Coord) {
        (self.0, self.1)
    }
}

/// Render an SGF real: integral values print without a fractional part.
pub(crate) fn format_real(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
