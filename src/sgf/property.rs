use std::fmt::{self, Display, Formatter};

use anyhow::{Result, bail, ensure};

use crate::sgf::types::{
    Color, Coord, CoordList, CoordSpan, Double, GameResult, Line, Move, Ruleset, SimpleText, Text,
    VariationMode, format_real,
};

/// Where a property belongs in the FF[4] taxonomy. Drives rendering order
/// and the game-info node test.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PropertyCategory {
    Move,
    Setup,
    NodeAnnotation,
    MoveAnnotation,
    Markup,
    Root,
    GameInfo,
    Inherited,
    Other,
}

/// One SGF property with its decoded payload. The tag set is closed;
/// anything else lands in `Unknown` with its raw bracket payloads kept
/// verbatim so it survives a round-trip untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Black move
    B(Move),
    /// White move
    W(Move),
    /// Ko: execute the move even if illegal
    KO,
    /// Set move number
    MN(i32),
    /// Add black stones
    AB(CoordList),
    /// Add white stones
    AW(CoordList),
    /// Clear points
    AE(CoordList),
    /// Player to move
    PL(Color),

    /// Comment
    C(Text),
    /// Even position
    DM(Double),
    /// Good for black
    GB(Double),
    /// Good for white
    GW(Double),
    /// Hotspot
    HO(Double),
    /// Node name
    N(SimpleText),
    /// Unclear position
    UC(Double),
    /// Node value estimate
    V(f64),

    /// Bad move
    BM(Double),
    /// Doubtful move
    DO,
    /// Interesting move
    IT,
    /// Tesuji
    TE(Double),

    /// Arrows, each from one point to another
    AR(Vec<(Coord, Coord)>),
    /// Circle marks
    CR(CoordList),
    /// Labels attached to points
    LB(Vec<(Coord, SimpleText)>),
    /// Lines between points
    LN(Vec<Line>),
    /// X marks
    MA(CoordList),
    /// Selected points
    SL(CoordList),
    /// Square marks
    SQ(CoordList),
    /// Triangle marks
    TR(CoordList),

    /// Dim points (inherited; empty resets)
    DD(CoordList),
    /// Visible points (inherited; empty resets)
    VW(CoordList),

    /// Application name and version
    AP(SimpleText, SimpleText),
    /// Charset
    CA(SimpleText),
    /// File format
    FF(i32),
    /// Game type (1 = Go)
    GM(i32),
    /// Variation display mode
    ST(VariationMode),
    /// Board size, width and height
    SZ(u8, u8),

    /// Annotator
    AN(SimpleText),
    /// Black rank
    BR(SimpleText),
    /// Black team
    BT(SimpleText),
    /// Copyright
    CP(SimpleText),
    /// Date
    DT(SimpleText),
    /// Event
    EV(SimpleText),
    /// Game comment
    GC(Text),
    /// Game name
    GN(SimpleText),
    /// Opening played
    ON(SimpleText),
    /// Overtime system
    OT(SimpleText),
    /// Black player name
    PB(SimpleText),
    /// Place
    PC(SimpleText),
    /// White player name
    PW(SimpleText),
    /// Result
    RE(GameResult),
    /// Round
    RO(SimpleText),
    /// Ruleset
    RU(Ruleset),
    /// Source
    SO(SimpleText),
    /// Time limit in seconds
    TM(f64),
    /// Entered by
    US(SimpleText),
    /// White rank
    WR(SimpleText),

    /// Black time left
    BL(f64),
    /// Black moves left in overtime
    OB(i32),
    /// White moves left in overtime
    OW(i32),
    /// White time left
    WL(f64),

    /// Handicap
    HA(i32),
    /// Komi
    KM(f64),
    /// Black territory
    TB(CoordList),
    /// White territory
    TW(CoordList),

    /// Unrecognized property; raw bracket payloads preserved for round-trip
    Unknown(String, Vec<String>),
}

fn single(ident: &str, values: &[String]) -> Result<String> {
    ensure!(
        values.len() == 1,
        "property {} takes exactly one value, got {}",
        ident,
        values.len()
    );
    Ok(values[0].clone())
}

fn none(ident: &str, values: &[String]) -> Result<()> {
    let value = single(ident, values)?;
    ensure!(value.is_empty(), "property {} takes an empty value", ident);
    Ok(())
}

fn coord_list(ident: &str, values: &[String]) -> Result<CoordList> {
    let mut spans = Vec::with_capacity(values.len());
    for value in values {
        ensure!(!value.is_empty(), "property {} forbids empty point values", ident);
        spans.push(value.parse::<CoordSpan>()?);
    }
    Ok(CoordList::new(spans))
}

/// Elist: a single empty payload means the empty list.
fn coord_elist(ident: &str, values: &[String]) -> Result<CoordList> {
    if values.len() == 1 && values[0].is_empty() {
        Ok(CoordList::empty())
    } else {
        coord_list(ident, values)
    }
}

/// Split a composed payload on its first unescaped `:`.
fn split_compose(raw: &str) -> Result<(&str, &str)> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b':' => return Ok((&raw[..i], &raw[i + 1..])),
            _ => i += 1,
        }
    }
    bail!("expected a composed value with ':' in {:?}", raw)
}

fn coord_pairs(values: &[String]) -> Result<Vec<(Coord, Coord)>> {
    values
        .iter()
        .map(|v| {
            let (a, b) = split_compose(v)?;
            Ok((a.parse()?, b.parse()?))
        })
        .collect()
}

fn parse_size(raw: &str) -> Result<(u8, u8)> {
    let (width, height) = match raw.split_once(':') {
        Some((w, h)) => (w.parse::<u8>()?, h.parse::<u8>()?),
        None => {
            let n = raw.parse::<u8>()?;
            (n, n)
        }
    };
    ensure!(
        (1..=52).contains(&width) && (1..=52).contains(&height),
        "board size {}x{} outside the SGF 1-52 range",
        width,
        height
    );
    Ok((width, height))
}

impl Property {
    /// Decode a property from its identifier and raw bracket payloads.
    /// Unknown identifiers always succeed; malformed payloads of known
    /// identifiers are an error.
    pub fn from_values(ident: &str, values: Vec<String>) -> Result<Property> {
        Ok(match ident {
            "B" => Property::B(single(ident, &values)?.parse()?),
            "W" => Property::W(single(ident, &values)?.parse()?),
            "KO" => {
                none(ident, &values)?;
                Property::KO
            }
            "MN" => Property::MN(single(ident, &values)?.parse()?),
            "AB" => Property::AB(coord_list(ident, &values)?),
            "AW" => Property::AW(coord_list(ident, &values)?),
            "AE" => Property::AE(coord_elist(ident, &values)?),
            "PL" => Property::PL(single(ident, &values)?.parse()?),

            "C" => Property::C(Text::from_raw(&single(ident, &values)?)),
            "DM" => Property::DM(single(ident, &values)?.parse()?),
            "GB" => Property::GB(single(ident, &values)?.parse()?),
            "GW" => Property::GW(single(ident, &values)?.parse()?),
            "HO" => Property::HO(single(ident, &values)?.parse()?),
            "N" => Property::N(SimpleText::from_raw(&single(ident, &values)?)),
            "UC" => Property::UC(single(ident, &values)?.parse()?),
            "V" => Property::V(single(ident, &values)?.parse()?),

            "BM" => Property::BM(single(ident, &values)?.parse()?),
            "DO" => {
                none(ident, &values)?;
                Property::DO
            }
            "IT" => {
                none(ident, &values)?;
                Property::IT
            }
            "TE" => Property::TE(single(ident, &values)?.parse()?),

            "AR" => Property::AR(coord_pairs(&values)?),
            "CR" => Property::CR(coord_list(ident, &values)?),
            "LB" => Property::LB(
                values
                    .iter()
                    .map(|v| {
                        let (coord, text) = split_compose(v)?;
                        Ok((coord.parse()?, SimpleText::from_raw(text)))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            "LN" => Property::LN(
                coord_pairs(&values)?
                    .into_iter()
                    .map(|(a, b)| Line::new(a, b))
                    .collect(),
            ),
            "MA" => Property::MA(coord_list(ident, &values)?),
            "SL" => Property::SL(coord_list(ident, &values)?),
            "SQ" => Property::SQ(coord_list(ident, &values)?),
            "TR" => Property::TR(coord_list(ident, &values)?),

            "DD" => Property::DD(coord_elist(ident, &values)?),
            "VW" => Property::VW(coord_elist(ident, &values)?),

            "AP" => {
                let value = single(ident, &values)?;
                let (name, version) = split_compose(&value)?;
                Property::AP(SimpleText::from_raw(name), SimpleText::from_raw(version))
            }
            "CA" => Property::CA(SimpleText::from_raw(&single(ident, &values)?)),
            "FF" => Property::FF(single(ident, &values)?.parse()?),
            "GM" => Property::GM(single(ident, &values)?.parse()?),
            "ST" => Property::ST(VariationMode::from_int(single(ident, &values)?.parse()?)?),
            "SZ" => {
                let (width, height) = parse_size(&single(ident, &values)?)?;
                Property::SZ(width, height)
            }

            "AN" => Property::AN(SimpleText::from_raw(&single(ident, &values)?)),
            "BR" => Property::BR(SimpleText::from_raw(&single(ident, &values)?)),
            "BT" => Property::BT(SimpleText::from_raw(&single(ident, &values)?)),
            "CP" => Property::CP(SimpleText::from_raw(&single(ident, &values)?)),
            "DT" => Property::DT(SimpleText::from_raw(&single(ident, &values)?)),
            "EV" => Property::EV(SimpleText::from_raw(&single(ident, &values)?)),
            "GC" => Property::GC(Text::from_raw(&single(ident, &values)?)),
            "GN" => Property::GN(SimpleText::from_raw(&single(ident, &values)?)),
            "ON" => Property::ON(SimpleText::from_raw(&single(ident, &values)?)),
            "OT" => Property::OT(SimpleText::from_raw(&single(ident, &values)?)),
            "PB" => Property::PB(SimpleText::from_raw(&single(ident, &values)?)),
            "PC" => Property::PC(SimpleText::from_raw(&single(ident, &values)?)),
            "PW" => Property::PW(SimpleText::from_raw(&single(ident, &values)?)),
            "RE" => Property::RE(
                SimpleText::from_raw(&single(ident, &values)?).as_str().parse()?,
            ),
            "RO" => Property::RO(SimpleText::from_raw(&single(ident, &values)?)),
            "RU" => Property::RU(
                SimpleText::from_raw(&single(ident, &values)?).as_str().parse()?,
            ),
            "SO" => Property::SO(SimpleText::from_raw(&single(ident, &values)?)),
            "TM" => Property::TM(single(ident, &values)?.parse()?),
            "US" => Property::US(SimpleText::from_raw(&single(ident, &values)?)),
            "WR" => Property::WR(SimpleText::from_raw(&single(ident, &values)?)),

            "BL" => Property::BL(single(ident, &values)?.parse()?),
            "OB" => Property::OB(single(ident, &values)?.parse()?),
            "OW" => Property::OW(single(ident, &values)?.parse()?),
            "WL" => Property::WL(single(ident, &values)?.parse()?),

            "HA" => Property::HA(single(ident, &values)?.parse()?),
            "KM" => Property::KM(single(ident, &values)?.parse()?),
            "TB" => Property::TB(coord_elist(ident, &values)?),
            "TW" => Property::TW(coord_elist(ident, &values)?),

            _ => Property::Unknown(ident.to_string(), values),
        })
    }

    pub fn ident(&self) -> &str {
        match self {
            Property::B(_) => "B",
            Property::W(_) => "W",
            Property::KO => "KO",
            Property::MN(_) => "MN",
            Property::AB(_) => "AB",
            Property::AW(_) => "AW",
            Property::AE(_) => "AE",
            Property::PL(_) => "PL",
            Property::C(_) => "C",
            Property::DM(_) => "DM",
            Property::GB(_) => "GB",
            Property::GW(_) => "GW",
            Property::HO(_) => "HO",
            Property::N(_) => "N",
            Property::UC(_) => "UC",
            Property::V(_) => "V",
            Property::BM(_) => "BM",
            Property::DO => "DO",
            Property::IT => "IT",
            Property::TE(_) => "TE",
            Property::AR(_) => "AR",
            Property::CR(_) => "CR",
            Property::LB(_) => "LB",
            Property::LN(_) => "LN",
            Property::MA(_) => "MA",
            Property::SL(_) => "SL",
            Property::SQ(_) => "SQ",
            Property::TR(_) => "TR",
            Property::DD(_) => "DD",
            Property::VW(_) => "VW",
            Property::AP(_, _) => "AP",
            Property::CA(_) => "CA",
            Property::FF(_) => "FF",
            Property::GM(_) => "GM",
            Property::ST(_) => "ST",
            Property::SZ(_, _) => "SZ",
            Property::AN(_) => "AN",
            Property::BR(_) => "BR",
            Property::BT(_) => "BT",
            Property::CP(_) => "CP",
            Property::DT(_) => "DT",
            Property::EV(_) => "EV",
            Property::GC(_) => "GC",
            Property::GN(_) => "GN",
            Property::ON(_) => "ON",
            Property::OT(_) => "OT",
            Property::PB(_) => "PB",
            Property::PC(_) => "PC",
            Property::PW(_) => "PW",
            Property::RE(_) => "RE",
            Property::RO(_) => "RO",
            Property::RU(_) => "RU",
            Property::SO(_) => "SO",
            Property::TM(_) => "TM",
            Property::US(_) => "US",
            Property::WR(_) => "WR",
            Property::BL(_) => "BL",
            Property::OB(_) => "OB",
            Property::OW(_) => "OW",
            Property::WL(_) => "WL",
            Property::HA(_) => "HA",
            Property::KM(_) => "KM",
            Property::TB(_) => "TB",
            Property::TW(_) => "TW",
            Property::Unknown(ident, _) => ident,
        }
    }

    pub fn category(&self) -> PropertyCategory {
        use PropertyCategory::*;
        match self {
            Property::B(_) | Property::W(_) | Property::KO | Property::MN(_) => Move,
            Property::AB(_) | Property::AW(_) | Property::AE(_) | Property::PL(_) => Setup,
            Property::C(_)
            | Property::DM(_)
            | Property::GB(_)
            | Property::GW(_)
            | Property::HO(_)
            | Property::N(_)
            | Property::UC(_)
            | Property::V(_) => NodeAnnotation,
            Property::BM(_) | Property::DO | Property::IT | Property::TE(_) => MoveAnnotation,
            Property::AR(_)
            | Property::CR(_)
            | Property::LB(_)
            | Property::LN(_)
            | Property::MA(_)
            | Property::SL(_)
            | Property::SQ(_)
            | Property::TR(_) => Markup,
            Property::DD(_) | Property::VW(_) => Inherited,
            Property::AP(_, _)
            | Property::CA(_)
            | Property::FF(_)
            | Property::GM(_)
            | Property::ST(_)
            | Property::SZ(_, _) => Root,
            Property::AN(_)
            | Property::BR(_)
            | Property::BT(_)
            | Property::CP(_)
            | Property::DT(_)
            | Property::EV(_)
            | Property::GC(_)
            | Property::GN(_)
            | Property::ON(_)
            | Property::OT(_)
            | Property::PB(_)
            | Property::PC(_)
            | Property::PW(_)
            | Property::RE(_)
            | Property::RO(_)
            | Property::RU(_)
            | Property::SO(_)
            | Property::TM(_)
            | Property::US(_)
            | Property::WR(_)
            | Property::HA(_)
            | Property::KM(_) => GameInfo,
            Property::BL(_)
            | Property::OB(_)
            | Property::OW(_)
            | Property::WL(_)
            | Property::TB(_)
            | Property::TW(_)
            | Property::Unknown(_, _) => Other,
        }
    }

    /// Inherited properties stay in effect down the tree until overridden.
    pub fn inherited(&self) -> bool {
        matches!(self, Property::DD(_) | Property::VW(_))
    }
}

fn write_coord_list(f: &mut Formatter<'_>, ident: &str, list: &CoordList) -> fmt::Result {
    write!(f, "{}", ident)?;
    if list.is_empty() {
        return write!(f, "[]");
    }
    for span in list.spans() {
        write!(f, "[{}]", span)?;
    }
    Ok(())
}

fn write_simple_text(f: &mut Formatter<'_>, ident: &str, text: &SimpleText) -> fmt::Result {
    write!(f, "{}[{}]", ident, text.to_raw())
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Property::B(mv) => write!(f, "B[{}]", mv),
            Property::W(mv) => write!(f, "W[{}]", mv),
            Property::KO => write!(f, "KO[]"),
            Property::MN(n) => write!(f, "MN[{}]", n),
            Property::AB(list) => write_coord_list(f, "AB", list),
            Property::AW(list) => write_coord_list(f, "AW", list),
            Property::AE(list) => write_coord_list(f, "AE", list),
            Property::PL(color) => write!(f, "PL[{}]", color),

            Property::C(text) => write!(f, "C[{}]", text.to_raw()),
            Property::DM(d) => write!(f, "DM[{}]", d),
            Property::GB(d) => write!(f, "GB[{}]", d),
            Property::GW(d) => write!(f, "GW[{}]", d),
            Property::HO(d) => write!(f, "HO[{}]", d),
            Property::N(text) => write_simple_text(f, "N", text),
            Property::UC(d) => write!(f, "UC[{}]", d),
            Property::V(v) => write!(f, "V[{}]", format_real(*v)),

            Property::BM(d) => write!(f, "BM[{}]", d),
            Property::DO => write!(f, "DO[]"),
            Property::IT => write!(f, "IT[]"),
            Property::TE(d) => write!(f, "TE[{}]", d),

            Property::AR(pairs) => {
                write!(f, "AR")?;
                for (a, b) in pairs {
                    write!(f, "[{}:{}]", a, b)?;
                }
                Ok(())
            }
            Property::CR(list) => write_coord_list(f, "CR", list),
            Property::LB(labels) => {
                write!(f, "LB")?;
                for (coord, text) in labels {
                    write!(f, "[{}:{}]", coord, text.to_raw_composed())?;
                }
                Ok(())
            }
            Property::LN(lines) => {
                write!(f, "LN")?;
                for line in lines {
                    let (a, b) = line.endpoints();
                    write!(f, "[{}:{}]", a, b)?;
                }
                Ok(())
            }
            Property::MA(list) => write_coord_list(f, "MA", list),
            Property::SL(list) => write_coord_list(f, "SL", list),
            Property::SQ(list) => write_coord_list(f, "SQ", list),
            Property::TR(list) => write_coord_list(f, "TR", list),

            Property::DD(list) => write_coord_list(f, "DD", list),
            Property::VW(list) => write_coord_list(f, "VW", list),

            Property::AP(name, version) => {
                write!(f, "AP[{}:{}]", name.to_raw_composed(), version.to_raw_composed())
            }
            Property::CA(text) => write_simple_text(f, "CA", text),
            Property::FF(n) => write!(f, "FF[{}]", n),
            Property::GM(n) => write!(f, "GM[{}]", n),
            Property::ST(mode) => write!(f, "ST[{}]", mode.to_int()),
            Property::SZ(width, height) => {
                if width == height {
                    write!(f, "SZ[{}]", width)
                } else {
                    write!(f, "SZ[{}:{}]", width, height)
                }
            }

            Property::AN(text) => write_simple_text(f, "AN", text),
            Property::BR(text) => write_simple_text(f, "BR", text),
            Property::BT(text) => write_simple_text(f, "BT", text),
            Property::CP(text) => write_simple_text(f, "CP", text),
            Property::DT(text) => write_simple_text(f, "DT", text),
            Property::EV(text) => write_simple_text(f, "EV", text),
            Property::GC(text) => write!(f, "GC[{}]", text.to_raw()),
            Property::GN(text) => write_simple_text(f, "GN", text),
            Property::ON(text) => write_simple_text(f, "ON", text),
            Property::OT(text) => write_simple_text(f, "OT", text),
            Property::PB(text) => write_simple_text(f, "PB", text),
            Property::PC(text) => write_simple_text(f, "PC", text),
            Property::PW(text) => write_simple_text(f, "PW", text),
            Property::RE(result) => {
                write!(f, "RE[{}]", SimpleText::new(result.to_string()).to_raw())
            }
            Property::RO(text) => write_simple_text(f, "RO", text),
            Property::RU(ruleset) => {
                write!(f, "RU[{}]", SimpleText::new(ruleset.to_string()).to_raw())
            }
            Property::SO(text) => write_simple_text(f, "SO", text),
            Property::TM(v) => write!(f, "TM[{}]", format_real(*v)),
            Property::US(text) => write_simple_text(f, "US", text),
            Property::WR(text) => write_simple_text(f, "WR", text),

            Property::BL(v) => write!(f, "BL[{}]", format_real(*v)),
            Property::OB(n) => write!(f, "OB[{}]", n),
            Property::OW(n) => write!(f, "OW[{}]", n),
            Property::WL(v) => write!(f, "WL[{}]", format_real(*v)),

            Property::HA(n) => write!(f, "HA[{}]", n),
            Property::KM(v) => write!(f, "KM[{}]", format_real(*v)),
            Property::TB(list) => write_coord_list(f, "TB", list),
            Property::TW(list) => write_coord_list(f, "TW", list),

            Property::Unknown(ident, values) => {
                write!(f, "{}", ident)?;
                for value in values {
                    write!(f, "[{}]", value)?;
                }
                Ok(())
            }
        }
    }
}
