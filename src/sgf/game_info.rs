use chrono::NaiveDate;

use crate::sgf::types::{GameResult, Ruleset, SimpleText, Text, VariationMode};

/// Root-level display parameters: board dimensions and variation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RootInfo {
    pub width: u8,
    pub height: u8,
    pub variation_mode: VariationMode,
}

impl RootInfo {
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            variation_mode: VariationMode::default(),
        }
    }
}

/// Everything the record says about the game as a whole. Fields mirror the
/// game-info property tags; all are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct GameInfo {
    pub root_info: RootInfo,

    pub annotator: Option<SimpleText>,
    pub black_rank: Option<SimpleText>,
    pub black_team: Option<SimpleText>,
    pub copyright: Option<SimpleText>,
    pub date: Option<SimpleText>,
    pub event: Option<SimpleText>,
    pub game_comment: Option<Text>,
    pub game_name: Option<SimpleText>,
    pub opening: Option<SimpleText>,
    pub overtime: Option<SimpleText>,
    pub black_player: Option<SimpleText>,
    pub place: Option<SimpleText>,
    pub white_player: Option<SimpleText>,
    pub result: Option<GameResult>,
    pub round: Option<SimpleText>,
    pub ruleset: Option<Ruleset>,
    pub source: Option<SimpleText>,
    pub time_limit: Option<f64>,
    pub entered_by: Option<SimpleText>,
    pub white_rank: Option<SimpleText>,

    pub handicap: Option<i32>,
    pub komi: Option<f64>,
}

impl GameInfo {
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            root_info: RootInfo::new(width, height),
            annotator: None,
            black_rank: None,
            black_team: None,
            copyright: None,
            date: None,
            event: None,
            game_comment: None,
            game_name: None,
            opening: None,
            overtime: None,
            black_player: None,
            place: None,
            white_player: None,
            result: None,
            round: None,
            ruleset: None,
            source: None,
            time_limit: None,
            entered_by: None,
            white_rank: None,
            handicap: None,
            komi: None,
        }
    }

    /// Calendar dates from the DT value, resolving the SGF shortcut forms
    /// (`YYYY-MM-DD,DD`, `YYYY-MM-DD,MM-DD`, …). Partial entries set
    /// context for later items but produce no date of their own.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let Some(dt) = &self.date else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut year: Option<i32> = None;
        let mut month: Option<u32> = None;

        for item in dt.as_str().split(',') {
            let parts: Vec<&str> = item.trim().split('-').collect();
            match parts.as_slice() {
                [y] if y.len() == 4 => {
                    year = y.parse().ok();
                    month = None;
                }
                [d] => {
                    if let (Some(y), Some(m), Ok(d)) = (year, month, d.parse::<u32>())
                        && let Some(date) = NaiveDate::from_ymd_opt(y, m, d)
                    {
                        out.push(date);
                    }
                }
                [y, m] if y.len() == 4 => {
                    year = y.parse().ok();
                    month = m.parse().ok();
                }
                [m, d] => {
                    if let (Some(y), Ok(m), Ok(d)) = (year, m.parse::<u32>(), d.parse::<u32>()) {
                        month = Some(m);
                        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                            out.push(date);
                        }
                    }
                }
                [y, m, d] => {
                    if let (Ok(y), Ok(m), Ok(d)) =
                        (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>())
                    {
                        year = Some(y);
                        month = Some(m);
                        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                            out.push(date);
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_date(dt: &str) -> GameInfo {
        let mut info = GameInfo::new(19, 19);
        info.date = Some(SimpleText::new(dt));
        info
    }

    #[test]
    fn full_date() {
        let dates = info_with_date("2024-03-05").dates();
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()]);
    }

    #[test]
    fn shortcut_day_continuation() {
        let dates = info_with_date("2024-03-05,06").dates();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            ]
        );
    }

    #[test]
    fn shortcut_month_day_continuation() {
        let dates = info_with_date("2024-12-30,2025-01-02").dates();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn partial_dates_yield_nothing() {
        assert!(info_with_date("2024").dates().is_empty());
        assert!(info_with_date("2024-03").dates().is_empty());
        assert!(info_with_date("unknown").dates().is_empty());
    }
}
