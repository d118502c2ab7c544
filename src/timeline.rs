use std::ops::Range;

use crate::event::{Event, TeamId};

/// Which side of the target's clock reading counts as "before".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanBound {
    /// `elapsed <= t`: events sharing the target's second are candidates.
    #[default]
    Inclusive,
    /// `elapsed < t`: only strictly earlier seconds are candidates.
    Exclusive,
}

impl ScanBound {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inclusive" | "le" | "<=" => Some(ScanBound::Inclusive),
            "exclusive" | "lt" | "<" => Some(ScanBound::Exclusive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScanBound::Inclusive => "inclusive",
            ScanBound::Exclusive => "exclusive",
        }
    }

    fn admits(self, elapsed: u32, t: u32) -> bool {
        match self {
            ScanBound::Inclusive => elapsed <= t,
            ScanBound::Exclusive => elapsed < t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Preseason,
    Regular,
    Playoffs,
    AllStar,
    Unknown,
}

impl GameType {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "1" | "01" | "PR" | "PRESEASON" => GameType::Preseason,
            "2" | "02" | "R" | "REGULAR" => GameType::Regular,
            "3" | "03" | "P" | "PLAYOFFS" => GameType::Playoffs,
            "4" | "04" | "A" | "ALL-STAR" | "ALLSTAR" | "ASG" => GameType::AllStar,
            _ => GameType::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameType::Preseason => "preseason",
            GameType::Regular => "regular",
            GameType::Playoffs => "playoffs",
            GameType::AllStar => "all-star",
            GameType::Unknown => "unknown",
        }
    }
}

// Sorted by (period, elapsed_seconds); same-second plays keep feed order.
#[derive(Debug, Clone)]
pub struct GameTimeline {
    game_id: u64,
    season: Option<u32>,
    game_type: GameType,
    home: TeamId,
    away: TeamId,
    events: Vec<Event>,
}

impl GameTimeline {
    pub fn new(game_id: u64, home: TeamId, away: TeamId, mut events: Vec<Event>) -> Self {
        // Stable: same-second events keep their feed order.
        events.sort_by_key(|e| (e.period, e.elapsed_seconds));
        Self {
            game_id,
            season: None,
            game_type: GameType::Unknown,
            home,
            away,
            events,
        }
    }

    pub fn with_season(mut self, season: Option<u32>, game_type: GameType) -> Self {
        self.season = season;
        self.game_type = game_type;
        self
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn season(&self) -> Option<u32> {
        self.season
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn home(&self) -> TeamId {
        self.home
    }

    pub fn away(&self) -> TeamId {
        self.away
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_up_to(&self, period: u32, elapsed: u32, bound: ScanBound) -> &[Event] {
        &self.events[self.range_up_to(period, elapsed, bound)]
    }

    pub fn range_up_to(&self, period: u32, elapsed: u32, bound: ScanBound) -> Range<usize> {
        let period_range = self.period_range(period);
        let slice = &self.events[period_range.clone()];
        let cut = slice.partition_point(|e| bound.admits(e.elapsed_seconds, elapsed));
        period_range.start..period_range.start + cut
    }

    fn period_range(&self, period: u32) -> Range<usize> {
        let start = self.events.partition_point(|e| e.period < period);
        let end = self.events.partition_point(|e| e.period <= period);
        start..end
    }
}
