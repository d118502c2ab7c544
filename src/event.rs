use std::fmt;

use crate::geometry::GoalSide;

pub const PERIOD_SECONDS: u32 = 20 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ShotOnGoal,
    MissedShot,
    BlockedShot,
    Goal,
    Faceoff,
    Hit,
    Giveaway,
    Takeaway,
    Penalty,
    DelayedPenalty,
    Stoppage,
    PeriodStart,
    PeriodEnd,
    GameEnd,
    Other(String),
}

impl EventKind {
    pub fn from_type_key(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase();
        match key.as_str() {
            "shot-on-goal" => EventKind::ShotOnGoal,
            "missed-shot" => EventKind::MissedShot,
            "blocked-shot" => EventKind::BlockedShot,
            "goal" => EventKind::Goal,
            "faceoff" => EventKind::Faceoff,
            "hit" => EventKind::Hit,
            "giveaway" => EventKind::Giveaway,
            "takeaway" => EventKind::Takeaway,
            "penalty" => EventKind::Penalty,
            "delayed-penalty" => EventKind::DelayedPenalty,
            "stoppage" => EventKind::Stoppage,
            "period-start" => EventKind::PeriodStart,
            "period-end" => EventKind::PeriodEnd,
            "game-end" => EventKind::GameEnd,
            _ => EventKind::Other(key),
        }
    }

    pub fn type_key(&self) -> &str {
        match self {
            EventKind::ShotOnGoal => "shot-on-goal",
            EventKind::MissedShot => "missed-shot",
            EventKind::BlockedShot => "blocked-shot",
            EventKind::Goal => "goal",
            EventKind::Faceoff => "faceoff",
            EventKind::Hit => "hit",
            EventKind::Giveaway => "giveaway",
            EventKind::Takeaway => "takeaway",
            EventKind::Penalty => "penalty",
            EventKind::DelayedPenalty => "delayed-penalty",
            EventKind::Stoppage => "stoppage",
            EventKind::PeriodStart => "period-start",
            EventKind::PeriodEnd => "period-end",
            EventKind::GameEnd => "game-end",
            EventKind::Other(raw) => raw.as_str(),
        }
    }

    /// Any tag mentioning "shot", including blocked and unknown shot variants.
    pub fn is_shot_class(&self) -> bool {
        self.type_key().to_ascii_lowercase().contains("shot")
    }

    pub fn is_blocked_shot(&self) -> bool {
        matches!(self, EventKind::BlockedShot)
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, EventKind::Goal)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: Option<u64>,
    pub kind: EventKind,
    pub period: u32,
    pub elapsed_seconds: u32,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub owner: Option<TeamId>,
    pub team_name: Option<String>,
    pub situation: Option<String>,
    pub home_defending_side: Option<GoalSide>,
    pub shot_type: Option<String>,
    pub shooter_id: Option<u64>,
    pub shooter_name: Option<String>,
    pub goalie_in_net: Option<u64>,
    pub goalie_name: Option<String>,
    pub zone_code: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, period: u32, elapsed_seconds: u32) -> Self {
        Self {
            event_id: None,
            kind,
            period,
            elapsed_seconds,
            x: None,
            y: None,
            owner: None,
            team_name: None,
            situation: None,
            home_defending_side: None,
            shot_type: None,
            shooter_id: None,
            shooter_name: None,
            goalie_in_net: None,
            goalie_name: None,
            zone_code: None,
        }
    }

    pub fn with_coords(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_owner(mut self, team: TeamId) -> Self {
        self.owner = Some(team);
        self
    }

    pub fn with_situation(mut self, code: &str) -> Self {
        self.situation = Some(code.to_string());
        self
    }

    pub fn with_goalie(mut self, goalie_id: u64) -> Self {
        self.goalie_in_net = Some(goalie_id);
        self
    }

    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    pub fn game_seconds(&self) -> u32 {
        self.period
            .saturating_sub(1)
            .saturating_mul(PERIOD_SECONDS)
            .saturating_add(self.elapsed_seconds)
    }
}

pub fn parse_clock(raw: &str) -> Option<u32> {
    let (minutes, seconds) = raw.trim().split_once(':')?;
    let minutes = minutes.trim().parse::<u32>().ok()?;
    let seconds = seconds.trim().parse::<u32>().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}
