use crate::event::{Event, TeamId};

pub const FULL_STRENGTH_SKATERS: u8 = 5;

/// Decoded `situationCode`: `[away goalie, away skaters, home skaters, home goalie]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SituationCode {
    pub away_goalie: u8,
    pub away_skaters: u8,
    pub home_skaters: u8,
    pub home_goalie: u8,
}

impl SituationCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: Vec<u8> = raw
            .trim()
            .chars()
            .map(|ch| ch.to_digit(10).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()?;
        let [away_goalie, away_skaters, home_skaters, home_goalie] = digits[..] else {
            return None;
        };
        Some(Self {
            away_goalie,
            away_skaters,
            home_skaters,
            home_goalie,
        })
    }

    pub fn is_power_play(&self) -> bool {
        self.away_skaters != self.home_skaters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manpower {
    pub friendly: u8,
    pub opponent: u8,
}

impl Manpower {
    pub const EVEN_STRENGTH: Manpower = Manpower {
        friendly: FULL_STRENGTH_SKATERS,
        opponent: FULL_STRENGTH_SKATERS,
    };

    pub fn diff(&self) -> i32 {
        i32::from(self.friendly) - i32::from(self.opponent)
    }
}

// Undecodable codes and owners outside the game read as five-on-five.
pub fn decode(situation: Option<&str>, owner: Option<TeamId>, home: TeamId, away: TeamId) -> Manpower {
    let Some(code) = situation.and_then(SituationCode::parse) else {
        return Manpower::EVEN_STRENGTH;
    };
    match owner {
        Some(team) if team == home => Manpower {
            friendly: code.home_skaters,
            opponent: code.away_skaters,
        },
        Some(team) if team == away => Manpower {
            friendly: code.away_skaters,
            opponent: code.home_skaters,
        },
        _ => Manpower::EVEN_STRENGTH,
    }
}

pub fn decode_event(event: &Event, home: TeamId, away: TeamId) -> Manpower {
    decode(event.situation.as_deref(), event.owner, home, away)
}

pub fn is_power_play(event: &Event) -> bool {
    event
        .situation
        .as_deref()
        .and_then(SituationCode::parse)
        .is_some_and(|code| code.is_power_play())
}

/// Seconds since the power play in force at the prefix's last event began.
///
/// Walks back from the last event to the nearest earlier play at equal
/// strength and measures from its clock. Zero when the last event is not on a
/// power play, and when no equal-strength play precedes it in the prefix.
pub fn time_since_power_play(prefix: &[Event]) -> u32 {
    let Some((current, earlier)) = prefix.split_last() else {
        return 0;
    };
    if !is_power_play(current) {
        return 0;
    }
    let start = earlier
        .iter()
        .rev()
        .find(|e| !is_power_play(e))
        .map(|e| e.elapsed_seconds)
        .unwrap_or(current.elapsed_seconds);
    current.elapsed_seconds.saturating_sub(start)
}
