use std::collections::HashMap;

use serde_json::Value;

use crate::error::FeatureError;
use crate::event::{Event, EventKind, TeamId, parse_clock};
use crate::geometry::GoalSide;
use crate::timeline::{GameTimeline, GameType};

#[derive(Debug, Clone)]
pub struct ParsedGame {
    pub timeline: GameTimeline,
    pub dropped: Vec<FeatureError>,
}

pub fn parse_game_json(raw: &str, fallback_game_id: Option<u64>) -> Result<ParsedGame, FeatureError> {
    let label = game_label(None, fallback_game_id);
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(FeatureError::malformed_payload(label, "empty payload"));
    }
    let root: Value = serde_json::from_str(trimmed)
        .map_err(|err| FeatureError::malformed_payload(label, format!("invalid json: {err}")))?;
    parse_game_value(&root, fallback_game_id)
}

pub fn parse_game_value(root: &Value, fallback_game_id: Option<u64>) -> Result<ParsedGame, FeatureError> {
    let game_id = root.get("id").and_then(as_u64_any).or(fallback_game_id);
    let label = game_label(game_id, fallback_game_id);
    if !root.is_object() {
        return Err(FeatureError::malformed_payload(label, "payload is not an object"));
    }
    let Some(game_id) = game_id else {
        return Err(FeatureError::malformed_payload(label, "missing game id"));
    };
    let home = team_id(root, "homeTeam")
        .ok_or_else(|| FeatureError::malformed_payload(label.clone(), "missing homeTeam.id"))?;
    let away = team_id(root, "awayTeam")
        .ok_or_else(|| FeatureError::malformed_payload(label.clone(), "missing awayTeam.id"))?;
    let plays = root
        .get("plays")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FeatureError::malformed_payload(label.clone(), "missing plays list"))?;

    let names = NameBook::from_root(root, home, away);
    let mut events = Vec::with_capacity(plays.len());
    let mut dropped = Vec::new();
    for (index, play) in plays.iter().enumerate() {
        match parse_play(play, &names) {
            Ok(event) => events.push(event),
            Err(reason) => dropped.push(FeatureError::MalformedEvent {
                game: label.clone(),
                index,
                reason,
            }),
        }
    }

    let season = root
        .get("season")
        .and_then(season_start_year)
        .or_else(|| season_from_game_id(game_id));
    let game_type = root
        .get("gameType")
        .and_then(as_code_string)
        .map(|code| GameType::from_code(&code))
        .filter(|t| *t != GameType::Unknown)
        .or_else(|| game_type_from_game_id(game_id))
        .unwrap_or(GameType::Unknown);

    let timeline = GameTimeline::new(game_id, home, away, events).with_season(season, game_type);
    Ok(ParsedGame { timeline, dropped })
}

fn parse_play(play: &Value, names: &NameBook) -> Result<Event, String> {
    let type_key = play
        .get("typeDescKey")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or("missing typeDescKey")?;
    let period = play
        .get("periodDescriptor")
        .and_then(|p| p.get("number"))
        .and_then(as_u64_any)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .ok_or("missing period number")?;
    let clock = play
        .get("timeInPeriod")
        .and_then(|v| v.as_str())
        .ok_or("missing timeInPeriod")?;
    let elapsed_seconds = parse_clock(clock).ok_or_else(|| format!("bad clock {clock:?}"))?;

    let details = play.get("details").unwrap_or(&Value::Null);
    let owner = details
        .get("eventOwnerTeamId")
        .and_then(as_u64_any)
        .and_then(|n| u32::try_from(n).ok())
        .map(TeamId);
    let shooter_id = details
        .get("shootingPlayerId")
        .and_then(as_u64_any)
        .or_else(|| details.get("scoringPlayerId").and_then(as_u64_any));
    let goalie_in_net = details.get("goalieInNetId").and_then(as_u64_any);
    Ok(Event {
        event_id: play.get("eventId").and_then(as_u64_any),
        kind: EventKind::from_type_key(type_key),
        period,
        elapsed_seconds,
        x: details.get("xCoord").and_then(as_f64_any),
        y: details.get("yCoord").and_then(as_f64_any),
        owner,
        team_name: owner.and_then(|team| names.team(team)),
        situation: play.get("situationCode").and_then(situation_string),
        home_defending_side: play
            .get("homeTeamDefendingSide")
            .and_then(|v| v.as_str())
            .and_then(GoalSide::parse),
        shot_type: details
            .get("shotType")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty()),
        shooter_id,
        shooter_name: shooter_id.and_then(|id| names.player(id)),
        goalie_in_net,
        goalie_name: goalie_in_net.and_then(|id| names.player(id)),
        zone_code: details
            .get("zoneCode")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

// Player names from `rosterSpots`, team names from `placeName` + `commonName`.
#[derive(Debug, Default)]
struct NameBook {
    players: HashMap<u64, String>,
    teams: HashMap<TeamId, String>,
}

impl NameBook {
    fn from_root(root: &Value, home: TeamId, away: TeamId) -> Self {
        let mut book = NameBook::default();
        if let Some(spots) = root.get("rosterSpots").and_then(|v| v.as_array()) {
            for spot in spots {
                let Some(player_id) = spot.get("playerId").and_then(as_u64_any) else {
                    continue;
                };
                let name = join_names(&[
                    localized(spot.get("firstName")),
                    localized(spot.get("lastName")),
                ]);
                if let Some(name) = name {
                    book.players.insert(player_id, name);
                }
            }
        }
        for (key, team) in [("homeTeam", home), ("awayTeam", away)] {
            let Some(node) = root.get(key) else {
                continue;
            };
            let name = join_names(&[localized(node.get("placeName")), localized(node.get("commonName"))]);
            if let Some(name) = name {
                book.teams.insert(team, name);
            }
        }
        book
    }

    fn player(&self, id: u64) -> Option<String> {
        self.players.get(&id).cloned()
    }

    fn team(&self, team: TeamId) -> Option<String> {
        self.teams.get(&team).cloned()
    }
}

// Names arrive either as plain strings or as `{"default": "..."}`.
fn localized(v: Option<&Value>) -> Option<&str> {
    let v = v?;
    v.as_str()
        .or_else(|| v.get("default").and_then(|d| d.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn join_names(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts.iter().flatten().copied().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

fn game_label(game_id: Option<u64>, fallback: Option<u64>) -> String {
    game_id
        .or(fallback)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn team_id(root: &Value, key: &str) -> Option<TeamId> {
    let id = root.get(key)?.get("id").and_then(as_u64_any)?;
    u32::try_from(id).ok().map(TeamId)
}

// 20192020 -> 2019
fn season_start_year(v: &Value) -> Option<u32> {
    let raw = as_code_string(v)?;
    raw.get(..4)?.parse::<u32>().ok()
}

fn season_from_game_id(game_id: u64) -> Option<u32> {
    let raw = game_id.to_string();
    raw.get(..4)?.parse::<u32>().ok()
}

// 2019020001 -> digits 5-6 are the game type
fn game_type_from_game_id(game_id: u64) -> Option<GameType> {
    let raw = game_id.to_string();
    let game_type = GameType::from_code(raw.get(4..6)?);
    (game_type != GameType::Unknown).then_some(game_type)
}

// Numeric codes lose their leading zero ("0651" arrives as 651).
fn situation_string(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        let s = s.trim();
        return (!s.is_empty()).then(|| s.to_string());
    }
    v.as_u64().map(|n| format!("{n:04}"))
}

fn as_code_string(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        return Some(s.trim().to_string());
    }
    v.as_u64().map(|n| n.to_string())
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
