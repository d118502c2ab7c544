use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::{self, ContextFeatures};
use crate::event::{Event, EventKind};
use crate::geometry::{AttackingGoalPolicy, AttackingGoalResolver, distance_and_angle};
use crate::manpower::{self, Manpower};
use crate::timeline::{GameTimeline, ScanBound};

/// Output column order. Matches the field order of [`ShotFeatureRow`].
pub const FEATURE_COLUMNS: &[&str] = &[
    "game_id",
    "season",
    "game_type",
    "event_index",
    "event_id",
    "period",
    "period_time_seconds",
    "game_time_seconds",
    "event_type",
    "team_id",
    "team_name",
    "shooter_id",
    "shooter_name",
    "goalie_id",
    "goalie_name",
    "is_home",
    "x_coord",
    "y_coord",
    "shot_type",
    "zone_code",
    "attacking_goal",
    "distance_from_net",
    "shot_angle",
    "last_event_type",
    "last_event_x",
    "last_event_y",
    "time_since_last_event",
    "distance_from_last_event",
    "rebound",
    "angle_change",
    "event_speed",
    "friendly_player_count",
    "opponent_player_count",
    "player_count_diff",
    "time_since_power_play",
    "empty_net",
    "is_goal",
];

/// One training row per shot or goal. Flags are encoded as `0`/`1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotFeatureRow {
    pub game_id: u64,
    pub season: Option<u32>,
    pub game_type: String,
    pub event_index: u32,
    pub event_id: Option<u64>,
    pub period: u32,
    pub period_time_seconds: u32,
    pub game_time_seconds: u32,
    pub event_type: String,
    pub team_id: Option<u32>,
    pub team_name: Option<String>,
    pub shooter_id: Option<u64>,
    pub shooter_name: Option<String>,
    pub goalie_id: Option<u64>,
    pub goalie_name: Option<String>,
    pub is_home: u8,
    pub x_coord: Option<f64>,
    pub y_coord: Option<f64>,
    pub shot_type: Option<String>,
    pub zone_code: Option<String>,
    pub attacking_goal: String,
    pub distance_from_net: Option<f64>,
    pub shot_angle: Option<f64>,
    pub last_event_type: Option<String>,
    pub last_event_x: Option<f64>,
    pub last_event_y: Option<f64>,
    pub time_since_last_event: Option<u32>,
    pub distance_from_last_event: Option<f64>,
    pub rebound: u8,
    pub angle_change: Option<f64>,
    pub event_speed: Option<f64>,
    pub friendly_player_count: u32,
    pub opponent_player_count: u32,
    pub player_count_diff: i32,
    pub time_since_power_play: u32,
    pub empty_net: u8,
    pub is_goal: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureCell {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl ShotFeatureRow {
    pub fn cells(&self) -> Vec<FeatureCell> {
        vec![
            int(self.game_id as i64),
            opt_int(self.season),
            text(&self.game_type),
            int(i64::from(self.event_index)),
            opt_int(self.event_id.map(|id| id as i64)),
            int(i64::from(self.period)),
            int(i64::from(self.period_time_seconds)),
            int(i64::from(self.game_time_seconds)),
            text(&self.event_type),
            opt_int(self.team_id),
            opt_text(self.team_name.as_deref()),
            opt_int(self.shooter_id.map(|id| id as i64)),
            opt_text(self.shooter_name.as_deref()),
            opt_int(self.goalie_id.map(|id| id as i64)),
            opt_text(self.goalie_name.as_deref()),
            int(i64::from(self.is_home)),
            opt_float(self.x_coord),
            opt_float(self.y_coord),
            opt_text(self.shot_type.as_deref()),
            opt_text(self.zone_code.as_deref()),
            text(&self.attacking_goal),
            opt_float(self.distance_from_net),
            opt_float(self.shot_angle),
            opt_text(self.last_event_type.as_deref()),
            opt_float(self.last_event_x),
            opt_float(self.last_event_y),
            opt_int(self.time_since_last_event),
            opt_float(self.distance_from_last_event),
            int(i64::from(self.rebound)),
            opt_float(self.angle_change),
            opt_float(self.event_speed),
            int(i64::from(self.friendly_player_count)),
            int(i64::from(self.opponent_player_count)),
            int(i64::from(self.player_count_diff)),
            int(i64::from(self.time_since_power_play)),
            int(i64::from(self.empty_net)),
            int(i64::from(self.is_goal)),
        ]
    }
}

fn int(v: i64) -> FeatureCell {
    FeatureCell::Int(v)
}

fn opt_int<T: Into<i64>>(v: Option<T>) -> FeatureCell {
    v.map(|n| FeatureCell::Int(n.into())).unwrap_or(FeatureCell::Null)
}

fn opt_float(v: Option<f64>) -> FeatureCell {
    v.map(FeatureCell::Float).unwrap_or(FeatureCell::Null)
}

fn text(v: &str) -> FeatureCell {
    FeatureCell::Text(v.to_string())
}

fn opt_text(v: Option<&str>) -> FeatureCell {
    v.map(text).unwrap_or(FeatureCell::Null)
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler {
    scan_bound: ScanBound,
    attacking_goal: AttackingGoalPolicy,
    include_missed_shots: bool,
}

impl FeatureAssembler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scan_bound: config.scan_bound,
            attacking_goal: config.attacking_goal,
            include_missed_shots: config.include_missed_shots,
        }
    }

    pub fn is_target(&self, event: &Event) -> bool {
        match event.kind {
            EventKind::ShotOnGoal | EventKind::Goal => true,
            EventKind::MissedShot => self.include_missed_shots,
            _ => false,
        }
    }

    pub fn assemble(&self, timeline: &GameTimeline) -> Vec<ShotFeatureRow> {
        let resolver = AttackingGoalResolver::for_timeline(timeline, self.attacking_goal);
        timeline
            .events()
            .iter()
            .enumerate()
            .filter(|(_, event)| self.is_target(event))
            .map(|(idx, event)| self.assemble_row(timeline, &resolver, idx, event))
            .collect()
    }

    fn assemble_row(
        &self,
        timeline: &GameTimeline,
        resolver: &AttackingGoalResolver,
        idx: usize,
        event: &Event,
    ) -> ShotFeatureRow {
        let side = resolver.attacking_goal(event);
        let (distance_from_net, shot_angle) = distance_and_angle(event.x, event.y, side);

        let ctx = context::scan(timeline, idx, self.scan_bound);
        let ContextFeatures {
            time_since_last_event,
            distance_from_last_event,
            rebound,
            angle_change,
            event_speed,
        } = ctx.features(event, side);

        let manpower = ctx
            .current
            .map(|current| manpower::decode_event(current, timeline.home(), timeline.away()))
            .unwrap_or(Manpower::EVEN_STRENGTH);
        let time_since_power_play = manpower::time_since_power_play(ctx.prefix);

        let previous = ctx.previous;
        ShotFeatureRow {
            game_id: timeline.game_id(),
            season: timeline.season(),
            game_type: timeline.game_type().label().to_string(),
            event_index: u32::try_from(idx).unwrap_or(u32::MAX),
            event_id: event.event_id,
            period: event.period,
            period_time_seconds: event.elapsed_seconds,
            game_time_seconds: event.game_seconds(),
            event_type: event.kind.type_key().to_string(),
            team_id: event.owner.map(|t| t.0),
            team_name: event.team_name.clone(),
            shooter_id: event.shooter_id,
            shooter_name: event.shooter_name.clone(),
            goalie_id: event.goalie_in_net,
            goalie_name: event.goalie_name.clone(),
            is_home: flag(event.owner == Some(timeline.home())),
            x_coord: event.x,
            y_coord: event.y,
            shot_type: event.shot_type.clone(),
            zone_code: event.zone_code.clone(),
            attacking_goal: side.label().to_string(),
            distance_from_net,
            shot_angle,
            last_event_type: previous.map(|p| p.kind.type_key().to_string()),
            last_event_x: previous.and_then(|p| p.x),
            last_event_y: previous.and_then(|p| p.y),
            time_since_last_event,
            distance_from_last_event,
            rebound: flag(rebound),
            angle_change,
            event_speed,
            friendly_player_count: u32::from(manpower.friendly),
            opponent_player_count: u32::from(manpower.opponent),
            player_count_diff: manpower.diff(),
            time_since_power_play,
            empty_net: flag(event.goalie_in_net.is_none()),
            is_goal: flag(event.kind.is_goal()),
        }
    }
}

fn flag(v: bool) -> u8 {
    if v { 1 } else { 0 }
}
