use crate::event::Event;
use crate::geometry::{GoalSide, shot_angle};
use crate::timeline::{GameTimeline, ScanBound};

#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub prefix: &'a [Event],
    pub current: Option<&'a Event>,
    pub previous: Option<&'a Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextFeatures {
    pub time_since_last_event: Option<u32>,
    pub distance_from_last_event: Option<f64>,
    pub rebound: bool,
    pub angle_change: Option<f64>,
    pub event_speed: Option<f64>,
}

/// Builds the context of the event at `target_idx`.
///
/// The prefix is `events_up_to(period, t, bound)` for the target's own period
/// and clock. Under the inclusive bound it is cut right after the target, so
/// plays logged later in the same second never count as its predecessors.
pub fn scan(timeline: &GameTimeline, target_idx: usize, bound: ScanBound) -> EventContext<'_> {
    let Some(target) = timeline.events().get(target_idx) else {
        return EventContext::from_prefix(&[]);
    };
    let mut range = timeline.range_up_to(target.period, target.elapsed_seconds, bound);
    if bound == ScanBound::Inclusive && range.contains(&target_idx) {
        range.end = target_idx + 1;
    }
    EventContext::from_prefix(&timeline.events()[range])
}

impl<'a> EventContext<'a> {
    pub fn from_prefix(prefix: &'a [Event]) -> Self {
        let current = prefix.last();
        let previous = prefix.len().checked_sub(2).and_then(|i| prefix.get(i));
        Self {
            prefix,
            current,
            previous,
        }
    }

    pub fn time_since_last_event(&self, target: &Event) -> Option<u32> {
        let previous = self.previous?;
        // Negative gaps mean a period boundary; no duration.
        target.elapsed_seconds.checked_sub(previous.elapsed_seconds)
    }

    pub fn distance_from_last_event(&self, target: &Event) -> Option<f64> {
        let (x, y) = target.coords()?;
        let (px, py) = self.previous?.coords()?;
        Some((x - px).hypot(y - py))
    }

    /// Previous play is a non-blocked shot taken by the current candidate's team.
    pub fn is_rebound(&self) -> bool {
        let (Some(current), Some(previous)) = (self.current, self.previous) else {
            return false;
        };
        if !previous.kind.is_shot_class() || previous.kind.is_blocked_shot() {
            return false;
        }
        match (previous.owner, current.owner) {
            (Some(prev_team), Some(cur_team)) => prev_team == cur_team,
            _ => false,
        }
    }

    pub fn features(&self, target: &Event, side: GoalSide) -> ContextFeatures {
        let time_since_last_event = self.time_since_last_event(target);
        let distance_from_last_event = self.distance_from_last_event(target);
        let rebound = self.is_rebound();
        let angle_change = if rebound {
            self.previous.and_then(|previous| {
                let now = shot_angle(target.x, target.y, side)?;
                let before = shot_angle(previous.x, previous.y, side)?;
                Some(reflect_angle((now - before).abs()))
            })
        } else {
            Some(0.0)
        };
        let event_speed = match (distance_from_last_event, time_since_last_event) {
            (Some(distance), Some(seconds)) if seconds > 0 => Some(distance / f64::from(seconds)),
            _ => None,
        };

        ContextFeatures {
            time_since_last_event,
            distance_from_last_event,
            rebound,
            angle_change,
            event_speed,
        }
    }
}

fn reflect_angle(diff: f64) -> f64 {
    let diff = diff % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}
