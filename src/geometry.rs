use serde::{Deserialize, Serialize};

use crate::event::{Event, TeamId};
use crate::timeline::GameTimeline;

pub const GOAL_LINE_X: f64 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalSide {
    Left,
    Right,
}

impl GoalSide {
    pub fn goal_x(self) -> f64 {
        match self {
            GoalSide::Left => -GOAL_LINE_X,
            GoalSide::Right => GOAL_LINE_X,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            GoalSide::Left => GoalSide::Right,
            GoalSide::Right => GoalSide::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GoalSide::Left => "left",
            GoalSide::Right => "right",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Some(GoalSide::Left),
            "right" => Some(GoalSide::Right),
            _ => None,
        }
    }

    pub fn nearest(x: f64) -> Self {
        if x < 0.0 {
            GoalSide::Left
        } else {
            GoalSide::Right
        }
    }
}

// Angle is 0° straight in front of the goal, 90° on the goal line, above 90°
// from behind the net.
pub fn distance_and_angle(x: Option<f64>, y: Option<f64>, side: GoalSide) -> (Option<f64>, Option<f64>) {
    let (Some(x), Some(y)) = (x, y) else {
        return (None, None);
    };
    if !x.is_finite() || !y.is_finite() {
        return (None, None);
    }
    let goal_x = side.goal_x();
    let distance = (x - goal_x).hypot(y);
    let toward_goal = match side {
        GoalSide::Right => goal_x - x,
        GoalSide::Left => x - goal_x,
    };
    let angle = y.abs().atan2(toward_goal).to_degrees();
    (Some(distance), Some(angle))
}

pub fn shot_angle(x: Option<f64>, y: Option<f64>, side: GoalSide) -> Option<f64> {
    distance_and_angle(x, y, side).1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackingGoalPolicy {
    /// Trust the feed's `homeTeamDefendingSide`, falling back to period parity.
    #[default]
    FeedDefendingSide,
    /// Home attacks the left goal in odd periods.
    PeriodParity,
    /// Infer the home side from each team's share of shots at the left goal:
    /// first-period shots when there are at least ten, otherwise the whole
    /// game with even periods mirrored.
    ShotMajority,
}

impl AttackingGoalPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "feed" | "feed-defending-side" => Some(AttackingGoalPolicy::FeedDefendingSide),
            "parity" | "period-parity" => Some(AttackingGoalPolicy::PeriodParity),
            "majority" | "shot-majority" => Some(AttackingGoalPolicy::ShotMajority),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttackingGoalPolicy::FeedDefendingSide => "feed-defending-side",
            AttackingGoalPolicy::PeriodParity => "period-parity",
            AttackingGoalPolicy::ShotMajority => "shot-majority",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttackingGoalResolver {
    policy: AttackingGoalPolicy,
    home: TeamId,
    away: TeamId,
    // Goal the home team attacks in odd periods.
    home_odd_period_side: GoalSide,
}

impl AttackingGoalResolver {
    pub fn for_timeline(timeline: &GameTimeline, policy: AttackingGoalPolicy) -> Self {
        let home_odd_period_side = match policy {
            // No usable lean falls back to period parity.
            AttackingGoalPolicy::ShotMajority => {
                majority_home_side(timeline).unwrap_or(GoalSide::Left)
            }
            _ => GoalSide::Left,
        };
        Self {
            policy,
            home: timeline.home(),
            away: timeline.away(),
            home_odd_period_side,
        }
    }

    pub fn attacking_goal(&self, event: &Event) -> GoalSide {
        let is_home = match event.owner {
            Some(team) if team == self.home => true,
            Some(team) if team == self.away => false,
            _ => return GoalSide::nearest(event.x.unwrap_or(0.0)),
        };

        if self.policy == AttackingGoalPolicy::FeedDefendingSide
            && let Some(home_defends) = event.home_defending_side
        {
            return if is_home {
                home_defends.opposite()
            } else {
                home_defends
            };
        }

        let home_side = if event.period % 2 == 1 {
            self.home_odd_period_side
        } else {
            self.home_odd_period_side.opposite()
        };
        if is_home { home_side } else { home_side.opposite() }
    }
}

const MIN_FIRST_PERIOD_SHOTS: usize = 10;

fn majority_home_side(timeline: &GameTimeline) -> Option<GoalSide> {
    let located = |e: &&Event| {
        (e.kind.is_shot_class() || e.kind.is_goal()) && e.x.is_some_and(|x| x != 0.0)
    };
    let first_period: Vec<&Event> =
        timeline.events().iter().filter(|e| e.period == 1).filter(located).collect();
    let sample: Vec<&Event> = if first_period.len() >= MIN_FIRST_PERIOD_SHOTS {
        first_period
    } else {
        timeline.events().iter().filter(located).collect()
    };

    // Share of a team's shots at the left goal, with even periods mirrored
    // into odd-period orientation. 0.5 when the team has none.
    let left_ratio = |team: TeamId| -> f64 {
        let (left, total) = sample
            .iter()
            .filter(|e| e.owner == Some(team))
            .filter_map(|e| e.x.map(|x| if e.period % 2 == 0 { -x } else { x }))
            .fold((0usize, 0usize), |(left, total), x| (left + usize::from(x < 0.0), total + 1));
        if total == 0 { 0.5 } else { left as f64 / total as f64 }
    };
    let home = left_ratio(timeline.home());
    let away = left_ratio(timeline.away());
    if home > away {
        Some(GoalSide::Left)
    } else if home < away {
        Some(GoalSide::Right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    const HOME: TeamId = TeamId(10);
    const AWAY: TeamId = TeamId(20);

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn straight_on_shot_has_zero_angle() {
        let (d, a) = distance_and_angle(Some(59.0), Some(0.0), GoalSide::Right);
        assert!(close(d.unwrap(), 30.0));
        assert!(close(a.unwrap(), 0.0));
    }

    #[test]
    fn mirrored_shots_match_across_goals() {
        let right = distance_and_angle(Some(70.0), Some(-12.0), GoalSide::Right);
        let left = distance_and_angle(Some(-70.0), Some(12.0), GoalSide::Left);
        assert!(close(right.0.unwrap(), left.0.unwrap()));
        assert!(close(right.1.unwrap(), left.1.unwrap()));
    }

    #[test]
    fn goal_line_and_behind_net_angles() {
        let on_line = shot_angle(Some(89.0), Some(5.0), GoalSide::Right).unwrap();
        assert!(close(on_line, 90.0));
        let behind = shot_angle(Some(95.0), Some(5.0), GoalSide::Right).unwrap();
        assert!(behind > 90.0 && behind <= 180.0);
    }

    #[test]
    fn unknown_coordinates_yield_none() {
        assert_eq!(distance_and_angle(None, Some(1.0), GoalSide::Left), (None, None));
        assert_eq!(distance_and_angle(Some(1.0), None, GoalSide::Left), (None, None));
    }

    #[test]
    fn parity_policy_flips_each_period() {
        let timeline = GameTimeline::new(1, HOME, AWAY, Vec::new());
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::PeriodParity);
        let home_p1 = Event::new(EventKind::ShotOnGoal, 1, 10).with_owner(HOME);
        let home_p2 = Event::new(EventKind::ShotOnGoal, 2, 10).with_owner(HOME);
        let away_p1 = Event::new(EventKind::ShotOnGoal, 1, 10).with_owner(AWAY);
        assert_eq!(resolver.attacking_goal(&home_p1), GoalSide::Left);
        assert_eq!(resolver.attacking_goal(&home_p2), GoalSide::Right);
        assert_eq!(resolver.attacking_goal(&away_p1), GoalSide::Right);
    }

    #[test]
    fn feed_side_overrides_parity() {
        let timeline = GameTimeline::new(1, HOME, AWAY, Vec::new());
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::FeedDefendingSide);
        let mut shot = Event::new(EventKind::ShotOnGoal, 1, 10).with_owner(HOME);
        shot.home_defending_side = Some(GoalSide::Left);
        assert_eq!(resolver.attacking_goal(&shot), GoalSide::Right);
        shot.owner = Some(AWAY);
        assert_eq!(resolver.attacking_goal(&shot), GoalSide::Left);
    }

    #[test]
    fn majority_policy_reads_first_period_shots() {
        let events = vec![
            Event::new(EventKind::ShotOnGoal, 1, 5).with_owner(HOME).with_coords(60.0, 3.0),
            Event::new(EventKind::ShotOnGoal, 1, 9).with_owner(HOME).with_coords(75.0, -8.0),
            Event::new(EventKind::ShotOnGoal, 1, 15).with_owner(AWAY).with_coords(-70.0, 1.0),
        ];
        let timeline = GameTimeline::new(1, HOME, AWAY, events);
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::ShotMajority);
        let home_p1 = Event::new(EventKind::ShotOnGoal, 1, 30).with_owner(HOME);
        let home_p2 = Event::new(EventKind::ShotOnGoal, 2, 30).with_owner(HOME);
        assert_eq!(resolver.attacking_goal(&home_p1), GoalSide::Right);
        assert_eq!(resolver.attacking_goal(&home_p2), GoalSide::Left);
    }

    #[test]
    fn majority_policy_prefers_a_full_first_period() {
        let mut events: Vec<Event> = (0..10)
            .map(|i| {
                let (team, x) = if i % 2 == 0 { (HOME, -60.0) } else { (AWAY, 60.0) };
                Event::new(EventKind::ShotOnGoal, 1, i * 10).with_owner(team).with_coords(x, 0.0)
            })
            .collect();
        // Contradicting later shots are ignored once period one has enough.
        for i in 0..20 {
            events.push(
                Event::new(EventKind::ShotOnGoal, 3, i * 10).with_owner(HOME).with_coords(70.0, 0.0),
            );
        }
        let timeline = GameTimeline::new(1, HOME, AWAY, events);
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::ShotMajority);
        let home_p1 = Event::new(EventKind::ShotOnGoal, 1, 300).with_owner(HOME);
        assert_eq!(resolver.attacking_goal(&home_p1), GoalSide::Left);
    }

    #[test]
    fn majority_policy_without_first_period_shots_uses_whole_game() {
        let events = vec![
            Event::new(EventKind::Faceoff, 1, 0).with_owner(HOME).with_coords(0.0, 0.0),
            Event::new(EventKind::ShotOnGoal, 2, 40).with_owner(HOME).with_coords(-65.0, 4.0),
            Event::new(EventKind::Goal, 2, 90).with_owner(HOME).with_coords(-80.0, -2.0),
            Event::new(EventKind::ShotOnGoal, 2, 120).with_owner(AWAY).with_coords(70.0, 9.0),
        ];
        let timeline = GameTimeline::new(1, HOME, AWAY, events);
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::ShotMajority);
        let home_p1 = Event::new(EventKind::ShotOnGoal, 1, 30).with_owner(HOME);
        let home_p2 = Event::new(EventKind::ShotOnGoal, 2, 30).with_owner(HOME);
        let away_p3 = Event::new(EventKind::ShotOnGoal, 3, 30).with_owner(AWAY);
        assert_eq!(resolver.attacking_goal(&home_p2), GoalSide::Left);
        assert_eq!(resolver.attacking_goal(&home_p1), GoalSide::Right);
        assert_eq!(resolver.attacking_goal(&away_p3), GoalSide::Left);
    }

    #[test]
    fn majority_policy_without_any_shots_falls_back_to_parity() {
        let events = vec![Event::new(EventKind::Faceoff, 1, 0).with_owner(HOME)];
        let timeline = GameTimeline::new(1, HOME, AWAY, events);
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::ShotMajority);
        let home_p1 = Event::new(EventKind::ShotOnGoal, 1, 30).with_owner(HOME);
        assert_eq!(resolver.attacking_goal(&home_p1), GoalSide::Left);
    }

    #[test]
    fn unknown_owner_uses_nearest_goal() {
        let timeline = GameTimeline::new(1, HOME, AWAY, Vec::new());
        let resolver = AttackingGoalResolver::for_timeline(&timeline, AttackingGoalPolicy::PeriodParity);
        let shot = Event::new(EventKind::ShotOnGoal, 1, 10).with_coords(-40.0, 0.0);
        assert_eq!(resolver.attacking_goal(&shot), GoalSide::Left);
    }
}
