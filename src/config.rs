use std::env;

use crate::geometry::AttackingGoalPolicy;
use crate::timeline::ScanBound;

const DEFAULT_PARALLELISM: usize = 6;
const MAX_PARALLELISM: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub scan_bound: ScanBound,
    pub attacking_goal: AttackingGoalPolicy,
    pub include_missed_shots: bool,
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_bound: ScanBound::Inclusive,
            attacking_goal: AttackingGoalPolicy::FeedDefendingSide,
            include_missed_shots: false,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scan_bound: env::var("FEATURE_SCAN_BOUND")
                .ok()
                .and_then(|val| ScanBound::parse(&val))
                .unwrap_or(defaults.scan_bound),
            attacking_goal: env::var("FEATURE_ATTACKING_GOAL")
                .ok()
                .and_then(|val| AttackingGoalPolicy::parse(&val))
                .unwrap_or(defaults.attacking_goal),
            include_missed_shots: env::var("FEATURE_INCLUDE_MISSED")
                .ok()
                .and_then(|val| parse_flag(&val))
                .unwrap_or(defaults.include_missed_shots),
            parallelism: env::var("FEATURE_PARALLELISM")
                .ok()
                .and_then(|val| val.trim().parse::<usize>().ok())
                .map(clamp_parallelism)
                .unwrap_or(defaults.parallelism),
        }
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = clamp_parallelism(threads);
        self
    }
}

pub fn clamp_parallelism(threads: usize) -> usize {
    threads.clamp(1, MAX_PARALLELISM)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
