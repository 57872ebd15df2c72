//! Form ledger
//!
//! Single forward pass over a league's chronological match sequence,
//! maintaining per team a bounded FIFO of recent outcomes. Each match's
//! feature row is emitted from data strictly before that match, so a
//! team's own result never leaks into its own training row.

use std::collections::{HashMap, VecDeque};

use crate::features::projector;
use crate::{MatchEvent, MatchResult};

/// Average points assumed for a team with no recorded history. A neutral
/// prior: an unobserved team is scored as typical, not as the worst
/// possible team. Used for feature construction only, never for trails.
pub const NEUTRAL_AVG_POINTS: f32 = 1.3;

/// One past match from a single team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormEntry {
    pub goals_for: u32,
    /// League points earned: 3 win, 1 draw, 0 loss
    pub points: u8,
}

impl FormEntry {
    /// W/D/L code for trail display.
    pub fn code(&self) -> char {
        match self.points {
            3 => 'W',
            1 => 'D',
            _ => 'L',
        }
    }
}

/// Bounded trailing window of a team's most recent outcomes, oldest first.
#[derive(Debug, Clone)]
pub struct FormWindow {
    capacity: usize,
    entries: VecDeque<FormEntry>,
}

impl FormWindow {
    pub fn new(capacity: usize) -> Self {
        FormWindow {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an outcome, evicting the oldest once past capacity.
    pub fn push(&mut self, entry: FormEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean goals scored over the window; 0.0 when empty.
    pub fn avg_goals(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: u32 = self.entries.iter().map(|e| e.goals_for).sum();
        total as f32 / self.entries.len() as f32
    }

    /// Mean points over the window; the neutral prior when empty.
    pub fn avg_points(&self) -> f32 {
        if self.entries.is_empty() {
            return NEUTRAL_AVG_POINTS;
        }
        let total: u32 = self.entries.iter().map(|e| e.points as u32).sum();
        total as f32 / self.entries.len() as f32
    }

    /// W/D/L trail, oldest first. Empty for an unseen team.
    pub fn trail(&self) -> Vec<char> {
        self.entries.iter().map(|e| e.code()).collect()
    }
}

/// A derived training sample: the feature vector seen before a match, and
/// the match's realized outcome.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub features: [f32; projector::FEATURE_DIM],
    pub target: MatchResult,
}

/// Walks a chronological event sequence and maintains per-team form.
#[derive(Debug)]
pub struct FormLedger {
    window: usize,
    forms: HashMap<String, FormWindow>,
}

impl FormLedger {
    pub fn new(window: usize) -> Self {
        FormLedger {
            window,
            forms: HashMap::new(),
        }
    }

    /// Process events in order, emitting one feature row per match computed
    /// from history strictly before it.
    pub fn process(&mut self, events: &[MatchEvent]) -> Vec<TrainingRow> {
        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            rows.push(TrainingRow {
                features: self.project(&event.home_team, &event.away_team),
                target: event.result(),
            });
            self.record(event);
        }
        rows
    }

    /// Current feature vector for a fixture, from history seen so far.
    pub fn project(&self, home_team: &str, away_team: &str) -> [f32; projector::FEATURE_DIM] {
        let empty = FormWindow::new(self.window);
        let home = self.forms.get(home_team).unwrap_or(&empty);
        let away = self.forms.get(away_team).unwrap_or(&empty);
        projector::project(home, away)
    }

    /// Fold a finished match into both teams' windows.
    fn record(&mut self, event: &MatchEvent) {
        let window = self.window;
        self.forms
            .entry(event.home_team.clone())
            .or_insert_with(|| FormWindow::new(window))
            .push(FormEntry {
                goals_for: event.home_goals,
                points: MatchResult::points(event.home_goals, event.away_goals),
            });
        self.forms
            .entry(event.away_team.clone())
            .or_insert_with(|| FormWindow::new(window))
            .push(FormEntry {
                goals_for: event.away_goals,
                points: MatchResult::points(event.away_goals, event.home_goals),
            });
    }

    /// Window for a team as of the end of the pass.
    pub fn snapshot(&self, team: &str) -> Option<&FormWindow> {
        self.forms.get(team)
    }

    /// Hand the per-team windows to the registry.
    pub fn into_forms(self) -> HashMap<String, FormWindow> {
        self.forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(day: u32, home: &str, away: &str, hg: u32, ag: u32) -> MatchEvent {
        MatchEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: hg,
            away_goals: ag,
        }
    }

    #[test]
    fn test_two_match_scenario() {
        let events = vec![event(1, "A", "B", 2, 0), event(8, "B", "A", 1, 1)];
        let mut ledger = FormLedger::new(5);
        let rows = ledger.process(&events);
        assert_eq!(rows.len(), 2);

        let a = ledger.snapshot("A").unwrap();
        assert_eq!(a.avg_goals(), 1.5); // goals [2, 1]
        assert_eq!(a.avg_points(), 2.0); // points [3, 1]
        assert_eq!(a.trail(), vec!['W', 'D']);

        let b = ledger.snapshot("B").unwrap();
        assert_eq!(b.avg_goals(), 0.5); // goals [0, 1]
        assert_eq!(b.avg_points(), 0.5); // points [0, 1]
        assert_eq!(b.trail(), vec!['L', 'D']);
    }

    #[test]
    fn test_first_row_uses_unseen_defaults() {
        let events = vec![event(1, "A", "B", 2, 0)];
        let mut ledger = FormLedger::new(5);
        let rows = ledger.process(&events);
        // Both sides unseen: avg_goals 0.0, avg_points neutral prior
        assert_eq!(
            rows[0].features,
            [0.0, 0.0, NEUTRAL_AVG_POINTS, NEUTRAL_AVG_POINTS]
        );
        assert_eq!(rows[0].target, MatchResult::Home);
    }

    #[test]
    fn test_no_lookahead() {
        let events: Vec<_> = (1..=10)
            .map(|d| event(d, "A", "B", d % 3, d % 2))
            .collect();

        let mut full = FormLedger::new(5);
        let full_rows = full.process(&events);

        // Truncating the suffix after match k leaves row k unchanged
        for k in 0..events.len() {
            let mut truncated = FormLedger::new(5);
            let rows = truncated.process(&events[..=k]);
            assert_eq!(rows[k].features, full_rows[k].features, "row {}", k);
        }
    }

    #[test]
    fn test_window_capped_at_five() {
        let events: Vec<_> = (1..=20).map(|d| event(d, "A", "B", 1, 0)).collect();
        let mut ledger = FormLedger::new(5);
        ledger.process(&events);
        assert_eq!(ledger.snapshot("A").unwrap().len(), 5);
        assert_eq!(ledger.snapshot("B").unwrap().len(), 5);
        // 20 straight wins: the window only remembers the last 5
        assert_eq!(ledger.snapshot("A").unwrap().trail(), vec!['W'; 5]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        // Loss first, then 5 wins: loss must be evicted
        let mut events = vec![event(1, "A", "B", 0, 1)];
        events.extend((2..=6).map(|d| event(d, "A", "B", 1, 0)));
        let mut ledger = FormLedger::new(5);
        ledger.process(&events);
        assert_eq!(ledger.snapshot("A").unwrap().trail(), vec!['W'; 5]);
        assert_eq!(ledger.snapshot("A").unwrap().avg_points(), 3.0);
    }

    #[test]
    fn test_trail_shorter_than_window() {
        let events = vec![event(1, "A", "B", 0, 0), event(2, "A", "C", 2, 0)];
        let mut ledger = FormLedger::new(5);
        ledger.process(&events);
        let trail = ledger.snapshot("A").unwrap().trail();
        assert_eq!(trail, vec!['D', 'W']);
        assert!(trail.iter().all(|c| ['W', 'D', 'L'].contains(c)));
        assert_eq!(ledger.snapshot("C").unwrap().trail(), vec!['L']);
    }

    #[test]
    fn test_unseen_team_snapshot() {
        let ledger = FormLedger::new(5);
        assert!(ledger.snapshot("Nowhere FC").is_none());
        let empty = FormWindow::new(5);
        assert_eq!(empty.avg_goals(), 0.0);
        assert_eq!(empty.avg_points(), NEUTRAL_AVG_POINTS);
        assert!(empty.trail().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let events: Vec<_> = (1..=15)
            .map(|d| event(d, if d % 2 == 0 { "A" } else { "C" }, "B", d % 4, d % 3))
            .collect();
        let mut first = FormLedger::new(5);
        let mut second = FormLedger::new(5);
        let rows_a = first.process(&events);
        let rows_b = second.process(&events);
        for (a, b) in rows_a.iter().zip(rows_b.iter()) {
            assert_eq!(a.features, b.features);
            assert_eq!(a.target, b.target);
        }
    }
}
