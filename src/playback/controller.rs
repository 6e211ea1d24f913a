//! Year / range time controller with a single playback timer

use bevy::prelude::*;
use chrono::{Datelike, Months, NaiveDate};
use std::collections::VecDeque;
use std::time::Duration;

use crate::api::SensorReading;
use crate::config::AppConfig;
use crate::floats::FloatQuery;

pub const MIN_FRAME_PERIOD: Duration = Duration::from_millis(50);
pub const MAX_FRAME_PERIOD: Duration = Duration::from_millis(4000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeMode {
    Year(i32),
    Range {
        start: NaiveDate,
        end: NaiveDate,
        playing: bool,
    },
}

impl TimeMode {
    pub fn is_range(&self) -> bool {
        matches!(self, TimeMode::Range { .. })
    }
}

#[derive(Resource, Debug)]
pub struct PlaybackController {
    mode: TimeMode,
    years: Vec<i32>,
    min_date: NaiveDate,
    max_date: NaiveDate,
    snapshot_limit: u32,
    frame_period: Duration,
    /// Present only while playing.
    timer: Option<Timer>,
}

impl PlaybackController {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: TimeMode::Year(config.initial_year),
            years: config.years.clone(),
            min_date: config.min_date,
            max_date: config.max_date,
            snapshot_limit: config.snapshot_limit,
            frame_period: Duration::from_millis(config.frame_period_ms)
                .clamp(MIN_FRAME_PERIOD, MAX_FRAME_PERIOD),
            timer: None,
        }
    }

    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, TimeMode::Range { playing: true, .. })
    }

    /// Whether a playback timer exists; never more than one.
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Query the float store should be showing for the current mode.
    pub fn query(&self) -> FloatQuery {
        match self.mode {
            TimeMode::Year(year) => FloatQuery::Snapshot {
                year,
                limit: self.snapshot_limit,
            },
            TimeMode::Range { start, end, .. } => FloatQuery::Range { start, end },
        }
    }

    /// Switch Year <-> Range. Range starts as the whole selected year; going back to
    /// Year keeps the year of the range start. Playback stops either way.
    pub fn toggle_mode(&mut self) {
        self.timer = None;
        self.mode = match self.mode {
            TimeMode::Year(year) => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(self.min_date);
                let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(self.max_date);
                let start = start.clamp(self.min_date, self.max_date);
                let end = end.clamp(start, self.max_date);
                TimeMode::Range {
                    start,
                    end,
                    playing: false,
                }
            }
            TimeMode::Range { start, .. } => {
                let year = if self.years.contains(&start.year()) {
                    start.year()
                } else {
                    self.years.first().copied().unwrap_or(start.year())
                };
                TimeMode::Year(year)
            }
        };
    }

    /// Year mode: move through the configured year list, stopping at the ends.
    pub fn step_year(&mut self, delta: i32) {
        let TimeMode::Year(year) = self.mode else { return };
        let Some(pos) = self.years.iter().position(|y| *y == year) else {
            return;
        };
        let next = (pos as i64 + i64::from(delta)).clamp(0, self.years.len() as i64 - 1) as usize;
        self.mode = TimeMode::Year(self.years[next]);
    }

    /// Range mode: move the start date by whole months within `[min_date, end]`.
    pub fn shift_start(&mut self, months: i32) {
        if let TimeMode::Range { start, end, .. } = &mut self.mode {
            *start = shift_months(*start, months).clamp(self.min_date, *end);
        }
    }

    /// Range mode: move the end date by whole months within `[start, max_date]`.
    pub fn shift_end(&mut self, months: i32) {
        if let TimeMode::Range { start, end, .. } = &mut self.mode {
            *end = shift_months(*end, months).clamp(*start, self.max_date);
        }
    }

    pub fn toggle_play(&mut self) {
        if let TimeMode::Range { playing, .. } = &mut self.mode {
            *playing = !*playing;
            self.timer = playing.then(|| Timer::new(self.frame_period, TimerMode::Once));
        }
    }

    /// Halve (`faster`) or double the frame period. The pending tick keeps its period.
    pub fn change_speed(&mut self, faster: bool) {
        let period = if faster {
            self.frame_period / 2
        } else {
            self.frame_period * 2
        };
        self.frame_period = period.clamp(MIN_FRAME_PERIOD, MAX_FRAME_PERIOD);
    }

    /// Advance the playback clock. Returns true when a frame step is due.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if !timer.tick(delta).just_finished() {
            return false;
        }
        // rearm with the current period
        self.timer = Some(Timer::new(self.frame_period, TimerMode::Once));
        true
    }
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Readings revealed by playback, newest first.
#[derive(Resource, Debug, Default)]
pub struct RecentActivity {
    entries: VecDeque<SensorReading>,
}

impl RecentActivity {
    pub const CAPACITY: usize = 8;

    pub fn push(&mut self, reading: SensorReading) {
        self.entries.push_front(reading);
        self.entries.truncate(Self::CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floats::store::tests::reading;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn controller() -> PlaybackController {
        PlaybackController::from_config(&AppConfig::default())
    }

    #[test]
    fn starts_in_year_mode() {
        let c = controller();
        assert_eq!(c.mode(), TimeMode::Year(2023));
        assert_eq!(c.query(), FloatQuery::Snapshot { year: 2023, limit: 5000 });
    }

    #[test]
    fn years_step_within_list() {
        let mut c = controller();
        c.step_year(1);
        assert_eq!(c.mode(), TimeMode::Year(2024));
        c.step_year(1);
        assert_eq!(c.mode(), TimeMode::Year(2024));
        c.step_year(-5);
        assert_eq!(c.mode(), TimeMode::Year(2022));
    }

    #[test]
    fn range_defaults_to_selected_year() {
        let mut c = controller();
        c.toggle_mode();
        assert_eq!(
            c.mode(),
            TimeMode::Range {
                start: date(2023, 1, 1),
                end: date(2023, 12, 31),
                playing: false
            }
        );
        c.toggle_mode();
        assert_eq!(c.mode(), TimeMode::Year(2023));
    }

    #[test]
    fn range_edits_respect_bounds() {
        let mut c = controller();
        c.toggle_mode();
        c.shift_start(-13);
        c.shift_start(-24);
        c.shift_end(-12);
        let TimeMode::Range { start, end, .. } = c.mode() else { panic!() };
        assert_eq!(start, date(2022, 1, 1));
        assert_eq!(end, date(2022, 12, 31));

        c.shift_start(20);
        let TimeMode::Range { start, end, .. } = c.mode() else { panic!() };
        assert_eq!(start, end, "start never passes end");

        c.shift_end(40);
        let TimeMode::Range { end, .. } = c.mode() else { panic!() };
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn mode_switch_stops_playback() {
        let mut c = controller();
        c.toggle_play();
        assert!(!c.is_playing(), "no playback in year mode");
        c.toggle_mode();
        c.toggle_play();
        assert!(c.is_playing() && c.has_timer());
        c.toggle_mode();
        assert!(!c.is_playing());
        assert!(!c.has_timer());
    }

    #[test]
    fn ticks_at_frame_period() {
        let mut c = controller();
        c.toggle_mode();
        c.toggle_play();
        assert!(!c.tick(Duration::from_millis(300)));
        assert!(c.tick(Duration::from_millis(250)));
        assert!(!c.tick(Duration::from_millis(100)));
        c.toggle_play();
        assert!(!c.has_timer());
        assert!(!c.tick(Duration::from_secs(10)));
    }

    #[test]
    fn speed_change_applies_on_next_tick() {
        let mut c = controller();
        c.toggle_mode();
        c.toggle_play();
        c.change_speed(true);
        assert_eq!(c.frame_period(), Duration::from_millis(250));
        // the pending tick still uses 500 ms
        assert!(!c.tick(Duration::from_millis(300)));
        assert!(c.tick(Duration::from_millis(200)));
        // the next one uses 250 ms
        assert!(c.tick(Duration::from_millis(250)));
    }

    #[test]
    fn speed_is_clamped() {
        let mut c = controller();
        for _ in 0..10 {
            c.change_speed(true);
        }
        assert_eq!(c.frame_period(), MIN_FRAME_PERIOD);
        for _ in 0..10 {
            c.change_speed(false);
        }
        assert_eq!(c.frame_period(), MAX_FRAME_PERIOD);
    }

    #[test]
    fn recent_activity_is_bounded_newest_first() {
        let mut recent = RecentActivity::default();
        for id in 0..12 {
            recent.push(reading(id, 0.0, 0.0));
        }
        assert_eq!(recent.len(), RecentActivity::CAPACITY);
        let ids: Vec<_> = recent.iter().map(|r| r.platform_id).collect();
        assert_eq!(ids, vec![11, 10, 9, 8, 7, 6, 5, 4]);
        recent.clear();
        assert!(recent.is_empty());
    }
}
