//! Sensor position store
//!
//! Holds the readings of the current query. Each issued query bumps a generation counter
//! and only the result carrying the latest generation is accepted, so a slow response to
//! an older query can never overwrite a newer one.

use bevy::prelude::*;
use chrono::NaiveDate;

use crate::api::{ApiCommand, PlatformId, SensorReading, TimeWindow};

/// The two query forms; exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatQuery {
    Snapshot { year: i32, limit: u32 },
    Range { start: NaiveDate, end: NaiveDate },
}

impl FloatQuery {
    pub fn is_range(&self) -> bool {
        matches!(self, FloatQuery::Range { .. })
    }

    /// Window used for the detail requests of a platform picked under this query.
    pub fn window(&self) -> TimeWindow {
        match *self {
            FloatQuery::Snapshot { year, .. } => TimeWindow::Year(year),
            FloatQuery::Range { start, end } => TimeWindow::Range { start, end },
        }
    }

    fn command(&self, generation: u64) -> ApiCommand {
        match *self {
            FloatQuery::Snapshot { year, limit } => ApiCommand::Snapshot {
                generation,
                year,
                limit,
            },
            FloatQuery::Range { start, end } => ApiCommand::Range {
                generation,
                start,
                end,
            },
        }
    }
}

#[derive(Resource, Default, Debug)]
pub struct FloatStore {
    generation: u64,
    query: Option<FloatQuery>,
    readings: Vec<SensorReading>,
    frame_index: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl FloatStore {
    /// Start a new query and return the command to send.
    ///
    /// Switching between snapshot and range discards the readings of the other form;
    /// a parameter change within the same form keeps showing the old readings until the
    /// new ones arrive.
    pub fn issue(&mut self, query: FloatQuery) -> ApiCommand {
        let switched = self.query.is_some_and(|q| q.is_range() != query.is_range());
        if switched {
            self.readings.clear();
            self.frame_index = 0;
        }
        self.generation += 1;
        self.query = Some(query);
        self.loading = true;
        self.error = None;
        query.command(self.generation)
    }

    /// Re-issue the active query, e.g. after a failure.
    pub fn reissue(&mut self) -> Option<ApiCommand> {
        let query = self.query?;
        Some(self.issue(query))
    }

    /// Accept a worker result. Returns false if it belongs to a superseded query.
    pub fn apply(&mut self, generation: u64, result: Result<Vec<SensorReading>, String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        match result {
            Ok(readings) => {
                self.readings = readings;
                self.frame_index = self.readings.len().saturating_sub(1);
                self.error = None;
            }
            Err(err) => {
                self.readings.clear();
                self.frame_index = 0;
                self.error = Some(err);
            }
        }
        true
    }

    pub fn query(&self) -> Option<FloatQuery> {
        self.query
    }

    pub fn is_range(&self) -> bool {
        self.query.is_some_and(|q| q.is_range())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Every reading of the current query, in server order.
    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Readings eligible for rendering: the whole snapshot, or the range sequence up to
    /// and including the frame index.
    pub fn visible(&self) -> &[SensorReading] {
        if self.is_range() {
            let end = (self.frame_index + 1).min(self.readings.len());
            &self.readings[..end]
        } else {
            &self.readings
        }
    }

    /// Step playback by one frame, wrapping to the start. Returns the newly revealed reading.
    pub fn advance_frame(&mut self) -> Option<&SensorReading> {
        if !self.is_range() || self.readings.is_empty() {
            return None;
        }
        self.frame_index = (self.frame_index + 1) % self.readings.len();
        self.readings.get(self.frame_index)
    }

    /// The whole range sequence of one platform, regardless of the frame index.
    pub fn platform_track(&self, platform_id: PlatformId) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter().filter(move |r| r.platform_id == platform_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::coordinates::GeoCoord;

    pub(crate) fn reading(platform_id: PlatformId, lon: f64, lat: f64) -> SensorReading {
        SensorReading {
            platform_id,
            coord: GeoCoord::new(lon, lat),
            observed_at: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn range_query() -> FloatQuery {
        FloatQuery::Range {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
        }
    }

    fn generation_of(cmd: &ApiCommand) -> u64 {
        match cmd {
            ApiCommand::Snapshot { generation, .. }
            | ApiCommand::Range { generation, .. }
            | ApiCommand::Detail { generation, .. } => *generation,
            ApiCommand::Boundary { .. } => 0,
        }
    }

    #[test]
    fn later_query_wins_when_answers_arrive_out_of_order() {
        let mut store = FloatStore::default();
        let a = store.issue(FloatQuery::Snapshot { year: 2022, limit: 10 });
        let b = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 });

        assert!(store.apply(generation_of(&b), Ok(vec![reading(2023, 0.0, 0.0)])));
        assert!(!store.apply(generation_of(&a), Ok(vec![reading(2022, 0.0, 0.0)])));

        assert_eq!(store.readings().len(), 1);
        assert_eq!(store.readings()[0].platform_id, 2023);
        assert!(!store.loading);
    }

    #[test]
    fn stale_failure_does_not_clear_fresh_data() {
        let mut store = FloatStore::default();
        let a = store.issue(FloatQuery::Snapshot { year: 2022, limit: 10 });
        let b = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 });
        store.apply(generation_of(&b), Ok(vec![reading(1, 0.0, 0.0)]));
        assert!(!store.apply(generation_of(&a), Err("timeout".into())));
        assert!(store.error.is_none());
        assert_eq!(store.visible().len(), 1);
    }

    #[test]
    fn failure_clears_working_set() {
        let mut store = FloatStore::default();
        let cmd = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 });
        store.apply(generation_of(&cmd), Ok(vec![reading(1, 0.0, 0.0)]));

        let cmd = store.issue(FloatQuery::Snapshot { year: 2024, limit: 10 });
        assert!(store.apply(generation_of(&cmd), Err("HTTP 500".into())));
        assert!(store.visible().is_empty());
        assert_eq!(store.error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn cumulative_playback_reveals_prefix() {
        let mut store = FloatStore::default();
        let cmd = store.issue(range_query());
        let rows: Vec<_> = (0..5).map(|i| reading(i, i as f64, 0.0)).collect();
        store.apply(generation_of(&cmd), Ok(rows));

        // range load starts at the last frame
        assert_eq!(store.frame_index(), 4);
        assert_eq!(store.visible().len(), 5);

        // wrap to 0, then step to 2
        assert_eq!(store.advance_frame().map(|r| r.platform_id), Some(0));
        assert_eq!(store.visible().len(), 1);
        store.advance_frame();
        store.advance_frame();
        assert_eq!(store.frame_index(), 2);
        let ids: Vec<_> = store.visible().iter().map(|r| r.platform_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn visible_set_grows_until_wrap() {
        let mut store = FloatStore::default();
        let cmd = store.issue(range_query());
        store.apply(generation_of(&cmd), Ok((0..4).map(|i| reading(i, 0.0, 0.0)).collect()));
        store.advance_frame();
        let mut last = store.visible().len();
        for _ in 0..3 {
            store.advance_frame();
            assert!(store.visible().len() > last);
            last = store.visible().len();
        }
        store.advance_frame();
        assert_eq!(store.visible().len(), 1);
    }

    #[test]
    fn snapshot_ignores_frames() {
        let mut store = FloatStore::default();
        let cmd = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 });
        store.apply(generation_of(&cmd), Ok(vec![reading(1, 0.0, 0.0), reading(2, 0.0, 0.0)]));
        assert!(store.advance_frame().is_none());
        assert_eq!(store.visible().len(), 2);
    }

    #[test]
    fn switching_forms_discards_other_data() {
        let mut store = FloatStore::default();
        let cmd = store.issue(FloatQuery::Snapshot { year: 2023, limit: 10 });
        store.apply(generation_of(&cmd), Ok(vec![reading(1, 0.0, 0.0)]));

        store.issue(FloatQuery::Snapshot { year: 2024, limit: 10 });
        assert_eq!(store.visible().len(), 1, "same form keeps last-known data while loading");

        store.issue(range_query());
        assert!(store.visible().is_empty());
        assert!(store.loading);
    }

    #[test]
    fn platform_track_spans_whole_range() {
        let mut store = FloatStore::default();
        let cmd = store.issue(range_query());
        let rows = vec![reading(7, 0.0, 0.0), reading(8, 1.0, 0.0), reading(7, 2.0, 0.0)];
        store.apply(generation_of(&cmd), Ok(rows));
        store.advance_frame();
        assert_eq!(store.visible().len(), 1);
        assert_eq!(store.platform_track(7).count(), 2);
    }
}
