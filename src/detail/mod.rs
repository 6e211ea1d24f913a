//! Selected float detail
//!
//! Fetches the dossier and trajectory of the selected platform for the active time window,
//! summarises them for the side panel and draws the trajectory as a line strip.

use bevy::prelude::*;
use chrono::NaiveDateTime;

use crate::api::{ApiChannels, ApiCommand, FloatDetail, PlatformId, TimeWindow};
use crate::core::coordinates::{DOT_RADIUS, GeoCoord, ProjectionMode, project};
use crate::floats::{FloatStore, SelectionState};
use crate::picking::FloatSelected;
use crate::scene::{SceneRoot, ViewMode};

const PATH_COLOR: Color = Color::srgb(0.54, 0.17, 0.89);
/// Lift of the path above the dot layer, world units.
const PATH_LIFT: f32 = 0.005;

#[derive(Resource, Default, Debug)]
pub struct DetailState {
    generation: u64,
    pub platform: Option<PlatformId>,
    pub window: Option<TimeWindow>,
    /// Position of the clicked reading.
    pub position: Option<GeoCoord>,
    pub loading: bool,
    pub error: Option<String>,
    pub detail: Option<FloatDetail>,
}

impl DetailState {
    pub fn is_open(&self) -> bool {
        self.platform.is_some()
    }

    /// Start fetching a platform's detail; any in-flight request is superseded.
    pub fn request(&mut self, platform_id: PlatformId, window: TimeWindow) -> ApiCommand {
        self.generation += 1;
        self.platform = Some(platform_id);
        self.window = Some(window);
        self.loading = true;
        self.error = None;
        self.detail = None;
        ApiCommand::Detail {
            generation: self.generation,
            platform_id,
            window,
        }
    }

    /// Close the panel and ignore whatever is still in flight.
    pub fn close(&mut self) {
        self.generation += 1;
        self.platform = None;
        self.window = None;
        self.position = None;
        self.loading = false;
        self.error = None;
        self.detail = None;
    }

    /// Accept a worker result. Returns false if it is stale.
    pub fn apply(&mut self, generation: u64, platform_id: PlatformId, result: Result<FloatDetail, String>) -> bool {
        if generation != self.generation || self.platform != Some(platform_id) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.error = None;
            }
            Err(err) => {
                self.detail = None;
                self.error = Some(err);
            }
        }
        true
    }
}

/// Numbers shown in the detail panel
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetailSummary {
    pub rows: usize,
    pub depth_m: Option<(f64, f64)>,
    pub temp_c: Option<(f64, f64)>,
    pub sal_psu: Option<(f64, f64)>,
    pub path_points: usize,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn summarize(detail: &FloatDetail) -> DetailSummary {
    DetailSummary {
        rows: detail.dossier.len(),
        depth_m: min_max(detail.dossier.iter().map(|r| r.depth_m)),
        temp_c: min_max(detail.dossier.iter().filter_map(|r| r.temp_c)),
        sal_psu: min_max(detail.dossier.iter().filter_map(|r| r.sal_psu)),
        path_points: detail.path.len(),
        first_date: detail.path.iter().map(|p| p.date).min(),
        last_date: detail.path.iter().map(|p| p.date).max(),
    }
}

pub struct DetailPlugin;

impl Plugin for DetailPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DetailState>()
            .add_systems(Update, (sync_detail_request, draw_detail_path).chain());
    }
}

/// Keep the detail request in line with the selection and the store's time window.
fn sync_detail_request(
    mut selections: MessageReader<FloatSelected>,
    selection: Res<SelectionState>,
    store: Res<FloatStore>,
    channels: Res<ApiChannels>,
    mut detail: ResMut<DetailState>,
) {
    let clicked = selections.read().last().copied();
    let wanted = selection.selected().zip(store.query().map(|q| q.window()));
    match wanted {
        None if detail.is_open() => detail.close(),
        None => {}
        Some((platform_id, window)) => {
            if detail.platform != Some(platform_id) || detail.window != Some(window) {
                let cmd = detail.request(platform_id, window);
                channels.send(cmd);
            }
            if let Some(clicked) = clicked.filter(|c| c.platform_id == platform_id) {
                detail.position = Some(clicked.coord);
            }
        }
    }
}

fn draw_detail_path(
    mut gizmos: Gizmos,
    detail: Res<DetailState>,
    view: Res<ViewMode>,
    root: Single<&GlobalTransform, With<SceneRoot>>,
) {
    let Some(path) = detail.detail.as_ref().map(|d| &d.path) else {
        return;
    };
    if path.len() < 2 {
        return;
    }
    let mode = view.mode;
    gizmos.linestrip(
        path.iter()
            .map(|p| root.transform_point(lifted(project(p.coord, DOT_RADIUS, mode), mode))),
        PATH_COLOR,
    );
}

fn lifted(point: Vec3, mode: ProjectionMode) -> Vec3 {
    match mode {
        ProjectionMode::Globe => point + point.normalize_or_zero() * PATH_LIFT,
        ProjectionMode::Flat => point + Vec3::Y * PATH_LIFT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DossierRow, PathPoint};
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 5, day).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn newer_selection_supersedes_older_request() {
        let mut state = DetailState::default();
        let ApiCommand::Detail { generation: first, .. } = state.request(1, TimeWindow::Year(2023)) else {
            panic!("expected detail command");
        };
        let ApiCommand::Detail { generation: second, .. } = state.request(2, TimeWindow::Year(2023)) else {
            panic!("expected detail command");
        };
        assert!(!state.apply(first, 1, Ok(FloatDetail::default())));
        assert!(state.loading);
        assert!(state.apply(second, 2, Ok(FloatDetail::default())));
        assert!(!state.loading);
        assert!(state.detail.is_some());
    }

    #[test]
    fn closing_ignores_late_results() {
        let mut state = DetailState::default();
        let ApiCommand::Detail { generation, .. } = state.request(1, TimeWindow::Year(2023)) else {
            panic!("expected detail command");
        };
        state.close();
        assert!(!state.apply(generation, 1, Ok(FloatDetail::default())));
        assert!(!state.is_open());
        assert!(state.detail.is_none());
    }

    #[test]
    fn failure_is_reported() {
        let mut state = DetailState::default();
        let ApiCommand::Detail { generation, .. } = state.request(3, TimeWindow::Year(2022)) else {
            panic!("expected detail command");
        };
        assert!(state.apply(generation, 3, Err("HTTP 404".into())));
        assert_eq!(state.error.as_deref(), Some("HTTP 404"));
        assert!(state.detail.is_none());
    }

    #[test]
    fn summary_ranges() {
        let detail = FloatDetail {
            dossier: vec![
                DossierRow {
                    date: at(1),
                    depth_m: 5.0,
                    temp_c: Some(20.5),
                    sal_psu: None,
                },
                DossierRow {
                    date: at(1),
                    depth_m: 1500.0,
                    temp_c: Some(3.25),
                    sal_psu: Some(34.9),
                },
            ],
            path: vec![
                PathPoint {
                    date: at(9),
                    coord: GeoCoord::new(1.0, 2.0),
                },
                PathPoint {
                    date: at(3),
                    coord: GeoCoord::new(1.5, 2.5),
                },
            ],
        };
        let s = summarize(&detail);
        assert_eq!(s.rows, 2);
        assert_eq!(s.depth_m, Some((5.0, 1500.0)));
        assert_eq!(s.temp_c, Some((3.25, 20.5)));
        assert_eq!(s.sal_psu, Some((34.9, 34.9)));
        assert_eq!(s.path_points, 2);
        assert_eq!(s.first_date, Some(at(3)));
        assert_eq!(s.last_date, Some(at(9)));
    }

    #[test]
    fn path_sits_above_the_dots() {
        let coord = GeoCoord::new(30.0, 10.0);
        let globe = project(coord, DOT_RADIUS, ProjectionMode::Globe);
        assert!(lifted(globe, ProjectionMode::Globe).length() > globe.length());
        let flat = project(coord, DOT_RADIUS, ProjectionMode::Flat);
        assert!(lifted(flat, ProjectionMode::Flat).y > flat.y);
    }

    #[test]
    fn empty_detail_has_no_ranges() {
        let s = summarize(&FloatDetail::default());
        assert_eq!(s, DetailSummary::default());
    }
}
