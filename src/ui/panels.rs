//! HUD text builders

use std::fmt::Write;

use crate::coastline::BoundaryState;
use crate::core::coordinates::ProjectionMode;
use crate::detail::{DetailState, summarize};
use crate::floats::{FloatStore, SelectionState};
use crate::playback::{PlaybackController, RecentActivity, TimeMode};

pub const KEY_HELP: &str = "[Tab] globe/map  [M] year/range  [Arrows] time  [Space] play  [+/-] speed\n\
[F] fill  [R] retry  [Esc] deselect";

/// Everything the status panel reads
pub struct StatusView<'a> {
    pub mode: ProjectionMode,
    pub controller: &'a PlaybackController,
    pub store: &'a FloatStore,
    pub boundary: &'a BoundaryState,
    pub selection: &'a SelectionState,
    pub recent: &'a RecentActivity,
}

fn status_flag(loading: bool, error: Option<&str>) -> String {
    match (loading, error) {
        (true, _) => "loading".to_string(),
        (false, Some(err)) => format!("error: {err}"),
        (false, None) => "ok".to_string(),
    }
}

pub fn status_text(view: &StatusView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "View: {}", view.mode.label());
    match view.controller.mode() {
        TimeMode::Year(year) => {
            let _ = writeln!(out, "Year: {year}");
        }
        TimeMode::Range { start, end, playing } => {
            let _ = writeln!(out, "Range: {start} .. {end}");
            let _ = writeln!(
                out,
                "Playback: {} @ {} ms",
                if playing { "playing" } else { "paused" },
                view.controller.frame_period().as_millis()
            );
            let total = view.store.readings().len();
            let frame = if total == 0 { 0 } else { view.store.frame_index() + 1 };
            let _ = writeln!(out, "Frame: {frame} / {total}");
        }
    }
    let _ = writeln!(
        out,
        "Floats: {} ({})",
        view.store.visible().len(),
        status_flag(view.store.loading, view.store.error.as_deref())
    );
    let _ = writeln!(
        out,
        "Coastline: {}",
        status_flag(view.boundary.loading, view.boundary.error.as_deref())
    );
    if let Some(hovered) = view.selection.hovered() {
        let _ = writeln!(out, "Hover: {hovered}");
    }
    if !view.recent.is_empty() {
        let _ = writeln!(out, "Recent:");
        for reading in view.recent.iter() {
            let _ = writeln!(
                out,
                "  {} {} ({:.2}, {:.2})",
                reading.observed_at.date(),
                reading.platform_id,
                reading.coord.latitude,
                reading.coord.longitude
            );
        }
    }
    out.push('\n');
    out.push_str(KEY_HELP);
    out
}

fn range_line(label: &str, range: Option<(f64, f64)>, unit: &str) -> String {
    match range {
        Some((lo, hi)) => format!("{label}: {lo:.2} .. {hi:.2} {unit}"),
        None => format!("{label}: n/a"),
    }
}

/// Detail panel body, or `None` when nothing is selected.
pub fn detail_text(detail: &DetailState) -> Option<String> {
    let platform = detail.platform?;
    let mut out = format!("Float {platform}\n");
    if let Some(pos) = detail.position {
        let _ = writeln!(out, "Position: {:.3}, {:.3}", pos.latitude, pos.longitude);
    }
    if detail.loading {
        out.push_str("Loading...\n");
        return Some(out);
    }
    if let Some(err) = &detail.error {
        let _ = writeln!(out, "Fetch failed: {err}");
        return Some(out);
    }
    let Some(data) = &detail.detail else {
        return Some(out);
    };
    let summary = summarize(data);
    let _ = writeln!(out, "Profile rows: {}", summary.rows);
    let _ = writeln!(out, "{}", range_line("Depth", summary.depth_m, "m"));
    let _ = writeln!(out, "{}", range_line("Temp", summary.temp_c, "degC"));
    let _ = writeln!(out, "{}", range_line("Salinity", summary.sal_psu, "PSU"));
    let _ = writeln!(out, "Path points: {}", summary.path_points);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        let _ = writeln!(out, "Path: {} .. {}", first.date(), last.date());
    }
    Some(out)
}
