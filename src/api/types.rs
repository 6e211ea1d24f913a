//! Float API data types and worker messages

use bevy::prelude::*;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender},
};

use crate::coastline::BoundaryDataset;
use crate::core::coordinates::GeoCoord;

/// Identifier of one float (platform).
pub type PlatformId = i64;

/// One observed float position.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorReading {
    pub platform_id: PlatformId,
    pub coord: GeoCoord,
    pub observed_at: NaiveDateTime,
}

/// One dossier row: a single depth sample of a profile.
#[derive(Clone, Debug, PartialEq)]
pub struct DossierRow {
    pub date: NaiveDateTime,
    pub depth_m: f64,
    pub temp_c: Option<f64>,
    pub sal_psu: Option<f64>,
}

/// One point of a float's trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct PathPoint {
    pub date: NaiveDateTime,
    pub coord: GeoCoord,
}

/// Time scope for dossier/path requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeWindow {
    Year(i32),
    Range { start: NaiveDate, end: NaiveDate },
}

/// Dossier plus path for a single platform.
#[derive(Clone, Debug, Default)]
pub struct FloatDetail {
    pub dossier: Vec<DossierRow>,
    pub path: Vec<PathPoint>,
}

/// Commands for the API worker thread
#[derive(Debug, Clone)]
pub enum ApiCommand {
    /// Latest position per platform for one year.
    Snapshot {
        generation: u64,
        year: i32,
        limit: u32,
    },
    /// Chronological positions across an inclusive date range.
    Range {
        generation: u64,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Dossier and path for one platform.
    Detail {
        generation: u64,
        platform_id: PlatformId,
        window: TimeWindow,
    },
    /// Static boundary dataset, URL or local path.
    Boundary { source: String },
}

/// Results from the API worker thread. Every float result echoes the generation of its
/// command so stale responses can be dropped.
#[derive(Debug)]
pub enum ApiResult {
    Positions {
        generation: u64,
        result: Result<Vec<SensorReading>, String>,
    },
    Detail {
        generation: u64,
        platform_id: PlatformId,
        result: Result<FloatDetail, String>,
    },
    Boundary {
        result: Result<BoundaryDataset, String>,
    },
}

/// Resource containing channels for communicating with the API worker thread
#[derive(Resource)]
pub struct ApiChannels {
    pub cmd_tx: Sender<ApiCommand>,
    pub res_rx: Arc<Mutex<Receiver<ApiResult>>>,
}

impl ApiChannels {
    /// Queue a command; a closed worker is logged, not fatal.
    pub fn send(&self, cmd: ApiCommand) -> bool {
        match self.cmd_tx.send(cmd) {
            Ok(()) => true,
            Err(err) => {
                error!("[API] worker unavailable, dropping {:?}", err.0);
                false
            }
        }
    }

    /// Drain every result that has arrived since the last call.
    pub fn drain(&self) -> Vec<ApiResult> {
        let Ok(guard) = self.res_rx.lock() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        while let Ok(msg) = guard.try_recv() {
            out.push(msg);
        }
        out
    }
}
