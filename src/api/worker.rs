//! Background API worker
//!
//! A dedicated thread hosts a tokio runtime. Commands are received over a std channel and
//! each one runs as its own task, so responses can arrive in any order.

use bevy::prelude::*;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use crate::api::client::ApiClient;
use crate::api::types::{ApiChannels, ApiCommand, ApiResult};

/// Start the background API worker thread
pub fn start_api_worker(base_url: String) -> ApiChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<ApiCommand>();
    let (res_tx, res_rx) = mpsc::channel::<ApiResult>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                error!("[API] failed to start tokio runtime: {}", err);
                return;
            }
        };
        rt.block_on(async move {
            let client = ApiClient::new(base_url);

            while let Ok(cmd) = cmd_rx.recv() {
                let client = client.clone();
                let res_tx = res_tx.clone();
                tokio::spawn(async move {
                    let msg = execute(&client, cmd).await;
                    // The app may already be shutting down.
                    let _ = res_tx.send(msg);
                });
            }
        });
    });

    ApiChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

async fn execute(client: &ApiClient, cmd: ApiCommand) -> ApiResult {
    match cmd {
        ApiCommand::Snapshot {
            generation,
            year,
            limit,
        } => {
            let result = client.fetch_snapshot(year, limit).await;
            log_outcome("snapshot", generation, &result, |rows| rows.len());
            ApiResult::Positions {
                generation,
                result: result.map_err(|e| format!("{e:#}")),
            }
        }
        ApiCommand::Range {
            generation,
            start,
            end,
        } => {
            let result = client.fetch_range(start, end).await;
            log_outcome("range", generation, &result, |rows| rows.len());
            ApiResult::Positions {
                generation,
                result: result.map_err(|e| format!("{e:#}")),
            }
        }
        ApiCommand::Detail {
            generation,
            platform_id,
            window,
        } => {
            let result = client.fetch_detail(platform_id, window).await;
            log_outcome("detail", generation, &result, |d| d.dossier.len() + d.path.len());
            ApiResult::Detail {
                generation,
                platform_id,
                result: result.map_err(|e| format!("{e:#}")),
            }
        }
        ApiCommand::Boundary { source } => {
            let result = client.fetch_boundary(&source).await;
            log_outcome("boundary", 0, &result, |d| d.features.len());
            ApiResult::Boundary {
                result: result.map_err(|e| format!("{e:#}")),
            }
        }
    }
}

fn log_outcome<T>(kind: &str, generation: u64, result: &anyhow::Result<T>, count: impl Fn(&T) -> usize) {
    match result {
        Ok(value) => info!("[API] {} gen={} OK ({} items)", kind, generation, count(value)),
        Err(err) => warn!("[API] {} gen={} FAILURE: {:#}", kind, generation, err),
    }
}
