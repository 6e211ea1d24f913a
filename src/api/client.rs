//! HTTP client for the float data API and the boundary dataset.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;

use crate::api::parse::{parse_dossier, parse_path, parse_range, parse_snapshot};
use crate::api::types::{FloatDetail, PlatformId, SensorReading, TimeWindow};
use crate::coastline::{BoundaryDataset, parse_boundary_geojson};

/// Whole-world bounding box; the viewer always asks for every float.
const WORLD_BOX: [(&str, &str); 4] = [
    ("min_lat", "-90"),
    ("max_lat", "90"),
    ("min_lon", "-180"),
    ("max_lon", "180"),
];

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_snapshot(&self, year: i32, limit: u32) -> Result<Vec<SensorReading>> {
        let url = snapshot_url(&self.base_url, year, limit)?;
        let body = self.get_json(url).await?;
        Ok(parse_snapshot(&body))
    }

    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SensorReading>> {
        let url = range_url(&self.base_url, start, end)?;
        let body = self.get_json(url).await?;
        Ok(parse_range(&body))
    }

    /// Dossier and path are requested concurrently; either failing fails the detail.
    pub async fn fetch_detail(&self, platform_id: PlatformId, window: TimeWindow) -> Result<FloatDetail> {
        let dossier_url = dossier_url(&self.base_url, platform_id, window)?;
        let path_url = path_url(&self.base_url, platform_id, window)?;
        let (dossier, path) = tokio::try_join!(self.get_json(dossier_url), self.get_json(path_url))?;
        Ok(FloatDetail {
            dossier: parse_dossier(&dossier),
            path: parse_path(&path),
        })
    }

    /// Boundary data from a URL, or from a local file for anything that is not http(s).
    pub async fn fetch_boundary(&self, source: &str) -> Result<BoundaryDataset> {
        let body = if source.starts_with("http://") || source.starts_with("https://") {
            self.get_text(Url::parse(source).with_context(|| format!("invalid boundary URL {source}"))?)
                .await?
        } else {
            tokio::fs::read_to_string(source)
                .await
                .with_context(|| format!("reading boundary file {source}"))?
        };
        parse_boundary_geojson(&body)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let body = self.get_text(url.clone()).await?;
        serde_json::from_str(&body).with_context(|| format!("invalid JSON from {url}"))
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }
        Ok(body)
    }
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), path))
        .with_context(|| format!("invalid API base URL {base_url}"))
}

pub fn snapshot_url(base_url: &str, year: i32, limit: u32) -> Result<Url> {
    let mut url = endpoint(base_url, "/api/floats_in_box")?;
    url.query_pairs_mut()
        .extend_pairs(WORLD_BOX)
        .append_pair("limit", &limit.to_string())
        .append_pair("year", &year.to_string());
    Ok(url)
}

pub fn range_url(base_url: &str, start: NaiveDate, end: NaiveDate) -> Result<Url> {
    let mut url = endpoint(base_url, "/api/floats_in_box/range")?;
    url.query_pairs_mut()
        .extend_pairs(WORLD_BOX)
        .append_pair("start_date", &start.format("%Y-%m-%d").to_string())
        .append_pair("end_date", &end.format("%Y-%m-%d").to_string());
    Ok(url)
}

pub fn dossier_url(base_url: &str, platform_id: PlatformId, window: TimeWindow) -> Result<Url> {
    windowed_url(base_url, platform_id, "dossier", window)
}

pub fn path_url(base_url: &str, platform_id: PlatformId, window: TimeWindow) -> Result<Url> {
    windowed_url(base_url, platform_id, "path", window)
}

/// `{kind}?year=` for a year window, `{kind}_range?start_date&end_date` for a range.
fn windowed_url(base_url: &str, platform_id: PlatformId, kind: &str, window: TimeWindow) -> Result<Url> {
    match window {
        TimeWindow::Year(year) => {
            let mut url = endpoint(base_url, &format!("/api/float/{platform_id}/{kind}"))?;
            url.query_pairs_mut().append_pair("year", &year.to_string());
            Ok(url)
        }
        TimeWindow::Range { start, end } => {
            let mut url = endpoint(base_url, &format!("/api/float/{platform_id}/{kind}_range"))?;
            url.query_pairs_mut()
                .append_pair("start_date", &start.format("%Y-%m-%d").to_string())
                .append_pair("end_date", &end.format("%Y-%m-%d").to_string());
            Ok(url)
        }
    }
}
