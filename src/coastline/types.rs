//! Boundary (coastline/landmass) dataset types and GeoJSON decoding

use anyhow::{Context, Result};
use bevy::prelude::*;
use serde_json::Value;

use crate::core::coordinates::GeoCoord;

/// A closed ring or open path of coordinates.
pub type Ring = Vec<GeoCoord>;

/// Geometry kinds the point generator understands.
#[derive(Clone, Debug, PartialEq)]
pub enum BoundaryGeometry {
    /// Outer ring followed by holes.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    LineString(Ring),
    MultiLineString(Vec<Ring>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryFeature {
    pub geometry: BoundaryGeometry,
}

/// Every supported feature of the boundary document, loaded once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryDataset {
    pub features: Vec<BoundaryFeature>,
}

/// Decode a GeoJSON `FeatureCollection`, a single `Feature`, or a bare geometry.
///
/// Unsupported geometry kinds (points, collections) and malformed coordinates are skipped.
pub fn parse_boundary_geojson(body: &str) -> Result<BoundaryDataset> {
    let value: Value = serde_json::from_str(body).context("boundary dataset is not valid JSON")?;
    let mut features = Vec::new();
    let mut skipped = 0usize;

    let geometries: Vec<&Value> = match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => value
            .get("features")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|f| f.get("geometry")).collect())
            .unwrap_or_default(),
        Some("Feature") => value.get("geometry").into_iter().collect(),
        Some(_) => vec![&value],
        None => anyhow::bail!("boundary dataset has no GeoJSON type"),
    };

    for geometry in geometries {
        match parse_geometry(geometry) {
            Some(geometry) => features.push(BoundaryFeature { geometry }),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("[COAST] skipped {} unsupported or malformed geometries", skipped);
    }
    Ok(BoundaryDataset { features })
}

fn parse_geometry(value: &Value) -> Option<BoundaryGeometry> {
    let coords = value.get("coordinates")?;
    match value.get("type")?.as_str()? {
        "Polygon" => Some(BoundaryGeometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => Some(BoundaryGeometry::MultiPolygon(
            coords.as_array()?.iter().map(parse_rings).collect::<Option<_>>()?,
        )),
        "LineString" => Some(BoundaryGeometry::LineString(parse_ring(coords)?)),
        "MultiLineString" => Some(BoundaryGeometry::MultiLineString(parse_rings(coords)?)),
        _ => None,
    }
}

fn parse_rings(value: &Value) -> Option<Vec<Ring>> {
    value.as_array()?.iter().map(parse_ring).collect()
}

fn parse_ring(value: &Value) -> Option<Ring> {
    value.as_array()?.iter().map(parse_position).collect()
}

/// `[lon, lat, ...]`; extra ordinates such as altitude are ignored.
fn parse_position(value: &Value) -> Option<GeoCoord> {
    let arr = value.as_array()?;
    let lon = arr.first()?.as_f64()?;
    let lat = arr.get(1)?.as_f64()?;
    Some(GeoCoord::new(lon, lat))
}
