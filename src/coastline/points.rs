//! Boundary dataset to point cloud

use bevy::prelude::*;

use crate::coastline::types::{BoundaryDataset, BoundaryGeometry, Ring};
use crate::core::coordinates::{COAST_RADIUS, GeoCoord, ProjectionMode, project};

/// Finest interior fill grid, degrees. Finer spacing is raised to this.
pub const MIN_FILL_GRID_DEG: f64 = 0.05;

/// Density knobs for point generation.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct CoastlineSettings {
    /// Sub-steps between consecutive vertices of a single LineString or polygon ring.
    pub line_steps: u32,
    /// Sub-steps for MultiLineString members, kept lower to bound the point count.
    pub multiline_steps: u32,
    /// Also sample polygon interiors on a regular grid.
    pub fill_interiors: bool,
    /// Grid spacing for interior fill, degrees.
    pub fill_grid_deg: f64,
}

impl Default for CoastlineSettings {
    fn default() -> Self {
        Self {
            line_steps: 10,
            multiline_steps: 5,
            fill_interiors: false,
            fill_grid_deg: 0.5,
        }
    }
}

/// Generate every coastline point for `mode`, in scene-root space.
pub fn generate_points(dataset: &BoundaryDataset, mode: ProjectionMode, settings: &CoastlineSettings) -> Vec<Vec3> {
    let mut out = Vec::new();
    for feature in &dataset.features {
        match &feature.geometry {
            BoundaryGeometry::Polygon(rings) => polygon_points(rings, mode, settings, &mut out),
            BoundaryGeometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    polygon_points(rings, mode, settings, &mut out);
                }
            }
            BoundaryGeometry::LineString(line) => {
                if line.len() >= 2 {
                    outline_points(line, settings.line_steps, mode, &mut out);
                }
            }
            BoundaryGeometry::MultiLineString(lines) => {
                for line in lines.iter().filter(|l| l.len() >= 2) {
                    outline_points(line, settings.multiline_steps, mode, &mut out);
                }
            }
        }
    }
    out
}

/// Outer ring only, holes are ignored.
fn polygon_points(rings: &[Ring], mode: ProjectionMode, settings: &CoastlineSettings, out: &mut Vec<Vec3>) {
    let Some(outer) = rings.first() else { return };
    if outer.len() < 3 {
        return;
    }
    outline_points(outer, settings.line_steps, mode, out);
    if settings.fill_interiors {
        fill_points(outer, settings.fill_grid_deg, mode, out);
    }
}

/// Walk consecutive vertex pairs, emitting `steps` evenly spaced points per segment plus
/// the final vertex.
fn outline_points(path: &[GeoCoord], steps: u32, mode: ProjectionMode, out: &mut Vec<Vec3>) {
    let steps = steps.max(1);
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for i in 0..steps {
            let t = f64::from(i) / f64::from(steps);
            out.push(project(a.lerp(b, t), COAST_RADIUS, mode));
        }
    }
    if let Some(last) = path.last() {
        out.push(project(*last, COAST_RADIUS, mode));
    }
}

/// Regular lon/lat grid over the ring's bounding box, kept where the even-odd test passes.
fn fill_points(ring: &[GeoCoord], grid_deg: f64, mode: ProjectionMode, out: &mut Vec<Vec3>) {
    if grid_deg.is_nan() || grid_deg <= 0.0 {
        return;
    }
    let grid_deg = grid_deg.max(MIN_FILL_GRID_DEG);
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in ring {
        min_lon = min_lon.min(c.longitude);
        max_lon = max_lon.max(c.longitude);
        min_lat = min_lat.min(c.latitude);
        max_lat = max_lat.max(c.latitude);
    }

    let mut lat = (min_lat / grid_deg).ceil() * grid_deg;
    while lat <= max_lat {
        let mut lon = (min_lon / grid_deg).ceil() * grid_deg;
        while lon <= max_lon {
            let sample = GeoCoord::new(lon, lat);
            if point_in_ring(sample, ring) {
                out.push(project(sample, COAST_RADIUS, mode));
            }
            lon += grid_deg;
        }
        lat += grid_deg;
    }
}

/// Even-odd ray casting in lon/lat space.
pub fn point_in_ring(point: GeoCoord, ring: &[GeoCoord]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.latitude > point.latitude) != (b.latitude > point.latitude) {
            let cross_lon =
                (b.longitude - a.longitude) * (point.latitude - a.latitude) / (b.latitude - a.latitude) + a.longitude;
            if point.longitude < cross_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coastline::types::{BoundaryFeature, parse_boundary_geojson};

    fn ring(coords: &[(f64, f64)]) -> Ring {
        coords.iter().map(|&(lon, lat)| GeoCoord::new(lon, lat)).collect()
    }

    fn dataset(geometry: BoundaryGeometry) -> BoundaryDataset {
        BoundaryDataset {
            features: vec![BoundaryFeature { geometry }],
        }
    }

    #[test]
    fn single_polygon_on_flat_map_stays_on_plane() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "square" },
                "geometry": { "type": "Polygon", "coordinates": [[[-10,-10],[10,-10],[10,10],[-10,-10]]] }
            }]
        }"#;
        let dataset = parse_boundary_geojson(body).unwrap();
        let points = generate_points(&dataset, ProjectionMode::Flat, &CoastlineSettings::default());

        assert!(!points.is_empty());
        for p in &points {
            assert!((p.y - 0.01).abs() < 1e-6, "y = {}", p.y);
            assert!((-18.0..=18.0).contains(&p.x));
            assert!((-9.0..=9.0).contains(&p.z));
        }
    }

    #[test]
    fn globe_points_sit_on_coast_radius() {
        let data = dataset(BoundaryGeometry::LineString(ring(&[(0.0, 0.0), (30.0, 45.0), (60.0, -10.0)])));
        let points = generate_points(&data, ProjectionMode::Globe, &CoastlineSettings::default());
        for p in points {
            assert!((p.length() - COAST_RADIUS as f32).abs() < 1e-4);
        }
    }

    #[test]
    fn outline_density_follows_step_counts() {
        let settings = CoastlineSettings::default();
        let line = ring(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);

        let single = generate_points(&dataset(BoundaryGeometry::LineString(line.clone())), ProjectionMode::Flat, &settings);
        assert_eq!(single.len(), 2 * 10 + 1);

        let multi = generate_points(
            &dataset(BoundaryGeometry::MultiLineString(vec![line.clone(), line])),
            ProjectionMode::Flat,
            &settings,
        );
        assert_eq!(multi.len(), 2 * (2 * 5 + 1));
    }

    #[test]
    fn degenerate_rings_and_lines_are_skipped() {
        let settings = CoastlineSettings {
            fill_interiors: true,
            ..default()
        };
        let data = BoundaryDataset {
            features: vec![
                BoundaryFeature {
                    geometry: BoundaryGeometry::Polygon(vec![ring(&[(0.0, 0.0), (1.0, 1.0)])]),
                },
                BoundaryFeature {
                    geometry: BoundaryGeometry::Polygon(vec![]),
                },
                BoundaryFeature {
                    geometry: BoundaryGeometry::LineString(ring(&[(5.0, 5.0)])),
                },
                BoundaryFeature {
                    geometry: BoundaryGeometry::MultiPolygon(vec![vec![ring(&[])]]),
                },
            ],
        };
        assert!(generate_points(&data, ProjectionMode::Globe, &settings).is_empty());
    }

    #[test]
    fn holes_do_not_add_points() {
        let outer = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let hole = ring(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 4.0)]);
        let settings = CoastlineSettings::default();
        let with_hole = generate_points(
            &dataset(BoundaryGeometry::Polygon(vec![outer.clone(), hole])),
            ProjectionMode::Flat,
            &settings,
        );
        let without = generate_points(&dataset(BoundaryGeometry::Polygon(vec![outer])), ProjectionMode::Flat, &settings);
        assert_eq!(with_hole.len(), without.len());
    }

    #[test]
    fn fill_adds_interior_samples() {
        let square = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let outline_only = CoastlineSettings::default();
        let filled = CoastlineSettings {
            fill_interiors: true,
            fill_grid_deg: 1.0,
            ..default()
        };
        let data = dataset(BoundaryGeometry::Polygon(vec![square]));
        let a = generate_points(&data, ProjectionMode::Flat, &outline_only);
        let b = generate_points(&data, ProjectionMode::Flat, &filled);
        assert!(b.len() > a.len());
    }

    #[test]
    fn fill_grid_is_never_finer_than_the_minimum() {
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        let data = dataset(BoundaryGeometry::Polygon(vec![square]));
        let fill = |grid| CoastlineSettings {
            fill_interiors: true,
            fill_grid_deg: grid,
            ..default()
        };
        let tiny = generate_points(&data, ProjectionMode::Flat, &fill(1e-9));
        let floor = generate_points(&data, ProjectionMode::Flat, &fill(MIN_FILL_GRID_DEG));
        assert_eq!(tiny.len(), floor.len());
    }

    #[test]
    fn even_odd_rule() {
        let square = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert!(point_in_ring(GeoCoord::new(5.0, 5.0), &square));
        assert!(!point_in_ring(GeoCoord::new(15.0, 5.0), &square));
        assert!(!point_in_ring(GeoCoord::new(5.0, -1.0), &square));
        assert!(!point_in_ring(GeoCoord::new(5.0, 5.0), &[]));
    }
}
