//! Geographic coordinates and the globe/flat projection.
//!
//! Every render-space position in the app comes out of [`project`]. Callers that want
//! points to share a surface must pass the same radius for all of them.

use bevy::math::{DVec3, Vec3};
use std::f64::consts::PI;

/// Radius of the ocean sphere mesh.
pub const OCEAN_RADIUS: f32 = 4.99;
/// Radius of the faint graticule wireframe.
pub const GRATICULE_RADIUS: f32 = 5.005;
/// Radius coastline points are projected onto.
pub const COAST_RADIUS: f64 = 5.015;
/// Radius float dots are projected onto, slightly above the coastline.
pub const DOT_RADIUS: f64 = 5.02;

/// Half extents of the flat map plane (36 x 18 units).
pub const FLAT_HALF_WIDTH: f64 = 18.0;
pub const FLAT_HALF_HEIGHT: f64 = 9.0;
/// Height of projected points above the flat plane, avoids z-fighting with the plane mesh.
pub const FLAT_HEIGHT_OFFSET: f64 = 0.01;
/// Height of the flat plane mesh itself.
pub const FLAT_PLANE_Y: f32 = -0.1;

/// Which surface geographic coordinates are projected onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    #[default]
    Globe,
    Flat,
}

impl ProjectionMode {
    pub fn is_globe(self) -> bool {
        matches!(self, ProjectionMode::Globe)
    }

    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Globe => ProjectionMode::Flat,
            ProjectionMode::Flat => ProjectionMode::Globe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectionMode::Globe => "3D globe",
            ProjectionMode::Flat => "2D map",
        }
    }
}

/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoCoord {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoCoord {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Linear interpolation in lon/lat space (not along a great circle).
    pub fn lerp(self, other: GeoCoord, t: f64) -> GeoCoord {
        GeoCoord {
            longitude: self.longitude + t * (other.longitude - self.longitude),
            latitude: self.latitude + t * (other.latitude - self.latitude),
        }
    }
}

/// Project a coordinate into render space.
///
/// Globe: spherical to Cartesian with the azimuth offset by 180 degrees. Flat: plate carree
/// onto the 36 x 18 plane, north towards -Z. Out-of-range input extrapolates, there is no
/// error case.
pub fn project(coord: GeoCoord, radius: f64, mode: ProjectionMode) -> Vec3 {
    project_f64(coord, radius, mode).as_vec3()
}

pub fn project_f64(coord: GeoCoord, radius: f64, mode: ProjectionMode) -> DVec3 {
    match mode {
        ProjectionMode::Globe => {
            let phi = (90.0 - coord.latitude) * (PI / 180.0);
            let theta = (coord.longitude + 180.0) * (PI / 180.0);
            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_theta, cos_theta) = theta.sin_cos();
            DVec3::new(
                -(radius * sin_phi * cos_theta),
                radius * cos_phi,
                radius * sin_phi * sin_theta,
            )
        }
        ProjectionMode::Flat => DVec3::new(
            (coord.longitude / 180.0) * FLAT_HALF_WIDTH,
            FLAT_HEIGHT_OFFSET,
            -(coord.latitude / 90.0) * FLAT_HALF_HEIGHT,
        ),
    }
}
