//! Geofence zones and containment evaluation.
//!
//! A zone is either a polygon or a circle. When a zone carries both, the
//! polygon wins; when it carries neither (or an incomplete circle) it never
//! contains anything. Evaluation is tolerant: malformed vertices or circle
//! fields make that one zone non-matching and evaluation moves on.
//!
//! Strict checks live in [`GeofenceZone::validate`], which the configuration
//! boundary runs before a zone is accepted. The evaluator does not call it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geodesy::{distance_meters, point_in_polygon, LatLon};
use crate::model::ZoneId;
use crate::numeric::Numeric;

/// A named geofence region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceZone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_latitude: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_longitude: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<Numeric>,
    /// Vertices as `[lat, lon]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vertex>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// One polygon entry as configured.
///
/// Entries that are not arrays (`null`, a bare number, an object) are kept
/// as [`Vertex::Other`] so only the owning zone turns malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Vertex {
    Pair(Vec<Numeric>),
    Other(serde_json::Value),
}

impl Vertex {
    /// The parsed `(lat, lon)` of an array entry. Extra components are ignored.
    pub fn lat_lon(&self) -> Option<LatLon> {
        let Vertex::Pair(components) = self else {
            return None;
        };
        let lat = components.first()?.as_f64()?;
        let lon = components.get(1)?.as_f64()?;
        Some(LatLon::new(lat, lon))
    }
}

impl From<Vec<Numeric>> for Vertex {
    fn from(components: Vec<Numeric>) -> Self {
        Vertex::Pair(components)
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((lat, lon): (f64, f64)) -> Self {
        Vertex::Pair(vec![Numeric::Number(lat), Numeric::Number(lon)])
    }
}

/// Geometry a zone resolves to at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneShape {
    /// Polygon with every vertex parsed.
    Polygon(Vec<LatLon>),
    /// Polygon present but at least one vertex is unusable.
    MalformedPolygon,
    /// Circle with parsed centre and radius in metres.
    Circle { center: LatLon, radius_m: f64 },
    /// All circle fields present but at least one is unusable.
    MalformedCircle,
    /// Neither a polygon nor a complete circle.
    Undefined,
}

impl ZoneShape {
    pub fn kind(&self) -> &'static str {
        match self {
            ZoneShape::Polygon(_) | ZoneShape::MalformedPolygon => "polygon",
            ZoneShape::Circle { .. } | ZoneShape::MalformedCircle => "circle",
            ZoneShape::Undefined => "undefined",
        }
    }
}

impl GeofenceZone {
    /// Circular zone helper.
    pub fn circle(id: ZoneId, name: impl Into<String>, lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            id,
            name: name.into(),
            center_latitude: Some(Numeric::Number(lat)),
            center_longitude: Some(Numeric::Number(lon)),
            radius_meters: Some(Numeric::Number(radius_m)),
            polygon: None,
            is_active: true,
        }
    }

    /// Polygonal zone helper from `(lat, lon)` pairs.
    pub fn polygon(id: ZoneId, name: impl Into<String>, vertices: &[(f64, f64)]) -> Self {
        Self {
            id,
            name: name.into(),
            center_latitude: None,
            center_longitude: None,
            radius_meters: None,
            polygon: Some(vertices.iter().copied().map(Vertex::from).collect()),
            is_active: true,
        }
    }

    /// Builder-style toggle of the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    fn has_polygon(&self) -> bool {
        self.polygon.as_ref().is_some_and(|p| !p.is_empty())
    }

    fn circle_fields(&self) -> Option<(&Numeric, &Numeric, &Numeric)> {
        match (&self.center_latitude, &self.center_longitude, &self.radius_meters) {
            (Some(lat), Some(lon), Some(radius)) => Some((lat, lon, radius)),
            _ => None,
        }
    }

    /// Resolve the zone's geometry, applying polygon-over-circle precedence.
    pub fn shape(&self) -> ZoneShape {
        if let Some(raw) = self.polygon.as_ref().filter(|p| !p.is_empty()) {
            return match parse_vertices(raw) {
                Some(vertices) => ZoneShape::Polygon(vertices),
                None => ZoneShape::MalformedPolygon,
            };
        }

        match self.circle_fields() {
            Some((lat, lon, radius)) => match (lat.as_f64(), lon.as_f64(), radius.as_f64()) {
                (Some(lat), Some(lon), Some(radius_m)) => ZoneShape::Circle {
                    center: LatLon::new(lat, lon),
                    radius_m,
                },
                _ => ZoneShape::MalformedCircle,
            },
            None => ZoneShape::Undefined,
        }
    }

    /// Whether the point lies inside this zone. Circle boundaries are inclusive.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match self.shape() {
            ZoneShape::Polygon(vertices) => point_in_polygon(lat, lon, &vertices),
            ZoneShape::Circle { center, radius_m } => {
                distance_meters(lat, lon, center.lat, center.lon) <= radius_m
            }
            ZoneShape::MalformedPolygon | ZoneShape::MalformedCircle => {
                debug!(zone_id = self.id, zone = %self.name, "skipping zone with malformed geometry");
                false
            }
            ZoneShape::Undefined => false,
        }
    }

    /// Strict configuration check run before a zone is accepted.
    ///
    /// Rejects dual polygon/circle configuration, partial circles, polygons
    /// with fewer than three vertices, malformed or out-of-range coordinates,
    /// and non-positive radii.
    pub fn validate(&self) -> Result<()> {
        let label = self.label();

        if self.name.trim().is_empty() {
            return Err(Error::invalid_zone(label, "name cannot be empty"));
        }

        let circle_present = [
            &self.center_latitude,
            &self.center_longitude,
            &self.radius_meters,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count();

        match (self.has_polygon(), circle_present) {
            (true, 0) => self.validate_polygon(&label),
            (true, _) => Err(Error::invalid_zone(
                label,
                "zone defines both a polygon and a circle",
            )),
            (false, 3) => self.validate_circle(&label),
            (false, 0) => Err(Error::invalid_zone(
                label,
                "zone defines neither a polygon nor a complete circle",
            )),
            (false, _) => Err(Error::invalid_zone(
                label,
                "circle requires center_latitude, center_longitude and radius_meters",
            )),
        }
    }

    fn validate_polygon(&self, label: &str) -> Result<()> {
        let raw = self.polygon.as_deref().unwrap_or_default();
        if raw.len() < 3 {
            return Err(Error::invalid_zone(
                label,
                format!("polygon needs at least 3 vertices, got {}", raw.len()),
            ));
        }

        for (index, vertex) in raw.iter().enumerate() {
            let Vertex::Pair(components) = vertex else {
                return Err(Error::invalid_zone(
                    label,
                    format!("vertex {index} must be a [lat, lon] pair"),
                ));
            };
            if components.len() != 2 {
                return Err(Error::invalid_zone(
                    label,
                    format!("vertex {index} must be a [lat, lon] pair"),
                ));
            }
            let (Some(lat), Some(lon)) = (components[0].as_f64(), components[1].as_f64()) else {
                return Err(Error::invalid_zone(
                    label,
                    format!("vertex {index} is not numeric"),
                ));
            };
            check_coordinate_range(label, &format!("vertex {index}"), lat, lon)?;
        }
        Ok(())
    }

    fn validate_circle(&self, label: &str) -> Result<()> {
        let ZoneShape::Circle { center, radius_m } = self.shape() else {
            return Err(Error::invalid_zone(label, "circle fields must be numeric"));
        };
        check_coordinate_range(label, "center", center.lat, center.lon)?;
        if radius_m <= 0.0 {
            return Err(Error::invalid_zone(
                label,
                "radius_meters must be a positive number",
            ));
        }
        Ok(())
    }

    fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("#{}", self.id)
        } else {
            format!("#{} '{}'", self.id, self.name)
        }
    }
}

fn check_coordinate_range(label: &str, what: &str, lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::invalid_zone(
            label,
            format!("{what} latitude {lat} is outside [-90, 90]"),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::invalid_zone(
            label,
            format!("{what} longitude {lon} is outside [-180, 180]"),
        ));
    }
    Ok(())
}

/// A missing, non-numeric, or non-array entry fails the whole polygon.
fn parse_vertices(raw: &[Vertex]) -> Option<Vec<LatLon>> {
    raw.iter().map(Vertex::lat_lon).collect()
}

/// Zones with `is_active = true`, in configuration order.
pub fn active_zones(zones: &[GeofenceZone]) -> impl Iterator<Item = &GeofenceZone> {
    zones.iter().filter(|zone| zone.is_active)
}

/// Short-circuit OR of [`GeofenceZone::contains`] over `zones`.
///
/// `zones` is expected to be the active subset. An empty set is never inside.
pub fn is_inside_any_zone<'a, I>(lat: f64, lon: f64, zones: I) -> bool
where
    I: IntoIterator<Item = &'a GeofenceZone>,
{
    zones.into_iter().any(|zone| zone.contains(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::EARTH_RADIUS_M;

    fn square() -> GeofenceZone {
        GeofenceZone::polygon(
            1,
            "Square",
            &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)],
        )
    }

    #[test]
    fn polygon_zone_contains_centre() {
        let zone = square();
        assert!(zone.contains(5.0, 5.0));
        assert!(!zone.contains(50.0, 50.0));
    }

    #[test]
    fn circle_boundary_is_inclusive() {
        let boundary_lat = (1000.0 / EARTH_RADIUS_M).to_degrees();
        let exact = distance_meters(boundary_lat, 0.0, 0.0, 0.0);

        let zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, exact);
        assert!(zone.contains(boundary_lat, 0.0));

        let zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 1000.0);
        let beyond_lat = (1000.01 / EARTH_RADIUS_M).to_degrees();
        assert!(distance_meters(0.0, 0.0, beyond_lat, 0.0) > 1000.0);
        assert!(!zone.contains(beyond_lat, 0.0));
        assert!(zone.contains(0.0, 0.0));
    }

    #[test]
    fn point_at_radius_distance_is_inside_kilometre_circle() {
        let zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 1000.0);

        // Walk north from the centre until the last latitude still within 1000 m.
        let (mut inside, mut outside) = (0.0_f64, 0.1_f64);
        for _ in 0..200 {
            let mid = (inside + outside) / 2.0;
            if distance_meters(mid, 0.0, 0.0, 0.0) <= 1000.0 {
                inside = mid;
            } else {
                outside = mid;
            }
        }

        let d = distance_meters(inside, 0.0, 0.0, 0.0);
        assert!(d <= 1000.0 && d > 999.999_999, "bisection landed at {d}");
        assert!(zone.contains(inside, 0.0));
        assert!(!zone.contains(outside, 0.0));
    }

    #[test]
    fn polygon_takes_precedence_over_circle() {
        // The circle would contain (50, 50); the polygon does not.
        let mut zone = square();
        zone.center_latitude = Some(Numeric::Number(50.0));
        zone.center_longitude = Some(Numeric::Number(50.0));
        zone.radius_meters = Some(Numeric::Number(10_000.0));

        assert!(matches!(zone.shape(), ZoneShape::Polygon(_)));
        assert!(!zone.contains(50.0, 50.0));
        assert!(zone.contains(5.0, 5.0));
    }

    #[test]
    fn malformed_polygon_does_not_fall_back_to_circle() {
        let mut zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 5_000.0);
        zone.polygon = Some(vec![
            vec![Numeric::from("abc"), Numeric::Number(0.0)].into(),
            (1.0, 1.0).into(),
            (0.0, 1.0).into(),
        ]);

        assert_eq!(zone.shape(), ZoneShape::MalformedPolygon);
        assert!(!zone.contains(0.0, 0.0));
    }

    #[test]
    fn short_vertex_entry_is_malformed() {
        let mut zone = square();
        if let Some(poly) = zone.polygon.as_mut() {
            poly[2] = vec![Numeric::Number(10.0)].into();
        }
        assert_eq!(zone.shape(), ZoneShape::MalformedPolygon);
        assert!(!zone.contains(5.0, 5.0));
    }

    #[test]
    fn decimal_text_vertices_are_accepted() {
        let mut zone = square();
        zone.polygon = Some(vec![
            vec![Numeric::from("0.000000"), Numeric::from("0.000000")].into(),
            vec![Numeric::from("0.000000"), Numeric::from("10.000000")].into(),
            vec![Numeric::from("10.000000"), Numeric::from("10.000000")].into(),
            vec![Numeric::from("10.000000"), Numeric::from("0.000000"), Numeric::Number(99.0)].into(),
        ]);
        assert!(zone.contains(5.0, 5.0));
    }

    #[test]
    fn empty_polygon_list_falls_back_to_circle() {
        let mut zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 5_000.0);
        zone.polygon = Some(vec![]);
        assert!(matches!(zone.shape(), ZoneShape::Circle { .. }));
        assert!(zone.contains(0.0, 0.0));
    }

    #[test]
    fn incomplete_or_malformed_circle_never_matches() {
        let mut zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 5_000.0);
        zone.radius_meters = None;
        assert_eq!(zone.shape(), ZoneShape::Undefined);
        assert!(!zone.contains(0.0, 0.0));

        let mut zone = GeofenceZone::circle(1, "Depot", 0.0, 0.0, 5_000.0);
        zone.radius_meters = Some(Numeric::from("wide"));
        assert_eq!(zone.shape(), ZoneShape::MalformedCircle);
        assert!(!zone.contains(0.0, 0.0));
    }

    #[test]
    fn degenerate_polygon_zone_never_matches() {
        let zone = GeofenceZone::polygon(1, "Line", &[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!zone.contains(5.0, 5.0));
    }

    #[test]
    fn any_zone_short_circuits_and_handles_empty_sets() {
        let zones = vec![
            GeofenceZone::polygon(1, "Broken", &[(0.0, 0.0)]),
            GeofenceZone::circle(2, "Far", 40.0, 40.0, 100.0),
            square(),
        ];
        assert!(is_inside_any_zone(5.0, 5.0, &zones));
        assert!(!is_inside_any_zone(-20.0, -20.0, &zones));
        let none: Vec<GeofenceZone> = Vec::new();
        assert!(!is_inside_any_zone(5.0, 5.0, &none));
    }

    #[test]
    fn active_zones_skips_inactive() {
        let zones = vec![
            square().with_active(false),
            GeofenceZone::circle(2, "Depot", 0.0, 0.0, 10.0),
        ];
        let active: Vec<ZoneId> = active_zones(&zones).map(|z| z.id).collect();
        assert_eq!(active, vec![2]);
    }

    #[test]
    fn zone_deserializes_from_configuration_json() {
        let json = r#"{
            "id": 4,
            "name": "Port",
            "polygon": [["18.0", "-16.0"], [18.0, -15.9], [18.1, -15.9]]
        }"#;
        let zone: GeofenceZone = serde_json::from_str(json).unwrap();
        assert!(zone.is_active);
        assert!(matches!(zone.shape(), ZoneShape::Polygon(ref v) if v.len() == 3));
    }

    #[test]
    fn non_array_vertices_make_only_the_polygon_malformed() {
        for entry in ["null", "true", "12.5", "\"x\"", "{\"lat\": 0}", "[0, null]"] {
            let json = format!(
                r#"{{"id": 5, "name": "Yard", "polygon": [[0, 0], {entry}, [1, 1]]}}"#
            );
            let zone: GeofenceZone = serde_json::from_str(&json).unwrap();
            assert_eq!(zone.shape(), ZoneShape::MalformedPolygon, "entry {entry}");
            assert_eq!(zone.shape().kind(), "polygon");
            assert!(!zone.contains(0.5, 0.2));
            assert!(zone.validate().is_err());
        }
    }

    #[test]
    fn validate_accepts_well_formed_zones() {
        assert!(square().validate().is_ok());
        assert!(GeofenceZone::circle(2, "Depot", 18.08, -15.97, 500.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_dual_configuration() {
        let mut zone = square();
        zone.radius_meters = Some(Numeric::Number(100.0));
        let err = zone.validate().unwrap_err();
        assert!(err.to_string().contains("both a polygon and a circle"));
    }

    #[test]
    fn validate_rejects_missing_geometry_and_partial_circles() {
        let mut zone = GeofenceZone::circle(2, "Depot", 0.0, 0.0, 10.0);
        zone.center_latitude = None;
        zone.center_longitude = None;
        zone.radius_meters = None;
        assert!(zone.validate().unwrap_err().to_string().contains("neither"));

        let mut zone = GeofenceZone::circle(2, "Depot", 0.0, 0.0, 10.0);
        zone.center_longitude = None;
        assert!(zone.validate().unwrap_err().to_string().contains("circle requires"));
    }

    #[test]
    fn validate_rejects_bad_polygons() {
        let zone = GeofenceZone::polygon(3, "Line", &[(0.0, 0.0), (1.0, 1.0)]);
        assert!(zone.validate().unwrap_err().to_string().contains("at least 3"));

        let zone = GeofenceZone::polygon(3, "Range", &[(0.0, 0.0), (95.0, 1.0), (1.0, 1.0)]);
        assert!(zone.validate().unwrap_err().to_string().contains("latitude"));

        let mut zone = square();
        if let Some(poly) = zone.polygon.as_mut() {
            poly[0] = vec![Numeric::from("x"), Numeric::Number(0.0)].into();
        }
        assert!(zone.validate().unwrap_err().to_string().contains("not numeric"));

        let mut zone = square();
        if let Some(poly) = zone.polygon.as_mut() {
            poly[1] = Vertex::Other(serde_json::Value::Null);
        }
        let err = zone.validate().unwrap_err();
        assert!(err.to_string().contains("vertex 1 must be a [lat, lon] pair"));
    }

    #[test]
    fn validate_rejects_bad_circles_and_blank_names() {
        let zone = GeofenceZone::circle(4, "Depot", 0.0, 0.0, 0.0);
        assert!(zone.validate().unwrap_err().to_string().contains("positive"));

        let zone = GeofenceZone::circle(4, "Depot", 0.0, 200.0, 10.0);
        assert!(zone.validate().unwrap_err().to_string().contains("longitude"));

        let zone = GeofenceZone::circle(4, "  ", 0.0, 0.0, 10.0);
        assert!(zone.validate().unwrap_err().to_string().contains("name"));
    }
}
