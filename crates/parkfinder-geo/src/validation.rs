use parkfinder_core::models::{PolygonGeometry, Ring};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// First error as "location: reason"
    pub fn summary(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }
}

/// Check a polygon against the feature invariant: at least one ring, every
/// ring closed with at least 4 points and 3 distinct vertices, all points
/// in range. A failing polygon is degenerate and will not be ranked.
pub fn validate_polygon(polygon: &PolygonGeometry) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if polygon.rings.is_empty() {
        result.add_error("Polygon".to_string(), "Polygon has no rings".to_string());
        return result;
    }

    for (i, ring) in polygon.rings.iter().enumerate() {
        let location = if i == 0 {
            "Polygon exterior".to_string()
        } else {
            format!("Polygon interior[{}]", i - 1)
        };
        validate_ring(ring, &location, &mut result);
    }

    result
}

fn validate_ring(ring: &Ring, location: &str, result: &mut ValidationResult) {
    if ring.len() < 4 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 4 points, found {}", ring.len()),
        );
    }

    if !ring.is_closed() {
        result.add_error(
            location.to_string(),
            "Ring must be closed (first point == last point)".to_string(),
        );
    }

    let open = ring.open_vertices();
    let distinct = open
        .iter()
        .enumerate()
        .filter(|(i, p)| !open[..*i].contains(p))
        .count();
    if distinct < 3 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 3 distinct vertices, found {}", distinct),
        );
    }

    for (i, point) in ring.points().iter().enumerate() {
        if let Err(e) = point.validate() {
            result.add_error(format!("{}[{}]", location, i), e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkfinder_core::models::GeoPoint;

    fn ring(coords: &[[f64; 2]]) -> Ring {
        Ring::new(coords.iter().map(|c| GeoPoint { latitude: c[1], longitude: c[0] }).collect())
    }

    #[test]
    fn test_valid_polygon() {
        let polygon = PolygonGeometry::new(vec![ring(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ])]);
        let result = validate_polygon(&polygon);
        assert!(result.is_valid);
        assert!(result.summary().is_none());
    }

    #[test]
    fn test_no_rings() {
        let result = validate_polygon(&PolygonGeometry::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_too_few_points() {
        let polygon = PolygonGeometry::new(vec![ring(&[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]])]);
        let result = validate_polygon(&polygon);
        assert!(!result.is_valid);
        // too short and only 2 distinct vertices
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_unclosed_ring() {
        let polygon = PolygonGeometry::new(vec![ring(&[
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ])]);
        let result = validate_polygon(&polygon);
        assert!(!result.is_valid);
        assert!(result.summary().unwrap().contains("closed"));
    }

    #[test]
    fn test_invalid_hole_location() {
        let outer = ring(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]]);
        let hole = ring(&[[1.0, 1.0], [2.0, 1.0], [1.0, 1.0]]);
        let result = validate_polygon(&PolygonGeometry::new(vec![outer, hole]));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].location, "Polygon interior[0]");
    }

    #[test]
    fn test_out_of_range_point() {
        let polygon = PolygonGeometry::new(vec![ring(&[
            [0.0, 0.0],
            [500000.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ])]);
        let result = validate_polygon(&polygon);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].location, "Polygon exterior[1]");
    }
}
