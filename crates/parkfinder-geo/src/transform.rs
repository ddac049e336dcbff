//! CRS transformation of raw datasets

use parkfinder_core::formats::{FormatDataset, RawRing};
use parkfinder_core::models::Crs;
use parkfinder_core::{ParkfinderError, Result};
use proj::Proj;

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Reproject every ring of a dataset into `to_crs`.
///
/// Returns the dataset untouched when it is already in the target CRS.
pub fn reproject_dataset(mut dataset: FormatDataset, to_crs: &Crs) -> Result<FormatDataset> {
    if crs_match(&dataset.crs, to_crs) {
        return Ok(dataset);
    }

    let from_epsg = dataset.crs.epsg;
    let to_epsg = to_crs.epsg;
    let reprojection_error = |reason: String| ParkfinderError::Reprojection {
        from_epsg,
        to_epsg,
        reason,
    };

    let from_proj = format!("EPSG:{}", from_epsg);
    let to_proj = format!("EPSG:{}", to_epsg);
    let proj = Proj::new_known_crs(&from_proj, &to_proj, None)
        .map_err(|e| reprojection_error(format!("Failed to create projection: {}", e)))?;

    for feature in &mut dataset.features {
        let rings: Result<Vec<RawRing>> = feature
            .rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|&[x, y]| {
                        proj.convert((x, y)).map(|(x, y)| [x, y]).map_err(|e| {
                            reprojection_error(format!(
                                "Projection failed for feature {}: {}",
                                feature.id, e
                            ))
                        })
                    })
                    .collect()
            })
            .collect();
        feature.rings = rings?;
    }

    tracing::info!(
        from_epsg,
        to_epsg,
        features = dataset.features.len(),
        "Reprojected dataset"
    );

    dataset.crs = to_crs.clone();
    Ok(dataset)
}
