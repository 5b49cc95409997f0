// ============================================================
// Layer 6 — GeoJSON Writer
// ============================================================
// Saves grid cells as a GeoJSON FeatureCollection so they open
// directly in QGIS or any web map:
//
//   {
//     "type": "FeatureCollection",
//     "features": [
//       { "type": "Feature",
//         "geometry": { "type": "Polygon", "coordinates": [[[lon, lat], ...]] },
//         "properties": { "grid_id": 17, "row": 1, "col": 5, "point_count": 42 } }
//     ]
//   }
//
// Reference: RFC 7946, serde_json::json!

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::{fs, path::Path};

use crate::data::grid::GridCell;

pub fn grid_feature_collection(cells: &[GridCell]) -> Value {
    let features: Vec<Value> = cells
        .iter()
        .map(|c| {
            let ring: Vec<[f64; 2]> = c.ring.iter().map(|&(lon, lat)| [lon, lat]).collect();
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring],
                },
                "properties": {
                    "grid_id":     c.grid_id,
                    "row":         c.row,
                    "col":         c.col,
                    "point_count": c.point_count,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn write_grid_geojson(path: &Path, cells: &[GridCell]) -> Result<()> {
    let json = serde_json::to_string(&grid_feature_collection(cells))?;
    fs::write(path, json).with_context(|| format!("Cannot write GeoJSON '{}'", path.display()))?;
    tracing::debug!("Wrote {} grid cells to '{}'", cells.len(), path.display());
    Ok(())
}
