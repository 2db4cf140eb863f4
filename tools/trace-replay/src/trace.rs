use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Value};
use shuttle_core::GeoPosition;
use std::path::Path;

/// Read recorded fixes from a GeoJSON file
pub fn read_trace(path: &Path) -> Result<Vec<GeoPosition>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {}", path.display()))?;

    parse_trace(&content).with_context(|| format!("No usable trace in: {}", path.display()))
}

pub fn parse_trace(content: &str) -> Result<Vec<GeoPosition>> {
    let geojson: GeoJson = content.parse().context("Failed to parse GeoJSON")?;

    match geojson {
        GeoJson::Geometry(geom) => geometry_to_trace(geom.value),
        GeoJson::Feature(feature) => match feature.geometry {
            Some(geom) => geometry_to_trace(geom.value),
            None => bail!("Feature has no geometry"),
        },
        GeoJson::FeatureCollection(fc) => {
            for feature in fc.features {
                if let Some(geom) = feature.geometry {
                    if let Ok(trace) = geometry_to_trace(geom.value) {
                        return Ok(trace);
                    }
                }
            }
            bail!("No LineString or MultiPoint found in FeatureCollection")
        }
    }
}

fn geometry_to_trace(value: Value) -> Result<Vec<GeoPosition>> {
    let coordinates = match value {
        Value::LineString(coordinates) | Value::MultiPoint(coordinates) => coordinates,
        _ => bail!("Unsupported geometry, expected LineString or MultiPoint"),
    };

    if coordinates.is_empty() {
        bail!("Trace has no coordinates");
    }

    coordinates
        .iter()
        .enumerate()
        .map(|(index, coordinate)| {
            let [longitude, latitude, ..] = coordinate.as_slice() else {
                bail!("Coordinate {index} has fewer than two values");
            };
            GeoPosition::new(*latitude, *longitude)
                .with_context(|| format!("Coordinate {index} is invalid"))
        })
        .collect()
}
