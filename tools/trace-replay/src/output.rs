use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use shuttle_core::GeoPosition;
use std::path::Path;

use crate::replay::ReplayStats;

fn line_string(path: &[GeoPosition]) -> Value {
    Value::LineString(
        path.iter()
            .map(|p| vec![p.longitude(), p.latitude()])
            .collect(),
    )
}

fn path_feature(path: &[GeoPosition], kind: &str) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert("kind".to_string(), serde_json::json!(kind));
    properties.insert("points".to_string(), serde_json::json!(path.len()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(line_string(path))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Build the raw trace and the rendered marker path as one FeatureCollection
pub fn report_geojson(trace: &[GeoPosition], rendered: &[GeoPosition], stats: &ReplayStats) -> GeoJson {
    let mut foreign_members = serde_json::Map::new();
    foreign_members.insert(
        "replay".to_string(),
        serde_json::json!({
            "accepted": stats.accepted,
            "dropped": stats.dropped,
            "frames": stats.frames,
            "max_backlog": stats.max_backlog,
            "settle_time_ms": stats.settle_time.as_millis() as u64,
        }),
    );

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: vec![path_feature(trace, "raw"), path_feature(rendered, "rendered")],
        foreign_members: Some(foreign_members),
    })
}

pub fn write_report(
    path: &Path,
    trace: &[GeoPosition],
    rendered: &[GeoPosition],
    stats: &ReplayStats,
) -> Result<()> {
    let geojson = report_geojson(trace, rendered, stats);

    std::fs::write(path, geojson.to_string())
        .with_context(|| format!("Failed to write output: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_has_both_paths() {
        let trace = vec![
            GeoPosition::new(23.8103, 90.4125).unwrap(),
            GeoPosition::new(23.8200, 90.4125).unwrap(),
        ];
        let stats = ReplayStats {
            accepted: 1,
            ..Default::default()
        };

        let GeoJson::FeatureCollection(fc) = report_geojson(&trace, &trace, &stats) else {
            panic!("expected a FeatureCollection");
        };

        assert_eq!(fc.features.len(), 2);
        let kinds: Vec<_> = fc
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["raw", "rendered"]);

        let Some(Geometry {
            value: Value::LineString(coords),
            ..
        }) = &fc.features[0].geometry
        else {
            panic!("expected a LineString");
        };
        assert_eq!(coords[1], vec![90.4125, 23.8200]);
        assert_eq!(fc.foreign_members.unwrap()["replay"]["accepted"], 1);
    }
}
