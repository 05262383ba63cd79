//! Library locations with usable coordinates

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::models::Library;

/// A library with numeric coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryLocation {
    /// Library code, when the API sent one
    pub code: Option<String>,
    /// Library name
    pub name: String,
    /// Street address
    pub address: Option<String>,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

fn coordinate(text: Option<&str>) -> Option<f64> {
    text?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keep libraries whose coordinates parse, dropping repeated library codes.
///
/// The first occurrence of a code wins, so results from earlier regions
/// take precedence.
pub fn collect_locations(libraries: &[Library]) -> Vec<LibraryLocation> {
    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    for library in libraries {
        let (Some(latitude), Some(longitude)) = (
            coordinate(library.latitude.as_deref()),
            coordinate(library.longitude.as_deref()),
        ) else {
            tracing::debug!(
                "Skipping {:?}: no valid coordinates",
                library.name.as_deref().unwrap_or("?")
            );
            continue;
        };

        if let Some(ref code) = library.code {
            if !seen.insert(code.clone()) {
                continue;
            }
        }

        locations.push(LibraryLocation {
            code: library.code.clone(),
            name: library.name.clone().unwrap_or_default(),
            address: library.address.clone(),
            latitude,
            longitude,
        });
    }

    locations
}

/// Render locations as a GeoJSON `FeatureCollection` of points
pub fn to_geojson(locations: &[LibraryLocation]) -> Value {
    let features: Vec<Value> = locations
        .iter()
        .map(|loc| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [loc.longitude, loc.latitude],
                },
                "properties": {
                    "code": loc.code,
                    "name": loc.name,
                    "address": loc.address,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fields;

    fn library(code: Option<&str>, name: &str, lat: Option<&str>, lon: Option<&str>) -> Library {
        let mut fields = Fields::new();
        if let Some(code) = code {
            fields.insert("libCode".into(), code.into());
        }
        fields.insert("libName".into(), name.into());
        if let Some(lat) = lat {
            fields.insert("latitude".into(), lat.into());
        }
        if let Some(lon) = lon {
            fields.insert("longitude".into(), lon.into());
        }
        Library::from_fields(fields)
    }

    #[test]
    fn test_invalid_coordinates_are_dropped() {
        let libraries = vec![
            library(Some("111017"), "어린이도서관", Some("37.5763001"), Some("126.968237")),
            library(Some("XXXXXX"), "Invalid Location Library", Some("invalid"), Some("invalid")),
            library(Some("YYYYYY"), "Missing Lon Library", Some("37.6"), None),
            library(Some("ZZZZZZ"), "Not A Number", Some("NaN"), Some("inf")),
        ];

        let locations = collect_locations(&libraries);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].code.as_deref(), Some("111017"));
        assert!((locations[0].latitude - 37.5763001).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let libraries = vec![
            library(Some("111004"), "정독도서관 (서울)", Some("37.5806"), Some("126.981")),
            library(Some("111004"), "정독도서관 (경기)", Some("37.0"), Some("127.0")),
            library(None, "코드 없음", Some("37.1"), Some("127.1")),
            library(None, "코드 없음 2", Some("37.2"), Some("127.2")),
        ];

        let locations = collect_locations(&libraries);
        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].name, "정독도서관 (서울)");
    }

    #[test]
    fn test_geojson_uses_lon_lat_order() {
        let locations = collect_locations(&[library(
            Some("111005"),
            "종로도서관",
            Some("37.5770"),
            Some("126.968"),
        )]);

        let geojson = to_geojson(&locations);
        assert_eq!(geojson["type"], "FeatureCollection");
        let point = &geojson["features"][0]["geometry"]["coordinates"];
        assert_eq!(point[0], 126.968);
        assert_eq!(point[1], 37.5770);
        assert_eq!(geojson["features"][0]["properties"]["code"], "111005");
    }
}
