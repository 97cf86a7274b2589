// Turns query rows into points a map front-end can draw directly. None of this feeds
// back into the pipeline.

use crate::config::MapConfig;
use crate::query::models::{ResultRow, ResultSet};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

const UNKNOWN_COLOR: [u8; 3] = [0xCC, 0xCC, 0xCC];
const ALPHA: u8 = 150;
const MAX_ELEVATION: f64 = 1000.0;
const NOT_AVAILABLE: &str = "N/A";

/// Property type to RGB, fixed at start-up.
#[derive(Debug, Clone)]
pub struct PropertyPalette {
    entries: Vec<(String, [u8; 3])>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LegendEntry {
    pub property_type: String,
    pub color: [u8; 3],
}

impl PropertyPalette {
    pub fn from_config(config: &MapConfig) -> Self {
        let entries = config
            .property_types
            .iter()
            .map(|entry| {
                let rgb = parse_hex(&entry.color).unwrap_or_else(|| {
                    warn!("Invalid color {:?} for {}, using grey", entry.color, entry.name);
                    UNKNOWN_COLOR
                });
                (entry.name.clone(), rgb)
            })
            .collect();
        Self { entries }
    }

    pub fn rgba(&self, property_type: Option<&str>) -> [u8; 4] {
        let [r, g, b] = property_type
            .and_then(|name| self.entries.iter().find(|(known, _)| known == name))
            .map(|(_, rgb)| *rgb)
            .unwrap_or(UNKNOWN_COLOR);
        [r, g, b, ALPHA]
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.entries
            .iter()
            .map(|(name, color)| LegendEntry {
                property_type: name.clone(),
                color: *color,
            })
            .collect()
    }
}

fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tooltip {
    pub address: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_feet: String,
    pub property_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub color: [u8; 4],
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub pitch: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapLayer {
    pub points: Vec<MapPoint>,
    pub viewport: Option<Viewport>,
    pub legend: Vec<LegendEntry>,
}

pub fn build_map_layer(results: &ResultSet, palette: &PropertyPalette) -> MapLayer {
    // Rows without a numeric price or position can't be placed
    let placed: Vec<(&ResultRow, f64, f64, f64)> = results
        .rows
        .iter()
        .filter_map(|row| {
            Some((
                row,
                number(row.get("price"))?,
                number(row.get("latitude"))?,
                number(row.get("longitude"))?,
            ))
        })
        .collect();

    let max_price = placed.iter().map(|(_, price, _, _)| *price).fold(0.0_f64, f64::max);

    let points: Vec<MapPoint> = placed
        .into_iter()
        .map(|(row, price, latitude, longitude)| MapPoint {
            latitude,
            longitude,
            elevation: if max_price > 0.0 { price / max_price * MAX_ELEVATION } else { 0.0 },
            color: palette.rgba(row.get("property_type").and_then(Value::as_str)),
            tooltip: Tooltip {
                address: display(row.get("address")),
                price: format_price(price),
                bedrooms: display(row.get("bedrooms")),
                bathrooms: display(row.get("bathrooms")),
                square_feet: display(row.get("square_feet")),
                property_type: display(row.get("property_type")),
            },
        })
        .collect();

    MapLayer {
        viewport: viewport(&points),
        points,
        legend: palette.legend(),
    }
}

pub fn viewport(points: &[MapPoint]) -> Option<Viewport> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let latitude = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let longitude = points.iter().map(|p| p.longitude).sum::<f64>() / n;

    let zoom = if points.len() == 1 {
        12
    } else {
        let span = |f: fn(&MapPoint) -> f64| {
            let (lo, hi) = points
                .iter()
                .map(f)
                .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
            hi - lo
        };
        let widest = span(|p| p.latitude).max(span(|p| p.longitude));
        if widest < 0.05 {
            13
        } else if widest < 0.2 {
            11
        } else {
            9
        }
    };

    Some(Viewport {
        latitude,
        longitude,
        zoom,
        pitch: 50,
    })
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Whole dollars with thousands separators, e.g. `$1,250,000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}${}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> ResultSet {
        ResultSet {
            columns: vec![],
            rows: values.into_iter().map(|v| v.as_object().unwrap().clone()).collect(),
        }
    }

    fn palette() -> PropertyPalette {
        PropertyPalette::from_config(&AppConfig::default().map)
    }

    #[test]
    fn formats_prices_like_listings() {
        assert_eq!(format_price(1_250_000.0), "$1,250,000");
        assert_eq!(format_price(999.6), "$1,000");
        assert_eq!(format_price(12.0), "$12");
    }

    #[test]
    fn colors_known_types_and_greys_out_the_rest() {
        let palette = palette();
        assert_eq!(palette.rgba(Some("Residential")), [0xca, 0x00, 0x20, 150]);
        assert_eq!(palette.rgba(Some("Castle")), [0xCC, 0xCC, 0xCC, 150]);
        assert_eq!(palette.rgba(None), [0xCC, 0xCC, 0xCC, 150]);
        assert_eq!(palette.legend().len(), 5);
    }

    #[test]
    fn builds_points_with_scaled_elevation_and_tooltips() {
        let results = rows(vec![
            json!({"address": "1 Main St", "price": 2000000.0, "latitude": 40.71, "longitude": -74.0,
                   "bedrooms": 3, "bathrooms": 2.5, "square_feet": null, "property_type": "Residential"}),
            json!({"address": "5 Pier Rd", "price": "500000", "latitude": 40.72, "longitude": -74.01,
                   "property_type": "Office"}),
            json!({"address": "Nowhere", "price": null, "latitude": 40.0, "longitude": -73.0}),
        ]);

        let layer = build_map_layer(&results, &palette());

        assert_eq!(layer.points.len(), 2);
        assert_eq!(layer.points[0].elevation, 1000.0);
        assert_eq!(layer.points[1].elevation, 250.0);
        assert_eq!(
            layer.points[0].tooltip,
            Tooltip {
                address: "1 Main St".into(),
                price: "$2,000,000".into(),
                bedrooms: "3".into(),
                bathrooms: "2.5".into(),
                square_feet: "N/A".into(),
                property_type: "Residential".into(),
            }
        );
        assert_eq!(layer.points[1].tooltip.bedrooms, "N/A");
        assert_eq!(layer.viewport.unwrap().zoom, 13);
    }

    #[test]
    fn viewport_zoom_follows_spread() {
        let at = |latitude: f64, longitude: f64| MapPoint {
            latitude,
            longitude,
            elevation: 0.0,
            color: [0; 4],
            tooltip: Tooltip {
                address: String::new(),
                price: String::new(),
                bedrooms: String::new(),
                bathrooms: String::new(),
                square_feet: String::new(),
                property_type: String::new(),
            },
        };

        assert!(viewport(&[]).is_none());
        assert_eq!(viewport(&[at(40.7, -74.0)]).unwrap().zoom, 12);
        assert_eq!(viewport(&[at(40.7, -74.0), at(40.8, -74.0)]).unwrap().zoom, 11);
        let wide = viewport(&[at(40.5, -74.2), at(40.9, -73.7)]).unwrap();
        assert_eq!(wide.zoom, 9);
        assert!((wide.latitude - 40.7).abs() < 1e-9);
        assert_eq!(wide.pitch, 50);
    }
}
