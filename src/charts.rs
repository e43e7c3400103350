// Abstract chart specifications.
//
// A spec is everything a renderer needs to draw the figure: data bindings,
// titles, and display parameters. Nothing in this crate renders; specs are
// serialized as JSON next to the exported tables. Builders return
// `Ok(None)` for an empty frame, which callers surface as a "no data"
// notice instead of a chart.
use crate::error::InsightResult;
use crate::frame::{Frame, Value};
use crate::geo::GeoReference;
use crate::schema::col;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The fixed color-scale menu used by the maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScale {
    Viridis,
    Blues,
    Oranges,
    Reds,
    Purples,
}

/// Map projection framing the Indian subcontinent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoProjection {
    pub kind: String,
    pub parallels: [f64; 2],
    pub rotation_lat: f64,
    pub rotation_lon: f64,
    pub lon_range: [f64; 2],
    pub lat_range: [f64; 2],
}

impl GeoProjection {
    pub fn india() -> Self {
        GeoProjection {
            kind: "conic conformal".to_string(),
            parallels: [12.47, 35.17],
            rotation_lat: 24.0,
            rotation_lon: 80.0,
            lon_range: [68.0, 98.0],
            lat_range: [6.0, 38.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethSpec {
    pub title: String,
    /// Property path the renderer joins `locations` against.
    pub feature_id_key: String,
    pub locations: Vec<String>,
    pub values: Vec<f64>,
    pub color_scale: ColorScale,
    pub colorbar_title: String,
    pub marker_line_color: String,
    pub marker_line_width: f64,
    pub projection: GeoProjection,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSpec {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub hole: f64,
    pub text_info: Option<String>,
    pub pull: Option<f64>,
    pub color_sequence: Option<String>,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSpec {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub x_title: String,
    pub y_title: String,
    /// One color per category rather than a single series color.
    pub color_by_category: bool,
    pub text_auto: bool,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub title: String,
    pub x: Vec<Value>,
    pub y: Vec<f64>,
    pub x_title: String,
    pub y_title: String,
    pub markers: bool,
    pub y_tick_format: Option<String>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSpec {
    pub title: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per-point label column.
    pub text: Vec<String>,
    pub x_title: String,
    pub y_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartSpec {
    Choropleth(ChoroplethSpec),
    Pie(PieSpec),
    Bar(BarSpec),
    Line(LineSpec),
    Scatter(ScatterSpec),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Choropleth(s) => &s.title,
            ChartSpec::Pie(s) => &s.title,
            ChartSpec::Bar(s) => &s.title,
            ChartSpec::Line(s) => &s.title,
            ChartSpec::Scatter(s) => &s.title,
        }
    }
}

/// Column name to display label: underscores become spaces and each word is
/// title-cased (first letter upper, the rest lower), so `Transaction_amount`
/// reads "Transaction Amount" and `AppOpens` reads "Appopens".
pub fn prettify(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut start_of_word = true;
    for ch in column.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if start_of_word {
                out.extend(ch.to_uppercase());
                start_of_word = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            out.push(ch);
            start_of_word = true;
        }
    }
    out
}

/// State-level choropleth bound to the `State` column. Region keys absent
/// from the reference stay in the spec (they render unfilled) and are
/// logged.
pub fn choropleth(
    frame: &Frame,
    value_col: &str,
    title: &str,
    color_scale: ColorScale,
    value_suffix: &str,
    geo: &GeoReference,
) -> InsightResult<Option<ChartSpec>> {
    if frame.is_empty() {
        return Ok(None);
    }
    let locations = frame.column_strings(col::STATE)?;
    let values = frame.column_f64(value_col)?;
    let unmatched = geo.unmatched(locations.iter().map(String::as_str));
    if !unmatched.is_empty() {
        warn!(regions = ?unmatched, "region keys missing from the geographic reference");
    }
    Ok(Some(ChartSpec::Choropleth(ChoroplethSpec {
        title: title.to_string(),
        feature_id_key: "properties.State_Name".to_string(),
        locations,
        values,
        color_scale,
        colorbar_title: format!("{} ({})", prettify(value_col), value_suffix),
        marker_line_color: "white".to_string(),
        marker_line_width: 1.5,
        projection: GeoProjection::india(),
        height: 600,
    })))
}

pub fn pie(
    frame: &Frame,
    values_col: &str,
    names_col: &str,
    title: &str,
) -> InsightResult<Option<ChartSpec>> {
    if frame.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSpec::Pie(PieSpec {
        title: title.to_string(),
        labels: frame.column_strings(names_col)?,
        values: frame.column_f64(values_col)?,
        hole: 0.4,
        text_info: None,
        pull: None,
        color_sequence: None,
        height: 400,
    })))
}

pub fn bar(
    frame: &Frame,
    x_col: &str,
    y_col: &str,
    title: &str,
) -> InsightResult<Option<ChartSpec>> {
    if frame.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSpec::Bar(BarSpec {
        title: title.to_string(),
        x: frame.column_strings(x_col)?,
        y: frame.column_f64(y_col)?,
        x_title: prettify(x_col),
        y_title: prettify(y_col),
        color_by_category: true,
        text_auto: true,
        height: 400,
    })))
}

/// Line over a label or numeric x axis. Axis titles stay the raw column
/// names unless the caller overrides them.
pub fn line(
    frame: &Frame,
    x_col: &str,
    y_col: &str,
    title: &str,
) -> InsightResult<Option<ChartSpec>> {
    if frame.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSpec::Line(LineSpec {
        title: title.to_string(),
        x: frame.column_values(x_col)?,
        y: frame.column_f64(y_col)?,
        x_title: x_col.to_string(),
        y_title: y_col.to_string(),
        markers: true,
        y_tick_format: None,
        height: None,
    })))
}

pub fn scatter(
    frame: &Frame,
    x_col: &str,
    y_col: &str,
    text_col: &str,
    title: &str,
) -> InsightResult<Option<ChartSpec>> {
    if frame.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChartSpec::Scatter(ScatterSpec {
        title: title.to_string(),
        x: frame.column_f64(x_col)?,
        y: frame.column_f64(y_col)?,
        text: frame.column_strings(text_col)?,
        x_title: x_col.to_string(),
        y_title: y_col.to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_frame() -> Frame {
        let mut f = Frame::new(vec!["State".into(), "Amount_M".into()]);
        f.push_row(vec!["odisha".into(), 2.5.into()]).unwrap();
        f.push_row(vec!["maharashtra".into(), 7.0.into()]).unwrap();
        f
    }

    #[test]
    fn empty_frames_build_no_chart() {
        let empty = Frame::empty();
        let geo = GeoReference::empty();
        assert!(choropleth(&empty, "A", "t", ColorScale::Viridis, "₹M", &geo)
            .unwrap()
            .is_none());
        assert!(pie(&empty, "A", "B", "t").unwrap().is_none());
        assert!(bar(&empty, "A", "B", "t").unwrap().is_none());
        assert!(line(&empty, "A", "B", "t").unwrap().is_none());
        assert!(scatter(&empty, "A", "B", "C", "t").unwrap().is_none());
    }

    #[test]
    fn prettify_matches_display_labels() {
        assert_eq!(prettify("Transaction_amount"), "Transaction Amount");
        assert_eq!(prettify("Amount_M"), "Amount M");
        assert_eq!(prettify("AppOpens"), "Appopens");
        assert_eq!(prettify("Avg_Policy_Value"), "Avg Policy Value");
    }

    #[test]
    fn choropleth_binds_state_column_and_display_params() {
        let frame = state_frame();
        let spec = choropleth(
            &frame,
            "Amount_M",
            "Transaction Heatmap - 2023 Q1",
            ColorScale::Blues,
            "₹M",
            &GeoReference::empty(),
        )
        .unwrap()
        .unwrap();
        let ChartSpec::Choropleth(map) = spec else {
            panic!("expected a choropleth");
        };
        assert_eq!(map.locations, vec!["odisha", "maharashtra"]);
        assert_eq!(map.values, vec![2.5, 7.0]);
        assert_eq!(map.feature_id_key, "properties.State_Name");
        assert_eq!(map.colorbar_title, "Amount M (₹M)");
        assert_eq!(map.marker_line_width, 1.5);
        assert_eq!(map.projection.parallels, [12.47, 35.17]);
        assert_eq!(map.height, 600);
    }

    #[test]
    fn bar_prettifies_axis_titles() {
        let frame = state_frame();
        let spec = bar(&frame, "State", "Amount_M", "Top 10 States (₹M)")
            .unwrap()
            .unwrap();
        let ChartSpec::Bar(bar) = spec else {
            panic!("expected a bar");
        };
        assert_eq!(bar.x_title, "State");
        assert_eq!(bar.y_title, "Amount M");
        assert!(bar.text_auto);
        assert!(bar.color_by_category);
        assert_eq!(bar.height, 400);
    }

    #[test]
    fn line_keeps_raw_axis_titles() {
        let mut f = Frame::new(vec!["Years".into(), "Transaction_amount".into()]);
        f.push_row(vec![2022.into(), 10.0.into()]).unwrap();
        f.push_row(vec![2023.into(), 20.0.into()]).unwrap();
        let spec = line(&f, "Years", "Transaction_amount", "Yearly Transaction Growth")
            .unwrap()
            .unwrap();
        let ChartSpec::Line(line) = spec else {
            panic!("expected a line");
        };
        assert_eq!(line.x_title, "Years");
        assert_eq!(line.y_title, "Transaction_amount");
        assert!(line.markers);
        assert_eq!(line.x, vec![Value::Int(2022), Value::Int(2023)]);
    }

    #[test]
    fn specs_serialize_with_variant_tags() {
        let frame = state_frame();
        let spec = pie(&frame, "Amount_M", "State", "Share").unwrap().unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["Pie"]["hole"], 0.4);
        assert_eq!(json["Pie"]["labels"][0], "odisha");
    }
}
