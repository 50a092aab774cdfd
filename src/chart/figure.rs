// Plotly figure model for the price chart.
// Serialized straight into the page; serde_json writes NaN as null, which
// Plotly draws as a gap.

use crate::data::series::{
    PriceSeries, CLOSE, DAILY_RETURN, EMA, HIGH, LOW, LOWER_BAND, OPEN, RSI, SMA, UPPER_BAND,
};
use crate::error::{PipelineError, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Candlestick(Candlestick),
    Scatter(Scatter),
}

#[derive(Debug, Serialize)]
pub struct Candlestick {
    pub name: String,
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub increasing: Direction,
    pub decreasing: Direction,
}

#[derive(Debug, Serialize)]
pub struct Direction {
    pub line: Line,
}

#[derive(Debug, Serialize)]
pub struct Scatter {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    pub line: Line,
    pub yaxis: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Layout {
    pub title: Text,
    pub template: &'static str,
    pub showlegend: bool,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis3: Option<Axis>,
}

#[derive(Debug, Serialize)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Axis {
    pub title: Text,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

#[derive(Debug, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Price,
    Rsi,
    Returns,
}

struct Overlay {
    column: &'static str,
    label: &'static str,
    line: Line,
    panel: Panel,
}

const fn solid(color: &'static str) -> Line {
    Line {
        color,
        width: Some(1.5),
        dash: None,
    }
}

const fn dashed(color: &'static str) -> Line {
    Line {
        color,
        width: Some(1.0),
        dash: Some("dash"),
    }
}

const OVERLAYS: [Overlay; 6] = [
    Overlay { column: SMA, label: "SMA", line: solid("blue"), panel: Panel::Price },
    Overlay { column: EMA, label: "EMA", line: solid("orange"), panel: Panel::Price },
    Overlay { column: UPPER_BAND, label: "Upper Band", line: dashed("gray"), panel: Panel::Price },
    Overlay { column: LOWER_BAND, label: "Lower Band", line: dashed("gray"), panel: Panel::Price },
    Overlay { column: RSI, label: "RSI", line: solid("purple"), panel: Panel::Rsi },
    Overlay { column: DAILY_RETURN, label: "Daily Return", line: solid("teal"), panel: Panel::Returns },
];

const PANEL_HEIGHT: f64 = 0.2;
const PANEL_GAP: f64 = 0.05;

/// Build the candlestick figure with an overlay for every indicator column
/// present. Absent indicators are skipped.
pub fn build_figure(series: &PriceSeries, ticker: &str) -> Result<Figure> {
    if series.is_empty() {
        return Err(PipelineError::Schema(
            "input data must be a non-empty price series".to_string(),
        ));
    }

    let x: Vec<String> = series.index().iter().map(|t| t.to_rfc3339()).collect();

    let mut data = vec![Trace::Candlestick(Candlestick {
        name: "Price".to_string(),
        x: x.clone(),
        open: series.require_column(OPEN)?.to_vec(),
        high: series.require_column(HIGH)?.to_vec(),
        low: series.require_column(LOW)?.to_vec(),
        close: series.require_column(CLOSE)?.to_vec(),
        increasing: Direction { line: solid("green") },
        decreasing: Direction { line: solid("red") },
    })];

    let present: Vec<&Overlay> = OVERLAYS
        .iter()
        .filter(|overlay| series.has_column(overlay.column))
        .collect();

    // Lower panels stack beneath the price panel in a fixed order
    let mut lower_panels: Vec<Panel> = Vec::new();
    for panel in [Panel::Rsi, Panel::Returns] {
        if present.iter().any(|overlay| overlay.panel == panel) {
            lower_panels.push(panel);
        }
    }
    let axis_for = |panel: Panel| -> &'static str {
        match lower_panels.iter().position(|p| *p == panel) {
            Some(0) => "y2",
            Some(_) => "y3",
            None => "y",
        }
    };

    for overlay in &present {
        let values = series.column(overlay.column).unwrap_or_default();
        data.push(Trace::Scatter(Scatter {
            name: overlay.label.to_string(),
            x: x.clone(),
            y: values.to_vec(),
            mode: "lines",
            line: overlay.line.clone(),
            yaxis: axis_for(overlay.panel),
        }));
    }

    let panel_axis = |slot: usize, panel: Panel| {
        let bottom = (lower_panels.len() - 1 - slot) as f64 * (PANEL_HEIGHT + PANEL_GAP);
        Axis {
            title: Text {
                text: match panel {
                    Panel::Rsi => "RSI".to_string(),
                    _ => "Return".to_string(),
                },
            },
            domain: Some([bottom, bottom + PANEL_HEIGHT]),
            anchor: Some("x"),
            rangeslider: None,
        }
    };

    let price_bottom = lower_panels.len() as f64 * (PANEL_HEIGHT + PANEL_GAP);
    let layout = Layout {
        title: Text {
            text: format!("{} Stock Analysis", ticker),
        },
        template: "plotly_white",
        showlegend: true,
        xaxis: Axis {
            title: Text {
                text: "Date".to_string(),
            },
            domain: None,
            anchor: None,
            rangeslider: Some(RangeSlider { visible: false }),
        },
        yaxis: Axis {
            title: Text {
                text: "Price ($)".to_string(),
            },
            domain: if lower_panels.is_empty() {
                None
            } else {
                Some([price_bottom, 1.0])
            },
            anchor: None,
            rangeslider: None,
        },
        yaxis2: lower_panels.first().map(|panel| panel_axis(0, *panel)),
        yaxis3: lower_panels.get(1).map(|panel| panel_axis(1, *panel)),
    };

    Ok(Figure { data, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series_from_closes;
    use crate::indicators::IndicatorCalculator;

    fn ohlc(closes: &[f64]) -> PriceSeries {
        let series = series_from_closes(closes);
        let open: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let high: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        series
            .with_column(OPEN, open)
            .unwrap()
            .with_column(HIGH, high)
            .unwrap()
            .with_column(LOW, low)
            .unwrap()
    }

    fn trace_names(figure: &Figure) -> Vec<String> {
        figure
            .data
            .iter()
            .map(|trace| match trace {
                Trace::Candlestick(c) => c.name.clone(),
                Trace::Scatter(s) => s.name.clone(),
            })
            .collect()
    }

    #[test]
    fn test_candlestick_only() {
        let figure = build_figure(&ohlc(&[1.0, 2.0, 3.0]), "AAPL").unwrap();

        assert_eq!(trace_names(&figure), vec!["Price"]);
        assert_eq!(figure.layout.title.text, "AAPL Stock Analysis");
        assert!(figure.layout.yaxis2.is_none());
    }

    #[test]
    fn test_overlays_for_present_columns() {
        let closes: Vec<f64> = (1..=40).map(f64::from).collect();
        let series = IndicatorCalculator::default().all(ohlc(&closes)).unwrap();
        let figure = build_figure(&series, "AAPL").unwrap();

        assert_eq!(
            trace_names(&figure),
            vec!["Price", "SMA", "EMA", "Upper Band", "Lower Band", "RSI", "Daily Return"]
        );
        assert!(figure.layout.yaxis2.is_some());
        assert!(figure.layout.yaxis3.is_some());
    }

    #[test]
    fn test_single_lower_panel_uses_y2() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        let series = crate::indicators::daily_return(ohlc(&closes)).unwrap();
        let figure = build_figure(&series, "AAPL").unwrap();

        match &figure.data[1] {
            Trace::Scatter(s) => assert_eq!(s.yaxis, "y2"),
            other => panic!("unexpected trace {:?}", other),
        }
        assert!(figure.layout.yaxis3.is_none());
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let closes: Vec<f64> = (1..=5).map(f64::from).collect();
        let series = crate::indicators::simple_moving_average(ohlc(&closes), 3).unwrap();
        let json = serde_json::to_value(build_figure(&series, "AAPL").unwrap()).unwrap();

        assert_eq!(json["data"][0]["type"], "candlestick");
        assert_eq!(json["data"][1]["type"], "scatter");
        assert!(json["data"][1]["y"][0].is_null());
        assert_eq!(json["data"][1]["y"][2], 2.0);
        assert_eq!(json["layout"]["xaxis"]["rangeslider"]["visible"], false);
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = build_figure(&PriceSeries::default(), "AAPL").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_missing_ohlc_rejected() {
        let err = build_figure(&series_from_closes(&[1.0]), "AAPL").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(ref msg) if msg.contains("open")));
    }
}
