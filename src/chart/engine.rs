use thiserror::Error;
use tracing::debug;

use crate::models::{Anchor, Annotation, Bar};

/// One rendered line value at a bar index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub index: usize,
    pub value: f64,
}

/// A marker pinned at an anchor's literal stored price. The marker may sit
/// off the interpolated line; the line is a trend approximation while markers
/// show the exact anchor prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPoint {
    pub index: usize,
    pub anchor: Anchor,
}

/// Everything the chart surface needs to draw one committed annotation:
/// one line value per loaded bar index, plus the two anchor markers.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlan {
    pub line: Vec<LinePoint>,
    pub markers: [MarkerPoint; 2],
    pub slope: f64,
    pub intercept: f64,
}

/// Non-fatal render failures: the series stays on screen, the line and
/// markers are simply omitted.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("anchor date {0} not present in the loaded series")]
    MissingAnchorDate(chrono::NaiveDate),
    #[error("both anchors resolve to bar index {0}")]
    DegenerateAnchors(usize),
}

/// Computes the rendered trend-line for an annotation against the currently
/// loaded bar series.
///
/// The line is a function of bar *index*, not raw time: bar spacing is
/// irregular (weekends and holidays are skipped), so interpolating over
/// timestamps would bend the line at every gap. Anchor dates are matched on
/// the date component only. Pure function of its inputs, so re-rendering
/// after the same commit is a no-op.
pub fn compute_line(annotation: &Annotation, bars: &[Bar]) -> Result<Option<LinePlan>, RenderError> {
    let Some((a1, a2)) = annotation.anchors() else {
        return Ok(None);
    };

    let index1 = index_of(bars, &a1)?;
    let index2 = index_of(bars, &a2)?;
    if index1 == index2 {
        // Zero run between the anchors; slope is undefined. Same handling
        // class as a missing anchor: report, draw nothing.
        return Err(RenderError::DegenerateAnchors(index1));
    }

    let slope = (a2.price - a1.price) / (index2 as f64 - index1 as f64);
    let intercept = a1.price - slope * index1 as f64;
    debug!("Annotation line: slope {} intercept {}", slope, intercept);

    let line = (0..bars.len())
        .map(|i| LinePoint { index: i, value: slope * i as f64 + intercept })
        .collect();

    Ok(Some(LinePlan {
        line,
        markers: [
            MarkerPoint { index: index1, anchor: a1 },
            MarkerPoint { index: index2, anchor: a2 },
        ],
        slope,
        intercept,
    }))
}

fn index_of(bars: &[Bar], anchor: &Anchor) -> Result<usize, RenderError> {
    bars.iter()
        .position(|b| b.date == anchor.date)
        .ok_or(RenderError::MissingAnchorDate(anchor.date))
}
