//! Bar charts: chart definitions from a record and raster output.

use image::{Rgb, RgbImage};
use tracing::warn;

use tenantpulse_core::{CanonicalRecord, FieldValue};

/// Raster size of every chart, in pixels.
pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 420;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
const BLUE: [u8; 3] = [0x34, 0x98, 0xdb];
const GREEN: [u8; 3] = [0x2e, 0xcc, 0x71];
const RED: [u8; 3] = [0xe7, 0x4c, 0x3c];
const YELLOW: [u8; 3] = [0xf1, 0xc4, 0x0f];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: String,
    pub bars: Vec<Bar>,
}

/// Resolve required metrics by label prefix; `None` if any is missing.
fn resolve_counts(fields: &[(String, FieldValue)], prefixes: &[&str]) -> Option<Vec<u64>> {
    prefixes
        .iter()
        .map(|prefix| {
            fields
                .iter()
                .find(|(label, _)| label.starts_with(prefix))
                .and_then(|(_, value)| value.as_count())
        })
        .collect()
}

fn build(
    record: &CanonicalRecord,
    title: &str,
    metrics: [(&str, &str, [u8; 3]); 3],
) -> Option<ChartSpec> {
    let fields = record.labelled_fields();
    let prefixes: Vec<&str> = metrics.iter().map(|(prefix, _, _)| *prefix).collect();

    let Some(values) = resolve_counts(&fields, &prefixes) else {
        warn!(tenant_id = %record.tenant_id, chart = title, "chart skipped: metrics missing");
        return None;
    };
    if values.iter().sum::<u64>() == 0 {
        warn!(tenant_id = %record.tenant_id, chart = title, "chart skipped: no data");
        return None;
    }

    let bars = metrics
        .iter()
        .zip(values)
        .map(|((_, label, color), value)| Bar {
            label: (*label).to_string(),
            value,
            color: *color,
        })
        .collect();
    Some(ChartSpec {
        title: title.to_string(),
        bars,
    })
}

/// Total, active and passive users.
pub fn user_engagement(record: &CanonicalRecord) -> Option<ChartSpec> {
    build(
        record,
        "User Engagement Overview",
        [
            ("Total Logged In Users", "Total Users", BLUE),
            ("Users Who Performed Actions", "Active Users", GREEN),
            ("Users Who Only Logged In", "Passive Users", RED),
        ],
    )
}

/// Total live, new and updated contracts.
pub fn contract_activity(record: &CanonicalRecord) -> Option<ChartSpec> {
    build(
        record,
        "Contract Activity",
        [
            ("Total Live Contracts", "Total Live", BLUE),
            ("NEW Live Contracts", "New", GREEN),
            ("Updated Live Contracts", "Updated", YELLOW),
        ],
    )
}

impl ChartSpec {
    /// Horizontal pixel span `(left, right)` of each bar.
    pub fn bar_spans(&self, width: u32) -> Vec<(u32, u32)> {
        let n = self.bars.len() as u32;
        if n == 0 {
            return Vec::new();
        }
        let slot = width / n;
        let bar = slot * 3 / 5;
        (0..n)
            .map(|i| {
                let left = i * slot + (slot - bar) / 2;
                (left, left + bar)
            })
            .collect()
    }

    /// Bar centres as fractions of the chart width, for label placement.
    pub fn bar_centres(&self) -> Vec<f32> {
        self.bar_spans(CHART_WIDTH)
            .into_iter()
            .map(|(l, r)| (l + r) as f32 / 2.0 / CHART_WIDTH as f32)
            .collect()
    }

    /// Draw the bars on a white canvas with a baseline.
    ///
    /// Text (title, labels, values) is not rasterised; renderers place it
    /// around the image.
    pub fn rasterize(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
        let baseline = CHART_HEIGHT - 10;
        let plot_height = (baseline - 20) as f64;
        let max = self.bars.iter().map(|b| b.value).max().unwrap_or(0).max(1) as f64;

        for (bar, (left, right)) in self.bars.iter().zip(self.bar_spans(CHART_WIDTH)) {
            let height = ((bar.value as f64 / max) * plot_height).round() as u32;
            let top = baseline.saturating_sub(height);
            for x in left..right {
                for y in top..baseline {
                    img.put_pixel(x, y, Rgb(bar.color));
                }
            }
        }
        for x in 0..CHART_WIDTH {
            img.put_pixel(x, baseline, AXIS);
        }
        img
    }
}
