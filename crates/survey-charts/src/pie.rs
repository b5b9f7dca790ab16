//! Pie chart with a ranked legend, one per question

use crate::style::ChartStyle;
use crate::traits::ChartRenderer;
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::io::Cursor;
use survey_common::{Distribution, RankedEntry, ReportError, Result};
use tracing::debug;

/// Share of the canvas width given to the pie; the rest holds the legend.
const PIE_WIDTH_RATIO: f64 = 0.6;

/// Legend text of one ranked label: `label (count - pct%)`
pub fn legend_label(entry: &RankedEntry) -> String {
    format!("{} ({} - {:.1}%)", entry.label, entry.count, entry.percentage)
}

/// Legend lines in slice order: count descending, then label ascending.
pub fn legend_entries(distribution: &Distribution) -> Vec<String> {
    distribution.ranked().iter().map(legend_label).collect()
}

/// Slice boundaries in radians, starting at twelve o'clock and running clockwise.
fn slice_angles(ranked: &[RankedEntry], total: u64) -> Vec<(f64, f64)> {
    let mut start = -FRAC_PI_2;
    ranked
        .iter()
        .map(|entry| {
            let sweep = entry.count as f64 / total as f64 * TAU;
            let bounds = (start, start + sweep);
            start += sweep;
            bounds
        })
        .collect()
}

fn slice_polygon(center: (i32, i32), radius: f64, (from, to): (f64, f64)) -> Vec<(i32, i32)> {
    let steps = ((to - from).to_degrees().ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = from + (to - from) * step as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

/// Renders distributions as pie charts on an in-memory bitmap
#[derive(Debug, Clone, Default)]
pub struct PieChartRenderer {
    style: ChartStyle,
}

impl PieChartRenderer {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Draws the chart and encodes it as PNG.
    pub fn render_png(&self, title: &str, distribution: &Distribution) -> Result<Vec<u8>> {
        let total = distribution.total();
        if total == 0 {
            return Err(ReportError::empty_distribution(title));
        }
        let ranked = distribution.ranked();
        let (width, height) = (self.style.width, self.style.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&self.style.background)?;

            let title_font = (self.style.font_family.as_str(), f64::from(self.style.title_font_size));
            let body = root.titled(title, title_font.into_font().color(&BLACK))?;

            let split = (f64::from(width) * PIE_WIDTH_RATIO) as i32;
            let (pie_area, legend_area) = body.split_horizontally(split);
            self.draw_pie(&pie_area, &ranked, total)?;
            self.draw_legend(&legend_area, &ranked)?;

            root.present()?;
        }

        debug!(title, slices = ranked.len(), "pie chart drawn");
        encode_png(buffer, width, height)
    }

    fn draw_pie(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        ranked: &[RankedEntry],
        total: u64,
    ) -> Result<()> {
        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = f64::from(w.min(h)) * 0.42;

        for (index, bounds) in slice_angles(ranked, total).into_iter().enumerate() {
            let color = self.style.slice_color(index);
            area.draw(&Polygon::new(slice_polygon(center, radius, bounds), color.filled()))?;
        }
        Ok(())
    }

    fn draw_legend(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        ranked: &[RankedEntry],
    ) -> Result<()> {
        let size = self.style.legend_font_size as i32;
        let line_height = size * 9 / 5;
        let font = (self.style.font_family.as_str(), f64::from(self.style.legend_font_size));

        for (index, entry) in ranked.iter().enumerate() {
            let top = line_height * (index as i32 + 1);
            let color = self.style.slice_color(index);
            area.draw(&Rectangle::new([(0, top), (size, top + size)], color.filled()))?;
            area.draw(&Text::new(
                legend_label(entry),
                (size + size / 2, top),
                font.into_font().color(&BLACK),
            ))?;
        }
        Ok(())
    }
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ReportError::chart("bitmap buffer does not match canvas size"))?;
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .map_err(|e| ReportError::chart_with_source("encoding PNG", e))?;
    Ok(bytes.into_inner())
}

#[async_trait]
impl ChartRenderer for PieChartRenderer {
    async fn render_to_bytes(&self, title: &str, distribution: &Distribution) -> Result<Vec<u8>> {
        self.render_png(title, distribution)
    }

    fn name(&self) -> &'static str {
        "pie"
    }
}
