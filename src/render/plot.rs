use std::path::PathBuf;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use serde::Serialize;

use crate::color::generate_palette;
use crate::data::model::IsothermRecord;

/// Title is drawn one step larger than the base font.
const TITLE_SCALE: f64 = 1.2;

const POINTS_PER_INCH: f64 = 72.0;

// ---------------------------------------------------------------------------
// Figure configuration
// ---------------------------------------------------------------------------

/// Physical size, styling and axis limits of the comparison figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotConfig {
    pub output: PathBuf,
    /// Figure width (in).
    pub width_in: f64,
    /// Width / height.
    pub aspect: f64,
    pub dpi: f64,
    /// Base font size (pt); the title is [`TITLE_SCALE`] times larger.
    pub font_size_pt: f64,
    pub line_width_pt: f64,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Axes box as `[left, bottom, width, height]` fractions of the figure.
    pub axes_rect: [f64; 4],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("isotherms.png"),
            width_in: 3.25,
            aspect: 1.618,
            dpi: 500.0,
            font_size_pt: 8.0,
            line_width_pt: 1.5,
            title: "ODPA Isotherms".to_string(),
            x_label: "Area/Alkyl Tail (Å²)".to_string(),
            y_label: "Surface Pressure (mN/m)".to_string(),
            x_range: (0.0, 40.0),
            y_range: (-0.5, 12.0),
            axes_rect: [0.2, 0.2, 0.7, 0.7],
        }
    }
}

impl PlotConfig {
    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let height_in = self.width_in / self.aspect;
        (
            (self.width_in * self.dpi).round() as u32,
            (height_in * self.dpi).round() as u32,
        )
    }

    /// Convert a length in points to pixels at this figure's DPI.
    fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / POINTS_PER_INCH
    }
}

// ---------------------------------------------------------------------------
// Series handed to the renderer
// ---------------------------------------------------------------------------

/// One legend entry and its `(area, pressure)` curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    pub fn from_record(label: &str, record: &IsothermRecord) -> Self {
        Self {
            label: label.to_string(),
            points: record.points().collect(),
        }
    }
}

type Point = (f64, f64);

/// The part of segment `a`-`b` inside the axis box, by Liang-Barsky.
/// Endpoints that are not cut are returned unchanged.
fn clip_segment(
    a: Point,
    b: Point,
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> Option<(Point, Point)> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, a.0 - x_range.0),
        (dx, x_range.1 - a.0),
        (-dy, a.1 - y_range.0),
        (dy, y_range.1 - a.1),
    ] {
        if p == 0.0 {
            // Parallel to this edge: either fully outside or no constraint.
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return None;
    }

    let at = |t: f64| match t {
        t if t == 0.0 => a,
        t if t == 1.0 => b,
        t => (a.0 + t * dx, a.1 + t * dy),
    };
    Some((at(t0), at(t1)))
}

/// Clip a polyline to the axis limits.
///
/// Segments crossing a limit are cut at the boundary, so a curve entering
/// from off-axis starts on the frame. Each returned run is a connected
/// piece of at least two points.
pub fn clip_to_axes(
    points: &[Point],
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> Vec<Vec<Point>> {
    fn flush(runs: &mut Vec<Vec<Point>>, run: &mut Vec<Point>) {
        if run.len() >= 2 {
            runs.push(std::mem::take(run));
        } else {
            run.clear();
        }
    }

    let mut runs = Vec::new();
    let mut run: Vec<Point> = Vec::new();
    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], x_range, y_range) {
            Some((start, end)) => {
                if run.last() != Some(&start) {
                    flush(&mut runs, &mut run);
                    run.push(start);
                }
                if end != start {
                    run.push(end);
                }
            }
            None => flush(&mut runs, &mut run),
        }
    }
    flush(&mut runs, &mut run);
    runs
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render all series on shared axes and write the PNG to `config.output`.
///
/// The figure is drawn into memory first; the file is only created once
/// drawing has succeeded.
pub fn save_isotherm_plot(config: &PlotConfig, series: &[PlotSeries]) -> Result<()> {
    let (width, height) = config.canvas_size();
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_isotherms(root, config, series).context("drawing isotherm figure")?;
    }

    image::save_buffer_with_format(
        &config.output,
        &buffer,
        width,
        height,
        image::ExtendedColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("writing {}", config.output.display()))?;

    log::info!(
        "wrote {} ({width}x{height} px, {} series)",
        config.output.display(),
        series.len()
    );
    Ok(())
}

fn draw_isotherms<DB>(
    root: DrawingArea<DB, Shift>,
    config: &PlotConfig,
    series: &[PlotSeries],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (width, height) = root.dim_in_pixel();
    let (w, h) = (width as f64, height as f64);
    let [left, bottom, axes_w, axes_h] = config.axes_rect;
    let left_px = (left * w).round() as u32;
    let bottom_px = (bottom * h).round() as u32;
    let right_px = ((1.0 - left - axes_w) * w).round().max(0.0) as u32;
    let top_px = ((1.0 - bottom - axes_h) * h).round().max(0.0) as u32;

    let font_px = config.pt_to_px(config.font_size_pt);
    let line_px = config.pt_to_px(config.line_width_pt).round().max(1.0) as u32;
    let frame_px = (line_px / 2).max(1);
    let body_font = || FontDesc::new(FontFamily::SansSerif, font_px, FontStyle::Normal);

    // Title sits centred just above the axes box.
    let title_style = FontDesc::new(FontFamily::SansSerif, font_px * TITLE_SCALE, FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let title_x = left_px as i32 + ((axes_w * w) / 2.0).round() as i32;
    let title_y = top_px as i32 - (font_px * 0.4).round() as i32;
    root.draw_text(&config.title, &title_style, (title_x, title_y))?;

    let (x0, x1) = config.x_range;
    let (y0, y1) = config.y_range;
    let mut chart = ChartBuilder::on(&root)
        .margin_top(top_px)
        .margin_right(right_px)
        .x_label_area_size(bottom_px)
        .y_label_area_size(left_px)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .y_labels(7)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{}", v))
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .label_style(body_font())
        .axis_desc_style(body_font())
        .axis_style(BLACK.stroke_width(frame_px))
        .draw()?;

    // Closed frame around the axes.
    chart.draw_series(std::iter::once(Rectangle::new(
        [(x0, y0), (x1, y1)],
        BLACK.stroke_width(frame_px),
    )))?;

    let legend_len = (font_px * 2.0).round() as i32;
    for (s, color) in series.iter().zip(generate_palette(series.len())) {
        let style = color.stroke_width(line_px);
        let runs = clip_to_axes(&s.points, config.x_range, config.y_range);
        chart
            .draw_series(runs.into_iter().map(|run| PathElement::new(run, style)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .label_font(body_font())
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawSample;

    #[test]
    fn default_canvas_matches_figure_size_and_dpi() {
        // 3.25 in wide, golden-ratio height, 500 dpi
        assert_eq!(PlotConfig::default().canvas_size(), (1625, 1004));
    }

    #[test]
    fn canvas_scales_with_dpi() {
        let cfg = PlotConfig {
            dpi: 100.0,
            ..PlotConfig::default()
        };
        assert_eq!(cfg.canvas_size(), (325, 201));
    }

    const X: (f64, f64) = (0.0, 40.0);
    const Y: (f64, f64) = (-0.5, 12.0);

    #[test]
    fn inside_polyline_is_kept_whole() {
        let pts = [(30.0, 0.5), (20.0, 4.0), (10.0, 12.0)];
        assert_eq!(clip_to_axes(&pts, X, Y), vec![pts.to_vec()]);
    }

    #[test]
    fn curve_entering_from_the_right_starts_on_the_frame() {
        let pts = [(50.0, 2.0), (30.0, 2.0), (10.0, 4.0)];
        assert_eq!(
            clip_to_axes(&pts, X, Y),
            vec![vec![(40.0, 2.0), (30.0, 2.0), (10.0, 4.0)]]
        );
    }

    #[test]
    fn segment_crossing_the_top_limit_ends_on_it() {
        let pts = [(10.0, 10.0), (5.0, 14.0)];
        assert_eq!(clip_to_axes(&pts, X, Y), vec![vec![(10.0, 10.0), (7.5, 12.0)]]);
    }

    #[test]
    fn leaving_and_reentering_splits_the_line() {
        let pts = [(30.0, 1.0), (10.0, 14.0), (5.0, 6.0)];
        let runs = clip_to_axes(&pts, X, Y);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[0][0], (30.0, 1.0));
        assert!((runs[0][1].1 - 12.0).abs() < 1e-12);
        assert_eq!(runs[1], vec![(8.75, 12.0), (5.0, 6.0)]);
    }

    #[test]
    fn line_fully_outside_is_not_drawn() {
        let pts = [(50.0, 1.0), (60.0, 2.0), (55.0, 13.0)];
        assert!(clip_to_axes(&pts, X, Y).is_empty());
    }

    #[test]
    fn nan_points_break_the_line() {
        let pts = [(f64::NAN, 1.0), (1.0, f64::NAN), (2.0, 2.0)];
        assert!(clip_to_axes(&pts, X, Y).is_empty());

        let pts = [(1.0, 1.0), (2.0, 2.0), (f64::NAN, 3.0), (4.0, 4.0), (5.0, 5.0)];
        assert_eq!(
            clip_to_axes(&pts, X, Y),
            vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(4.0, 4.0), (5.0, 5.0)]]
        );
    }

    #[test]
    fn series_carries_area_pressure_pairs() {
        let rec = IsothermRecord::from_samples(
            [
                RawSample {
                    time: 0.0,
                    area: 96.32,
                    pressure: 0.0,
                },
                RawSample {
                    time: 1.0,
                    area: 48.16,
                    pressure: 3.0,
                },
            ],
            1.0,
            160.0,
        );
        let s = PlotSeries::from_record("Er+ODPA", &rec);
        assert_eq!(s.label, "Er+ODPA");
        assert_eq!(s.points.len(), 2);
        assert!((s.points[0].0 - 10.0).abs() < 1e-9);
        assert_eq!(s.points[1].1, 3.0);
    }
}
