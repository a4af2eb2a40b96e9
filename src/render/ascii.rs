//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed samples: `o`
//! - fitted curve: `-` line
//!
//! The fraction axis is fixed to `[-0.05, 1.0]` so plots of different crudes
//! line up.

use crate::render::{ProfilePlot, RenderSink};

const Y_MIN: f64 = -0.05;
const Y_MAX: f64 = 1.0;

/// Sink that renders each plot to text and keeps it.
#[derive(Debug, Clone)]
pub struct AsciiPlot {
    width: usize,
    height: usize,
    rendered: Vec<String>,
}

impl AsciiPlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rendered: Vec::new(),
        }
    }

    /// Rendered plots, in the order they were received.
    pub fn rendered(&self) -> &[String] {
        &self.rendered
    }

    pub fn into_rendered(self) -> Vec<String> {
        self.rendered
    }
}

impl RenderSink for AsciiPlot {
    fn render(&mut self, plot: &ProfilePlot) {
        self.rendered.push(render_ascii(plot, self.width, self.height));
    }
}

/// Render a plot to a fixed-size character grid.
pub fn render_ascii(plot: &ProfilePlot, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = temperature_range(plot).unwrap_or((0.0, 500.0));

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, &plot.curve, t_min, t_max);

    for s in &plot.observed {
        if !(s.temperature.is_finite() && s.fraction.is_finite()) {
            continue;
        }
        let x = map_x(s.temperature, t_min, t_max, width);
        let y = map_y(s.fraction, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: {} | T=[{t_min:.1}, {t_max:.1}] °C\n", plot.title));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn temperature_range(plot: &ProfilePlot) -> Option<(f64, f64)> {
    let temps = plot
        .observed
        .iter()
        .map(|s| s.temperature)
        .chain(plot.curve.iter().map(|&(t, _)| t))
        .filter(|t| t.is_finite());

    let (min_t, max_t) = temps.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));
    if min_t.is_finite() && max_t.is_finite() && max_t > min_t {
        Some((min_t, max_t))
    } else {
        None
    }
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - Y_MIN) / (Y_MAX - Y_MIN)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        if !(t.is_finite() && y.is_finite()) {
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
