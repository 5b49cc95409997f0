// ============================================================
// Layer 6 — Before/After Density Figure (PNG + SVG)
// ============================================================
// Renders two side-by-side map panels of grid density, raw on
// the left and cleaned on the right, with one shared colour bar.
//
// Colour scale:
//   vmin = vmin_pct percentile of all occupied-cell counts
//   vmax = vmax_pct percentile of all occupied-cell counts
//   counts above vmax saturate at the top colour
//
// Palette: viridis, sampled at 5 anchors and interpolated.
// Panel aspect ratio follows the extent in metres, so cells
// stay square on screen.
//
// Every figure is saved as a pair: the SVG as drawn, and a PNG
// rasterised from it with resvg at 300 dpi (pHYs chunk set, so
// viewers pick up the resolution).

use anyhow::{Context, Result};
use resvg::{tiny_skia, usvg};
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::analysis::describe::quantile;
use crate::data::extent::Extent;
use crate::data::geo::{meters_per_deg_lon, METERS_PER_DEG_LAT};
use crate::data::grid::GridCell;

const PANEL_WIDTH: f64 = 560.0;
const MARGIN: f64 = 40.0;
const TITLE_SPACE: f64 = 36.0;
const COLORBAR_WIDTH: f64 = 16.0;
const CELL_ALPHA: f64 = 0.55;

/// Raster output resolution; SVG user units are CSS pixels (96 per inch)
pub const RASTER_DPI: f32 = 300.0;
const SVG_DPI: f32 = 96.0;
const METERS_PER_INCH: f32 = 0.0254;

const VIRIDIS: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

#[derive(Debug, Clone)]
pub struct DensityFigure<'a> {
    pub raw:      &'a [GridCell],
    pub cleaned:  &'a [GridCell],
    pub extent:   Extent,
    pub vmin_pct: f64,
    pub vmax_pct: f64,
}

/// Viridis colour for t in [0, 1]
pub fn viridis(t: f64) -> String {
    let t      = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i      = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let f      = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix    = |x: f64, y: f64| (x + (y - x) * f).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

impl<'a> DensityFigure<'a> {
    /// Shared (vmin, vmax), or None when neither panel has cells
    pub fn color_limits(&self) -> Option<(f64, f64)> {
        let counts: Vec<f64> = self
            .raw
            .iter()
            .chain(self.cleaned)
            .map(|c| c.point_count as f64)
            .collect();
        if counts.is_empty() {
            return None;
        }
        let vmin = quantile(&counts, self.vmin_pct / 100.0);
        let vmax = quantile(&counts, self.vmax_pct / 100.0);
        Some((vmin, vmax.max(vmin)))
    }

    fn panel_height(&self) -> f64 {
        let e        = &self.extent;
        let width_m  = (e.lon_max - e.lon_min) * meters_per_deg_lon(e.mid_lat());
        let height_m = (e.lat_max - e.lat_min) * METERS_PER_DEG_LAT;
        if width_m <= 0.0 {
            PANEL_WIDTH
        } else {
            (PANEL_WIDTH * height_m / width_m).clamp(120.0, 1600.0)
        }
    }

    /// Write the PNG and SVG members of the figure
    pub fn save_pair(&self, png_path: &Path, svg_path: &Path) -> Result<()> {
        let svg = self.render_svg();
        std::fs::write(svg_path, &svg)
            .with_context(|| format!("Cannot write '{}'", svg_path.display()))?;
        rasterize_png(&svg, png_path, RASTER_DPI)
    }

    pub fn render_svg(&self) -> String {
        let panel_h = self.panel_height();
        let total_w = MARGIN * 4.0 + PANEL_WIDTH * 2.0 + COLORBAR_WIDTH + 60.0;
        let total_h = MARGIN * 2.0 + TITLE_SPACE + panel_h;
        let limits  = self.color_limits();

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{total_w:.0}" height="{total_h:.0}" viewBox="0 0 {total_w:.0} {total_h:.0}" font-family="Times New Roman, serif">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        let panels = [
            (self.raw, "Before Cleaning (Raw Grid Density)"),
            (self.cleaned, "After Cleaning (Cleaned Grid Density)"),
        ];
        for (i, (cells, title)) in panels.iter().enumerate() {
            let x0 = MARGIN + i as f64 * (PANEL_WIDTH + MARGIN * 2.0);
            let y0 = MARGIN + TITLE_SPACE;
            self.render_panel(&mut svg, cells, title, x0, y0, panel_h, limits);
        }

        let bar_x = MARGIN * 3.0 + PANEL_WIDTH * 2.0 + MARGIN / 2.0;
        self.render_colorbar(&mut svg, bar_x, MARGIN + TITLE_SPACE, panel_h);

        svg.push_str("</svg>\n");
        svg
    }

    #[allow(clippy::too_many_arguments)]
    fn render_panel(
        &self,
        svg:    &mut String,
        cells:  &[GridCell],
        title:  &str,
        x0:     f64,
        y0:     f64,
        h:      f64,
        limits: Option<(f64, f64)>,
    ) {
        let e     = &self.extent;
        let sx    = PANEL_WIDTH / (e.lon_max - e.lon_min);
        let sy    = h / (e.lat_max - e.lat_min);
        let to_px = |lon: f64, lat: f64| (x0 + (lon - e.lon_min) * sx, y0 + h - (lat - e.lat_min) * sy);

        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="15" font-weight="bold" text-anchor="middle">{}</text>"#,
            x0 + PANEL_WIDTH / 2.0,
            y0 - TITLE_SPACE / 2.0,
            title
        );
        let _ = writeln!(
            svg,
            r##"<rect x="{x0:.1}" y="{y0:.1}" width="{PANEL_WIDTH:.1}" height="{h:.1}" fill="#f4f4f4" stroke="#999" stroke-width="0.5"/>"##
        );

        if let Some((vmin, vmax)) = limits {
            let span = (vmax - vmin).max(f64::EPSILON);
            for c in cells {
                let (left, bottom) = to_px(c.ring[0].0, c.ring[0].1);
                let (right, top)   = to_px(c.ring[2].0, c.ring[2].1);
                let t = (c.point_count as f64 - vmin) / span;
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{CELL_ALPHA}"/>"#,
                    left,
                    top,
                    (right - left).max(0.1),
                    (bottom - top).max(0.1),
                    viridis(t)
                );
            }
        }

        // lon / lat labels on the bottom and left edges
        let _ = writeln!(
            svg,
            r#"<text x="{x0:.1}" y="{:.1}" font-size="9">{:.4}°</text>"#,
            y0 + h + 12.0,
            e.lon_min
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.4}°</text>"#,
            x0 + PANEL_WIDTH,
            y0 + h + 12.0,
            e.lon_max
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.4}°</text>"#,
            x0 - 3.0,
            y0 + h,
            e.lat_min
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.4}°</text>"#,
            x0 - 3.0,
            y0 + 9.0,
            e.lat_max
        );
    }

    fn render_colorbar(&self, svg: &mut String, x: f64, y: f64, h: f64) {
        let _ = writeln!(svg, r#"<defs><linearGradient id="viridis" x1="0" y1="1" x2="0" y2="0">"#);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let _ = writeln!(svg, r#"<stop offset="{t:.1}" stop-color="{}"/>"#, viridis(t));
        }
        let _ = writeln!(svg, "</linearGradient></defs>");
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{COLORBAR_WIDTH:.1}" height="{h:.1}" fill="url(#viridis)"/>"#
        );
        let label_x = x + COLORBAR_WIDTH + 16.0;
        let label_y = y + h / 2.0;
        let _ = writeln!(
            svg,
            r#"<text x="{label_x:.1}" y="{label_y:.1}" font-size="12" font-weight="bold" text-anchor="middle" transform="rotate(90 {label_x:.1} {label_y:.1})">Low &lt;- Grid Point Count -&gt; High</text>"#
        );
    }
}

// ─── Rasterisation ────────────────────────────────────────────────────────────

/// Render an SVG document to an RGBA PNG at `dpi`
pub fn rasterize_png(svg: &str, path: &Path, dpi: f32) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &opt).context("Cannot parse figure SVG")?;

    let scale  = dpi / SVG_DPI;
    let width  = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .with_context(|| format!("Cannot allocate a {width}x{height} raster"))?;
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    // tiny-skia keeps premultiplied alpha; PNG wants straight alpha
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let file = File::create(path).with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = (dpi / METERS_PER_INCH).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions { xppu: ppm, yppu: ppm, unit: png::Unit::Meter }));

    let mut writer = encoder
        .write_header()
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;
    tracing::debug!("Rasterised {}x{} px figure to '{}'", width, height, path.display());
    Ok(())
}
