// src/visualisation.rs
//
// x-z plane pictures of a dump: the coloured variable on the native cells,
// poloidal field lines on top and a colour bar on the right.

use std::error::Error;
use std::path::Path;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::colormap::{finite_range, ColorScale};
use crate::config::RenderConfig;
use crate::dump::{Dump, DumpError};
use crate::field_lines::field_lines;
use crate::slice::{clip_polygon, clip_polyline, xz_cells, Window};

/// Chart with x and z in embedding units.
pub type XzChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const LABEL_AREA: i32 = 45;

fn caption(dump: &Dump, cfg: &RenderConfig) -> String {
    let scale = if cfg.log { " (log10)" } else { "" };
    format!("{}{} at t = {:.2}", cfg.var, scale, dump.t)
}

/// Colour `var` over the x-z plane of `dump` inside `cfg.window`.
///
/// Returns the chart, so field lines can be drawn on the same axes, and the
/// colour scale that was used.
pub fn plot_xz<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    dump: &Dump,
    var: &str,
    cfg: &RenderConfig,
) -> Result<(XzChart<'a, DB>, ColorScale), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let window = Window::from(cfg.window);
    let cells = xz_cells(dump, var)?;
    let visible: Vec<_> = cells.iter().filter(|c| window.overlaps(&c.corners)).collect();

    let (auto_lo, auto_hi) =
        finite_range(visible.iter().map(|c| &c.value), cfg.log).unwrap_or((1.0, 1.0));
    let scale = ColorScale::new(
        cfg.colormap,
        cfg.vmin.unwrap_or(auto_lo),
        cfg.vmax.unwrap_or(auto_hi),
        cfg.log,
    )?;

    let label_area = if cfg.labels { LABEL_AREA } else { 0 };
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(label_area)
        .y_label_area_size(label_area)
        .build_cartesian_2d(window.xmin..window.xmax, window.zmin..window.zmax)?;

    if cfg.labels {
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("x (GM/c^2)")
            .y_desc("z (GM/c^2)")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;
    }

    // One filled polygon per cell, cut to the window
    chart.draw_series(visible.iter().filter_map(|c| {
        let pts = clip_polygon(&c.corners, &window);
        (pts.len() >= 3).then(|| Polygon::new(pts, scale.color(c.value).filled()))
    }))?;

    Ok((chart, scale))
}

/// Draw the poloidal field lines of `dump` in black. Returns the number of
/// polyline pieces drawn.
pub fn overlay_field<DB: DrawingBackend>(
    chart: &mut XzChart<'_, DB>,
    dump: &Dump,
    cfg: &RenderConfig,
) -> Result<usize, Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let window = Window::from(cfg.window);
    let pieces: Vec<_> = field_lines(dump, cfg.nlines)?
        .iter()
        .flat_map(|line| clip_polyline(line, &window))
        .collect();

    chart.draw_series(
        pieces
            .iter()
            .map(|p| PathElement::new(p.clone(), BLACK.stroke_width(1))),
    )?;

    Ok(pieces.len())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scale: &ColorScale,
    cfg: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    const STEPS: usize = 128;
    let (lo, hi) = scale.bounds();
    let label_area = if cfg.labels { LABEL_AREA } else { 0 };

    let mut bar = ChartBuilder::on(area)
        .margin(10)
        .margin_bottom(10 + label_area)
        .right_y_label_area_size(label_area)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    if cfg.labels {
        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(6)
            .draw()?;
    }

    bar.draw_series((0..STEPS).map(|k| {
        let f0 = k as f64 / STEPS as f64;
        let f1 = (k + 1) as f64 / STEPS as f64;
        let color = scale.color_at(0.5 * (f0 + f1));
        Rectangle::new(
            [(0.0, lo + f0 * (hi - lo)), (1.0, lo + f1 * (hi - lo))],
            color.filled(),
        )
    }))?;

    Ok(())
}

/// Lay out one full picture of `dump` on `root`. The caller presents.
pub fn draw_dump<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    dump: &Dump,
    cfg: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let body = if cfg.labels {
        root.titled(&caption(dump, cfg), ("sans-serif", 20))?
    } else {
        root.clone()
    };

    let (w, h) = body.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let bar_w = (w / 8).max(24);
    let (plot_area, bar_area) = body.split_horizontally(w - bar_w);

    // Square axes keep x and z at the same scale
    let side = (w - bar_w).min(h);
    let plot_area = plot_area.shrink(((w - bar_w - side) / 2, (h - side) / 2), (side, side));

    let (mut chart, scale) = plot_xz(&plot_area, dump, &cfg.var, cfg)?;
    overlay_field(&mut chart, dump, cfg)?;
    draw_colorbar(&bar_area, &scale, cfg)?;
    Ok(())
}

/// Render `dump` to a `size`×`size` PNG at `path`.
///
/// The bitmap is flushed and released before returning.
pub fn save_dump_plot(
    dump: &Dump,
    path: &Path,
    cfg: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    // The bitmap is flushed to disk even when dropped early, so catch
    // missing data before the file is opened.
    for name in [cfg.var.as_str(), "B1", "B2"] {
        if !dump.has(name) {
            return Err(Box::new(DumpError::MissingVariable(name.to_string())));
        }
    }

    let root = BitMapBackend::new(path, (cfg.size, cfg.size)).into_drawing_area();
    draw_dump(&root, dump, cfg)?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monopole::bz_monopole;

    fn quiet_config(size: u32) -> RenderConfig {
        RenderConfig {
            size,
            labels: false,
            ..Default::default()
        }
    }

    fn render_to_buffer(dump: &Dump, cfg: &RenderConfig) -> Vec<u8> {
        let (w, h) = (cfg.size, cfg.size);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            draw_dump(&root, dump, cfg).unwrap();
            root.present().unwrap();
        }
        buf
    }

    #[test]
    fn monopole_fills_the_window_and_draws_lines() {
        let d = bz_monopole(0.0).unwrap();
        let cfg = quiet_config(200);
        let buf = render_to_buffer(&d, &cfg);

        let px: Vec<&[u8]> = buf.chunks(3).collect();
        let coloured = px.iter().filter(|p| p[..] != [255u8, 255, 255]).count();
        let black = px.iter().filter(|p| p[..] == [0u8, 0, 0]).count();
        assert!(
            coloured > px.len() * 2 / 5,
            "only {coloured} of {} pixels coloured",
            px.len()
        );
        assert!(black > 0, "no field lines drawn");
    }

    #[test]
    fn overlay_reports_line_pieces() {
        let d = bz_monopole(0.0).unwrap();
        let cfg = quiet_config(128);
        let mut buf = vec![0u8; 128 * 128 * 3];
        let root = BitMapBackend::with_buffer(&mut buf, (128, 128)).into_drawing_area();
        let (mut chart, _) = plot_xz(&root, &d, "rho", &cfg).unwrap();
        let n = overlay_field(&mut chart, &d, &cfg).unwrap();
        assert!(n >= 2);
    }

    #[test]
    fn missing_variable_fails_before_drawing_lines() {
        let d = bz_monopole(0.0).unwrap();
        let cfg = RenderConfig {
            var: "bsq".into(),
            ..quiet_config(128)
        };
        let mut buf = vec![0u8; 128 * 128 * 3];
        let root = BitMapBackend::with_buffer(&mut buf, (128, 128)).into_drawing_area();
        let err = draw_dump(&root, &d, &cfg).unwrap_err();
        assert!(err.to_string().contains("bsq"), "{err}");
    }

    #[test]
    fn saved_plot_is_a_png_of_the_requested_size() {
        let d = bz_monopole(10.0).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_dump_plot(&d, &path, &quiet_config(160)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width and height
        assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 160);
        assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 160);
    }
}
