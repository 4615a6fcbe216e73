use crate::config::VisualizationConfig;
use crate::contour;
use crate::grid::Grid;
use crate::simulation::{BucklingFieldSimulator, EnergyTrace};
use anyhow::{anyhow, Context, Result};
use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Writes PNG views of a simulator's deflection field and of an energy trace.
/// Rendering only reads simulator state.
pub struct DeflectionVisualiser {
    output_dir: PathBuf,
    deflection_size: (u32, u32),
    energy_size: (u32, u32),
    contour_levels: usize,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl DeflectionVisualiser {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(output_dir, &VisualizationConfig::default())
    }

    pub fn from_config(output_dir: impl AsRef<Path>, config: &VisualizationConfig) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory '{}'", output_dir.display())
        })?;

        let gradient: Box<dyn colorgrad::Gradient> = Box::new(colorgrad::preset::viridis());

        Ok(Self {
            output_dir,
            deflection_size: config.deflection_size,
            energy_size: config.energy_size,
            contour_levels: config.contour_levels,
            gradient,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Surface and contour views side by side.
    pub fn render_deflection(
        &self,
        sim: &BucklingFieldSimulator,
        file_name: &str,
    ) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let (width, height) = self.deflection_size;
        let draw = || -> DrawResult {
            let root = BitMapBackend::new(&path, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;
            let (left, right) = root.split_horizontally((width / 2) as i32);
            self.draw_surface(&left, sim.grid(), sim.deflection())?;
            self.draw_contour(&right, sim.grid(), sim.deflection())?;
            root.present()?;
            Ok(())
        };
        draw().map_err(|e| anyhow!("Failed to render '{}': {}", path.display(), e))?;
        log::info!("Saved deflection plot: {}", path.display());
        Ok(path)
    }

    pub fn render_surface(&self, sim: &BucklingFieldSimulator, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let size = self.panel_size();
        let draw = || -> DrawResult {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE)?;
            self.draw_surface(&root, sim.grid(), sim.deflection())?;
            root.present()?;
            Ok(())
        };
        draw().map_err(|e| anyhow!("Failed to render '{}': {}", path.display(), e))?;
        log::info!("Saved surface plot: {}", path.display());
        Ok(path)
    }

    pub fn render_contour(&self, sim: &BucklingFieldSimulator, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let size = self.panel_size();
        let draw = || -> DrawResult {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE)?;
            self.draw_contour(&root, sim.grid(), sim.deflection())?;
            root.present()?;
            Ok(())
        };
        draw().map_err(|e| anyhow!("Failed to render '{}': {}", path.display(), e))?;
        log::info!("Saved contour plot: {}", path.display());
        Ok(path)
    }

    pub fn render_energy_trace(&self, trace: &EnergyTrace, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let draw = || -> DrawResult {
            let root = BitMapBackend::new(&path, self.energy_size).into_drawing_area();
            root.fill(&WHITE)?;

            let steps = trace.len().max(1);
            let (lo, hi) = padded_range(trace.energies().iter().copied());
            let mut chart = ChartBuilder::on(&root)
                .caption("Energy evolution", ("sans-serif", 24))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(90)
                .build_cartesian_2d(0..steps, lo..hi)?;

            chart
                .configure_mesh()
                .x_desc("Step")
                .y_desc("Total elastic energy")
                .y_label_formatter(&|v| format!("{:.3e}", v))
                .draw()?;

            chart.draw_series(LineSeries::new(
                trace
                    .energies()
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, e)| e.is_finite()),
                &BLUE,
            ))?;

            root.present()?;
            Ok(())
        };
        draw().map_err(|e| anyhow!("Failed to render '{}': {}", path.display(), e))?;
        log::info!("Saved energy plot: {}", path.display());
        Ok(path)
    }

    fn panel_size(&self) -> (u32, u32) {
        let (width, height) = self.deflection_size;
        ((width / 2).max(1), height)
    }

    fn draw_surface(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        grid: &Grid,
        w: &Array2<f64>,
    ) -> DrawResult {
        let xs = grid.x_coords();
        let ys = grid.y_coords();
        let x_max = grid.width();
        let y_max = grid.height();
        let (lo, hi) = padded_range(w.iter().copied());

        let mut chart = ChartBuilder::on(area)
            .caption("Deflection pattern", ("sans-serif", 24))
            .margin(10)
            .build_cartesian_3d(0.0..x_max, lo..hi, 0.0..y_max)?;

        chart.with_projection(|mut pb| {
            pb.pitch = 0.5;
            pb.yaw = 0.6;
            pb.scale = 0.8;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()?;

        let x_step = lattice_step(x_max, grid.nx);
        let y_step = lattice_step(y_max, grid.ny);
        let (nx, ny) = w.dim();
        let style = |v: &f64| -> ShapeStyle { self.value_to_color(*v, lo, hi).filled() };

        chart.draw_series(
            SurfaceSeries::xoz(xs.iter().copied(), ys.iter().copied(), |x: f64, y: f64| {
                let i = nearest_index(x, x_step, nx);
                let j = nearest_index(y, y_step, ny);
                w[[i, j]]
            })
            .style_func(&style),
        )?;

        Ok(())
    }

    fn draw_contour(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        grid: &Grid,
        w: &Array2<f64>,
    ) -> DrawResult {
        let xs = grid.x_coords().to_vec();
        let ys = grid.y_coords().to_vec();

        let mut chart = ChartBuilder::on(area)
            .caption("Deflection contours", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..grid.width(), 0.0..grid.height())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("x")
            .y_desc("y")
            .draw()?;

        let (lo, hi) = finite_min_max(w.iter().copied()).unwrap_or((0.0, 0.0));
        for level in contour::levels(lo, hi, self.contour_levels) {
            let color = self.value_to_color(level, lo, hi);
            let segments = contour::iso_lines(&w.view(), &xs, &ys, level);

            chart.draw_series(
                segments
                    .iter()
                    .map(move |&(a, b)| PathElement::new(vec![a, b], color.stroke_width(1))),
            )?;

            // Inline label halfway along the level's segment list
            if let Some(&(anchor, _)) = segments.get(segments.len() / 2) {
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.2e}", level),
                    anchor,
                    ("sans-serif", 12).into_font().color(&color),
                )))?;
            }
        }

        Ok(())
    }

    fn value_to_color(&self, value: f64, min_val: f64, max_val: f64) -> RGBColor {
        let rgba = self.gradient.at(normalise(value, min_val, max_val) as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }
}

fn normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    let normalized = if max_val > min_val {
        (value - min_val) / (max_val - min_val)
    } else {
        0.5
    };
    if normalized.is_nan() {
        0.5
    } else {
        normalized.clamp(0.0, 1.0)
    }
}

fn finite_min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Axis range covering all finite values with a 5% margin; never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    match finite_min_max(values) {
        None => (-1.0, 1.0),
        Some((lo, hi)) => {
            let span = hi - lo;
            let pad = if span > 0.0 {
                0.05 * span
            } else if lo != 0.0 {
                0.05 * lo.abs()
            } else {
                1.0
            };
            (lo - pad, hi + pad)
        }
    }
}

fn lattice_step(extent: f64, n: usize) -> f64 {
    if n > 1 {
        extent / (n - 1) as f64
    } else {
        1.0
    }
}

fn nearest_index(coord: f64, step: f64, n: usize) -> usize {
    ((coord / step).round().max(0.0) as usize).min(n.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{PhysicalParameters, PotentialCoefficients};
    use approx::assert_relative_eq;

    #[test]
    fn padded_range_is_never_degenerate() {
        assert_eq!(padded_range(std::iter::empty()), (-1.0, 1.0));
        assert_eq!(padded_range([0.0, 0.0].into_iter()), (-1.0, 1.0));
        let (lo, hi) = padded_range([2.0, 2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);
        let (lo, hi) = padded_range([0.0, f64::NAN, 10.0].into_iter());
        assert_relative_eq!(lo, -0.5);
        assert_relative_eq!(hi, 10.5);
    }

    #[test]
    fn normalise_clamps_and_handles_flat_ranges() {
        assert_relative_eq!(normalise(5.0, 0.0, 10.0), 0.5);
        assert_relative_eq!(normalise(-3.0, 0.0, 10.0), 0.0);
        assert_relative_eq!(normalise(30.0, 0.0, 10.0), 1.0);
        assert_relative_eq!(normalise(1.0, 1.0, 1.0), 0.5);
        assert_relative_eq!(normalise(f64::NAN, 0.0, 1.0), 0.5);
    }

    #[test]
    fn surface_coordinates_map_back_to_lattice_indices() {
        let grid = Grid::new(7, 4, 0.1).unwrap();
        let step = lattice_step(grid.width(), grid.nx);
        for (i, x) in grid.x_coords().iter().enumerate() {
            assert_eq!(nearest_index(*x, step, grid.nx), i);
        }
        assert_eq!(nearest_index(99.0, step, grid.nx), 6);
        assert_eq!(nearest_index(0.0, lattice_step(0.1, 1), 1), 0);
    }

    #[test]
    #[ignore = "needs a system sans-serif font for captions"]
    fn rendering_writes_files_without_touching_the_field() {
        let dir = std::env::temp_dir().join(format!("buckling-render-{}", std::process::id()));
        let visualiser = DeflectionVisualiser::new(&dir).unwrap();

        let mut sim = BucklingFieldSimulator::new(
            PhysicalParameters::fingerprint(),
            Grid::new(12, 12, 0.1).unwrap(),
            PotentialCoefficients::default(),
        )
        .unwrap();
        let trace = sim.run_seeded(10, 1);
        let before = sim.deflection().clone();

        let deflection = visualiser.render_deflection(&sim, "deflection.png").unwrap();
        let energy = visualiser.render_energy_trace(&trace, "energy.png").unwrap();
        visualiser.render_deflection(&sim, "deflection.png").unwrap();
        let surface = visualiser.render_surface(&sim, "surface.png").unwrap();
        let contour = visualiser.render_contour(&sim, "contour.png").unwrap();

        for path in [&deflection, &energy, &surface, &contour] {
            assert!(path.exists(), "{} was not written", path.display());
        }
        assert_eq!(sim.deflection(), &before);
        std::fs::remove_dir_all(&dir).ok();
    }
}
