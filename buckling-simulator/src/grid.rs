use crate::error::{ConfigResult, ConfigurationError};
use ndarray::Array1;

pub const DEFAULT_NX: usize = 100;
pub const DEFAULT_NY: usize = 100;
pub const DEFAULT_DX: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub nx: usize, // Number of points along x (array axis 0)
    pub ny: usize, // Number of points along y (array axis 1)
    pub dx: f64,   // Uniform spacing, shared by both axes
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            nx: DEFAULT_NX,
            ny: DEFAULT_NY,
            dx: DEFAULT_DX,
        }
    }
}

impl Grid {
    pub fn new(nx: usize, ny: usize, dx: f64) -> ConfigResult<Self> {
        let grid = Grid { nx, ny, dx };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(ConfigurationError::EmptyGrid {
                nx: self.nx,
                ny: self.ny,
            });
        }
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return Err(ConfigurationError::NonPositiveSpacing(self.dx));
        }
        Ok(())
    }

    /// Array shape `(nx, ny)` for fields living on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Area weight of a single lattice point in the rectangle-rule integral.
    pub fn cell_area(&self) -> f64 {
        self.dx * self.dx
    }

    /// Plotting coordinates along x: `nx` points spread over `[0, nx * dx]`.
    pub fn x_coords(&self) -> Array1<f64> {
        Array1::linspace(0.0, self.nx as f64 * self.dx, self.nx)
    }

    /// Plotting coordinates along y: `ny` points spread over `[0, ny * dx]`.
    pub fn y_coords(&self) -> Array1<f64> {
        Array1::linspace(0.0, self.ny as f64 * self.dx, self.ny)
    }

    pub fn width(&self) -> f64 {
        self.nx as f64 * self.dx
    }

    pub fn height(&self) -> f64 {
        self.ny as f64 * self.dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_grid_is_100_by_100() {
        let grid = Grid::default();
        assert_eq!(grid.shape(), (100, 100));
        assert_relative_eq!(grid.dx, 0.1);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            Grid::new(0, 10, 0.1),
            Err(ConfigurationError::EmptyGrid { nx: 0, ny: 10 })
        );
        assert!(Grid::new(10, 0, 0.1).is_err());
    }

    #[test]
    fn rejects_bad_spacing() {
        assert!(matches!(
            Grid::new(10, 10, 0.0),
            Err(ConfigurationError::NonPositiveSpacing(_))
        ));
        assert!(Grid::new(10, 10, -0.1).is_err());
        assert!(Grid::new(10, 10, f64::NAN).is_err());
        assert!(Grid::new(10, 10, f64::INFINITY).is_err());
    }

    #[test]
    fn coordinates_span_n_times_dx() {
        let grid = Grid::new(11, 6, 0.5).unwrap();
        let xs = grid.x_coords();
        let ys = grid.y_coords();
        assert_eq!(xs.len(), 11);
        assert_eq!(ys.len(), 6);
        assert_relative_eq!(xs[0], 0.0);
        assert_relative_eq!(xs[10], 5.5, epsilon = 1e-12);
        assert_relative_eq!(ys[5], 3.0, epsilon = 1e-12);
        assert_relative_eq!(grid.cell_area(), 0.25);
    }
}
