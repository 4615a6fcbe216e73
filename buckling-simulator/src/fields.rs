use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};

/// The two scalar fields of the shell model.
#[derive(Debug, Clone)]
pub struct PlateFields {
    /// Out-of-plane deflection.
    pub w: Array2<f64>,
    /// Airy stress function. Held at zero by the simulator.
    pub f: Array2<f64>,
}

impl PlateFields {
    pub fn new(nx: usize, ny: usize) -> Self {
        PlateFields {
            w: Array2::zeros((nx, ny)),
            f: Array2::zeros((nx, ny)),
        }
    }

    /// Largest absolute deflection.
    pub fn max_deflection(&self) -> f64 {
        self.w.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
    }

    /// Root-mean-square deflection.
    pub fn rms_deflection(&self) -> f64 {
        if self.w.is_empty() {
            return 0.0;
        }
        (self.w.iter().map(|v| v * v).sum::<f64>() / self.w.len() as f64).sqrt()
    }
}

/// First derivative along one axis with numpy `gradient` semantics:
/// central differences inside, first-order one-sided differences on the two edges.
/// An axis with a single point has zero derivative.
pub fn gradient(field: &ArrayView2<f64>, spacing: f64, axis: Axis) -> Array2<f64> {
    let mut out = Array2::zeros(field.raw_dim());
    for (src, dst) in field.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        gradient_1d(src, dst, spacing);
    }
    out
}

fn gradient_1d(src: ArrayView1<f64>, mut dst: ArrayViewMut1<f64>, spacing: f64) {
    let n = src.len();
    if n < 2 {
        dst.fill(0.0);
        return;
    }
    for i in 1..n - 1 {
        dst[i] = (src[i + 1] - src[i - 1]) / (2.0 * spacing);
    }
    dst[0] = (src[1] - src[0]) / spacing;
    dst[n - 1] = (src[n - 1] - src[n - 2]) / spacing;
}

/// Second partial derivatives of a field, each obtained by applying [`gradient`] twice.
/// The double application widens the stencil and loses accuracy near the edges.
#[derive(Debug, Clone)]
pub struct Curvatures {
    pub xx: Array2<f64>,
    pub yy: Array2<f64>,
    pub xy: Array2<f64>,
}

impl Curvatures {
    pub fn of(field: &ArrayView2<f64>, spacing: f64) -> Self {
        let d_x = gradient(field, spacing, Axis(0));
        let d_y = gradient(field, spacing, Axis(1));

        let xx = gradient(&d_x.view(), spacing, Axis(0));
        let yy = gradient(&d_y.view(), spacing, Axis(1));
        // Mixed term: x first, then y
        let xy = gradient(&d_x.view(), spacing, Axis(1));

        Curvatures { xx, yy, xy }
    }

    pub fn laplacian(&self) -> Array2<f64> {
        &self.xx + &self.yy
    }

    /// Monge-Ampère bracket
    /// `[self, other] = self_xx other_yy + self_yy other_xx - 2 self_xy other_xy`.
    pub fn bracket(&self, other: &Curvatures) -> Array2<f64> {
        let mut out = Zip::from(&self.xx)
            .and(&self.yy)
            .and(&other.xx)
            .and(&other.yy)
            .map_collect(|&fxx, &fyy, &wxx, &wyy| fxx * wyy + fyy * wxx);
        Zip::from(&mut out)
            .and(&self.xy)
            .and(&other.xy)
            .for_each(|b, &fxy, &wxy| *b -= 2.0 * fxy * wxy);
        out
    }
}
