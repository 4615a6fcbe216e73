//! Elastic energy of a shallow shell on a nonlinear substrate:
//!
//! E = ∫ [ D/2 (∇²w)² − (∇²F)² / (2Eh) + F_yy w / Rx + F_xx w / Ry − w [F, w] + V(w) ] dx dy
//!
//! evaluated with repeated central differences and a rectangle-rule sum.

use crate::fields::Curvatures;
use crate::parameters::{PhysicalParameters, PotentialCoefficients};
use ndarray::{Array2, ArrayView2, Zip};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyFunctional {
    pub params: PhysicalParameters,
    pub potential: PotentialCoefficients,
    pub dx: f64,
}

impl EnergyFunctional {
    pub fn new(params: PhysicalParameters, potential: PotentialCoefficients, dx: f64) -> Self {
        EnergyFunctional {
            params,
            potential,
            dx,
        }
    }

    /// Pointwise energy density.
    ///
    /// # Panics
    /// If `w` and `f` differ in shape.
    pub fn density(&self, w: &ArrayView2<f64>, f: &ArrayView2<f64>) -> Array2<f64> {
        assert_eq!(
            w.dim(),
            f.dim(),
            "deflection and stress fields must share a shape"
        );

        let cw = Curvatures::of(w, self.dx);
        let cf = Curvatures::of(f, self.dx);
        let bracket = cf.bracket(&cw);

        let half_d = self.params.flexural_modulus / 2.0;
        let half_compliance = self.params.membrane_compliance() / 2.0;
        let (rx, ry) = (self.params.rx, self.params.ry);
        let potential = self.potential;

        let lap_w = cw.laplacian();
        let lap_f = cf.laplacian();
        let mut density = Zip::from(w)
            .and(&lap_w)
            .and(&lap_f)
            .map_collect(|&w, &lap_w, &lap_f| {
                // Skipped for flat F so an underflowed compliance cannot give inf * 0.
                let membrane = if lap_f == 0.0 {
                    0.0
                } else {
                    half_compliance * lap_f * lap_f
                };
                half_d * lap_w * lap_w - membrane + potential.potential(w)
            });

        // Curvature coupling and the von Kármán bracket
        Zip::from(&mut density)
            .and(w)
            .and(&cf.xx)
            .and(&cf.yy)
            .and(&bracket)
            .for_each(|d, &w, &fxx, &fyy, &br| {
                *d += fyy * w / rx + fxx * w / ry - w * br;
            });
        density
    }

    /// Total energy: density summed over the lattice times the cell area.
    pub fn total(&self, w: &ArrayView2<f64>, f: &ArrayView2<f64>) -> f64 {
        self.density(w, f).sum() * self.dx * self.dx
    }

    /// Bending-only energy `D/2 Σ (∇²w)² dx²`, the limit of [`total`](Self::total)
    /// for a flat, stress-free plate without substrate.
    pub fn bending(&self, w: &ArrayView2<f64>) -> f64 {
        let lap = Curvatures::of(w, self.dx).laplacian();
        self.params.flexural_modulus / 2.0 * lap.mapv(|v| v * v).sum() * self.dx * self.dx
    }
}
