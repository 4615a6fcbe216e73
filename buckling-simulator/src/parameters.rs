use crate::error::{require_finite, require_positive, ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};

/// Material and geometric constants of the shell, fixed for a simulator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParameters {
    /// Flexural modulus (bending rigidity).
    #[serde(rename = "D")]
    pub flexural_modulus: f64,
    /// Young's modulus.
    #[serde(rename = "E")]
    pub youngs_modulus: f64,
    /// Layer thickness.
    #[serde(rename = "h")]
    pub thickness: f64,
    /// Principal radius of curvature along x.
    pub rx: f64,
    /// Principal radius of curvature along y.
    pub ry: f64,
}

impl PhysicalParameters {
    pub fn new(d: f64, e: f64, h: f64, rx: f64, ry: f64) -> ConfigResult<Self> {
        let params = PhysicalParameters {
            flexural_modulus: d,
            youngs_modulus: e,
            thickness: h,
            rx,
            ry,
        };
        params.validate()?;
        Ok(params)
    }

    /// Values used for the fingerprint-buckling experiment (N, mm).
    pub fn fingerprint() -> Self {
        PhysicalParameters {
            flexural_modulus: 1.3e-7,
            youngs_modulus: 10e-3,
            thickness: 8.0e-3,
            rx: 780.0,
            ry: 780.0,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        require_positive("D", self.flexural_modulus)?;
        require_positive("E", self.youngs_modulus)?;
        require_positive("h", self.thickness)?;
        // Infinite radii describe a flat plate and are allowed.
        for (name, value) in [("Rx", self.rx), ("Ry", self.ry)] {
            if value.is_nan() {
                return Err(ConfigurationError::NonFiniteParameter { name, value });
            }
            if value == 0.0 {
                return Err(ConfigurationError::ZeroCurvatureRadius { name, value });
            }
        }
        Ok(())
    }

    /// Membrane compliance `1 / (E h)` weighting the stress-function term.
    /// Infinite when `E h` underflows.
    pub fn membrane_compliance(&self) -> f64 {
        1.0 / (self.youngs_modulus * self.thickness)
    }
}

/// Coefficients of the substrate potential `V(w) = c w²/2 + a w³/3 + b w⁴/4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialCoefficients {
    pub c: f64,
    pub a: f64,
    pub b: f64,
}

impl Default for PotentialCoefficients {
    fn default() -> Self {
        PotentialCoefficients {
            c: 1.0,
            a: 0.1,
            b: 0.01,
        }
    }
}

impl PotentialCoefficients {
    /// No substrate: `V(w) = 0`.
    pub fn none() -> Self {
        PotentialCoefficients {
            c: 0.0,
            a: 0.0,
            b: 0.0,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        require_finite("c", self.c)?;
        require_finite("a", self.a)?;
        require_finite("b", self.b)
    }

    #[inline]
    pub fn potential(&self, w: f64) -> f64 {
        let w2 = w * w;
        self.c * w2 / 2.0 + self.a * w2 * w / 3.0 + self.b * w2 * w2 / 4.0
    }
}
