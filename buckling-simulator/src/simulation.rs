use crate::energy::EnergyFunctional;
use crate::error::{require_finite, ConfigResult, ConfigurationError};
use crate::fields::PlateFields;
use crate::grid::Grid;
use crate::parameters::{PhysicalParameters, PotentialCoefficients};
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Standard deviations of the Gaussian noise used by the descent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationSettings {
    pub initial_amplitude: f64,  // Noise that reseeds w at the start of a run
    pub proposal_amplitude: f64, // Noise added to w for each proposed step
}

impl Default for PerturbationSettings {
    fn default() -> Self {
        PerturbationSettings {
            initial_amplitude: 0.01,
            proposal_amplitude: 0.01,
        }
    }
}

impl PerturbationSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("initial_amplitude", self.initial_amplitude),
            ("proposal_amplitude", self.proposal_amplitude),
        ] {
            require_finite(name, value)?;
            if value < 0.0 {
                return Err(ConfigurationError::NegativeAmplitude { name, value });
            }
        }
        Ok(())
    }
}

/// Bookkeeping for one descent step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub step: usize,
    pub energy: f64,          // Energy of w before the step
    pub proposed_energy: f64, // Energy of the perturbed candidate
    pub accepted: bool,
}

/// Energies recorded over one run, one entry per step, taken before the
/// accept/reject decision of that step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyTrace {
    energies: Vec<f64>,
    outcomes: Vec<StepOutcome>,
}

impl EnergyTrace {
    fn with_capacity(steps: usize) -> Self {
        EnergyTrace {
            energies: Vec::with_capacity(steps),
            outcomes: Vec::with_capacity(steps),
        }
    }

    fn record(&mut self, outcome: StepOutcome) {
        self.energies.push(outcome.energy);
        self.outcomes.push(outcome);
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.accepted).count()
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.accepted_count() as f64 / self.len() as f64
        }
    }

    pub fn initial_energy(&self) -> Option<f64> {
        self.energies.first().copied()
    }

    /// Energy of the field left behind by the run, i.e. after the last decision.
    pub fn final_energy(&self) -> Option<f64> {
        self.outcomes.last().map(|o| {
            if o.accepted {
                o.proposed_energy
            } else {
                o.energy
            }
        })
    }
}

/// Shallow-shell buckling by greedy stochastic descent on the elastic energy.
///
/// The stress function stays at zero; only the deflection evolves, and a
/// proposal replaces it only when it strictly lowers the total energy.
pub struct BucklingFieldSimulator {
    grid: Grid,
    functional: EnergyFunctional,
    perturbation: PerturbationSettings,
    fields: PlateFields,
    report_every: usize,
}

impl BucklingFieldSimulator {
    pub fn new(
        params: PhysicalParameters,
        grid: Grid,
        potential: PotentialCoefficients,
    ) -> ConfigResult<Self> {
        params.validate()?;
        grid.validate()?;
        potential.validate()?;

        let fields = PlateFields::new(grid.nx, grid.ny);
        Ok(Self {
            grid,
            functional: EnergyFunctional::new(params, potential, grid.dx),
            perturbation: PerturbationSettings::default(),
            fields,
            report_every: 0,
        })
    }

    /// 100 x 100 grid, dx = 0.1, default substrate potential.
    pub fn with_defaults(params: PhysicalParameters) -> ConfigResult<Self> {
        Self::new(params, Grid::default(), PotentialCoefficients::default())
    }

    pub fn with_perturbation(mut self, perturbation: PerturbationSettings) -> ConfigResult<Self> {
        perturbation.validate()?;
        self.perturbation = perturbation;
        Ok(self)
    }

    /// Log progress every `every` steps at debug level (0 disables).
    pub fn with_report_every(mut self, every: usize) -> Self {
        self.report_every = every;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &PhysicalParameters {
        &self.functional.params
    }

    pub fn potential(&self) -> &PotentialCoefficients {
        &self.functional.potential
    }

    pub fn perturbation(&self) -> &PerturbationSettings {
        &self.perturbation
    }

    pub fn fields(&self) -> &PlateFields {
        &self.fields
    }

    pub fn deflection(&self) -> &Array2<f64> {
        &self.fields.w
    }

    pub fn stress_potential(&self) -> &Array2<f64> {
        &self.fields.f
    }

    /// Total elastic energy of an arbitrary pair of fields on this simulator's grid.
    pub fn compute_elastic_energy(&self, w: &ArrayView2<f64>, f: &ArrayView2<f64>) -> f64 {
        self.functional.total(w, f)
    }

    /// Energy of the stored fields.
    pub fn current_energy(&self) -> f64 {
        self.functional.total(&self.fields.w.view(), &self.fields.f.view())
    }

    /// Reseed w and run exactly `steps` descent steps drawing noise from `rng`.
    pub fn run_simulation<R: Rng + ?Sized>(&mut self, steps: usize, rng: &mut R) -> EnergyTrace {
        info!(
            "Starting buckling simulation: {}x{} grid, dx={}, {} steps",
            self.grid.nx, self.grid.ny, self.grid.dx, steps
        );

        let initial = self.perturbation.initial_amplitude;
        self.fields.w = Array2::from_shape_simple_fn(self.grid.shape(), || {
            initial * sample_normal(rng)
        });

        let scale = self.perturbation.proposal_amplitude;
        let mut trace = EnergyTrace::with_capacity(steps);

        for step in 0..steps {
            let energy = self.current_energy();

            let mut proposal = self.fields.w.clone();
            proposal.mapv_inplace(|v| v + scale * sample_normal(rng));
            let proposed_energy = self
                .functional
                .total(&proposal.view(), &self.fields.f.view());

            // NaN compares false and is rejected.
            let accepted = proposed_energy < energy;
            if accepted {
                self.fields.w = proposal;
            }

            trace.record(StepOutcome {
                step,
                energy,
                proposed_energy,
                accepted,
            });

            if self.report_every > 0 && (step + 1) % self.report_every == 0 {
                debug!(
                    "Step {}/{}: E={:.6e}, accepted {}",
                    step + 1,
                    steps,
                    energy,
                    trace.accepted_count()
                );
            }
        }

        info!(
            "Simulation complete: {} of {} proposals accepted, final E={:?}",
            trace.accepted_count(),
            steps,
            trace.final_energy()
        );
        trace
    }

    /// Reproducible run from a fixed seed.
    pub fn run_seeded(&mut self, steps: usize, seed: u64) -> EnergyTrace {
        let mut rng = StdRng::seed_from_u64(seed);
        self.run_simulation(steps, &mut rng)
    }

    /// Run seeded from the operating system's entropy source.
    pub fn run(&mut self, steps: usize) -> EnergyTrace {
        let mut rng = StdRng::from_entropy();
        self.run_simulation(steps, &mut rng)
    }
}

fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_simulator() -> BucklingFieldSimulator {
        BucklingFieldSimulator::new(
            PhysicalParameters::fingerprint(),
            Grid::new(10, 10, 0.1).unwrap(),
            PotentialCoefficients::default(),
        )
        .unwrap()
    }

    #[test]
    fn fields_start_at_zero_with_zero_energy() {
        let sim = small_simulator();
        assert_eq!(sim.deflection().dim(), (10, 10));
        assert!(sim.deflection().iter().all(|&v| v == 0.0));
        assert_eq!(sim.current_energy(), 0.0);
    }

    #[test]
    fn construction_validates_inputs() {
        let bad_params = PhysicalParameters {
            rx: 0.0,
            ..PhysicalParameters::fingerprint()
        };
        assert!(BucklingFieldSimulator::with_defaults(bad_params).is_err());

        let bad_grid = Grid {
            nx: 0,
            ny: 4,
            dx: 0.1,
        };
        assert!(matches!(
            BucklingFieldSimulator::new(
                PhysicalParameters::fingerprint(),
                bad_grid,
                PotentialCoefficients::default()
            ),
            Err(ConfigurationError::EmptyGrid { .. })
        ));

        let negative = PerturbationSettings {
            initial_amplitude: -0.01,
            proposal_amplitude: 0.01,
        };
        assert!(matches!(
            small_simulator().with_perturbation(negative),
            Err(ConfigurationError::NegativeAmplitude { name: "initial_amplitude", .. })
        ));
    }

    #[test]
    fn zero_steps_gives_empty_trace_but_reseeds() {
        let mut sim = small_simulator();
        let trace = sim.run_seeded(0, 7);
        assert!(trace.is_empty());
        assert_eq!(trace.final_energy(), None);
        assert_eq!(trace.acceptance_rate(), 0.0);
        assert!(sim.deflection().iter().any(|&v| v != 0.0));
    }

    #[test]
    fn trace_has_one_finite_entry_per_step() {
        for steps in [0, 1, 10, 100] {
            let mut sim = small_simulator();
            let trace = sim.run_seeded(steps, 42);
            assert_eq!(trace.len(), steps);
            assert_eq!(trace.outcomes().len(), steps);
            assert!(trace.energies().iter().all(|e| e.is_finite()));
        }
    }

    #[test]
    fn accepted_steps_strictly_lower_the_energy() {
        // A rough start leaves room for downhill proposals.
        let mut sim = small_simulator()
            .with_perturbation(PerturbationSettings {
                initial_amplitude: 1.0,
                proposal_amplitude: 0.01,
            })
            .unwrap();
        let trace = sim.run_seeded(200, 3);
        assert!(trace.accepted_count() > 0);

        for outcome in trace.outcomes() {
            if outcome.accepted {
                assert!(outcome.proposed_energy < outcome.energy);
            } else {
                assert!(!(outcome.proposed_energy < outcome.energy));
            }
        }
        // Each step starts from whatever the previous decision left behind.
        for pair in trace.outcomes().windows(2) {
            let expected = if pair[0].accepted {
                pair[0].proposed_energy
            } else {
                pair[0].energy
            };
            assert_eq!(pair[1].energy.to_bits(), expected.to_bits());
        }
        for pair in trace.energies().windows(2) {
            assert!(pair[1] <= pair[0]);
        }

        let final_energy = trace.final_energy().unwrap();
        assert_eq!(sim.current_energy().to_bits(), final_energy.to_bits());
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let mut a = small_simulator();
        let mut b = small_simulator();
        let ta = a.run_seeded(25, 11);
        let tb = b.run_seeded(25, 11);
        assert_eq!(ta, tb);
        assert_eq!(a.deflection(), b.deflection());

        // A second run on the same simulator starts over rather than continuing.
        let again = a.run_seeded(25, 11);
        assert_eq!(again, ta);
    }

    #[test]
    fn zero_proposal_amplitude_never_accepts() {
        let mut sim = small_simulator()
            .with_perturbation(PerturbationSettings {
                initial_amplitude: 0.01,
                proposal_amplitude: 0.0,
            })
            .unwrap();
        let trace = sim.run_seeded(10, 5);
        assert_eq!(trace.accepted_count(), 0);
        let first = trace.initial_energy().unwrap();
        for &e in trace.energies() {
            assert_relative_eq!(e, first);
        }
    }

    #[test]
    fn stress_potential_is_never_updated() {
        let mut sim = small_simulator();
        sim.run_seeded(20, 9);
        assert!(sim.stress_potential().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn accepts_any_rng() {
        let mut sim = small_simulator();
        let mut rng: Box<dyn rand::RngCore> = Box::new(StdRng::seed_from_u64(1));
        let trace = sim.run_simulation(3, rng.as_mut());
        assert_eq!(trace.len(), 3);
    }
}
