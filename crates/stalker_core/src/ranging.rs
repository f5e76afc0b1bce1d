//! Position estimation from range measurements.
//!
//! The agent has no direct access to its own world position. Instead it asks
//! eight range sensors for the distance to eight fixed reference points and
//! solves for the point that best fits all of them.
//!
//! # Linearization
//!
//! For reference points `pᵢ` and measured distances `dᵢ`, subtracting the
//! sphere equations of each unordered pair `(i, j)` cancels the quadratic
//! term and leaves one linear equation:
//!
//! ```text
//! 2(pᵢ − pⱼ) · x = (|pᵢ|² − dᵢ²) − (|pⱼ|² − dⱼ²)
//! ```
//!
//! Eight references give 28 equations in 3 unknowns, solved in the
//! least-squares sense through the normal equations `AᵀA x = Aᵀb`.
//!
//! # Latency
//!
//! Measurements are requested at the start of a tick and the solve runs
//! shortly before the next tick, so the estimate the tick body sees is
//! always one measurement cycle old.

use serde::{Deserialize, Serialize};

use crate::config::SENSOR_COUNT;
use crate::error::{AgentError, Result};
use crate::math::{solve_linear_system, Vec3};

/// Least-squares multilateration.
///
/// # Errors
///
/// Returns [`AgentError::InvalidSensor`] if the slices differ in length or
/// hold fewer than four points, and [`AgentError::SingularSystem`] if the
/// references are coplanar or otherwise degenerate.
pub fn multilaterate(references: &[Vec3], distances: &[f64]) -> Result<Vec3> {
    if references.len() != distances.len() || references.len() < 4 {
        return Err(AgentError::InvalidSensor(distances.len()));
    }

    let mut ata = [[0.0_f64; 3]; 3];
    let mut atb = [0.0_f64; 3];

    for i in 0..references.len() {
        for j in (i + 1)..references.len() {
            let (pi, pj) = (references[i], references[j]);
            let row = [
                2.0 * (pi.x - pj.x),
                2.0 * (pi.y - pj.y),
                2.0 * (pi.z - pj.z),
            ];
            let rhs = (pi.length_squared() - distances[i] * distances[i])
                - (pj.length_squared() - distances[j] * distances[j]);

            for r in 0..3 {
                for c in 0..3 {
                    ata[r][c] += row[r] * row[c];
                }
                atb[r] += row[r] * rhs;
            }
        }
    }

    let [x, y, z] = solve_linear_system(ata, atb)?;
    Ok(Vec3::new(x, y, z))
}

/// Latest distance reported by each range sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangingState {
    distances: [Option<f64>; SENSOR_COUNT],
}

impl RangingState {
    /// Record a sensor reply.
    ///
    /// # Errors
    ///
    /// Rejects unknown sensor indices and negative or non-finite distances,
    /// leaving the previous reading in place.
    pub fn record(&mut self, sensor: usize, distance: f64) -> Result<()> {
        let slot = self
            .distances
            .get_mut(sensor)
            .ok_or(AgentError::InvalidSensor(sensor))?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(AgentError::malformed(
                &distance.to_string(),
                format!("sensor {sensor} reported an invalid distance"),
            ));
        }
        *slot = Some(distance);
        Ok(())
    }

    /// True once every sensor has reported at least once.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.distances.iter().all(Option::is_some)
    }

    /// All distances, if every sensor has reported.
    #[must_use]
    pub fn distances(&self) -> Option<[f64; SENSOR_COUNT]> {
        let mut out = [0.0; SENSOR_COUNT];
        for (slot, value) in out.iter_mut().zip(self.distances) {
            *slot = value?;
        }
        Some(out)
    }

    /// Forget every reading.
    pub fn clear(&mut self) {
        self.distances = [None; SENSOR_COUNT];
    }
}

/// Turns sensor readings into a self-position estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimator {
    references: Vec<Vec3>,
    vertical_offset: f64,
    readings: RangingState,
}

impl PositionEstimator {
    /// Create an estimator for the given reference points.
    #[must_use]
    pub fn new(references: Vec<Vec3>, vertical_offset: f64) -> Self {
        Self {
            references,
            vertical_offset,
            readings: RangingState::default(),
        }
    }

    /// Record a sensor reply. See [`RangingState::record`].
    pub fn record(&mut self, sensor: usize, distance: f64) -> Result<()> {
        self.readings.record(sensor, distance)
    }

    /// True once a full ranging cycle has completed.
    #[must_use]
    pub fn has_full_cycle(&self) -> bool {
        self.readings.is_complete()
    }

    /// Solve for the agent's visual centre.
    ///
    /// Returns `Ok(None)` until every sensor has reported.
    pub fn solve(&self) -> Result<Option<Vec3>> {
        let Some(distances) = self.readings.distances() else {
            return Ok(None);
        };
        let bundle = multilaterate(&self.references, &distances)?;
        Ok(Some(bundle + Vec3::new(0.0, 0.0, self.vertical_offset)))
    }

    /// Forget every reading.
    pub fn reset(&mut self) {
        self.readings.clear();
    }

    /// Reference points, in sensor order.
    #[must_use]
    pub fn references(&self) -> &[Vec3] {
        &self.references
    }
}
