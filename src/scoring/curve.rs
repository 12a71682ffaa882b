//! Four-parameter dose-response curve.
//!
//! ```text
//! score
//!  100 |                              ......------------
//!      |                    ....''''
//!  rec |               .:''                  (exponential saturation)
//!      |            .''
//!      |          .'      (tanh ramp)
//!    5 |.......--'
//!    0 +-----+-------------+----------------------------- dose
//!           min           rec
//! ```

use crate::config::ComponentRule;

/// Score at `dose == min_dose`, the bottom of the ramp.
pub const LOW_SCORE_FLOOR: f64 = 5.0;
pub const MAX_SCORE: f64 = 100.0;
/// Steepness of the tanh ramp over the normalised [0, 1] dose interval.
pub const RAMP_STEEPNESS: f64 = 5.0;
/// Perturbation applied to degenerate `rec_dose` values.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Map a dose onto a 0-100 score.
///
/// - missing or below `min_dose`: 0
/// - `[min_dose, rec_dose)`: tanh ramp rescaled onto `[5, rec_score]`
/// - `>= rec_dose`: exponential saturation from `rec_score` toward 100 at
///   rate `saturation_factor / rec_dose`
///
/// `rec_dose == min_dose` and `rec_dose == 0` are nudged by
/// [`DEGENERATE_EPSILON`] so neither branch divides by zero. The result is
/// clamped to `[0, 100]`.
pub fn dose_response_score(
    dose: Option<f64>,
    min_dose: f64,
    rec_dose: f64,
    rec_score: f64,
    saturation_factor: f64,
) -> f64 {
    let mut rec_dose = rec_dose;
    if rec_dose == min_dose {
        rec_dose += DEGENERATE_EPSILON;
    }
    if rec_dose == 0.0 {
        rec_dose = DEGENERATE_EPSILON;
    }

    let Some(dose) = dose.filter(|d| !d.is_nan()) else {
        return 0.0;
    };
    if dose < min_dose {
        return 0.0;
    }

    let score = if dose < rec_dose {
        let x_norm = (dose - min_dose) / (rec_dose - min_dose);
        let ramp = 0.5 * (1.0 + (RAMP_STEEPNESS * (x_norm - 0.5)).tanh());
        ramp * (rec_score - LOW_SCORE_FLOOR) + LOW_SCORE_FLOOR
    } else {
        let rate = saturation_factor / rec_dose;
        let saturation = 1.0 - (-rate * (dose - rec_dose)).exp();
        rec_score + (MAX_SCORE - rec_score) * saturation
    };

    score.clamp(0.0, MAX_SCORE)
}

impl ComponentRule {
    /// Score a dose under this rule's curve parameters.
    pub fn score(&self, dose: Option<f64>) -> f64 {
        dose_response_score(
            dose,
            self.min_dose,
            self.rec_dose,
            self.rec_score,
            self.saturation_factor,
        )
    }
}
