//! Exponential smoothing of the per-cycle raw average
//!
//! Turns the noisy cycle-to-cycle average into a temporally stable signal:
//!
//! ```text
//! s = α·raw + (1 − α)·s_prev
//! ```
//!
//! The first sample seeds the state directly - no synthetic zero baseline,
//! so there is no cold-start bias toward zero. α = 1 degenerates to "no
//! smoothing".

/// Smallest usable smoothing factor.
///
/// α must stay strictly positive or the newest sample would never register.
const ALPHA_FLOOR: f32 = 1e-6;

/// First-order exponential smoother
#[derive(Debug, Clone, Copy)]
pub struct ExponentialSmoother {
    /// Weight given to the newest raw sample, in (0, 1]
    alpha: f32,

    /// Last smoothed value; `None` until the first sample arrives
    state: Option<f32>,
}

impl ExponentialSmoother {
    /// Create a smoother with the given factor, clamped into (0, 1].
    ///
    /// Non-finite factors fall back to 1.0 (no smoothing).
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(ALPHA_FLOOR, 1.0)
        } else {
            1.0
        };

        Self { alpha, state: None }
    }

    /// Fold one raw value into the smoothed signal and return the result.
    ///
    /// The first call returns its input unchanged and seeds the state.
    pub fn smooth(&mut self, raw: f32) -> f32 {
        let next = match self.state {
            Some(prev) => self.alpha * raw + (1.0 - self.alpha) * prev,
            None => raw,
        };
        self.state = Some(next);
        next
    }

    /// Last smoothed value, if any sample has been folded in
    pub fn value(&self) -> Option<f32> {
        self.state
    }

    /// Configured smoothing factor
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Discard the state; the next sample seeds afresh
    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_passes_through() {
        let mut smoother = ExponentialSmoother::new(0.2);
        assert_eq!(smoother.smooth(21.6), 21.6);
        assert_eq!(smoother.value(), Some(21.6));
    }

    #[test]
    fn second_sample_is_weighted() {
        let mut smoother = ExponentialSmoother::new(0.5);
        smoother.smooth(20.0);
        assert_eq!(smoother.smooth(30.0), 25.0);
    }

    #[test]
    fn alpha_one_is_no_smoothing() {
        let mut smoother = ExponentialSmoother::new(1.0);
        smoother.smooth(20.0);
        assert_eq!(smoother.smooth(30.0), 30.0);
        assert_eq!(smoother.smooth(-5.0), -5.0);
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(ExponentialSmoother::new(2.0).alpha(), 1.0);
        assert!(ExponentialSmoother::new(0.0).alpha() > 0.0);
        assert_eq!(ExponentialSmoother::new(f32::NAN).alpha(), 1.0);
    }

    #[test]
    fn constant_input_converges_monotonically() {
        let mut smoother = ExponentialSmoother::new(0.3);
        smoother.smooth(0.0);

        let target = 10.0;
        let mut last_gap = target;
        for _ in 0..30 {
            let s = smoother.smooth(target);
            let gap = target - s;
            assert!(gap >= 0.0, "smoothed value overshot the constant input");
            assert!(gap < last_gap, "convergence must be monotone");
            last_gap = gap;
        }
        assert!(last_gap < 1e-3);
    }

    #[test]
    fn reset_reseeds_from_next_sample() {
        let mut smoother = ExponentialSmoother::new(0.2);
        smoother.smooth(20.0);
        smoother.smooth(25.0);

        smoother.reset();
        assert_eq!(smoother.value(), None);
        assert_eq!(smoother.smooth(40.0), 40.0);
    }
}
