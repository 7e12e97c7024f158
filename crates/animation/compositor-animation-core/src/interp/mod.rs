//! Interpolators map normalized time in [0,1] to eased progress.
//!
//! An [`Interpolator`] is a cheap-to-clone handle around a pure function.
//! Presets cover the platform's standard curves; `by_name` resolves them
//! from configuration and fixtures.

pub mod functions;

use std::fmt;
use std::rc::Rc;

/// Shared easing function from normalized time to normalized progress.
#[derive(Clone)]
pub struct Interpolator {
    name: &'static str,
    func: Rc<dyn Fn(f32) -> f32>,
}

impl Interpolator {
    /// Wrap an arbitrary easing function. Overshooting curves are allowed.
    pub fn from_fn(f: impl Fn(f32) -> f32 + 'static) -> Self {
        Self {
            name: "custom",
            func: Rc::new(f),
        }
    }

    fn preset(name: &'static str, f: fn(f32) -> f32) -> Self {
        Self {
            name,
            func: Rc::new(f),
        }
    }

    pub fn linear() -> Self {
        Self::preset("linear", functions::linear)
    }

    pub fn accelerate() -> Self {
        Self::preset("accelerate", functions::accelerate)
    }

    pub fn decelerate() -> Self {
        Self::preset("decelerate", functions::decelerate)
    }

    pub fn accelerate_decelerate() -> Self {
        Self::preset("accelerate_decelerate", functions::accelerate_decelerate)
    }

    /// Cubic-bezier timing curve with control points (x1, y1) and (x2, y2).
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            name: "cubic_bezier",
            func: Rc::new(move |t| functions::bezier_ease(t, x1, y1, x2, y2)),
        }
    }

    fn named_bezier(name: &'static str, ctrl: [f32; 4]) -> Self {
        Self {
            name,
            ..Self::cubic_bezier(ctrl[0], ctrl[1], ctrl[2], ctrl[3])
        }
    }

    pub fn fast_out_slow_in() -> Self {
        Self::named_bezier("fast_out_slow_in", [0.4, 0.0, 0.2, 1.0])
    }

    pub fn linear_out_slow_in() -> Self {
        Self::named_bezier("linear_out_slow_in", [0.0, 0.0, 0.2, 1.0])
    }

    pub fn fast_out_linear_in() -> Self {
        Self::named_bezier("fast_out_linear_in", [0.4, 0.0, 1.0, 1.0])
    }

    pub fn emphasized_accelerate() -> Self {
        Self::named_bezier("emphasized_accelerate", [0.3, 0.0, 0.8, 0.15])
    }

    pub fn emphasized_decelerate() -> Self {
        Self::named_bezier("emphasized_decelerate", [0.05, 0.7, 0.1, 1.0])
    }

    /// Resolve a preset by its name.
    pub fn by_name(name: &str) -> Option<Self> {
        let interp = match name {
            "linear" => Self::linear(),
            "accelerate" => Self::accelerate(),
            "decelerate" => Self::decelerate(),
            "accelerate_decelerate" => Self::accelerate_decelerate(),
            "fast_out_slow_in" => Self::fast_out_slow_in(),
            "linear_out_slow_in" => Self::linear_out_slow_in(),
            "fast_out_linear_in" => Self::fast_out_linear_in(),
            "emphasized_accelerate" => Self::emphasized_accelerate(),
            "emphasized_decelerate" => Self::emphasized_decelerate(),
            _ => return None,
        };
        Some(interp)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        (self.func)(t)
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::decelerate()
    }
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Interpolator").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_decelerate() {
        let interp = Interpolator::default();
        assert_eq!(interp.name(), "decelerate");
        assert_eq!(interp.apply(0.5), 0.75);
    }

    #[test]
    fn by_name_resolves_every_preset() {
        for name in [
            "linear",
            "accelerate",
            "decelerate",
            "accelerate_decelerate",
            "fast_out_slow_in",
            "linear_out_slow_in",
            "fast_out_linear_in",
            "emphasized_accelerate",
            "emphasized_decelerate",
        ] {
            let interp = Interpolator::by_name(name).expect("preset exists");
            assert_eq!(interp.name(), name);
            assert!(
                (interp.apply(1.0) - 1.0).abs() < 1e-6,
                "{name} should end at 1"
            );
        }
        assert!(Interpolator::by_name("bounce").is_none());
    }

    #[test]
    fn custom_functions_may_overshoot() {
        let overshoot = Interpolator::from_fn(|t| t * 1.5);
        assert_eq!(overshoot.name(), "custom");
        assert_eq!(overshoot.apply(1.0), 1.5);
    }
}
