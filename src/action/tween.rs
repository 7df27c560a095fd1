use crate::errors::Result;
use crate::scene::NodeId;

use super::Action;

/// Easing curves applied to a `Tween`'s normalized progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Ease {
    /// Maps a normalized progress `t` in `[0, 1]` through the curve. Every
    /// curve is anchored at `apply(0) == 0` and `apply(1) == 1`.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Ease::Linear => t,
            Ease::QuadIn => t * t,
            Ease::QuadOut => t * (2.0 - t),
            Ease::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    (4.0 - 2.0 * t) * t - 1.0
                }
            }
            Ease::CubicIn => t * t * t,
            Ease::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
        }
    }
}

/// A finite-duration action delivering eased, normalized progress to a
/// closure once per frame. The closure owns whatever is being animated; the
/// manager never needs to know.
///
/// The final step is clamped so the closure always observes exactly `1.0`
/// before the tween completes.
pub struct Tween {
    duration: f32,
    elapsed: f32,
    ease: Ease,
    callback: Box<dyn FnMut(f32) -> Result<()>>,
}

impl Tween {
    pub fn new<F>(duration: f32, callback: F) -> Self
    where
        F: FnMut(f32) -> Result<()> + 'static,
    {
        Tween::with_ease(duration, Ease::Linear, callback)
    }

    pub fn with_ease<F>(duration: f32, ease: Ease, callback: F) -> Self
    where
        F: FnMut(f32) -> Result<()> + 'static,
    {
        debug_assert!(duration > 0.0, "a tween needs a positive duration");

        Tween {
            duration,
            elapsed: 0.0,
            ease,
            callback: Box::new(callback),
        }
    }
}

impl Action for Tween {
    fn start(&mut self, _: NodeId) {
        self.elapsed = 0.0;
    }

    fn step(&mut self, dt: f32) -> Result<()> {
        if self.is_done() {
            return Ok(());
        }

        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = self.elapsed / self.duration;
        (self.callback)(self.ease.apply(t))
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn curves_are_anchored() {
        let curves = [
            Ease::Linear,
            Ease::QuadIn,
            Ease::QuadOut,
            Ease::QuadInOut,
            Ease::CubicIn,
            Ease::CubicOut,
            Ease::CubicInOut,
        ];

        for ease in &curves {
            assert!(ease.apply(0.0).abs() < 1e-6);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn final_step_is_clamped() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);

        let mut tween = Tween::new(1.0, move |t| {
            log.borrow_mut().push(t);
            Ok(())
        });

        tween.start(NodeId::default());
        tween.step(0.4).unwrap();
        tween.step(0.4).unwrap();
        tween.step(0.4).unwrap();

        assert!(tween.is_done());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!((seen[0] - 0.4).abs() < 1e-6);
        assert!((seen[1] - 0.8).abs() < 1e-6);
        assert!((seen[2] - 1.0).abs() < 1e-6);
    }
}
