use crate::errors::Result;

/// How many times a timer fires before it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// The timer never expires on its own.
    Forever,
    /// The timer expires after firing this many times in total.
    Times(u32),
}

/// The setup parameters of a named timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimerParams {
    /// Seconds between two firings. An interval of 0 with `Repeat::Forever`
    /// fires on every frame.
    pub interval: f32,
    /// How many times the timer fires before it is unscheduled
    /// automatically.
    pub repeat: Repeat,
    /// Extra seconds before the first firing only.
    pub delay: f32,
    /// Whether the owning target starts out paused.
    pub paused: bool,
}

impl Default for TimerParams {
    fn default() -> Self {
        TimerParams {
            interval: 0.0,
            repeat: Repeat::Forever,
            delay: 0.0,
            paused: false,
        }
    }
}

pub(crate) type TimerCallback = Box<dyn FnMut(f32) -> Result<()>>;

/// One named, recurring or one-shot callback. Timers arm on their first
/// tick: the tick that registers them into the flow of time never fires
/// the callback, it only starts the clock.
pub(crate) struct Timer {
    repeat: Repeat,
    delay: f32,
    pending_delay: bool,
    elapsed: Option<f32>,
    executed: u32,
    callback: TimerCallback,
}

impl Timer {
    pub fn new(params: TimerParams, callback: TimerCallback) -> Self {
        Timer {
            repeat: params.repeat,
            delay: params.delay,
            pending_delay: params.delay > 0.0,
            elapsed: None,
            executed: 0,
            callback,
        }
    }

    /// Advances the timer. The interval is owned by the slot so in-place
    /// re-schedules take effect without touching the timer state. Returns
    /// true once the repeat count is exhausted.
    pub fn tick(&mut self, dt: f32, interval: f32) -> Result<bool> {
        let elapsed = match self.elapsed {
            None => {
                self.elapsed = Some(0.0);
                self.executed = 0;
                return Ok(false);
            }
            Some(v) => v + dt,
        };

        if self.pending_delay {
            if elapsed >= self.delay {
                (self.callback)(elapsed)?;
                self.executed += 1;
                self.elapsed = Some(elapsed - self.delay);
                self.pending_delay = false;
            } else {
                self.elapsed = Some(elapsed);
            }
        } else if elapsed >= interval {
            (self.callback)(elapsed)?;
            self.executed += 1;
            self.elapsed = Some(0.0);
        } else {
            self.elapsed = Some(elapsed);
        }

        Ok(match self.repeat {
            Repeat::Forever => false,
            Repeat::Times(n) => self.executed >= n,
        })
    }
}
