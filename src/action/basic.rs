use crate::errors::Result;
use crate::scene::NodeId;
use crate::sched::Repeat;

use super::Action;

/// Waits for a fixed amount of seconds and does nothing else. Mostly useful
/// as a spacer inside a `Sequence`.
pub struct Delay {
    duration: f32,
    elapsed: f32,
}

impl Delay {
    pub fn new(duration: f32) -> Self {
        Delay {
            duration,
            elapsed: 0.0,
        }
    }
}

impl Action for Delay {
    fn start(&mut self, _: NodeId) {
        self.elapsed = 0.0;
    }

    fn step(&mut self, dt: f32) -> Result<()> {
        self.elapsed += dt;
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Fires a closure once on its first step and completes immediately.
pub struct Invoke {
    callback: Box<dyn FnMut() -> Result<()>>,
    fired: bool,
}

impl Invoke {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        Invoke {
            callback: Box::new(callback),
            fired: false,
        }
    }
}

impl Action for Invoke {
    fn start(&mut self, _: NodeId) {
        self.fired = false;
    }

    fn step(&mut self, _: f32) -> Result<()> {
        if !self.fired {
            self.fired = true;
            (self.callback)()?;
        }

        Ok(())
    }

    fn is_done(&self) -> bool {
        self.fired
    }
}

/// Runs a list of actions back to back. The whole sequence counts as one
/// running action on its target.
pub struct Sequence {
    steps: Vec<Box<dyn Action>>,
    index: usize,
    target: Option<NodeId>,
}

impl Sequence {
    pub fn new(steps: Vec<Box<dyn Action>>) -> Self {
        debug_assert!(!steps.is_empty(), "a sequence needs at least one step");

        Sequence {
            steps,
            index: 0,
            target: None,
        }
    }
}

impl Action for Sequence {
    fn start(&mut self, target: NodeId) {
        self.target = Some(target);
        self.index = 0;

        if let Some(first) = self.steps.first_mut() {
            first.start(target);
        }
    }

    fn step(&mut self, dt: f32) -> Result<()> {
        // A step completing mid-frame hands control to the next one within
        // the same frame, with a zero dt; instantaneous followers thus fire
        // without waiting for the next update.
        let mut dt = dt;

        while self.index < self.steps.len() {
            {
                let current = &mut self.steps[self.index];
                current.step(dt)?;

                if !current.is_done() {
                    break;
                }

                current.stop();
            }

            self.index += 1;
            dt = 0.0;

            if let Some(target) = self.target {
                if let Some(next) = self.steps.get_mut(self.index) {
                    next.start(target);
                }
            }
        }

        Ok(())
    }

    fn is_done(&self) -> bool {
        self.index >= self.steps.len()
    }

    fn stop(&mut self) {
        if let Some(current) = self.steps.get_mut(self.index) {
            current.stop();
        }
    }
}

/// Runs the wrapped action to completion a fixed number of times, or
/// forever.
pub struct RepeatAction {
    inner: Box<dyn Action>,
    repeat: Repeat,
    completed: u32,
    target: Option<NodeId>,
}

impl RepeatAction {
    pub fn new(inner: Box<dyn Action>, times: u32) -> Self {
        debug_assert!(times > 0, "a repeat must run at least once");

        RepeatAction {
            inner,
            repeat: Repeat::Times(times),
            completed: 0,
            target: None,
        }
    }

    pub fn forever(inner: Box<dyn Action>) -> Self {
        RepeatAction {
            inner,
            repeat: Repeat::Forever,
            completed: 0,
            target: None,
        }
    }
}

impl Action for RepeatAction {
    fn start(&mut self, target: NodeId) {
        self.target = Some(target);
        self.completed = 0;
        self.inner.start(target);
    }

    fn step(&mut self, dt: f32) -> Result<()> {
        if self.is_done() {
            return Ok(());
        }

        self.inner.step(dt)?;

        if self.inner.is_done() {
            self.inner.stop();
            self.completed += 1;

            if !self.is_done() {
                if let Some(target) = self.target {
                    self.inner.start(target);
                }
            }
        }

        Ok(())
    }

    fn is_done(&self) -> bool {
        match self.repeat {
            Repeat::Forever => false,
            Repeat::Times(n) => self.completed >= n,
        }
    }

    fn stop(&mut self) {
        if !self.is_done() {
            self.inner.stop();
        }
    }
}
