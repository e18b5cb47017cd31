/// Animation time in seconds, advanced by the preview scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationClock {
    t: f64,
    running: bool,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            t: 0.0,
            running: true,
        }
    }
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Add `base_dt·max(0, speed_percent)/100` while running. Returns the new time.
    pub fn advance(&mut self, base_dt: f64, speed_percent: f32) -> f64 {
        if self.running && base_dt.is_finite() && base_dt > 0.0 {
            let speed = f64::from(speed_percent.max(0.0));
            self.t += base_dt * speed / 100.0;
        }
        self.t
    }

    /// Back to `t = 0`. Only called when the base grid is rebuilt.
    pub fn reset(&mut self) {
        self.t = 0.0;
    }
}
