//! Percentage progress reporting through the `log` facade.

/// Logs `stage: N%` at every tenth of `total` steps.
#[derive(Debug)]
pub struct Progress {
    stage: &'static str,
    total: usize,
    done: usize,
    last_decile: usize,
}

impl Progress {
    pub fn new(stage: &'static str, total: usize) -> Self {
        log::debug!("{stage}: 0%");
        Self {
            stage,
            total,
            done: 0,
            last_decile: 0,
        }
    }

    /// Records one finished step.
    pub fn tick(&mut self) {
        self.done += 1;
        let decile = (self.done * 10).checked_div(self.total).unwrap_or(10).min(10);
        if decile > self.last_decile {
            self.last_decile = decile;
            log::debug!("{}: {}%", self.stage, decile * 10);
        }
    }

    /// Grows the expected step count (stages whose work list grows as they run).
    pub fn extend(&mut self, steps: usize) {
        self.total += steps;
    }

    #[cfg(test)]
    fn percent(&self) -> usize {
        self.last_decile * 10
    }
}
