//! Spinner shown for indeterminate progress.

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone, Default)]
pub struct AliveCursor {
    frame: usize,
}

impl AliveCursor {
    /// Advance and return the next frame.
    pub fn tick(&mut self) -> char {
        self.frame = (self.frame + 1) % FRAMES.len();
        FRAMES[self.frame]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_frames() {
        let mut c = AliveCursor::default();
        let seen: String = (0..5).map(|_| c.tick()).collect();
        assert_eq!(seen, "/-\\|/");
    }
}
