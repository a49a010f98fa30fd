//! Frame driver
//!
//! Turns variable real-time frames into a whole number of fixed ticks, then
//! hands the resulting scene to a renderer:
//!
//! ```text
//! Idle → Accumulating → Stepping(n) → Rendering → Accumulating → …
//! ```

use std::time::Duration;

use crate::core::SceneConfig;
use crate::frame::FixedTimestep;
use crate::scene::DrawItem;

/// Where the driver is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    /// No frame has run yet
    #[default]
    Idle,
    /// Between frames, collecting real time
    Accumulating,
    /// Running the given number of ticks
    Stepping(u32),
    /// Handing the draw list to the renderer
    Rendering,
}

/// Frame pacing diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frames run
    pub frames: u64,
    /// Ticks run
    pub ticks: u64,
    /// Frames that hit the cap
    pub clamped_frames: u64,
    /// Real time dropped by the cap
    pub discarded: Duration,
    /// Ticks run by the latest frame
    pub last_ticks: u32,
    /// Interpolation factor left after the latest frame
    pub last_alpha: f32,
}

/// What a frame drives
pub trait FrameTarget {
    /// Run one fixed tick
    fn tick(&mut self);

    /// Blend presentation between the last two ticks
    fn interpolate(&mut self, alpha: f32);

    /// Prepare and return everything to draw
    fn draw_list(&mut self) -> Vec<DrawItem>;
}

/// Receives the draw list once per frame
pub trait FrameRenderer {
    /// Draw one frame
    fn render(&mut self, items: &[DrawItem]);
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render(&mut self, _items: &[DrawItem]) {}
}

/// Fixed-step frame loop for one scene
#[derive(Debug)]
pub struct FrameDriver {
    timestep: FixedTimestep,
    interpolate: bool,
    phase: FramePhase,
    stats: FrameStats,
}

impl FrameDriver {
    /// Create a driver from scene settings
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            timestep: FixedTimestep::new(config.simulation.tick_rate_hz, config.frame.max_frame_duration()),
            interpolate: config.frame.interpolate,
            phase: FramePhase::Idle,
            stats: FrameStats::default(),
        }
    }

    /// Current phase
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Diagnostics so far
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Fixed step in seconds
    pub fn timestep(&self) -> f32 {
        self.timestep.timestep()
    }

    /// Interpolation enabled
    pub fn interpolates(&self) -> bool {
        self.interpolate
    }

    /// Run one frame of `frame_dt` real time
    ///
    /// Returns the number of ticks run.
    pub fn run_frame<T>(&mut self, frame_dt: Duration, target: &mut T, renderer: &mut dyn FrameRenderer) -> u32
    where
        T: FrameTarget + ?Sized,
    {
        self.phase = FramePhase::Accumulating;
        let accumulated = self.timestep.accumulate(frame_dt);
        if accumulated.clamped {
            self.stats.clamped_frames += 1;
            self.stats.discarded += accumulated.discarded;
            log::debug!(
                "Frame of {:?} clamped, discarding {:?}",
                frame_dt,
                accumulated.discarded
            );
        }

        let ticks = accumulated.ticks;
        self.phase = FramePhase::Stepping(ticks);
        let mut ran = 0;
        while self.timestep.consume_tick() {
            target.tick();
            ran += 1;
        }

        let alpha = self.timestep.alpha();
        if self.interpolate {
            target.interpolate(alpha);
        }

        self.phase = FramePhase::Rendering;
        let items = target.draw_list();
        renderer.render(&items);

        self.stats.frames += 1;
        self.stats.ticks += u64::from(ran);
        self.stats.last_ticks = ran;
        self.stats.last_alpha = alpha;
        self.phase = FramePhase::Accumulating;

        log::trace!("Frame {}: {} tick(s), alpha {:.3}", self.stats.frames, ran, alpha);
        ran
    }

    /// Drop accumulated time and statistics
    pub fn reset(&mut self) {
        self.timestep.reset();
        self.stats = FrameStats::default();
        self.phase = FramePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameConfig;

    #[derive(Default)]
    struct Recorder {
        ticks: u32,
        alphas: Vec<f32>,
        renders: u32,
    }

    impl FrameTarget for Recorder {
        fn tick(&mut self) {
            self.ticks += 1;
        }

        fn interpolate(&mut self, alpha: f32) {
            self.alphas.push(alpha);
        }

        fn draw_list(&mut self) -> Vec<DrawItem> {
            Vec::new()
        }
    }

    impl FrameRenderer for Recorder {
        fn render(&mut self, _items: &[DrawItem]) {
            self.renders += 1;
        }
    }

    #[test]
    fn test_phases_and_stats() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        assert_eq!(driver.phase(), FramePhase::Idle);

        let mut target = Recorder::default();
        let mut renderer = Recorder::default();
        let ticks = driver.run_frame(Duration::from_millis(50), &mut target, &mut renderer);

        assert_eq!(ticks, 3);
        assert_eq!(target.ticks, 3);
        assert_eq!(renderer.renders, 1);
        assert_eq!(driver.phase(), FramePhase::Accumulating);
        assert_eq!(driver.stats().frames, 1);
        assert_eq!(driver.stats().last_ticks, 3);
        assert!(target.alphas.is_empty());
    }

    #[test]
    fn test_ten_second_frame_runs_fifteen_ticks() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        let mut target = Recorder::default();

        let ticks = driver.run_frame(Duration::from_secs(10), &mut target, &mut NullRenderer);

        assert_eq!(ticks, 15);
        let stats = driver.stats();
        assert_eq!(stats.clamped_frames, 1);
        assert_eq!(stats.discarded, Duration::from_millis(9750));
    }

    #[test]
    fn test_short_frames_still_render() {
        let mut driver = FrameDriver::new(&SceneConfig::default());
        let mut target = Recorder::default();
        let mut renderer = Recorder::default();

        for _ in 0..3 {
            driver.run_frame(Duration::from_millis(5), &mut target, &mut renderer);
        }

        assert_eq!(target.ticks, 0);
        assert_eq!(renderer.renders, 3);
        assert_eq!(driver.stats().ticks, 0);
    }

    #[test]
    fn test_interpolation_alpha_is_reported() {
        let config = SceneConfig::default().with_frame(FrameConfig::default().with_interpolation(true));
        let mut driver = FrameDriver::new(&config);
        let mut target = Recorder::default();

        driver.run_frame(Duration::from_millis(25), &mut target, &mut NullRenderer);

        assert_eq!(target.ticks, 1);
        assert_eq!(target.alphas.len(), 1);
        assert!((target.alphas[0] - 0.5).abs() < 1e-6);

        driver.reset();
        assert_eq!(driver.phase(), FramePhase::Idle);
        assert_eq!(driver.stats(), FrameStats::default());
    }
}
