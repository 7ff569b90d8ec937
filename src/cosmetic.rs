//! Caption colour cycling, a background task independent of the sequencer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec3;
use rand::Rng;

use crate::display::DisplaySurface;
use crate::error::{Error, Result};

/// HSV (all components in 0..=1) to RGB
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;

    let rgb = match h as u32 {
        0 => Vec3::new(c, x, 0.0),
        1 => Vec3::new(x, c, 0.0),
        2 => Vec3::new(0.0, c, x),
        3 => Vec3::new(0.0, x, c),
        4 => Vec3::new(x, 0.0, c),
        _ => Vec3::new(c, 0.0, x),
    };
    rgb + Vec3::splat(m)
}

/// Random opaque colour, uniform in HSV space
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    hsv_to_rgb(rng.gen(), rng.gen(), rng.gen())
}

/// Re-tints the caption at a fixed interval until stopped or dropped
pub struct ColorCycler {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<u64>>,
}

impl ColorCycler {
    pub fn start<R>(display: Arc<dyn DisplaySurface>, interval: Duration, mut rng: R) -> Result<Self>
    where
        R: Rng + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("color-cycler".to_string())
            .spawn(move || {
                let mut ticks = 0u64;
                while !stop_thread.load(Ordering::Acquire) {
                    display.set_text_color(random_color(&mut rng));
                    ticks += 1;
                    thread::sleep(interval);
                }
                ticks
            })
            .map_err(Error::Io)?;

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stop the task and return how many colours were applied
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.stop.store(true, Ordering::Release);
        self.thread
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for ColorCycler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
