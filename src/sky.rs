//! Procedural sky images
//!
//! Skies are generated as indexed pixels: fractal clouds mapped onto a
//! palette ramp, optionally with a band of hills along the bottom. Noise is
//! sampled around a cylinder so the image wraps seamlessly horizontally.

use std::f64::consts::TAU;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{SkyConfig, SkyTheme};

impl SkyTheme {
    /// Palette ramp for the clouds, darkest first
    pub fn cloud_colors(self) -> &'static [u8] {
        match self {
            SkyTheme::Clouds => &[
                106, 104, 102, 100, 98, 96, 94, 92, 90, 88, 86, 84, 82, 80,
            ],
            SkyTheme::Hell => &[
                188, 185, 184, 183, 182, 181, 180, 179, 178, 177, 176, 175, 174, 173,
            ],
            SkyTheme::Blue => &[
                245, 245, 244, 244, 243, 242, 241, 240, 206, 205, 204, 204, 203, 203,
            ],
        }
    }

    /// Palette ramp for the hills, darkest first
    pub fn hill_colors(self) -> &'static [u8] {
        match self {
            SkyTheme::Hell => &[0, 6, 47, 45, 43, 41, 39, 37, 35, 33],
            SkyTheme::Clouds | SkyTheme::Blue => &[0, 2, 1, 79, 77, 75, 73, 70, 67, 64],
        }
    }
}

/// Seeded generator for sky pixels
pub struct SkyGenerator {
    rng: StdRng,
}

impl SkyGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fractal cloud layer covering the whole image.
    /// `squish` stretches the clouds horizontally.
    pub fn clouds(&mut self, width: usize, height: usize, colors: &[u8], squish: f64) -> Vec<u8> {
        assert!(!colors.is_empty());

        let fbm = Fbm::<Perlin>::new(self.rng.gen()).set_octaves(5);
        let radius = 2.0;

        let mut pixels = vec![0u8; width * height];
        for y in 0..height {
            let v = y as f64 / height as f64 * squish;
            for x in 0..width {
                let angle = x as f64 / width as f64 * TAU;
                let value = fbm.get([angle.cos() * radius, angle.sin() * radius, v]);
                pixels[y * width + x] = ramp(colors, (value + 1.0) * 0.5);
            }
        }
        pixels
    }

    /// Draw hills over the bottom of `pixels`. Hill tops lie between
    /// `min_h` and `max_h`, given as fractions of the image height.
    pub fn add_hills(
        &mut self,
        pixels: &mut [u8],
        width: usize,
        height: usize,
        colors: &[u8],
        min_h: f64,
        max_h: f64,
    ) {
        assert!(!colors.is_empty());
        assert!(pixels.len() >= width * height);

        let fbm = Fbm::<Perlin>::new(self.rng.gen()).set_octaves(3);

        for x in 0..width {
            let angle = x as f64 / width as f64 * TAU;
            let value = (fbm.get([angle.cos(), angle.sin(), 0.5]) + 1.0) * 0.5;
            let hill = (min_h + (max_h - min_h) * value.clamp(0.0, 1.0)) * height as f64;
            let top = height.saturating_sub(hill as usize);
            let span = (height - top).max(1);

            for y in top..height {
                // brightest at the crest
                let depth = (y - top) as f64 / span as f64;
                pixels[y * width + x] = ramp(colors, 1.0 - depth);
            }
        }
    }
}

/// Pick a color from `colors` for an intensity in `[0, 1]`
fn ramp(colors: &[u8], intensity: f64) -> u8 {
    let index = (intensity.clamp(0.0, 1.0) * colors.len() as f64) as usize;
    colors[index.min(colors.len() - 1)]
}

/// Generate the sky described by `config`
pub fn generate_sky(config: &SkyConfig) -> Vec<u8> {
    let width = config.width as usize;
    let height = config.height as usize;

    let mut generator = SkyGenerator::new(config.seed);
    let mut pixels = generator.clouds(width, height, config.theme.cloud_colors(), 3.0);

    if config.hills {
        generator.add_hills(&mut pixels, width, height, config.theme.hill_colors(), 0.2, 0.9);
    }

    log::debug!(
        "[Sky] Generated {}x{} {:?} sky (seed {})",
        width,
        height,
        config.theme,
        config.seed
    );

    pixels
}
