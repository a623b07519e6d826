//! Injectable uniform random sources.
//!
//! The engine never touches a global generator. It draws through
//! [`RandomSource`], which is implemented for any `rand` generator via
//! [`RngSource`] and, for replaying exact draw sequences, by
//! [`ScriptedSource`].

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::ValidationError;

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    /// Returns the next sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Adapts any [`RngCore`] into a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: RngCore> RngSource<R> {
    /// Wraps a generator.
    pub const fn new(rng: R) -> Self {
        Self(rng)
    }

    /// Returns the wrapped generator.
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// The default reproducible source.
pub type SeededSource = RngSource<ChaCha8Rng>;

/// Creates a [`SeededSource`] from a 64-bit seed.
#[must_use]
pub fn seeded(seed: u64) -> SeededSource {
    RngSource::new(ChaCha8Rng::seed_from_u64(seed))
}

/// Derives an independent seed for stream `index` from a base seed.
///
/// SplitMix64 over `base ^ index * golden_gamma`, so neighbouring indices
/// give unrelated streams.
#[must_use]
pub fn derive_seed(base: u64, index: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut z = base ^ index.wrapping_mul(GOLDEN_GAMMA);
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Replays a fixed list of samples, cycling when exhausted.
///
/// # Examples
///
/// ```
/// use crnsim::{RandomSource, ScriptedSource};
///
/// let mut source = ScriptedSource::new(vec![0.25, 0.75]).unwrap();
/// assert_eq!(source.next_f64(), 0.25);
/// assert_eq!(source.next_f64(), 0.75);
/// assert_eq!(source.next_f64(), 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    samples: Vec<f64>,
    cursor: usize,
    drawn: u64,
}

impl ScriptedSource {
    /// Creates a scripted source. Every sample must lie in `[0, 1)` and the
    /// list must not be empty.
    pub fn new(samples: Vec<f64>) -> Result<Self, ValidationError> {
        if samples.is_empty() {
            return Err(ValidationError::InvalidSamples {
                reason: "no samples".to_string(),
            });
        }
        if let Some(bad) = samples.iter().find(|s| !(0.0..1.0).contains(*s)) {
            return Err(ValidationError::InvalidSamples {
                reason: format!("sample {bad} outside [0, 1)"),
            });
        }
        Ok(Self {
            samples,
            cursor: 0,
            drawn: 0,
        })
    }

    /// Total number of samples handed out so far.
    #[must_use]
    pub const fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        let sample = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        self.drawn += 1;
        sample
    }
}
