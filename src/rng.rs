use std::collections::{HashMap, VecDeque};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform randomness as the simulation consumes it. Every stochastic
/// branch draws through this trait so tests can script the rolls.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn roll(&mut self) -> f64;

    fn chance(&mut self, probability: f64) -> bool {
        self.roll() < probability
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let picked = (self.roll() * len as f64) as usize;
        picked.min(len.saturating_sub(1))
    }

    /// Uniform integer in `min..=max`.
    fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        let offset = (self.roll() * span as f64).floor() as i64;
        min + offset.min(span - 1)
    }
}

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    /// Independent stream per subsystem, derived from the master seed the
    /// first time the name is requested.
    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 32];
            self.master.fill_bytes(&mut seed_bytes);
            let mut seed_u64 = [0u8; 8];
            seed_u64.copy_from_slice(&seed_bytes[..8]);
            let derived = u64::from_le_bytes(seed_u64);
            ChaCha8Rng::seed_from_u64(derived)
        });
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl<'a> RandomSource for SystemRng<'a> {
    fn roll(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}

impl RandomSource for ChaCha8Rng {
    fn roll(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of rolls, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    queued: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            queued: rolls.into_iter().collect(),
            fallback,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }

    pub fn remaining(&self) -> usize {
        self.queued.len()
    }
}

impl RandomSource for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.queued.pop_front().unwrap_or(self.fallback)
    }
}
