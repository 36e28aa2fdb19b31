//! Random draw sources
//!
//! Agents never own global randomness: every decision receives a
//! `RandomSource` from the host. `SeededRng` is the deterministic PRNG
//! used for real play, `ScriptedSource` and `RecordingSource` exist so a
//! match can be pinned down or replayed draw-for-draw.

use serde::{Deserialize, Serialize};

/// Capability handed to an agent once per round.
pub trait RandomSource {
    /// Uniform value in [0, 1).
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in the inclusive range [lo, hi].
    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        (**self).next_in_range(lo, hi)
    }
}

/// Seeded random number generator
///
/// Deterministic: same seed + index = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and match index
    pub fn new(seed: &[u8; 32], match_index: u32) -> Self {
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        state ^= (match_index as u64).wrapping_mul(0x517cc1b727220a95);

        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Convenience constructor for tests and tools that only have a number.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(&bytes, 0)
    }

    /// Derive an independent stream for one draw slot within a match.
    ///
    /// The host uses `round * 2` and `round * 2 + 1` so the two players
    /// never consume each other's draws.
    pub fn for_round(&self, slot: u32) -> Self {
        let mut new_state = self.state;
        new_state ^= (slot as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15);
        if new_state == 0 {
            new_state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state: new_state };
        rng.next_u64();
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }
}

impl RandomSource for SeededRng {
    fn next_unit(&mut self) -> f64 {
        // 53 high bits → exact f64 in [0, 1)
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as u32
    }
}

/// One value handed out by a `RandomSource`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Draw {
    Unit(f64),
    Range(u32),
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// A unit request served by a `Range` entry (or the reverse) takes the
/// neutral value for its kind; range results are clamped into the range
/// actually requested.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    draws: Vec<Draw>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(draws: Vec<Draw>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Every unit draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![Draw::Unit(value)])
    }

    pub fn units(values: &[f64]) -> Self {
        Self::new(values.iter().map(|v| Draw::Unit(*v)).collect())
    }

    fn next_draw(&mut self) -> Option<Draw> {
        if self.draws.is_empty() {
            return None;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        Some(draw)
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        match self.next_draw() {
            Some(Draw::Unit(v)) if (0.0..1.0).contains(&v) => v,
            _ => 0.5,
        }
    }

    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        let hi = hi.max(lo);
        match self.next_draw() {
            Some(Draw::Range(v)) => v.clamp(lo, hi),
            _ => lo + (hi - lo) / 2,
        }
    }
}

/// Wraps a source and remembers every draw it served.
#[derive(Clone, Debug)]
pub struct RecordingSource<S> {
    inner: S,
    log: Vec<Draw>,
}

impl<S: RandomSource> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, log: Vec::new() }
    }

    pub fn draws(&self) -> &[Draw] {
        &self.log
    }

    /// A source that serves exactly the recorded draws again.
    pub fn replay(&self) -> ScriptedSource {
        ScriptedSource::new(self.log.clone())
    }
}

impl<S: RandomSource> RandomSource for RecordingSource<S> {
    fn next_unit(&mut self) -> f64 {
        let v = self.inner.next_unit();
        self.log.push(Draw::Unit(v));
        v
    }

    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        let v = self.inner.next_in_range(lo, hi);
        self.log.push(Draw::Range(v));
        v
    }
}
