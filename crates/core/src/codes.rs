use crate::error::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

pub const CODE_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Seeded generator of random access codes. The same seed and parameters
/// always yield the same sequence of codes, across builds and platforms.
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    rng: ChaCha12Rng,
}

impl CodeGenerator {
    pub fn new(seed: u64, length: usize) -> Self {
        Self {
            alphabet: CODE_ALPHABET.chars().collect(),
            length,
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    pub fn next_code(&mut self) -> String {
        // u32 draws keep the sequence independent of the target's pointer width
        let symbols = self.alphabet.len() as u32;
        (0..self.length)
            .map(|_| self.alphabet[self.rng.gen_range(0..symbols) as usize])
            .collect()
    }

    pub fn generate(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.next_code()).collect()
    }

    /// Draws and discards `count` codes
    pub fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.next_code();
        }
    }
}

/// Number of codes that precede batch `batch`, or `None` if the batch lies
/// past the end of the addressable sequence
pub fn batch_offset(count: usize, batch: usize) -> Option<usize> {
    let offset = count.checked_mul(batch)?;
    offset.checked_add(count)?;
    Some(offset)
}

/// Codes for batch number `batch` of `count` codes each.
///
/// The generator always replays from the seed, so earlier batches are drawn
/// and discarded. Batch 0 is the first `count` codes and batch 1 is the
/// second `count`. Previously issued codes are therefore never reissued, and
/// nothing has to be recorded between runs.
pub fn issue_batch(seed: u64, length: usize, count: usize, batch: usize) -> Result<Vec<String>> {
    let offset = batch_offset(count, batch).ok_or_else(|| {
        Error::Config(format!("batch {batch} of {count} codes is out of range"))
    })?;
    let mut generator = CodeGenerator::new(seed, length);
    generator.skip(offset);
    Ok(generator.generate(count))
}
