//! Reed-Solomon coding over any [`GaloisField`].
//!
//! Codewords are ordered highest power first: `c[0]` is the coefficient of x^(n-1).

use super::galois::GaloisField;
use thiserror::Error;

/// Why a block could not be corrected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReedSolomonError {
    /// More errors than the check words can locate
    #[error("uncorrectable block")]
    Uncorrectable,
    /// Block longer than the field allows
    #[error("block of {0} words exceeds field order")]
    BlockTooLong(usize),
}

/// Systematic encoder with a cached generator polynomial
#[derive(Debug, Clone)]
pub struct ReedSolomonEncoder {
    field: &'static GaloisField,
    generator: Vec<u16>,
}

impl ReedSolomonEncoder {
    /// Encoder producing `ec_count` check words
    pub fn new(field: &'static GaloisField, ec_count: usize) -> Self {
        let mut generator = vec![1u16];
        for i in 0..ec_count {
            let root = field.exp(field.generator_base() + i);
            let mut next = vec![0u16; generator.len() + 1];
            for (j, &g) in generator.iter().enumerate() {
                next[j] ^= g;
                next[j + 1] ^= field.mul(g, root);
            }
            generator = next;
        }
        Self { field, generator }
    }

    /// Check words for `data`
    pub fn encode(&self, data: &[u16]) -> Vec<u16> {
        let ec_count = self.generator.len() - 1;
        let mut remainder = vec![0u16; ec_count];
        if ec_count == 0 {
            return remainder;
        }
        for &d in data {
            let factor = d ^ remainder[0];
            remainder.rotate_left(1);
            remainder[ec_count - 1] = 0;
            for (r, &g) in remainder.iter_mut().zip(&self.generator[1..]) {
                *r ^= self.field.mul(g, factor);
            }
        }
        remainder
    }

    /// Byte-oriented convenience wrapper
    pub fn encode_bytes(&self, data: &[u8]) -> Vec<u8> {
        let words: Vec<u16> = data.iter().map(|&b| b as u16).collect();
        self.encode(&words).into_iter().map(|w| w as u8).collect()
    }
}

/// Berlekamp-Massey decoder with Chien search and Forney error values
#[derive(Debug, Clone, Copy)]
pub struct ReedSolomonDecoder {
    field: &'static GaloisField,
}

impl ReedSolomonDecoder {
    /// Decoder for codes over `field`
    pub fn new(field: &'static GaloisField) -> Self {
        Self { field }
    }

    /// Correct `received` in place; returns the number of corrected words
    pub fn decode(&self, received: &mut [u16], ec_count: usize) -> Result<usize, ReedSolomonError> {
        let f = self.field;
        let n = received.len();
        if n >= f.size() {
            return Err(ReedSolomonError::BlockTooLong(n));
        }
        if ec_count == 0 {
            return Ok(0);
        }

        let syndromes = self.syndromes(received, ec_count);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let lambda = self.error_locator(&syndromes);
        let degree = lambda.len() - 1;
        if degree == 0 || degree * 2 > ec_count {
            return Err(ReedSolomonError::Uncorrectable);
        }

        // Chien search: position j holds power p = n-1-j, a root of lambda is alpha^-p
        let mut errors = Vec::with_capacity(degree);
        for j in 0..n {
            let p = n - 1 - j;
            if eval_ascending(f, &lambda, f.exp_neg(p)) == 0 {
                errors.push((j, p));
            }
        }
        if errors.len() != degree {
            return Err(ReedSolomonError::Uncorrectable);
        }

        let mut omega = vec![0u16; ec_count];
        for (k, slot) in omega.iter_mut().enumerate() {
            for i in 0..=k.min(degree) {
                *slot ^= f.mul(syndromes[k - i], lambda[i]);
            }
        }
        let derivative: Vec<u16> = lambda
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
            .collect();

        let order = f.size() - 1;
        for &(j, p) in &errors {
            let x_inv = f.exp_neg(p);
            let denominator = eval_ascending(f, &derivative, x_inv);
            if denominator == 0 {
                return Err(ReedSolomonError::Uncorrectable);
            }
            let value = f.div(eval_ascending(f, &omega, x_inv), denominator);
            // X^(1 - base)
            let shift = (p * (order + 1 - f.generator_base() % order)) % order;
            received[j] ^= f.mul(value, f.exp(shift));
        }

        if self.syndromes(received, ec_count).iter().any(|&s| s != 0) {
            return Err(ReedSolomonError::Uncorrectable);
        }
        Ok(degree)
    }

    /// Byte-oriented convenience wrapper
    pub fn decode_bytes(&self, received: &mut [u8], ec_count: usize) -> Result<usize, ReedSolomonError> {
        let mut words: Vec<u16> = received.iter().map(|&b| b as u16).collect();
        let corrected = self.decode(&mut words, ec_count)?;
        for (dst, w) in received.iter_mut().zip(words) {
            *dst = w as u8;
        }
        Ok(corrected)
    }

    fn syndromes(&self, received: &[u16], ec_count: usize) -> Vec<u16> {
        let f = self.field;
        (0..ec_count)
            .map(|i| {
                let x = f.exp(f.generator_base() + i);
                received.iter().fold(0u16, |acc, &c| f.mul(acc, x) ^ c)
            })
            .collect()
    }

    fn error_locator(&self, syndromes: &[u16]) -> Vec<u16> {
        let f = self.field;
        let mut lambda = vec![1u16];
        let mut prev = vec![1u16];
        let mut l = 0usize;
        let mut m = 1usize;
        let mut b = 1u16;

        for k in 0..syndromes.len() {
            let mut d = syndromes[k];
            for i in 1..=l.min(lambda.len() - 1) {
                d ^= f.mul(lambda[i], syndromes[k - i]);
            }
            if d == 0 {
                m += 1;
                continue;
            }
            let coef = f.div(d, b);
            let mut next = lambda.clone();
            if next.len() < prev.len() + m {
                next.resize(prev.len() + m, 0);
            }
            for (i, &pc) in prev.iter().enumerate() {
                next[i + m] ^= f.mul(coef, pc);
            }
            if 2 * l <= k {
                prev = std::mem::replace(&mut lambda, next);
                l = k + 1 - l;
                b = d;
                m = 1;
            } else {
                lambda = next;
                m += 1;
            }
        }

        while lambda.len() > 1 && lambda[lambda.len() - 1] == 0 {
            lambda.pop();
        }
        lambda
    }
}

fn eval_ascending(f: &GaloisField, poly: &[u16], x: u16) -> u16 {
    poly.iter().rev().fold(0u16, |acc, &c| f.mul(acc, x) ^ c)
}
