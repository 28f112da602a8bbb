//! Arithmetic in GF(2^m) via log/exp tables.

use std::sync::OnceLock;

/// A binary extension field plus the first consecutive root used by its RS codes
#[derive(Debug)]
pub struct GaloisField {
    size: usize,
    generator_base: usize,
    exp: Vec<u16>,
    log: Vec<u16>,
}

impl GaloisField {
    /// Build the field defined by `primitive` (which includes the x^m term)
    pub fn new(primitive: u32, size: usize, generator_base: usize) -> Self {
        let mut exp = vec![0u16; size * 2];
        let mut log = vec![0u16; size];
        let mut x = 1u32;
        for i in 0..size - 1 {
            exp[i] = x as u16;
            log[x as usize] = i as u16;
            x <<= 1;
            if x as usize >= size {
                x ^= primitive;
                x &= size as u32 - 1;
            }
        }
        for i in size - 1..size * 2 {
            exp[i] = exp[i - (size - 1)];
        }
        Self {
            size,
            generator_base,
            exp,
            log,
        }
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.size
    }

    /// Power of alpha at which the generator polynomial's roots start
    pub fn generator_base(&self) -> usize {
        self.generator_base
    }

    /// alpha^power
    pub fn exp(&self, power: usize) -> u16 {
        self.exp[power % (self.size - 1)]
    }

    /// Discrete log of a non-zero element
    pub fn log(&self, a: u16) -> usize {
        debug_assert!(a != 0, "log of zero");
        self.log[a as usize] as usize
    }

    /// Product
    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    /// Quotient; `b` must be non-zero
    pub fn div(&self, a: u16, b: u16) -> u16 {
        debug_assert!(b != 0, "division by zero");
        if a == 0 || b == 0 {
            return 0;
        }
        let order = self.size - 1;
        let diff = self.log[a as usize] as usize + order - self.log[b as usize] as usize;
        self.exp[diff % order]
    }

    /// alpha^(-power)
    pub fn exp_neg(&self, power: usize) -> u16 {
        let order = self.size - 1;
        self.exp[(order - power % order) % order]
    }
}

macro_rules! field {
    ($name:ident, $doc:literal, $primitive:expr, $size:expr, $base:expr) => {
        #[doc = $doc]
        pub fn $name() -> &'static GaloisField {
            static FIELD: OnceLock<GaloisField> = OnceLock::new();
            FIELD.get_or_init(|| GaloisField::new($primitive, $size, $base))
        }
    };
}

field!(qr_code, "GF(256), x^8+x^4+x^3+x^2+1, roots from alpha^0", 0x11D, 256, 0);
field!(data_matrix, "GF(256), x^8+x^5+x^3+x^2+1, roots from alpha^1", 0x12D, 256, 1);
field!(aztec_param, "GF(16) for Aztec mode messages", 0x13, 16, 1);
field!(aztec_data_6, "GF(64) for Aztec 6-bit codewords", 0x43, 64, 1);
field!(aztec_data_10, "GF(1024) for Aztec 10-bit codewords", 0x409, 1024, 1);
field!(aztec_data_12, "GF(4096) for Aztec 12-bit codewords", 0x1069, 4096, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_field_matches_known_powers() {
        let f = qr_code();
        assert_eq!(f.exp(0), 1);
        assert_eq!(f.exp(8), 29);
        assert_eq!(f.exp(255), 1);
        assert_eq!(f.log(29), 8);
    }

    #[test]
    fn test_field_axioms() {
        for f in [qr_code(), data_matrix(), aztec_param(), aztec_data_10()] {
            for a in 1..f.size().min(300) as u16 {
                let inv = f.div(1, a);
                assert_eq!(f.mul(a, inv), 1);
                assert_eq!(f.div(f.mul(a, 7 % f.size() as u16 + 1), a), 7 % f.size() as u16 + 1);
            }
        }
    }

    #[test]
    fn test_every_nonzero_element_is_a_power() {
        let f = aztec_data_6();
        let mut seen = vec![false; f.size()];
        for i in 0..f.size() - 1 {
            seen[f.exp(i) as usize] = true;
        }
        assert!(seen[1..].iter().all(|&s| s));
        assert_eq!(f.mul(f.exp(5), f.exp_neg(5)), 1);
    }
}
