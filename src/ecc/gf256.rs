/// GF(256) field arithmetic backed by log/exp tables
///
/// Each symbol format fixes an irreducible primitive polynomial and a
/// generator base exponent; a [`Gf256Field`] holds the tables for one such
/// pair. The named instances below are computed once and shared read-only
/// process-wide.
use std::sync::LazyLock;

/// Field order
const FIELD_SIZE: usize = 256;

/// The field used by QR-style symbols: x^8 + x^4 + x^3 + x^2 + 1, generator
/// polynomial roots starting at alpha^0
pub static QR_FIELD: LazyLock<Gf256Field> = LazyLock::new(|| Gf256Field::new(0x11D, 0));

/// The field used by Data Matrix-style symbols: x^8 + x^5 + x^3 + x^2 + 1,
/// generator polynomial roots starting at alpha^1
pub static DATA_MATRIX_FIELD: LazyLock<Gf256Field> = LazyLock::new(|| Gf256Field::new(0x12D, 1));

/// GF(256) for one (primitive polynomial, generator base) pair
pub struct Gf256Field {
    exp_table: [u8; FIELD_SIZE],
    log_table: [u8; FIELD_SIZE],
    primitive: u16,
    generator_base: usize,
}

impl Gf256Field {
    /// Build the log/exp tables for `primitive` (9-bit irreducible
    /// polynomial, e.g. 0x11D) with generator roots starting at
    /// `alpha^generator_base`
    pub fn new(primitive: u16, generator_base: usize) -> Self {
        let mut exp_table = [0u8; FIELD_SIZE];
        let mut log_table = [0u8; FIELD_SIZE];

        let mut x: u16 = 1;
        for entry in exp_table.iter_mut() {
            *entry = x as u8;
            x <<= 1;
            if x >= FIELD_SIZE as u16 {
                x ^= primitive;
            }
        }
        // alpha^255 wraps to alpha^0; log(0) stays unused
        for (i, &value) in exp_table.iter().enumerate().take(FIELD_SIZE - 1) {
            log_table[value as usize] = i as u8;
        }

        Self {
            exp_table,
            log_table,
            primitive,
            generator_base,
        }
    }

    /// alpha^power
    pub fn exp(&self, power: usize) -> u8 {
        self.exp_table[power % 255]
    }

    /// Discrete log of `a`
    ///
    /// # Panics
    /// Panics on `a == 0`, which has no logarithm; callers guard against it.
    pub fn log(&self, a: u8) -> usize {
        assert!(a != 0, "log(0) is undefined in GF(256)");
        self.log_table[a as usize] as usize
    }

    /// Multiplicative inverse of `a`
    ///
    /// # Panics
    /// Panics on `a == 0`.
    pub fn inverse(&self, a: u8) -> u8 {
        assert!(a != 0, "0 has no multiplicative inverse");
        self.exp_table[(255 - self.log_table[a as usize] as usize) % 255]
    }

    /// Field product; addition in GF(256) is plain XOR and needs no table
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = self.log_table[a as usize] as usize;
        let log_b = self.log_table[b as usize] as usize;
        self.exp_table[(log_a + log_b) % 255]
    }

    /// The primitive polynomial this field reduces by
    pub fn primitive(&self) -> u16 {
        self.primitive
    }

    /// First exponent of the generator polynomial roots
    pub fn generator_base(&self) -> usize {
        self.generator_base
    }
}

impl std::fmt::Debug for Gf256Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gf256Field")
            .field("primitive", &format_args!("{:#06x}", self.primitive))
            .field("generator_base", &self.generator_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_field_known_values() {
        // Spot values of the standard 0x11D tables
        assert_eq!(QR_FIELD.exp(0), 1);
        assert_eq!(QR_FIELD.exp(1), 2);
        assert_eq!(QR_FIELD.exp(8), 29);
        assert_eq!(QR_FIELD.log(2), 1);
        assert_eq!(QR_FIELD.log(29), 8);
    }

    #[test]
    fn test_data_matrix_field_known_values() {
        // 2^8 reduces by 0x12D to 0x2D
        assert_eq!(DATA_MATRIX_FIELD.exp(8), 0x2D);
        assert_eq!(DATA_MATRIX_FIELD.generator_base(), 1);
    }

    #[test]
    fn test_exp_log_roundtrip() {
        for a in 1..=255u8 {
            assert_eq!(QR_FIELD.exp(QR_FIELD.log(a)), a);
            assert_eq!(DATA_MATRIX_FIELD.exp(DATA_MATRIX_FIELD.log(a)), a);
        }
    }

    #[test]
    fn test_inverse() {
        for a in 1..=255u8 {
            assert_eq!(QR_FIELD.mul(a, QR_FIELD.inverse(a)), 1);
        }
    }

    #[test]
    fn test_mul_basic() {
        assert_eq!(QR_FIELD.mul(0, 5), 0);
        assert_eq!(QR_FIELD.mul(5, 0), 0);
        assert_eq!(QR_FIELD.mul(1, 37), 37);
        // Commutativity spot check
        assert_eq!(QR_FIELD.mul(13, 200), QR_FIELD.mul(200, 13));
    }

    #[test]
    fn test_exp_wraps_at_group_order() {
        // alpha^255 = 1, alpha^256 = alpha
        assert_eq!(QR_FIELD.exp(255), 1);
        assert_eq!(QR_FIELD.exp(256), 2);
    }

    #[test]
    #[should_panic(expected = "log(0)")]
    fn test_log_zero_panics() {
        QR_FIELD.log(0);
    }
}
