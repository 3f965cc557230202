/// Polynomials over GF(256)
///
/// Coefficients are stored most-significant first; construction trims
/// leading zeros, so the zero polynomial is `[0]` and has degree zero by
/// convention.
use super::gf256::Gf256Field;

/// A polynomial with GF(256) coefficients
#[derive(Clone)]
pub struct GfPoly {
    field: &'static Gf256Field,
    coefficients: Vec<u8>,
}

impl GfPoly {
    /// Build a polynomial from most-significant-first coefficients,
    /// trimming leading zeros
    pub fn new(field: &'static Gf256Field, coefficients: &[u8]) -> Self {
        let first_nonzero = coefficients.iter().position(|&c| c != 0);
        let coefficients = match first_nonzero {
            Some(i) => coefficients[i..].to_vec(),
            None => vec![0],
        };
        Self {
            field,
            coefficients,
        }
    }

    /// The zero polynomial
    pub fn zero(field: &'static Gf256Field) -> Self {
        Self {
            field,
            coefficients: vec![0],
        }
    }

    /// `coefficient * x^degree`
    pub fn monomial(field: &'static Gf256Field, degree: usize, coefficient: u8) -> Self {
        if coefficient == 0 {
            return Self::zero(field);
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        Self {
            field,
            coefficients,
        }
    }

    /// Degree of the polynomial; zero for the zero polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Whether this is the zero polynomial
    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    /// Coefficient of the `x^degree` term
    pub fn coefficient(&self, degree: usize) -> u8 {
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    /// Evaluate at `a` by Horner's rule
    pub fn evaluate_at(&self, a: u8) -> u8 {
        if a == 0 {
            return self.coefficient(0);
        }
        if a == 1 {
            // Sum of all coefficients
            return self.coefficients.iter().fold(0, |acc, &c| acc ^ c);
        }
        let mut result = self.coefficients[0];
        for &c in &self.coefficients[1..] {
            result = self.field.mul(a, result) ^ c;
        }
        result
    }

    /// Polynomial sum; addition of coefficients is XOR
    pub fn add(&self, other: &GfPoly) -> GfPoly {
        debug_assert!(std::ptr::eq(self.field, other.field));
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let (smaller, larger) = if self.coefficients.len() <= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        } else {
            (&other.coefficients, &self.coefficients)
        };
        let mut sum = larger.clone();
        let offset = larger.len() - smaller.len();
        for (i, &c) in smaller.iter().enumerate() {
            sum[offset + i] ^= c;
        }
        GfPoly::new(self.field, &sum)
    }

    /// Polynomial product
    pub fn multiply(&self, other: &GfPoly) -> GfPoly {
        debug_assert!(std::ptr::eq(self.field, other.field));
        if self.is_zero() || other.is_zero() {
            return GfPoly::zero(self.field);
        }

        let mut product = vec![0u8; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in other.coefficients.iter().enumerate() {
                product[i + j] ^= self.field.mul(a, b);
            }
        }
        GfPoly::new(self.field, &product)
    }

    /// Scalar product
    pub fn multiply_scalar(&self, scalar: u8) -> GfPoly {
        if scalar == 0 {
            return GfPoly::zero(self.field);
        }
        if scalar == 1 {
            return self.clone();
        }
        let scaled: Vec<u8> = self
            .coefficients
            .iter()
            .map(|&c| self.field.mul(c, scalar))
            .collect();
        GfPoly::new(self.field, &scaled)
    }

    /// Product with `coefficient * x^degree`
    pub fn multiply_by_monomial(&self, degree: usize, coefficient: u8) -> GfPoly {
        if coefficient == 0 {
            return GfPoly::zero(self.field);
        }
        let mut product = vec![0u8; self.coefficients.len() + degree];
        for (i, &c) in self.coefficients.iter().enumerate() {
            product[i] = self.field.mul(c, coefficient);
        }
        GfPoly::new(self.field, &product)
    }

    /// Division with remainder
    ///
    /// # Panics
    /// Panics when `other` is the zero polynomial.
    pub fn divide(&self, other: &GfPoly) -> (GfPoly, GfPoly) {
        debug_assert!(std::ptr::eq(self.field, other.field));
        assert!(!other.is_zero(), "division by the zero polynomial");

        let mut quotient = GfPoly::zero(self.field);
        let mut remainder = self.clone();

        let denominator_leading = other.coefficient(other.degree());
        let inverse_leading = self.field.inverse(denominator_leading);

        while remainder.degree() >= other.degree() && !remainder.is_zero() {
            let degree_diff = remainder.degree() - other.degree();
            let scale = self
                .field
                .mul(remainder.coefficient(remainder.degree()), inverse_leading);
            quotient = quotient.add(&GfPoly::monomial(self.field, degree_diff, scale));
            remainder = remainder.add(&other.multiply_by_monomial(degree_diff, scale));
        }

        (quotient, remainder)
    }
}

impl std::fmt::Debug for GfPoly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GfPoly{:02x?}", self.coefficients)
    }
}
