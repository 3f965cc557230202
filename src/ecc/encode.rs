/// Reed-Solomon encoding: appends error-correction codewords to data
use super::gf256::Gf256Field;
use super::poly::GfPoly;

/// Encoder for one field; generator polynomials are built incrementally and
/// cached across calls
pub struct RsEncoder {
    field: &'static Gf256Field,
    cached_generators: Vec<GfPoly>,
}

impl RsEncoder {
    /// Create an encoder over `field`
    pub fn new(field: &'static Gf256Field) -> Self {
        Self {
            field,
            cached_generators: vec![GfPoly::new(field, &[1])],
        }
    }

    /// The generator polynomial of the requested degree:
    /// product of (x - alpha^i) for i in [base, base + degree)
    fn build_generator(&mut self, degree: usize) -> &GfPoly {
        let base = self.field.generator_base();
        while self.cached_generators.len() <= degree {
            let d = self.cached_generators.len();
            let last = &self.cached_generators[d - 1];
            let next = last.multiply(&GfPoly::new(
                self.field,
                &[1, self.field.exp(d - 1 + base)],
            ));
            self.cached_generators.push(next);
        }
        &self.cached_generators[degree]
    }

    /// Encode `data`, returning `data` followed by `ec_count` error
    /// correction codewords.
    ///
    /// # Panics
    /// Panics when `ec_count` is zero, `data` is empty, or the block would
    /// exceed the field's 255-codeword limit; those are caller contract
    /// violations.
    pub fn encode(&mut self, data: &[u8], ec_count: usize) -> Vec<u8> {
        assert!(ec_count > 0, "ec codeword count must be positive");
        assert!(!data.is_empty(), "no data codewords to encode");
        assert!(
            data.len() + ec_count <= 255,
            "block of {} data + {} ec codewords exceeds the 255 codeword field limit",
            data.len(),
            ec_count
        );

        let generator = self.build_generator(ec_count).clone();
        let info = GfPoly::new(self.field, data).multiply_by_monomial(ec_count, 1);
        let (_, remainder) = info.divide(&generator);

        let mut out = data.to_vec();
        // The remainder can have fewer than ec_count coefficients; the
        // missing leading ones are zeros.
        let num_coefficients = remainder.degree() + 1;
        let leading_zeros = if remainder.is_zero() {
            ec_count
        } else {
            ec_count - num_coefficients
        };
        out.resize(data.len() + leading_zeros, 0);
        if !remainder.is_zero() {
            for d in (0..num_coefficients).rev() {
                out.push(remainder.coefficient(d));
            }
        }
        out
    }
}
