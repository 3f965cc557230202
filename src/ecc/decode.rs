/// Reed-Solomon decoding: corrects codeword errors in place
use thiserror::Error;

use super::gf256::Gf256Field;
use super::poly::GfPoly;

/// Decoding failure
///
/// Uncorrectable blocks are an expected runtime outcome (too many symbol
/// errors), not a bug; malformed calls (`ec_count` of zero or not smaller
/// than the sequence) panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EccError {
    /// More symbol errors than the code's redundancy can fix
    #[error("too many codeword errors to correct")]
    Uncorrectable,
}

/// Decoder for one field
pub struct RsDecoder {
    field: &'static Gf256Field,
}

impl RsDecoder {
    /// Create a decoder over `field`
    pub fn new(field: &'static Gf256Field) -> Self {
        Self { field }
    }

    /// Correct `received` (data followed by `ec_count` error correction
    /// codewords) in place.
    ///
    /// Returns the number of corrected symbols, zero when the sequence was
    /// already consistent. [`EccError::Uncorrectable`] reports a block with
    /// more errors than the redundancy can fix; corrupted output is never
    /// passed off as success.
    ///
    /// # Panics
    /// Panics when `ec_count` is zero or not smaller than `received.len()`;
    /// those are caller contract violations.
    pub fn decode(&self, received: &mut [u8], ec_count: usize) -> Result<usize, EccError> {
        assert!(ec_count > 0, "ec codeword count must be positive");
        assert!(
            ec_count < received.len(),
            "ec codeword count {} must be smaller than the {} codeword sequence",
            ec_count,
            received.len()
        );

        let poly = GfPoly::new(self.field, received);
        let base = self.field.generator_base();

        let mut syndromes = vec![0u8; ec_count];
        let mut no_error = true;
        for i in 0..ec_count {
            let eval = poly.evaluate_at(self.field.exp(i + base));
            syndromes[ec_count - 1 - i] = eval;
            if eval != 0 {
                no_error = false;
            }
        }
        if no_error {
            return Ok(0);
        }

        let syndrome = GfPoly::new(self.field, &syndromes);
        let (locator, evaluator) =
            self.run_euclidean(GfPoly::monomial(self.field, ec_count, 1), syndrome, ec_count)?;
        let locations = self.find_error_locations(&locator)?;
        let magnitudes = self.find_error_magnitudes(&evaluator, &locations);

        for (&location, &magnitude) in locations.iter().zip(&magnitudes) {
            let log = self.field.log(location);
            if log >= received.len() {
                return Err(EccError::Uncorrectable);
            }
            let position = received.len() - 1 - log;
            received[position] ^= magnitude;
        }

        // Trust nothing: the corrected block must itself pass the syndrome
        // check before it is reported as fixed.
        let corrected = GfPoly::new(self.field, received);
        for i in 0..ec_count {
            if corrected.evaluate_at(self.field.exp(i + base)) != 0 {
                return Err(EccError::Uncorrectable);
            }
        }

        Ok(locations.len())
    }

    /// Extended Euclidean algorithm over the syndrome polynomial, stopped
    /// once the remainder's degree drops below `ec_count / 2`; yields the
    /// error locator and error evaluator polynomials
    fn run_euclidean(
        &self,
        a: GfPoly,
        b: GfPoly,
        ec_count: usize,
    ) -> Result<(GfPoly, GfPoly), EccError> {
        let (mut r_last, mut r) = if a.degree() < b.degree() { (b, a) } else { (a, b) };
        let mut t_last = GfPoly::zero(self.field);
        let mut t = GfPoly::new(self.field, &[1]);

        while 2 * r.degree() >= ec_count {
            let r_last_last = r_last;
            let t_last_last = t_last;
            r_last = r;
            t_last = t;

            if r_last.is_zero() {
                // The iteration cannot continue; the locator degree bound
                // is unreachable
                return Err(EccError::Uncorrectable);
            }

            r = r_last_last;
            let mut q = GfPoly::zero(self.field);
            let leading = r_last.coefficient(r_last.degree());
            let inverse_leading = self.field.inverse(leading);
            while r.degree() >= r_last.degree() && !r.is_zero() {
                let degree_diff = r.degree() - r_last.degree();
                let scale = self.field.mul(r.coefficient(r.degree()), inverse_leading);
                q = q.add(&GfPoly::monomial(self.field, degree_diff, scale));
                r = r.add(&r_last.multiply_by_monomial(degree_diff, scale));
            }
            t = q.multiply(&t_last).add(&t_last_last);

            if r.degree() >= r_last.degree() {
                return Err(EccError::Uncorrectable);
            }
        }

        let locator_at_zero = t.coefficient(0);
        if locator_at_zero == 0 {
            return Err(EccError::Uncorrectable);
        }
        let inverse = self.field.inverse(locator_at_zero);
        Ok((t.multiply_scalar(inverse), r.multiply_scalar(inverse)))
    }

    /// Chien-style search: evaluate the locator at every non-zero field
    /// element; the inverses of its roots are the error locations. A root
    /// count short of the locator degree means the block is uncorrectable.
    fn find_error_locations(&self, locator: &GfPoly) -> Result<Vec<u8>, EccError> {
        let num_errors = locator.degree();
        if num_errors == 1 {
            return Ok(vec![locator.coefficient(1)]);
        }

        let mut locations = Vec::with_capacity(num_errors);
        let mut i: u16 = 1;
        while i < 256 && locations.len() < num_errors {
            if locator.evaluate_at(i as u8) == 0 {
                locations.push(self.field.inverse(i as u8));
            }
            i += 1;
        }
        if locations.len() != num_errors {
            return Err(EccError::Uncorrectable);
        }
        Ok(locations)
    }

    /// Forney algorithm: the evaluator at each root's inverse over the
    /// locator's formal derivative there gives the error magnitude
    fn find_error_magnitudes(&self, evaluator: &GfPoly, locations: &[u8]) -> Vec<u8> {
        let s = locations.len();
        let mut magnitudes = vec![0u8; s];
        for i in 0..s {
            let xi_inverse = self.field.inverse(locations[i]);
            let mut denominator = 1u8;
            for (j, &other) in locations.iter().enumerate() {
                if i != j {
                    // 1 + location_j / location_i, addition being XOR
                    let term = self.field.mul(other, xi_inverse);
                    denominator = self.field.mul(denominator, term ^ 1);
                }
            }
            magnitudes[i] = self.field.mul(
                evaluator.evaluate_at(xi_inverse),
                self.field.inverse(denominator),
            );
            if self.field.generator_base() != 0 {
                magnitudes[i] = self.field.mul(magnitudes[i], xi_inverse);
            }
        }
        magnitudes
    }
}
