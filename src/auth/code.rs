use rand::Rng;

/// Source of one-time verification codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random decimal codes of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct NumericCodeGenerator {
    length: usize,
}

impl NumericCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }
}

impl Default for NumericCodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeGenerator for NumericCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_digits_of_requested_length() {
        let gen = NumericCodeGenerator::new(8);
        for _ in 0..50 {
            let code = gen.generate();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn zero_length_is_clamped() {
        assert_eq!(NumericCodeGenerator::new(0).generate().len(), 1);
    }
}
