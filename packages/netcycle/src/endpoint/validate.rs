use crate::error::ValidationError;

/// Decides whether a complete response body counts as success.
pub trait ResponseValidator {
    fn validate(&self, response: &[u8]) -> Result<(), ValidationError>;
}

impl<F> ResponseValidator for F
where
    F: Fn(&[u8]) -> Result<(), ValidationError>,
{
    fn validate(&self, response: &[u8]) -> Result<(), ValidationError> {
        self(response)
    }
}

/// Accepts a response whose trailing bytes equal `expected` exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuffixMatch<'a> {
    expected: &'a [u8],
}

impl<'a> SuffixMatch<'a> {
    pub const fn new(expected: &'a [u8]) -> Self {
        Self { expected }
    }
}

impl ResponseValidator for SuffixMatch<'_> {
    fn validate(&self, response: &[u8]) -> Result<(), ValidationError> {
        let required = self.expected.len();
        if response.len() < required {
            return Err(ValidationError::TooShort {
                received: response.len(),
                required,
            });
        }

        let tail = &response[response.len() - required..];
        match tail
            .iter()
            .zip(self.expected)
            .position(|(received, expected)| received != expected)
        {
            Some(index) => Err(ValidationError::Mismatch {
                index,
                received: tail[index],
                expected: self.expected[index],
            }),
            None => Ok(()),
        }
    }
}
