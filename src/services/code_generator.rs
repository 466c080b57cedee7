//! Short code allocation
//!
//! Candidates are drawn uniformly from the 62-character alphabet. Each length
//! gets `max_attempts` tries against the caller's existence check; when all of
//! them collide the length grows by one, up to `max_length`.

use std::future::Future;

use tracing::{debug, warn};

use crate::config::LinksConfig;
use crate::errors::{Result, SnaplinkError};
use crate::utils::generate_random_code;

pub const DEFAULT_CODE_LENGTH: usize = 7;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_MAX_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    min_length: usize,
    max_attempts: u32,
    max_length: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_LENGTH)
    }
}

impl CodeGenerator {
    /// `min_length` and `max_attempts` are clamped to at least 1 and
    /// `max_length` to at least `min_length`.
    pub fn new(min_length: usize, max_attempts: u32, max_length: usize) -> Self {
        let min_length = min_length.max(1);
        Self {
            min_length,
            max_attempts: max_attempts.max(1),
            max_length: max_length.max(min_length),
        }
    }

    pub fn from_config(config: &LinksConfig) -> Self {
        Self::new(
            config.code_length,
            config.code_max_attempts,
            config.code_max_length,
        )
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Produces a code for which `exists` returned `false`
    ///
    /// `exists` is typically a lookup against `short_links` executed on the
    /// same transaction that will perform the insert.
    pub async fn generate<F, Fut>(&self, mut exists: F) -> Result<String>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        for length in self.min_length..=self.max_length {
            for attempt in 1..=self.max_attempts {
                let candidate = generate_random_code(length);
                if !exists(candidate.clone()).await? {
                    if length > self.min_length || attempt > 1 {
                        debug!(
                            "Allocated code of length {} after {} attempt(s)",
                            length, attempt
                        );
                    }
                    return Ok(candidate);
                }
            }
            warn!(
                "All {} candidates of length {} collided, growing code length",
                self.max_attempts, length
            );
        }

        Err(SnaplinkError::code_space_exhausted(format!(
            "Could not allocate a unique short code up to length {}",
            self.max_length
        )))
    }
}
