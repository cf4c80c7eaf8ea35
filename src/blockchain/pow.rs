use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use thiserror::Error;

use super::hash::sha256_hex;

/// Default difficulty target: required prefix of the guess digest's hex form
///
/// Each additional character multiplies the expected search cost by 16.
pub const DEFAULT_TARGET_PREFIX: &str = "0000";

/// Errors that can occur during a proof search
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("Mining aborted before a valid proof was found")]
    Aborted,
}

/// Signal for abandoning an in-flight proof search
///
/// Cloned tokens share the same stop flag, so a caller can keep one half and
/// hand the other to the search. An optional deadline bounds the search even
/// when nobody cancels explicitly.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates a token that only cancels when asked to
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Creates a token that also cancels once `timeout` has elapsed
    pub fn with_deadline(timeout: Duration) -> Self {
        CancelToken {
            stop: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Requests cancellation of the search holding this token
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Checks whether the search should stop
    pub fn is_cancelled(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }

        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// Proof-of-work engine
///
/// A proof is valid when the SHA-256 digest of the previous proof and the
/// candidate proof, concatenated as decimal strings, starts with the target
/// prefix. The search is a linear scan from zero, so the result is fully
/// deterministic for a given previous proof and target.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    target_prefix: String,
}

impl ProofOfWork {
    /// Creates an engine with the given difficulty target
    pub fn new(target_prefix: impl Into<String>) -> Self {
        ProofOfWork {
            target_prefix: target_prefix.into(),
        }
    }

    /// The hex prefix a guess digest must start with
    pub fn target_prefix(&self) -> &str {
        &self.target_prefix
    }

    /// Validates a proof against the previous block's proof
    ///
    /// # Arguments
    ///
    /// * `last_proof` - The proof of the previous block
    /// * `proof` - The candidate proof
    ///
    /// # Returns
    ///
    /// true if the guess digest meets the difficulty target
    pub fn valid_proof(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{}{}", last_proof, proof);
        let guess_hash = sha256_hex(guess.as_bytes());

        guess_hash.starts_with(&self.target_prefix)
    }

    /// Finds the smallest proof satisfying the difficulty target
    ///
    /// Runs to completion no matter how long the search takes; use
    /// [`ProofOfWork::find_proof_until`] when the caller needs to bound it.
    ///
    /// # Arguments
    ///
    /// * `last_proof` - The proof of the previous block
    ///
    /// # Returns
    ///
    /// The smallest non-negative integer forming a valid proof
    pub fn find_proof(&self, last_proof: u64) -> u64 {
        let mut proof = 0;

        while !self.valid_proof(last_proof, proof) {
            proof += 1;
        }

        proof
    }

    /// Finds the smallest valid proof, giving up when the token cancels
    ///
    /// The search touches no shared state, so other ledger operations stay
    /// live while it runs.
    ///
    /// # Arguments
    ///
    /// * `last_proof` - The proof of the previous block
    /// * `cancel` - Stop signal checked on every candidate
    ///
    /// # Returns
    ///
    /// The found proof, or `MiningError::Aborted` if cancelled first
    pub fn find_proof_until(&self, last_proof: u64, cancel: &CancelToken) -> Result<u64, MiningError> {
        info!(
            "Starting proof search from last proof {} (target prefix {:?})",
            last_proof, self.target_prefix
        );

        let mut proof = 0;

        while !self.valid_proof(last_proof, proof) {
            if cancel.is_cancelled() {
                warn!("Proof search from last proof {} aborted at candidate {}", last_proof, proof);
                return Err(MiningError::Aborted);
            }

            proof += 1;
        }

        info!("Found proof {} for last proof {}", proof, last_proof);
        Ok(proof)
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork::new(DEFAULT_TARGET_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_proof_recomputes() {
        let pow = ProofOfWork::new("0");
        let proof = pow.find_proof(100);

        let guess_hash = sha256_hex(format!("100{}", proof).as_bytes());
        assert!(guess_hash.starts_with("0"));
    }

    #[test]
    fn test_find_proof_returns_smallest() {
        let pow = ProofOfWork::new("0");

        for last_proof in [0, 1, 100] {
            let proof = pow.find_proof(last_proof);

            assert!(pow.valid_proof(last_proof, proof));
            for candidate in 0..proof {
                assert!(!pow.valid_proof(last_proof, candidate));
            }
        }
    }

    #[test]
    fn test_find_proof_deterministic() {
        let pow = ProofOfWork::new("00");

        assert_eq!(pow.find_proof(100), pow.find_proof(100));
    }

    #[test]
    fn test_find_proof_until_matches_find_proof() {
        let pow = ProofOfWork::new("0");
        let token = CancelToken::new();

        assert_eq!(pow.find_proof_until(100, &token), Ok(pow.find_proof(100)));
    }

    #[test]
    fn test_cancelled_token_aborts_search() {
        let pow = ProofOfWork::new(DEFAULT_TARGET_PREFIX);
        let token = CancelToken::new();
        token.cancel();

        assert_eq!(pow.find_proof_until(100, &token), Err(MiningError::Aborted));
    }

    #[test]
    fn test_expired_deadline_aborts_search() {
        let pow = ProofOfWork::new(DEFAULT_TARGET_PREFIX);
        let token = CancelToken::with_deadline(Duration::from_secs(0));

        assert_eq!(pow.find_proof_until(100, &token), Err(MiningError::Aborted));
    }

    #[test]
    fn test_cloned_tokens_share_cancellation() {
        let token = CancelToken::new();
        let shared = token.clone();

        shared.cancel();
        assert!(token.is_cancelled());
    }
}
