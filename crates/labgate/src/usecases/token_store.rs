use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::common::mutex_lock_or_recover;
use crate::domain::{AccessToken, LabError, TokenString};
use crate::usecases::admin::AdminGrant;
use crate::usecases::ports::{Clock, Entropy};

/// Issued access tokens keyed by their normalized string.
pub struct TokenStore {
    tokens: Mutex<HashMap<TokenString, AccessToken>>,
    entropy: Arc<dyn Entropy>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(entropy: Arc<dyn Entropy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            entropy,
            clock,
        }
    }

    pub fn issue(&self, _grant: &AdminGrant) -> AccessToken {
        loop {
            let value = TokenString::generate(|| self.entropy.next_u32());
            let mut tokens = mutex_lock_or_recover(&self.tokens);
            if tokens.contains_key(&value) {
                continue;
            }
            let token = AccessToken::new(value.clone(), self.clock.utc_now());
            tokens.insert(value, token.clone());
            return token;
        }
    }

    /// Looks up and consumes a token in one step.
    pub fn redeem(&self, raw: &str) -> Result<AccessToken, LabError> {
        let value = TokenString::parse(raw).map_err(|_| LabError::InvalidToken)?;
        let mut tokens = mutex_lock_or_recover(&self.tokens);
        let token = tokens.get_mut(&value).ok_or(LabError::InvalidToken)?;
        if !token.consume() {
            return Err(LabError::InvalidToken);
        }
        Ok(token.clone())
    }

    /// Removes a token that was never redeemed.
    pub fn revoke(&self, raw: &str) -> bool {
        let Ok(value) = TokenString::parse(raw) else {
            return false;
        };
        let mut tokens = mutex_lock_or_recover(&self.tokens);
        match tokens.get(&value) {
            Some(token) if !token.is_consumed() => tokens.remove(&value).is_some(),
            _ => false,
        }
    }

    /// Returns a consumed token to the unused pool.
    pub fn refund(&self, value: &TokenString) -> bool {
        let mut tokens = mutex_lock_or_recover(&self.tokens);
        match tokens.get_mut(value) {
            Some(token) if token.is_consumed() => {
                token.restore();
                true
            }
            _ => false,
        }
    }

    /// Drops a consumed token once its session is over.
    pub fn finalize(&self, value: &TokenString) -> bool {
        let mut tokens = mutex_lock_or_recover(&self.tokens);
        match tokens.get(value) {
            Some(token) if token.is_consumed() => tokens.remove(value).is_some(),
            _ => false,
        }
    }

    pub fn outstanding(&self) -> usize {
        mutex_lock_or_recover(&self.tokens)
            .values()
            .filter(|token| !token.is_consumed())
            .count()
    }
}
