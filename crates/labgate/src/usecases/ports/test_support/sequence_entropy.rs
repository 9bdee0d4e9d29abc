use std::collections::VecDeque;
use std::sync::Mutex;

use crate::usecases::ports::Entropy;

/// Replays scripted draws, then counts upwards once they run out.
pub struct SequenceEntropy {
    draws: Mutex<VecDeque<u32>>,
    fallback: Mutex<u32>,
}

impl SequenceEntropy {
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            fallback: Mutex::new(0),
        }
    }

    pub fn counting() -> Self {
        Self::new([])
    }
}

impl Entropy for SequenceEntropy {
    fn next_u32(&self) -> u32 {
        if let Some(draw) = self.draws.lock().unwrap().pop_front() {
            return draw;
        }
        let mut next = self.fallback.lock().unwrap();
        *next = next.wrapping_add(1);
        *next
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_u32().to_le_bytes()[0];
        }
    }
}
