/// Source of unpredictable values for token generation.
pub trait Entropy: Send + Sync {
    fn next_u32(&self) -> u32;

    fn fill_bytes(&self, dest: &mut [u8]);
}
