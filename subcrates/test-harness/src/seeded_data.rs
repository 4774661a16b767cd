use humansize::{format_size, BINARY};
use rand::{distributions::Standard, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use resource_harness::content::{parse_size, BufferedContent};


/// A deterministic source of object bodies.
///
/// Each call to [`Self::next_content`] continues the same ChaCha20 stream,
/// so a test that creates several bodies from one seed always gets the same bodies,
/// and no two bodies of a run are equal.
pub struct SeededContentGenerator {
    random_generator: ChaCha20Rng,
}

impl SeededContentGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            random_generator: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Returns the next `size_in_bytes` bytes of the stream as content.
    pub fn next_content(&mut self, size_in_bytes: usize) -> BufferedContent {
        let data: Vec<u8> = (&mut self.random_generator)
            .sample_iter::<u8, _>(Standard)
            .take(size_in_bytes)
            .collect();

        log::debug!(
            "generated {} of seeded content",
            format_size(size_in_bytes as u64, BINARY)
        );

        BufferedContent::new(data)
    }

    /// Like [`Self::next_content`], with a human-readable size such as `"2KiB"`.
    ///
    /// # Panics
    /// Panics if `size` is malformed.
    pub fn next_sized_content(&mut self, size: &str) -> BufferedContent {
        let size_in_bytes =
            parse_size(size).unwrap_or_else(|error| panic!("invalid content size {size:?}: {error}"));

        self.next_content(usize::try_from(size_in_bytes).expect("content size does not fit in memory"))
    }
}



#[cfg(test)]
mod tests {
    use resource_harness::content::ObjectContentContainer;

    use super::*;

    #[test]
    fn same_seed_generates_same_sequence() {
        let mut first = SeededContentGenerator::new(2023);
        let mut second = SeededContentGenerator::new(2023);

        let first_a = first.next_content(1024);
        let first_b = first.next_content(1024);

        assert_eq!(first_a, second.next_content(1024));
        assert_eq!(first_b, second.next_content(1024));
        assert_ne!(first_a.content_hash().unwrap(), first_b.content_hash().unwrap());
    }

    #[test]
    fn sized_content_follows_the_same_stream() {
        let mut by_size = SeededContentGenerator::new(77);
        let mut by_bytes = SeededContentGenerator::new(77);

        assert_eq!(by_size.next_sized_content("1KiB"), by_bytes.next_content(1024));
        assert_eq!(by_size.next_sized_content("2K"), by_bytes.next_content(2048));
    }

    #[test]
    fn first_body_matches_seeded_buffered_content() {
        let mut generator = SeededContentGenerator::new(9001);

        assert_eq!(
            generator.next_content(4096),
            BufferedContent::random_with_seed(4096, 9001)
        );
    }
}
