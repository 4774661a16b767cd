//! Object bodies.
//!
//! An [`ObjectContentContainer`] describes the body of an object-level resource
//! independently of any storage back-end: its size, a fresh reader over it, and its hash.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{self, Cursor, Read, Seek, SeekFrom},
};

use humansize::{format_size, BINARY};
use rand::{distributions::Standard, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::error::SizeParseError;


/// A reader that can also seek. Blanket-implemented for every such type.
pub trait ReadSeek: Read + Seek + Send {}

impl<T> ReadSeek for T where T: Read + Seek + Send {}



/// The body of an object-level resource.
///
/// Content is immutable once constructed.
pub trait ObjectContentContainer: Send + Sync + Debug {
    /// Length of the body in bytes.
    fn size(&self) -> u64;

    /// Returns a fresh reader positioned at offset 0.
    ///
    /// Readers are independent of each other: reading from one never moves another.
    fn reader(&self) -> Box<dyn ReadSeek + '_>;

    /// Hash of the full body, streamed from a fresh [`Self::reader`].
    ///
    /// # Errors
    /// Fails with the reader's error if the body cannot be read to the end.
    fn content_hash(&self) -> io::Result<ContentHash> {
        ContentHash::of_reader(self.reader())
    }

    /// Returns a deep, independent copy of this content.
    fn clone_container(&self) -> Box<dyn ObjectContentContainer>;
}

impl Clone for Box<dyn ObjectContentContainer> {
    fn clone(&self) -> Self {
        self.clone_container()
    }
}



/// SHA-256 digest of an object body.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hashes everything `reader` yields.
    pub fn of_reader<R>(mut reader: R) -> io::Result<Self>
    where
        R: Read,
    {
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher)?;

        Ok(Self::from_digest(&hasher.finalize()))
    }

    /// Hashes a byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_digest(&Sha256::digest(bytes))
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut raw_digest = [0u8; 32];
        raw_digest.copy_from_slice(digest);

        Self(raw_digest)
    }

    /// The raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal representation of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}



/// Content held fully in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct BufferedContent {
    data: Vec<u8>,
}

impl BufferedContent {
    /// Wraps the given bytes.
    pub fn new<D>(data: D) -> Self
    where
        D: Into<Vec<u8>>,
    {
        Self { data: data.into() }
    }

    /// Content with the UTF-8 bytes of `text`.
    pub fn from_text<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(text.into().into_bytes())
    }

    /// `size_in_bytes` random bytes from a freshly seeded generator.
    pub fn random(size_in_bytes: usize) -> Self {
        Self::random_with_seed(size_in_bytes, rand::thread_rng().gen())
    }

    /// `size_in_bytes` bytes generated by ChaCha20 seeded with `seed`.
    ///
    /// The same seed and size always produce the same content.
    pub fn random_with_seed(size_in_bytes: usize, seed: u64) -> Self {
        let random_generator = ChaCha20Rng::seed_from_u64(seed);

        let mut random_data: Vec<u8> = Vec::with_capacity(size_in_bytes);
        random_data.extend(
            random_generator
                .sample_iter::<u8, _>(Standard)
                .take(size_in_bytes),
        );

        Self { data: random_data }
    }

    /// The content bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for BufferedContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedContent")
            .field("size", &format_size(self.data.len() as u64, BINARY))
            .finish()
    }
}

impl ObjectContentContainer for BufferedContent {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn reader(&self) -> Box<dyn ReadSeek + '_> {
        Box::new(Cursor::new(self.data.as_slice()))
    }

    fn content_hash(&self) -> io::Result<ContentHash> {
        Ok(ContentHash::of_bytes(&self.data))
    }

    fn clone_container(&self) -> Box<dyn ObjectContentContainer> {
        Box::new(self.clone())
    }
}



/// Zero-filled content of a fixed size. Nothing is allocated up front.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ZeroContent {
    size: u64,
}

impl ZeroContent {
    /// `size_in_bytes` zero bytes.
    pub fn new(size_in_bytes: u64) -> Self {
        Self {
            size: size_in_bytes,
        }
    }
}

impl Debug for ZeroContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroContent")
            .field("size", &format_size(self.size, BINARY))
            .finish()
    }
}

impl ObjectContentContainer for ZeroContent {
    fn size(&self) -> u64 {
        self.size
    }

    fn reader(&self) -> Box<dyn ReadSeek + '_> {
        Box::new(ZeroReader {
            size: self.size,
            position: 0,
        })
    }

    fn clone_container(&self) -> Box<dyn ObjectContentContainer> {
        Box::new(*self)
    }
}


struct ZeroReader {
    size: u64,

    position: u64,
}

impl Read for ZeroReader {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let remaining = self.size.saturating_sub(self.position);
        let to_fill = buffer
            .len()
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));

        buffer[..to_fill].fill(0);
        self.position += to_fill as u64;

        Ok(to_fill)
    }
}

impl Seek for ZeroReader {
    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        let new_position = match position {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => self.size.checked_add_signed(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        match new_position {
            Some(new_position) => {
                self.position = new_position;
                Ok(new_position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}



/// Parses a human-readable size such as `"512"`, `"10K"`, `"1KiB"` or `"2M"`.
///
/// Units are powers of 1024. Accepted suffixes (case-insensitive):
/// `B`, `K`/`KB`/`KiB`, `M`/`MB`/`MiB`, `G`/`GB`/`GiB` and `T`/`TB`/`TiB`.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let trimmed = input.trim();

    let unit_start = trimmed
        .find(|character: char| !character.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(unit_start);

    let number: u64 = number.parse().map_err(|_| SizeParseError::InvalidNumber {
        input: input.to_string(),
    })?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        "t" | "tb" | "tib" => 1024 * 1024 * 1024 * 1024,
        _ => {
            return Err(SizeParseError::UnknownUnit {
                unit: unit.trim().to_string(),
            })
        }
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::Overflow {
            input: input.to_string(),
        })
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes_with_binary_units() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("10K").unwrap(), 10 * 1024);
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * 1024 * 1024);
    }

    #[test]
    fn rejects_malformed_sizes() {
        assert!(matches!(
            parse_size("K"),
            Err(SizeParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_size("10X"),
            Err(SizeParseError::UnknownUnit { ref unit }) if unit == "X"
        ));
        assert!(matches!(
            parse_size("99999999999T"),
            Err(SizeParseError::Overflow { .. })
        ));
    }

    #[test]
    fn every_reader_starts_at_the_beginning() {
        let content = BufferedContent::from_text("hello world");

        let mut first = content.reader();
        let mut prefix = [0u8; 5];
        first.read_exact(&mut prefix).unwrap();
        assert_eq!(&prefix, b"hello");

        let mut second = String::new();
        content.reader().read_to_string(&mut second).unwrap();
        assert_eq!(second, "hello world");
    }

    #[test]
    fn seeded_content_is_deterministic() {
        let first = BufferedContent::random_with_seed(1024, 39581913123);
        let second = BufferedContent::random_with_seed(1024, 39581913123);
        let different = BufferedContent::random_with_seed(1024, 1);

        assert_eq!(first.content_hash().unwrap(), second.content_hash().unwrap());
        assert_ne!(first.content_hash().unwrap(), different.content_hash().unwrap());
        assert_eq!(first.size(), 1024);
    }

    #[test]
    fn zero_content_hashes_like_zero_bytes() {
        let zero = ZeroContent::new(3000);
        let buffered = BufferedContent::new(vec![0u8; 3000]);

        assert_eq!(zero.content_hash().unwrap(), buffered.content_hash().unwrap());

        let mut reader = zero.reader();
        assert_eq!(reader.seek(SeekFrom::End(-10)).unwrap(), 2990);

        let mut tail = Vec::new();
        reader.read_to_end(&mut tail).unwrap();
        assert_eq!(tail.len(), 10);
    }

    #[test]
    fn cloned_containers_are_independent() {
        let original: Box<dyn ObjectContentContainer> = Box::new(BufferedContent::random(64));
        let copy = original.clone();

        assert_eq!(original.content_hash().unwrap(), copy.content_hash().unwrap());
        assert_eq!(copy.size(), 64);
    }
}
