/// Running byte and newline counts of one input.
///
/// The reported result of every strategy is [`Tally::total`], i.e. the byte
/// length of the input plus the number of `\n` bytes in it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub bytes: u64,
    pub newlines: u64,
}

impl Tally {
    #[cfg(test)]
    pub fn new(bytes: u64, newlines: u64) -> Self {
        Self { bytes, newlines }
    }

    /// Tally of a complete buffer.
    pub fn of(bytes: &[u8]) -> Self {
        let mut tally = Self::default();
        tally.add_bytes(bytes);
        tally
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.bytes += bytes.len() as u64;
        self.newlines += memchr::memchr_iter(b'\n', bytes).count() as u64;
    }

    /// Merge the counts with another instance. Order of merging doesn't
    /// matter.
    pub fn merge(&mut self, other: &Self) {
        self.bytes += other.bytes;
        self.newlines += other.newlines;
    }

    pub fn total(&self) -> u64 {
        self.bytes + self.newlines
    }
}
