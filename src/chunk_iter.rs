use crate::tally::Tally;
use std::cmp::{max, min};
use std::thread;

/// Below this size, spawning workers costs more than it saves.
const PARALLEL_THRESHOLD: usize = 0x100000 /* 1 MiB */;

/// Iterates the file in `n` chunks, but with respect to line endings.
/// Every byte of the input lands in exactly one chunk. Only the last chunk
/// may end without a newline.
#[derive(Debug)]
pub struct ChunkIter<'a> {
    bytes_per_chunk: usize,
    file_bytes: &'a [u8],
    /// This variable is mutated and keeps track of the progress.
    consumed_bytes: usize,
}

impl<'a> ChunkIter<'a> {
    pub fn new(file_bytes: &'a [u8], chunk_count: usize) -> Self {
        let bytes_per_chunk = file_bytes.len().div_ceil(max(chunk_count, 1));
        Self {
            file_bytes,
            bytes_per_chunk,
            consumed_bytes: 0,
        }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let bytes_left = self.file_bytes.len() - self.consumed_bytes;
        if bytes_left == 0 {
            return None;
        }

        let i_begin = self.consumed_bytes;
        // -1: because the given byte might already be a newline
        let i_end_min = i_begin + min(self.bytes_per_chunk, bytes_left) - 1;

        let search_slice = &self.file_bytes[i_end_min..];
        let chunk = match memchr::memchr(b'\n', search_slice) {
            // include final newline here
            Some(offset) => &self.file_bytes[i_begin..i_end_min + offset + 1],
            // unterminated tail
            None => &self.file_bytes[i_begin..],
        };

        self.consumed_bytes += chunk.len();

        Some(chunk)
    }
}

/// Tallies `file_bytes` with up to `workers` scoped threads, one per chunk.
pub fn count_parallel(file_bytes: &[u8], workers: usize) -> Tally {
    let workers = max(workers, 1);
    if workers == 1 || file_bytes.len() < PARALLEL_THRESHOLD {
        return Tally::of(file_bytes);
    }

    thread::scope(|scope| {
        let handles = ChunkIter::new(file_bytes, workers)
            .map(|chunk| scope.spawn(move || Tally::of(chunk)))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .fold(Tally::default(), |mut acc, handle| match handle.join() {
                Ok(partial) => {
                    acc.merge(&partial);
                    acc
                }
                Err(panic) => std::panic::resume_unwind(panic),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_iter_bytes_per_chunk() {
        let data = "a".repeat(15);
        let iter = ChunkIter::new(data.as_bytes(), 2);

        assert_eq!(iter.bytes_per_chunk, 8, "must be rounded up");
    }

    #[test]
    fn test_chunk_iter_zero_chunks_means_one() {
        let data = "aaa\nbbb\n";
        let chunks = ChunkIter::new(data.as_bytes(), 0).collect::<Vec<_>>();
        assert_eq!(chunks, vec![data.as_bytes()]);
    }

    #[test]
    fn test_chunk_iter_chunk_size_aligns_with_newlines() {
        let data = "aaa\nbbb\nccc\nddd\neee\n";
        assert_eq!(data.len(), 20);
        let iter = ChunkIter::new(data.as_bytes(), 5);
        assert_eq!(iter.bytes_per_chunk, 4);

        let mut iter = iter.map(|data| core::str::from_utf8(data).unwrap());

        assert_eq!(Some("aaa\n"), iter.next());
        assert_eq!(Some("bbb\n"), iter.next());
        assert_eq!(Some("ccc\n"), iter.next());
        assert_eq!(Some("ddd\n"), iter.next());
        assert_eq!(Some("eee\n"), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn test_chunk_iter_unterminated_tail() {
        let data = "aa\nbb\ncc\ndd";
        let mut iter =
            ChunkIter::new(data.as_bytes(), 2).map(|data| core::str::from_utf8(data).unwrap());

        assert_eq!(Some("aa\nbb\n"), iter.next());
        assert_eq!(Some("cc\ndd"), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn test_chunk_iter_without_any_newline() {
        let data = "a".repeat(10);
        let chunks = ChunkIter::new(data.as_bytes(), 4).collect::<Vec<_>>();
        assert_eq!(chunks, vec![data.as_bytes()]);
    }

    #[test]
    fn test_chunk_iter_not_evenly_splittable() {
        let data = "aa\nbb\ncc\ndd\nee\nff\ngg\n".repeat(2);
        assert_eq!(data.len(), 42);
        let iter = ChunkIter::new(data.as_bytes(), 4);
        assert_eq!(iter.bytes_per_chunk, 11, "must be rounded up");

        let mut iter = iter.map(|data| core::str::from_utf8(data).unwrap());

        assert_eq!(Some("aa\nbb\ncc\ndd\n"), iter.next());
        assert_eq!(Some("ee\nff\ngg\naa\n"), iter.next());
        assert_eq!(Some("bb\ncc\ndd\nee\n"), iter.next());
        assert_eq!(Some("ff\ngg\n"), iter.next());
    }

    #[test]
    fn test_count_parallel_matches_sequential() {
        let data = "station;12.3\nother;-4.0\nlast".repeat(100_000);
        assert!(data.len() > PARALLEL_THRESHOLD);

        let expected = Tally::of(data.as_bytes());
        for workers in [0, 1, 2, 3, 8] {
            assert_eq!(count_parallel(data.as_bytes(), workers), expected);
        }
    }

    #[test]
    fn test_count_parallel_empty() {
        assert_eq!(count_parallel(b"", 4), Tally::default());
    }
}
