//! The interchangeable counting strategies.
//!
//! All strategies report the same [`Tally`] for the same input. They only
//! differ in how the bytes get from the disk into memory.

use crate::chunk_iter::count_parallel;
use crate::config::default_workers;
use crate::error::CountError;
use crate::tally::Tally;
use likely_stable::unlikely;
use memmap::Mmap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Initial capacity of the reused line buffer of [`Strategy::CGetline`].
const MAX_LINE_LEN: usize = 10000;

/// Capacity of the buffered readers that open the file themselves.
const READ_BUFFER_SIZE: usize = 0x10000 /* 64 KiB */;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Delimiter by delimiter from a buffered stream.
    Getline,
    /// Whole stream into one growing buffer, then a scan.
    Read,
    /// Whole stream into one buffer sized up front, then a scan.
    InMemory,
    /// Whole stream into memory, then a parallel reduction.
    StreamReduce,
    /// Opens the file, reads it line by line into a reused buffer.
    CGetline,
    /// Opens the file, reads it one byte per call.
    CCharByChar,
    /// Opens the file, reads it unbuffered into an exact-size buffer.
    CInMemory,
    /// Maps the file into the address space and counts with `memchr`.
    Mmap,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::Getline,
        Strategy::Read,
        Strategy::InMemory,
        Strategy::StreamReduce,
        Strategy::CGetline,
        Strategy::CCharByChar,
        Strategy::CInMemory,
        Strategy::Mmap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Getline => "Getline",
            Strategy::Read => "Read",
            Strategy::InMemory => "In Memory",
            Strategy::StreamReduce => "istreambuf_iterator",
            Strategy::CGetline => "C Getline",
            Strategy::CCharByChar => "C Char-by-Char",
            Strategy::CInMemory => "C in Memory",
            Strategy::Mmap => "Mmap memchr",
        }
    }

    /// Whether the strategy consumes a shared, already open stream instead
    /// of opening the path on its own.
    pub fn uses_stream(self) -> bool {
        matches!(
            self,
            Strategy::Getline | Strategy::Read | Strategy::InMemory | Strategy::StreamReduce
        )
    }

    /// Runs a stream strategy. The stream is read from its start and is
    /// rewound to the start afterwards.
    ///
    /// Path strategies ignore the stream and open `path` instead.
    pub fn count<R: Read + Seek>(
        self,
        path: &Path,
        stream: &mut R,
        workers: usize,
    ) -> Result<Tally, CountError> {
        stream.rewind()?;
        let tally = match self {
            Strategy::Getline => count_getline(&mut BufReader::new(&mut *stream))?,
            Strategy::Read => count_read(stream)?,
            Strategy::InMemory => count_in_memory(stream)?,
            Strategy::StreamReduce => count_stream_reduce(stream, workers)?,
            Strategy::CGetline | Strategy::CCharByChar | Strategy::CInMemory | Strategy::Mmap => {
                return self.count_path(path)
            }
        };
        stream.rewind()?;
        Ok(tally)
    }

    /// Runs a strategy that needs nothing but the path. Stream strategies
    /// get a freshly opened file.
    pub fn count_path(self, path: &Path) -> Result<Tally, CountError> {
        match self {
            Strategy::CGetline => count_c_getline(path),
            Strategy::CCharByChar => count_c_char_by_char(path),
            Strategy::CInMemory => count_c_in_memory(path),
            Strategy::Mmap => count_mmap(path),
            stream_strategy => {
                let mut file = open(path)?;
                stream_strategy.count(path, &mut file, default_workers())
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn open(path: &Path) -> Result<File, CountError> {
    File::open(path).map_err(|source| CountError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn to_usize(len: u64) -> Result<usize, CountError> {
    usize::try_from(len).map_err(|_| CountError::TooLarge(len))
}

/// Fills `buffer` completely, failing with [`CountError::ShortRead`] if the
/// input ends early.
fn fill_exact(reader: &mut impl Read, buffer: &mut [u8]) -> Result<(), CountError> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    if unlikely(filled < buffer.len()) {
        return Err(CountError::ShortRead {
            expected: buffer.len() as u64,
            actual: filled as u64,
        });
    }
    Ok(())
}

fn count_getline(reader: &mut impl BufRead) -> Result<Tally, CountError> {
    let mut tally = Tally::default();
    let mut line_buf = Vec::new();
    while reader.read_until(b'\n', &mut line_buf)? != 0 {
        tally.bytes += line_buf.len() as u64;
        tally.newlines += u64::from(line_buf.last() == Some(&b'\n'));
        // Clear for next iteration.
        line_buf.clear();
    }
    Ok(tally)
}

fn count_read(reader: &mut impl Read) -> Result<Tally, CountError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    let mut tally = Tally::default();
    for &byte in &buffer {
        tally.bytes += 1;
        tally.newlines += u64::from(byte == b'\n');
    }
    Ok(tally)
}

fn count_in_memory<R: Read + Seek>(stream: &mut R) -> Result<Tally, CountError> {
    let len = stream.seek(SeekFrom::End(0))?;
    stream.rewind()?;

    let mut buffer = vec![0; to_usize(len)?];
    fill_exact(stream, &mut buffer)?;

    let mut tally = Tally::default();
    for &byte in &buffer {
        tally.bytes += 1;
        tally.newlines += u64::from(byte == b'\n');
    }
    Ok(tally)
}

fn count_stream_reduce(reader: &mut impl Read, workers: usize) -> Result<Tally, CountError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(count_parallel(&buffer, workers))
}

fn count_c_getline(path: &Path) -> Result<Tally, CountError> {
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, open(path)?);
    let mut line_buf = Vec::with_capacity(MAX_LINE_LEN);

    let mut tally = Tally::default();
    loop {
        line_buf.clear();
        let n = reader.read_until(b'\n', &mut line_buf)?;
        if n == 0 {
            break;
        }
        tally.bytes += n as u64;
        tally.newlines += u64::from(line_buf[n - 1] == b'\n');
    }
    Ok(tally)
}

fn count_c_char_by_char(path: &Path) -> Result<Tally, CountError> {
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, open(path)?);

    let mut tally = Tally::default();
    for byte in reader.bytes() {
        let byte = byte?;
        tally.bytes += 1;
        tally.newlines += u64::from(byte == b'\n');
    }
    Ok(tally)
}

fn count_c_in_memory(path: &Path) -> Result<Tally, CountError> {
    let mut file = open(path)?;
    let len = file.metadata()?.len();

    let mut buffer = vec![0; to_usize(len)?];
    fill_exact(&mut file, &mut buffer)?;

    let newlines = buffer.iter().filter(|&&byte| byte == b'\n').count() as u64;
    Ok(Tally {
        bytes: len,
        newlines,
    })
}

fn count_mmap(path: &Path) -> Result<Tally, CountError> {
    let file = open(path)?;
    // mapping an empty file fails with EINVAL
    if file.metadata()?.len() == 0 {
        return Ok(Tally::default());
    }

    // SAFETY: the mapping is read-only and dropped before returning. Truncating
    // the file from another process while counting is not supported.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Tally::of(&mmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_names_are_unique() {
        let mut names = Strategy::ALL.iter().map(|s| s.name()).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Strategy::ALL.len());
    }

    #[test]
    fn test_stream_strategies_on_cursor() {
        let data = b"abc\nde\n\nf".to_vec();
        let expected = Tally::of(&data);
        assert_eq!(expected.total(), 9 + 3);

        for strategy in Strategy::ALL.into_iter().filter(|s| s.uses_stream()) {
            let mut cursor = Cursor::new(data.clone());
            let tally = strategy
                .count(Path::new("unused"), &mut cursor, 2)
                .unwrap();
            assert_eq!(tally, expected, "{strategy}");
            assert_eq!(cursor.position(), 0, "{strategy} must rewind");
        }
    }

    #[test]
    fn test_stream_strategy_starts_at_beginning() {
        let mut cursor = Cursor::new(b"abc\n".to_vec());
        cursor.set_position(2);
        let tally = Strategy::Read
            .count(Path::new("unused"), &mut cursor, 1)
            .unwrap();
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn test_getline_counts_unterminated_tail_once() {
        let tally = count_getline(&mut Cursor::new(b"aa\nbb")).unwrap();
        assert_eq!(tally, Tally::new(5, 1));
    }

    #[test]
    fn test_fill_exact_reports_short_read() {
        let mut buffer = [0; 8];
        let err = fill_exact(&mut Cursor::new(b"abc"), &mut buffer).unwrap_err();
        assert!(matches!(
            err,
            CountError::ShortRead {
                expected: 8,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_path_strategy_reports_missing_file() {
        let err = Strategy::CGetline
            .count_path(Path::new("./does/not/exist.txt"))
            .unwrap_err();
        assert!(matches!(err, CountError::Open { .. }));
    }
}
