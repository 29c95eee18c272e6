use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::io::{FileData, open_noatime, read_file};
use crate::error::{FreqError, Result};
use crate::tokenize::{first_space, is_space};

/// Probe reads for [`ByteSource::token_end`] fetch this many bytes at a time.
const PROBE_CHUNK: usize = 256;

/// A seekable, byte-addressable corpus.
///
/// Implementations must allow concurrent `read_at` calls from several
/// threads; there is no shared cursor.
pub trait ByteSource: Sync {
    /// Total size in bytes.
    fn len(&self) -> u64;

    /// Read up to `buf.len()` bytes starting at `offset`. Returns 0 at or
    /// past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Like `read_at`, but keeps reading until `buf` is full or the source
    /// is exhausted.
    fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.read_at(offset + total as u64, &mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// The byte at `offset`, or `None` past the end.
    fn byte_at(&self, offset: u64) -> io::Result<Option<u8>> {
        let mut b = [0u8; 1];
        match self.read_full_at(offset, &mut b)? {
            0 => Ok(None),
            _ => Ok(Some(b[0])),
        }
    }

    /// Consume one whitespace-delimited token starting at `offset`: skip any
    /// leading whitespace, then the token itself. Returns the offset of the
    /// whitespace byte that ends the token, or `len()` if the token runs to
    /// the end of the source.
    fn token_end(&self, offset: u64) -> io::Result<u64> {
        let len = self.len();
        let mut pos = offset;
        let mut in_token = false;
        let mut chunk = [0u8; PROBE_CHUNK];
        while pos < len {
            let n = self.read_full_at(pos, &mut chunk)?;
            if n == 0 {
                break;
            }
            for (i, &b) in chunk[..n].iter().enumerate() {
                if is_space(b) {
                    if in_token {
                        return Ok(pos + i as u64);
                    }
                } else {
                    in_token = true;
                }
            }
            pos += n as u64;
        }
        Ok(len)
    }
}

impl ByteSource for [u8] {
    #[inline]
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= <[u8]>::len(self) {
            return Ok(0);
        }
        let n = buf.len().min(<[u8]>::len(self) - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }

    fn token_end(&self, offset: u64) -> io::Result<u64> {
        let len = <[u8]>::len(self);
        let mut i = usize::try_from(offset).unwrap_or(len).min(len);
        while i < len && is_space(self[i]) {
            i += 1;
        }
        Ok(match first_space(&self[i..]) {
            Some(p) => (i + p) as u64,
            None => len as u64,
        })
    }
}

/// A file read with positional reads (`pread`), so any number of scanner
/// threads can share one handle without seeking.
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Open `path` and record its size. Any failure is a
    /// [`FreqError::SourceUnavailable`].
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |source: io::Error| FreqError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let file = open_noatime(path).map_err(unavailable)?;
        let len = file.metadata().map_err(unavailable)?.len();
        Ok(Self { file, len })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }
}

/// Load a whole corpus into memory: mmap for large files, a single read
/// for small ones. Failures are reported against `path`.
pub fn load(path: &Path) -> Result<FileData> {
    read_file(path).map_err(|source| FreqError::SourceUnavailable {
        path: PathBuf::from(path),
        source,
    })
}
