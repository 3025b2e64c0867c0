//! File Source (spec §4.B): owns one file, plain or gzip, tracks identity.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;
use snafu::ResultExt;

use crate::entry::FileIdentity;
use crate::error::{OpenError, OpenFailedSnafu, StatFailedSnafu};

#[cfg(unix)]
fn identity_of(file: &File) -> io::Result<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    let meta = file.metadata()?;
    Ok(FileIdentity::new(meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn identity_of(file: &File) -> io::Result<FileIdentity> {
    // Windows has no (dev, inode) pair exposed through std; approximate with
    // file index/volume serial would require platform-specific APIs not
    // available here. Identity tracking degrades to "always distinct",
    // which disables rotation detection on non-unix targets.
    let _ = file;
    Ok(FileIdentity::new(0, 0))
}

/// `MultiGzDecoder` has no `Seek` impl -- it is a one-pass decompression
/// stream. This wrapper tracks the decompressed byte position itself:
/// forward seeks read-and-discard, backward seeks (including the common
/// seek-to-0 on truncation) reopen the underlying file and replay forward.
struct GzipStream {
    path: PathBuf,
    reader: BufReader<MultiGzDecoder<BufReader<File>>>,
    position: u64,
}

impl GzipStream {
    fn open(path: &Path) -> io::Result<GzipStream> {
        let file = File::open(path)?;
        let reader = BufReader::new(MultiGzDecoder::new(BufReader::new(file)));
        Ok(GzipStream { path: path.to_path_buf(), reader, position: 0 })
    }

    fn discard(&mut self, mut n: u64) -> io::Result<()> {
        let mut sink = [0u8; 8192];
        while n > 0 {
            let want = n.min(sink.len() as u64) as usize;
            let read = self.reader.read(&mut sink[..want])?;
            if read == 0 {
                break;
            }
            n -= read as u64;
            self.position += read as u64;
        }
        Ok(())
    }

    fn seek_to(&mut self, target: u64) -> io::Result<u64> {
        if target < self.position {
            let file = File::open(&self.path)?;
            self.reader = BufReader::new(MultiGzDecoder::new(BufReader::new(file)));
            self.position = 0;
        }
        self.discard(target - self.position)?;
        Ok(self.position)
    }
}

enum Inner {
    Plain(BufReader<File>),
    Gzip(GzipStream),
}

/// Owns one open file, gzip-transparent, plus its identity.
pub struct FileSource {
    path: PathBuf,
    identity: FileIdentity,
    inner: Inner,
}

impl FileSource {
    /// Opens `path`. `.gz`-suffixed paths are transparently decompressed.
    /// Opening always propagates I/O errors.
    pub fn open(path: &Path) -> Result<FileSource, OpenError> {
        let file = File::open(path).context(OpenFailedSnafu { path: path.to_path_buf() })?;
        let identity = identity_of(&file).context(StatFailedSnafu { path: path.to_path_buf() })?;

        let inner = if path.extension().map(|e| e == "gz").unwrap_or(false) {
            drop(file);
            Inner::Gzip(GzipStream::open(path).context(OpenFailedSnafu { path: path.to_path_buf() })?)
        } else {
            Inner::Plain(BufReader::new(file))
        };

        Ok(FileSource {
            path: path.to_path_buf(),
            identity,
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> FileIdentity {
        self.identity
    }

    pub fn is_gzip(&self) -> bool {
        matches!(self.inner, Inner::Gzip(_))
    }

    pub fn tell(&mut self) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Plain(r) => r.stream_position(),
            Inner::Gzip(g) => Ok(g.position),
        }
    }

    /// Absolute seek. Gzip streams support this by replaying from the
    /// start when seeking backward (spec §9: checkpointing is disabled for
    /// `.gz` sources, so in practice this only ever needs to seek to 0).
    pub fn seek(&mut self, absolute: u64) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Plain(r) => r.seek(SeekFrom::Start(absolute)),
            Inner::Gzip(g) => g.seek_to(absolute),
        }
    }

    pub fn seek_relative(&mut self, delta: i64, from_end: bool) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Plain(r) => {
                let whence = if from_end { SeekFrom::End(delta) } else { SeekFrom::Current(delta) };
                r.seek(whence)
            }
            Inner::Gzip(g) => {
                if from_end {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "seek-from-end is not supported on gzip sources",
                    ));
                }
                let target = (g.position as i64 + delta).max(0) as u64;
                g.seek_to(target)
            }
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Plain(r) => r.read(buf),
            Inner::Gzip(g) => {
                let n = g.reader.read(buf)?;
                g.position += n as u64;
                Ok(n)
            }
        }
    }

    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Plain(r) => r.read_line(buf),
            Inner::Gzip(g) => {
                let n = g.reader.read_line(buf)?;
                g.position += n as u64;
                Ok(n)
            }
        }
    }

    /// Size of the underlying file on disk (compressed size for `.gz`
    /// files -- callers doing chunked scans over gzip streams should not
    /// rely on this for positioning; checkpointing over gzip is
    /// intentionally disallowed by the checkpoint store).
    pub fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

impl BufRead for FileSource {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match &mut self.inner {
            Inner::Plain(r) => r.fill_buf(),
            Inner::Gzip(g) => g.reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match &mut self.inner {
            Inner::Plain(r) => r.consume(amt),
            Inner::Gzip(g) => {
                g.reader.consume(amt);
                g.position += amt as u64;
            }
        }
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileSource::read(self, buf)
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(n) => FileSource::seek(self, n),
            SeekFrom::Current(delta) => self.seek_relative(delta, false),
            SeekFrom::End(delta) => match &mut self.inner {
                Inner::Plain(r) => r.seek(SeekFrom::End(delta)),
                Inner::Gzip(_) => self.seek_relative(delta, true),
            },
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.tell()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn identity_stable_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"line one\n").unwrap();

        let a = FileSource::open(&path).unwrap();
        let b = FileSource::open(&path).unwrap();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn rotation_produces_new_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"first\n").unwrap();
        let a = FileSource::open(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"second\n").unwrap();
        let b = FileSource::open(&path).unwrap();

        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn open_missing_file_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.log");
        assert!(FileSource::open(&path).is_err());
    }

    #[test]
    fn gzip_reads_transparently_and_tracks_position() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"hello\nworld\n").unwrap();
        encoder.finish().unwrap();

        let mut source = FileSource::open(&path).unwrap();
        assert!(source.is_gzip());
        let mut line = String::new();
        source.read_line(&mut line).unwrap();
        assert_eq!(line, "hello\n");
        assert_eq!(source.tell().unwrap(), 6);
    }

    #[test]
    fn gzip_seek_to_zero_replays_from_start() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"hello\nworld\n").unwrap();
        encoder.finish().unwrap();

        let mut source = FileSource::open(&path).unwrap();
        let mut line = String::new();
        source.read_line(&mut line).unwrap();
        source.seek(0).unwrap();
        assert_eq!(source.tell().unwrap(), 0);
        let mut again = String::new();
        source.read_line(&mut again).unwrap();
        assert_eq!(again, "hello\n");
    }
}
