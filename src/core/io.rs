//! Buffered text input with transparent decompression
//!
//! Z-score files and sample panels are often distributed gzip- or
//! bzip2-compressed; readers here detect the format by extension and
//! magic bytes and hand back a plain `BufRead`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Uncompressed text
    Plain,
    /// Gzip compressed (.gz), including bgzip
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from file path and/or content
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    // First check by extension
    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    // Then check by magic bytes
    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    if bytes_read >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        return Ok(CompressionFormat::Gzip);
    }
    if bytes_read >= 3 && magic[0] == 0x42 && magic[1] == 0x5a && magic[2] == 0x68 {
        return Ok(CompressionFormat::Bzip2);
    }

    Ok(CompressionFormat::Plain)
}

/// Open a text file for buffered line reading, decompressing if needed
pub fn open_text_reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let format = detect_compression(path)?;
    let file = File::open(path)?;

    Ok(match format {
        CompressionFormat::Plain => {
            Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        }
        CompressionFormat::Gzip => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            flate2::read::MultiGzDecoder::new(file),
        )),
        CompressionFormat::Bzip2 => Box::new(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            bzip2::read::BzDecoder::new(file),
        )),
    })
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None, // EOF
            Ok(_) => {
                // Remove trailing newline
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detect_plain() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "chrom\tpos")?;
        temp.flush()?;
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Plain);
        Ok(())
    }

    #[test]
    fn test_detect_gzip_by_magic() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        // gzip magic without a .gz extension
        temp.write_all(&[0x1f, 0x8b, 0x08])?;
        temp.flush()?;
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Gzip);
        Ok(())
    }

    #[test]
    fn test_open_gzip_roundtrip() -> io::Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp = NamedTempFile::with_suffix(".gz")?;
        let mut enc = GzEncoder::new(File::create(temp.path())?, Compression::default());
        enc.write_all(b"line1\nline2\n")?;
        enc.finish()?;

        let reader = open_text_reader(temp.path())?;
        let mut iter = LineIterator::new(reader);
        assert_eq!(iter.next_line().unwrap()?, "line1");
        assert_eq!(iter.next_line().unwrap()?, "line2");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_line_iterator_strips_crlf() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"a\r\nb\n")?;
        temp.flush()?;

        let reader = open_text_reader(temp.path())?;
        let mut iter = LineIterator::new(reader);
        assert_eq!(iter.next_line().unwrap()?, "a");
        assert_eq!(iter.next_line().unwrap()?, "b");
        assert!(iter.next_line().is_none());
        Ok(())
    }
}
