use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::ConvertError;

type GzipReader = BufReader<MultiGzDecoder<File>>;
type ZstdReader = BufReader<zstd::Decoder<'static, BufReader<File>>>;
type PlainReader = BufReader<File>;

/// Transparent line source for a log file.
///
/// The variant is chosen by extension suffix (`.gz`, `.zst`), never by
/// content sniffing, so a batch behaves predictably from the directory
/// listing alone. Decode errors in the compressed stream surface as I/O
/// errors while reading and are mapped to per-file failures by the caller.
pub enum LogReader {
    Gzip(GzipReader),
    Zstd(ZstdReader),
    Plain(PlainReader),
}

// zstd::Decoder has no Debug impl, so spell one out per variant.
impl std::fmt::Debug for LogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogReader::Gzip(_) => write!(f, "LogReader::Gzip"),
            LogReader::Zstd(_) => write!(f, "LogReader::Zstd"),
            LogReader::Plain(_) => write!(f, "LogReader::Plain"),
        }
    }
}

impl LogReader {
    /// Open a log file, layering the decoder its extension calls for.
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let unreadable = |source| ConvertError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if name.ends_with(".gz") {
            Ok(LogReader::Gzip(BufReader::new(MultiGzDecoder::new(file))))
        } else if name.ends_with(".zst") {
            let decoder = zstd::Decoder::new(file).map_err(unreadable)?;
            Ok(LogReader::Zstd(BufReader::new(decoder)))
        } else {
            Ok(LogReader::Plain(BufReader::new(file)))
        }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            LogReader::Gzip(reader) => reader.read(buf),
            LogReader::Zstd(reader) => reader.read(buf),
            LogReader::Plain(reader) => reader.read(buf),
        }
    }
}

impl BufRead for LogReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            LogReader::Gzip(reader) => reader.fill_buf(),
            LogReader::Zstd(reader) => reader.fill_buf(),
            LogReader::Plain(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            LogReader::Gzip(reader) => reader.consume(amt),
            LogReader::Zstd(reader) => reader.consume(amt),
            LogReader::Plain(reader) => reader.consume(amt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn read_all(path: &Path) -> String {
        let mut reader = LogReader::open(path).unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn plain_file_passthrough() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.log");
        std::fs::write(&path, "1.0\tEXP\tstart\n").unwrap();

        assert_eq!(read_all(&path), "1.0\tEXP\tstart\n");
    }

    #[test]
    fn gzip_file_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.log.gz");

        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(b"1.0\tEXP\tstart\n2.0\tEXP\tend\n").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_all(&path), "1.0\tEXP\tstart\n2.0\tEXP\tend\n");
    }

    #[test]
    fn zstd_file_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.log.zst");

        let file = File::create(&path).unwrap();
        let mut encoder = zstd::stream::write::Encoder::new(file, 0).unwrap();
        encoder.write_all(b"1.0\tEXP\tstart\n").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_all(&path), "1.0\tEXP\tstart\n");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = LogReader::open(Path::new("/no/such/file.log")).unwrap_err();
        assert!(matches!(err, ConvertError::Unreadable { .. }));
    }

    #[test]
    fn detection_is_by_extension_not_content() {
        // Gzip bytes under a .log name must be read as-is, not decoded.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mislabeled.log");
        std::fs::write(&path, [0x1F, 0x8B, 0x08, 0x00]).unwrap();

        let reader = LogReader::open(&path).unwrap();
        assert!(matches!(reader, LogReader::Plain(_)));
    }

    #[test]
    fn corrupt_gzip_fails_while_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.log.gz");
        std::fs::write(&path, b"this is not a gzip stream").unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        let mut content = String::new();
        assert!(reader.read_to_string(&mut content).is_err());
    }
}
