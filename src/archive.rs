// src/archive.rs
//! On-disk container for a [`CodecFile`].
//!
//! A container carries the original length and a SHA-256 digest of the
//! original bytes so a decoded file can be checked before it is written out.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec_file::{wire_error, wire_options, CodecFile};
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;

pub const ARCHIVE_EXT: &str = "huf";
const TEMP_EXT: &str = "tmp"; // For atomic writes
const MAGIC: [u8; 4] = *b"HUFP";
const VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    version: u8,
    original_len: u64,
    digest: [u8; 32],
    body: Vec<u8>,
}

/// A codec file together with what is known about the bytes it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    original_len: u64,
    digest: [u8; 32],
    codec: CodecFile,
}

fn file_hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl Archive {
    /// Compress `data` and record its length and digest.
    pub fn pack(data: &[u8]) -> Result<Self> {
        Ok(Self {
            original_len: data.len() as u64,
            digest: file_hash(data),
            codec: crate::compress(data)?,
        })
    }

    pub fn original_len(&self) -> u64 {
        self.original_len
    }

    pub fn digest_hex(&self) -> String {
        hex(&self.digest)
    }

    pub fn codec(&self) -> &CodecFile {
        &self.codec
    }

    /// Decode the payload. With `verify`, the output must also match the
    /// recorded digest; the length is always checked.
    pub fn unpack(&self, verify: bool) -> Result<Vec<u8>> {
        let data = crate::decompress(&self.codec)?;

        if data.len() as u64 != self.original_len {
            tracing::warn!(expected = self.original_len, actual = data.len(), "length mismatch");
            return Err(CodecError::IntegrityMismatch {
                expected: format!("{} bytes", self.original_len),
                actual: format!("{} bytes", data.len()),
            });
        }
        if verify {
            let digest = file_hash(&data);
            if digest != self.digest {
                tracing::warn!("digest mismatch after decoding");
                return Err(CodecError::IntegrityMismatch {
                    expected: hex(&self.digest),
                    actual: hex(&digest),
                });
            }
        }
        Ok(data)
    }

    /// Shannon entropy of the original bytes, in bits per symbol.
    pub fn entropy(&self) -> Result<f64> {
        let data = crate::decompress(&self.codec)?;
        Ok(FrequencyTable::from_bytes(&data).entropy())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let envelope = Envelope {
            magic: MAGIC,
            version: VERSION,
            original_len: self.original_len,
            digest: self.digest,
            body: self.codec.to_bytes()?,
        };
        wire_options().serialize(&envelope).map_err(wire_error)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
            return Err(CodecError::MalformedFile("not a huffpack archive".into()));
        }
        // The version byte decides the layout, so check it before decoding.
        match data.get(MAGIC.len()) {
            Some(&VERSION) => {}
            Some(version) => {
                return Err(CodecError::MalformedFile(format!(
                    "unsupported format version {version}"
                )));
            }
            None => {
                return Err(CodecError::TruncatedOrCorruptStream(
                    "archive ends before its version byte".into(),
                ));
            }
        }
        let envelope: Envelope = wire_options()
            .with_limit(data.len() as u64)
            .deserialize(data)
            .map_err(wire_error)?;
        Ok(Self {
            original_len: envelope.original_len,
            digest: envelope.digest,
            codec: CodecFile::from_bytes(&envelope.body)?,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes).map_err(CodecError::Io)?;
        writer.flush().map_err(CodecError::Io)
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(CodecError::InputUnavailable)?;
        Self::from_bytes(&bytes)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(CodecError::InputUnavailable)?;
        Self::from_bytes(&data)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_atomic(path, &self.to_bytes()?)
    }
}

/// Read a whole byte source, reporting failures as
/// [`CodecError::InputUnavailable`].
pub fn read_input<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(CodecError::InputUnavailable)?;
    Ok(data)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(TEMP_EXT);
    PathBuf::from(name)
}

/// Write to a sibling temp file, then rename over `path`.
pub fn save_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp = temp_path(path);
    let written = fs::write(&temp, data).and_then(|()| fs::rename(&temp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(CodecError::Io(e));
    }
    tracing::debug!(path = %path.display(), bytes = data.len(), "saved");
    Ok(())
}

/// `input.huf` for a file being compressed.
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(ARCHIVE_EXT);
    PathBuf::from(name)
}

/// Strip `.huf` from an archive name, or append `.out` if there is none.
pub fn decompressed_path(archive: &Path) -> PathBuf {
    if archive.extension().is_some_and(|ext| ext == ARCHIVE_EXT) {
        archive.with_extension("")
    } else {
        let mut name = archive.as_os_str().to_owned();
        name.push(".out");
        PathBuf::from(name)
    }
}

/// Refuse to clobber an existing file unless `force` is set.
pub fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(CodecError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const TEXT: &[u8] = b"It was the best of times, it was the worst of times.";

    #[test]
    fn write_then_read_in_memory() {
        let archive = Archive::pack(TEXT).unwrap();
        let mut buf = Vec::new();
        archive.write_to(&mut buf).unwrap();

        let restored = Archive::read_from(Cursor::new(buf)).unwrap();
        assert_eq!(restored, archive);
        assert_eq!(restored.original_len(), TEXT.len() as u64);
        assert_eq!(restored.unpack(true).unwrap(), TEXT);
    }

    #[test]
    fn digest_mismatch_is_detected() {
        let mut archive = Archive::pack(TEXT).unwrap();
        archive.digest[0] ^= 0xff;
        assert!(matches!(
            archive.unpack(true),
            Err(CodecError::IntegrityMismatch { .. })
        ));
        assert_eq!(archive.unpack(false).unwrap(), TEXT);
    }

    #[test]
    fn length_mismatch_is_detected() {
        let mut archive = Archive::pack(TEXT).unwrap();
        archive.original_len += 1;
        assert!(matches!(
            archive.unpack(false),
            Err(CodecError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn bad_magic_and_version_are_rejected() {
        let bytes = Archive::pack(TEXT).unwrap().to_bytes().unwrap();

        let mut wrong_magic = bytes.clone();
        wrong_magic[0] = b'X';
        assert!(matches!(
            Archive::from_bytes(&wrong_magic),
            Err(CodecError::MalformedFile(_))
        ));

        let mut wrong_version = bytes;
        wrong_version[MAGIC.len()] = VERSION + 1;
        assert!(matches!(
            Archive::from_bytes(&wrong_version),
            Err(CodecError::MalformedFile(_))
        ));
    }

    #[test]
    fn unknown_version_is_reported_before_layout() {
        let mut bytes = MAGIC.to_vec();
        bytes.push(VERSION + 1);
        bytes.extend_from_slice(b"some future layout");
        match Archive::from_bytes(&bytes) {
            Err(CodecError::MalformedFile(msg)) => assert!(msg.contains("version"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            Archive::from_bytes(&MAGIC),
            Err(CodecError::TruncatedOrCorruptStream(_))
        ));
    }

    #[test]
    fn entropy_comes_from_decoded_bytes() {
        let archive = Archive::pack(b"abcdabcd").unwrap();
        assert!((archive.entropy().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(Archive::pack(&[]).unwrap().entropy().unwrap(), 0.0);
    }

    #[test]
    fn truncated_archive_is_rejected() {
        let bytes = Archive::pack(TEXT).unwrap().to_bytes().unwrap();
        let err = Archive::from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedOrCorruptStream(_)));
    }

    #[test]
    fn empty_input_round_trips() {
        let archive = Archive::pack(&[]).unwrap();
        let restored = Archive::from_bytes(&archive.to_bytes().unwrap()).unwrap();
        assert!(restored.unpack(true).unwrap().is_empty());
    }

    #[test]
    fn output_names() {
        assert_eq!(
            compressed_path(Path::new("dir/notes.txt")),
            PathBuf::from("dir/notes.txt.huf")
        );
        assert_eq!(
            decompressed_path(Path::new("dir/notes.txt.huf")),
            PathBuf::from("dir/notes.txt")
        );
        assert_eq!(
            decompressed_path(Path::new("dir/blob.bin")),
            PathBuf::from("dir/blob.bin.out")
        );
        assert_eq!(temp_path(Path::new("a.huf")), PathBuf::from("a.huf.tmp"));
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("huffpack-archive-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.huf");

        let archive = Archive::pack(TEXT).unwrap();
        archive.save(&path).unwrap();
        assert!(!temp_path(&path).exists());
        assert!(ensure_writable(&path, false).is_err());
        assert!(ensure_writable(&path, true).is_ok());

        let loaded = Archive::load(&path).unwrap();
        assert_eq!(loaded.unpack(true).unwrap(), TEXT);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn read_input_collects_everything() {
        assert_eq!(read_input(Cursor::new(TEXT)).unwrap(), TEXT);
    }
}
