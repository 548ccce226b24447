// src/compression/mod.rs
//! Decoding of compressed repository indices
//!
//! Mirrors publish their indices in several encodings: `primary.xml.gz` or
//! `.zst` for RPM repodata, `Packages.xz`/`.gz` for Debian dists, gzip'd
//! tarballs for Arch databases and zstd/xz CPIO payloads inside RPMs.

use std::io::{self, Read};
use thiserror::Error;

/// Decoding failures
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to open {codec} stream: {source}")]
    Open { codec: &'static str, source: io::Error },

    #[error("Corrupt {codec} stream: {source}")]
    Corrupt { codec: &'static str, source: io::Error },
}

/// Encoding of a downloaded index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Xz,
    Zstd,
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

impl Codec {
    /// Guess the codec from the last path segment of a URL or file name
    pub fn from_name(name: &str) -> Self {
        let name = name.split(['?', '#']).next().unwrap_or(name);
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("gz" | "tgz") => Self::Gzip,
            Some("xz") => Self::Xz,
            Some("zst" | "zstd") => Self::Zstd,
            _ => Self::Plain,
        }
    }

    /// Sniff the codec from the leading bytes
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if data.starts_with(XZ_MAGIC) {
            Self::Xz
        } else if data.starts_with(ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::Plain
        }
    }

    /// Strip this codec's extension from a file name (`Packages.xz` -> `Packages`)
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        let suffixes: &[&str] = match self {
            Self::Plain => &[],
            Self::Gzip => &[".gz", ".tgz"],
            Self::Xz => &[".xz"],
            Self::Zstd => &[".zst", ".zstd"],
        };
        suffixes
            .iter()
            .find_map(|s| name.strip_suffix(s))
            .unwrap_or(name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Wrap a reader in the decoder for `codec`
pub fn reader<'a, R: Read + 'a>(
    inner: R,
    codec: Codec,
) -> Result<Box<dyn Read + 'a>, CompressionError> {
    Ok(match codec {
        Codec::Plain => Box::new(inner),
        Codec::Gzip => Box::new(flate2::read::GzDecoder::new(inner)),
        Codec::Xz => Box::new(xz2::read::XzDecoder::new(inner)),
        Codec::Zstd => Box::new(
            zstd::Decoder::new(inner).map_err(|source| CompressionError::Open {
                codec: "zstd",
                source,
            })?,
        ),
    })
}

/// Decode a whole buffer
///
/// Magic bytes win over the name hint; the hint only matters for data too
/// short to sniff, and plain data is returned unchanged.
pub fn decode(name_hint: &str, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let codec = match Codec::sniff(data) {
        Codec::Plain if data.len() < XZ_MAGIC.len() => Codec::from_name(name_hint),
        sniffed => sniffed,
    };
    if codec == Codec::Plain {
        return Ok(data.to_vec());
    }

    let mut out = Vec::with_capacity(data.len() * 4);
    reader(data, codec)?
        .read_to_end(&mut out)
        .map_err(|source| CompressionError::Corrupt {
            codec: codec.name(),
            source,
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_codec_from_name() {
        assert_eq!(Codec::from_name("repodata/primary.xml.gz"), Codec::Gzip);
        assert_eq!(Codec::from_name("main/binary-amd64/Packages.xz"), Codec::Xz);
        assert_eq!(Codec::from_name("abc-primary.xml.zst"), Codec::Zstd);
        assert_eq!(Codec::from_name("core.db.tar.gz?x=1"), Codec::Gzip);
        assert_eq!(Codec::from_name("InRelease"), Codec::Plain);
    }

    #[test]
    fn test_codec_sniff() {
        assert_eq!(Codec::sniff(&gzip(b"x")), Codec::Gzip);
        assert_eq!(Codec::sniff(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 1]), Codec::Xz);
        assert_eq!(Codec::sniff(&[0x28, 0xb5, 0x2f, 0xfd]), Codec::Zstd);
        assert_eq!(Codec::sniff(b"<?xml"), Codec::Plain);
        assert_eq!(Codec::sniff(&[0x1f]), Codec::Plain);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(Codec::Xz.strip("Packages.xz"), "Packages");
        assert_eq!(Codec::Gzip.strip("Packages.gz"), "Packages");
        assert_eq!(Codec::Plain.strip("Packages"), "Packages");
    }

    #[test]
    fn test_decode_gzip_and_plain() {
        let packed = gzip(b"Package: linux-headers\n");
        assert_eq!(decode("Packages.gz", &packed).unwrap(), b"Package: linux-headers\n");
        assert_eq!(decode("Packages", b"plain text").unwrap(), b"plain text");
    }

    #[test]
    fn test_decode_zstd() {
        let packed = zstd::encode_all(&b"<metadata/>"[..], 3).unwrap();
        assert_eq!(decode("primary.xml.zst", &packed).unwrap(), b"<metadata/>");
    }

    #[test]
    fn test_decode_corrupt_gzip() {
        let mut packed = gzip(b"some longer payload that compresses");
        packed.truncate(12);
        assert!(decode("x.gz", &packed).is_err());
    }
}
