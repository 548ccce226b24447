// src/packages/cpio.rs

//! Reader for the newc CPIO payload of RPM packages

use crate::packages::common::MAX_EXTRACTION_FILE_SIZE;
use crate::packages::traits::ExtractedFile;
use std::io::{self, Read};
use tracing::warn;

/// CPIO New ASCII Format (newc) header size
const HEADER_SIZE: usize = 110;
const MAGIC_NEWC: &[u8] = b"070701";
const MAGIC_CRC: &[u8] = b"070702";
const TRAILER: &str = "TRAILER!!!";

/// Longest member name accepted, `PATH_MAX` including the NUL
const MAX_NAME_SIZE: u64 = 4096;

/// Regular file bit pattern in `mode`
const S_IFMT: u32 = 0o170000;
const S_IFREG: u32 = 0o100000;

/// Header of one archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpioEntry {
    pub name: String,
    pub size: u64,
    pub mode: u32,
}

impl CpioEntry {
    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn padding(len: u64) -> usize {
    ((4 - (len % 4)) % 4) as usize
}

/// Streaming reader over a newc archive
///
/// Call [`CpioReader::next_entry`], then either [`CpioReader::read_content`]
/// or [`CpioReader::skip_content`] before asking for the next entry.
pub struct CpioReader<R: Read> {
    reader: R,
    pending: Option<u64>,
}

impl<R: Read> CpioReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
        }
    }

    fn skip(&mut self, len: u64) -> io::Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
        if copied != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        Ok(())
    }

    /// Read the next header, `None` at the trailer or end of stream
    pub fn next_entry(&mut self) -> io::Result<Option<CpioEntry>> {
        if self.pending.is_some() {
            self.skip_content()?;
        }

        let mut header = [0u8; HEADER_SIZE];
        match self.reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        let magic = &header[0..6];
        if magic != MAGIC_NEWC && magic != MAGIC_CRC {
            return Err(invalid(format!(
                "Invalid CPIO magic: {:?}",
                String::from_utf8_lossy(magic)
            )));
        }

        let field = |start: usize| -> io::Result<u64> {
            let s = std::str::from_utf8(&header[start..start + 8])
                .map_err(|e| invalid(e.to_string()))?;
            u64::from_str_radix(s, 16).map_err(|e| invalid(e.to_string()))
        };
        let mode = field(14)? as u32;
        let size = field(54)?;
        let namesize = field(94)?;
        if namesize > MAX_NAME_SIZE {
            return Err(invalid(format!(
                "CPIO name size {namesize} exceeds {MAX_NAME_SIZE} bytes"
            )));
        }

        let mut name = vec![0u8; namesize as usize];
        self.reader.read_exact(&mut name)?;
        if name.last() == Some(&0) {
            name.pop();
        }
        let name = String::from_utf8_lossy(&name).into_owned();
        self.skip(padding(HEADER_SIZE as u64 + namesize) as u64)?;

        if name == TRAILER {
            return Ok(None);
        }

        self.pending = Some(size);
        Ok(Some(CpioEntry { name, size, mode }))
    }

    /// Content of the entry last returned by `next_entry`
    pub fn read_content(&mut self) -> io::Result<Vec<u8>> {
        let size = self.pending.take().unwrap_or(0);
        let mut content = vec![0u8; size as usize];
        self.reader.read_exact(&mut content)?;
        self.skip(padding(size) as u64)?;
        Ok(content)
    }

    pub fn skip_content(&mut self) -> io::Result<()> {
        let size = self.pending.take().unwrap_or(0);
        self.skip(size + padding(size) as u64)
    }
}

/// Regular files whose basename is one of `names`
pub fn extract_matching<R: Read>(reader: R, names: &[String]) -> io::Result<Vec<ExtractedFile>> {
    let mut cpio = CpioReader::new(reader);
    let mut files = Vec::new();

    while let Some(entry) = cpio.next_entry()? {
        if !entry.is_file() || !names.iter().any(|n| n == entry.basename()) {
            cpio.skip_content()?;
            continue;
        }
        if entry.size > MAX_EXTRACTION_FILE_SIZE {
            warn!(
                "Skipping oversized file '{}' ({} bytes), exceeds {} byte limit",
                entry.name, entry.size, MAX_EXTRACTION_FILE_SIZE
            );
            cpio.skip_content()?;
            continue;
        }
        let content = cpio.read_content()?;
        files.push(ExtractedFile::new(entry.name, content));
    }

    Ok(files)
}
