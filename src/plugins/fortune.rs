//! Fortune cookies from strfile-indexed databases.
//!
//! Each `<name>.dat` index sits next to its `<name>` data file. The index
//! starts with a 24-byte big-endian header
//!
//! ```text
//! u32 version
//! u32 count      number of cookies
//! u32 longest
//! u32 shortest
//! u32 flags      0x1 random, 0x2 ordered, 0x4 rot13
//! u8  delimiter  followed by 3 bytes of padding
//! ```
//!
//! followed by `count + 1` big-endian u32 offsets into the data file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, info};

use super::Plugin;
use crate::bot::{Action, ActionContext, ActionResult};

const HEADER_LEN: usize = 24;
const FLAG_ROTATED: u32 = 0x4;

#[derive(Debug, Error)]
pub enum FortuneError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: index is truncated", path.display())]
    Truncated { path: PathBuf },
    #[error("{}: offset {offset} is outside the data file", path.display())]
    BadOffset { path: PathBuf, offset: u32 },
}

/// Header fields of a `.dat` index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version: u32,
    count: u32,
    longest: u32,
    shortest: u32,
    flags: u32,
    delimiter: u8,
}

#[derive(Debug)]
struct FortuneFile {
    name: String,
    header: Header,
    offsets: Vec<u32>,
    data: Vec<u8>,
}

impl FortuneFile {
    fn load(index: &Path) -> Result<Self, FortuneError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| FortuneError::Io { path, source }
        };

        let raw = std::fs::read(index).map_err(io_err(index))?;
        let data_path = index.with_extension("");
        let data = std::fs::read(&data_path).map_err(io_err(&data_path))?;

        let truncated = || FortuneError::Truncated {
            path: index.to_path_buf(),
        };
        let header = parse_header(&raw).ok_or_else(truncated)?;
        let offsets: Vec<u32> = raw[HEADER_LEN..]
            .chunks_exact(4)
            .take(header.count as usize + 1)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        if offsets.len() != header.count as usize + 1 {
            return Err(truncated());
        }
        if let Some(&offset) = offsets.iter().find(|&&o| o as usize > data.len()) {
            return Err(FortuneError::BadOffset {
                path: index.to_path_buf(),
                offset,
            });
        }

        let name = data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(
            file = %name,
            version = header.version,
            count = header.count,
            longest = header.longest,
            shortest = header.shortest,
            "loaded fortune file"
        );
        Ok(Self {
            name,
            header,
            offsets,
            data,
        })
    }

    fn count(&self) -> usize {
        self.header.count as usize
    }

    fn cookie(&self, index: usize) -> Option<String> {
        let start = *self.offsets.get(index)? as usize;
        let end = *self.offsets.get(index + 1)? as usize;
        let mut raw = self.data.get(start..end)?;

        let trailer = [b'\n', self.header.delimiter, b'\n'];
        raw = raw.strip_suffix(&trailer[..]).unwrap_or(raw);
        raw = raw.strip_suffix(b"\n").unwrap_or(raw);

        let mut text = String::from_utf8_lossy(raw).replace('\t', "    ");
        if self.header.flags & FLAG_ROTATED != 0 {
            text = rot13(&text);
        }
        Some(text)
    }
}

fn parse_header(raw: &[u8]) -> Option<Header> {
    let word = |i: usize| -> Option<u32> {
        let b = raw.get(i * 4..i * 4 + 4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };
    if raw.len() < HEADER_LEN {
        return None;
    }
    Some(Header {
        version: word(0)?,
        count: word(1)?,
        longest: word(2)?,
        shortest: word(3)?,
        flags: word(4)?,
        delimiter: raw[20],
    })
}

fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

/// Every fortune file found in the configured directories.
#[derive(Debug, Default)]
pub struct FortuneDb {
    files: Vec<FortuneFile>,
}

impl FortuneDb {
    /// Load every `.dat` index in `dirs`.
    pub fn load<P: AsRef<Path>>(dirs: &[P]) -> Result<Self, FortuneError> {
        let mut files = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            let entries = std::fs::read_dir(dir).map_err(|source| FortuneError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

            let mut indexes = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|source| FortuneError::Io {
                        path: dir.to_path_buf(),
                        source,
                    })?
                    .path();
                if path.extension().is_some_and(|ext| ext == "dat") {
                    indexes.push(path);
                }
            }
            indexes.sort();

            for index in indexes {
                files.push(FortuneFile::load(&index)?);
            }
        }

        info!(files = files.len(), "fortune databases loaded");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Pick a file uniformly, then a cookie within it uniformly. Cookies
    /// in small files are therefore more likely than those in large ones.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<String> {
        let file = self.files.choose(rng)?;
        if file.count() == 0 {
            return None;
        }
        let index = rng.gen_range(0..file.count());
        debug!(file = %file.name, index, "picked fortune");
        file.cookie(index)
    }
}

/// `fortune`: tell a fortune in the channel, line by line.
pub struct Fortune {
    db: Arc<FortuneDb>,
}

impl Fortune {
    pub fn new(db: FortuneDb) -> Self {
        Self { db: Arc::new(db) }
    }
}

impl Plugin for Fortune {
    fn name(&self) -> &'static str {
        "fortune"
    }

    fn actions(&self) -> Vec<Action> {
        let db = Arc::clone(&self.db);
        vec![
            Action::command("fortune", move |ctx| tell(&db, ctx))
                .doc("- tells your fortune"),
        ]
    }
}

fn tell(db: &FortuneDb, ctx: ActionContext) -> ActionResult {
    let Some(cookie) = db.pick(&mut rand::thread_rng()) else {
        ctx.client.notice(&ctx.sender.nick, "No fortunes available");
        return Ok(None);
    };
    for line in cookie.lines() {
        ctx.client.message(&ctx.channel, line);
    }
    Ok(None)
}
