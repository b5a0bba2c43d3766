//! Corpus loading: tokenize text and count word frequencies into a table.
//!
//! Input is read as raw bytes. Tokens are ASCII-whitespace-delimited, a
//! token is kept only if every byte is an ASCII letter, and kept tokens are
//! lowercased. Bytes that are not valid UTF-8 only cost the token they sit in.

use crate::chained_table::{ChainedTable, TableError};
use crate::ranking::Frequency;
use core::hash::BuildHasher;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot open corpus {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed reading corpus")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Lowercased `token` if it is purely alphabetic ASCII.
pub fn normalize(token: &[u8]) -> Option<String> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_alphabetic) {
        return None;
    }
    Some(token.iter().map(|b| char::from(b.to_ascii_lowercase())).collect())
}

pub fn tokens(text: &[u8]) -> impl Iterator<Item = String> + '_ {
    text.split(u8::is_ascii_whitespace).filter_map(normalize)
}

/// Bump the frequency of every word; returns how many words were counted.
pub fn count_words<S, I>(
    table: &mut ChainedTable<Frequency, S>,
    words: I,
) -> Result<usize, TableError>
where
    S: BuildHasher,
    I: IntoIterator<Item = String>,
{
    let mut counted = 0;
    for word in words {
        let frequency = table.get(&word).map_or(1, |f| f.saturating_add(1));
        table.put(&word, frequency)?;
        counted += 1;
    }
    Ok(counted)
}

pub fn from_reader<R: BufRead>(
    reader: R,
    bucket_hint: usize,
) -> Result<ChainedTable<Frequency>, CorpusError> {
    let mut table = ChainedTable::with_buckets(bucket_hint);
    let mut counted = 0;
    for line in reader.split(b'\n') {
        counted += count_words(&mut table, tokens(&line?))?;
    }
    debug!(
        "corpus: {counted} words, {} distinct, load factor {:.2}",
        table.len(),
        table.load_factor()
    );
    Ok(table)
}

pub fn load(
    path: impl AsRef<Path>,
    bucket_hint: usize,
) -> Result<ChainedTable<Frequency>, CorpusError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CorpusError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    from_reader(BufReader::new(file), bucket_hint)
}
