//! Thin wrappers around FS utils so every failure names the file it touched.

use std::{
    fs::OpenOptions,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use log::trace;
use miette::Diagnostic;
use thiserror::Error;

pub(crate) fn write<C: AsRef<[u8]>>(path: &Path, contents: C) -> Result<(), Error> {
    trace!(
        "Writing {} bytes to {}",
        contents.as_ref().len(),
        path.display()
    );
    std::fs::write(path, contents).map_err(|source| Error::Write {
        path: path.into(),
        source,
    })
}

/// Appends to a file, creating it first if needed.
pub(crate) fn append<C: AsRef<[u8]>>(path: &Path, contents: C) -> Result<(), Error> {
    trace!(
        "Appending {} bytes to {}",
        contents.as_ref().len(),
        path.display()
    );
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents.as_ref()))
        .map_err(|source| Error::Write {
            path: path.into(),
            source,
        })
}

/// Reads a file, treating a missing file as `None` and any other failure as an error.
pub(crate) fn read_to_string_if_exists(path: &Path) -> Result<Option<String>, Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Read {
            path: path.into(),
            source,
        }),
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Error writing to {path}: {source}")]
    #[diagnostic(
        code(fs::write),
        help("Make sure you have permission to write to this file.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading from {path}: {source}")]
    #[diagnostic(
        code(fs::read),
        help("Make sure you have permission to read this file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
