use crate::{Array, DecodeNpyError, NpyDecoder};
use std::{
    collections::BTreeMap,
    io::{self, Read, Seek},
};
use thiserror::Error;
use zip::{result::ZipError, ZipArchive};

/// An error reading a `.npz` file.
#[derive(Debug, Error)]
pub enum ReadNpzError {
    /// An error caused by the zip file.
    #[error("zip file error: {0}")]
    Zip(#[from] ZipError),
    /// An error caused by I/O while reading a member.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error decoding a member as `.npy`.
    #[error("error reading npy member: {0}")]
    Npy(#[from] DecodeNpyError),
}

/// Reader for `.npz` files.
///
/// The archive itself is handled entirely by the `zip` crate; with the
/// `compressed-npz` feature this includes DEFLATE members written by
/// `numpy.savez_compressed`.
///
/// # Example
///
/// ```no_run
/// use npy_array::NpzReader;
/// use std::fs::File;
///
/// let mut npz = NpzReader::new(File::open("arrays.npz")?)?;
/// let a = npz.by_name("a")?;
/// let b = npz.by_name("b.npy")?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct NpzReader<R: Read + Seek> {
    zip: ZipArchive<R>,
    decoder: NpyDecoder,
}

impl<R: Read + Seek> NpzReader<R> {
    /// Creates a new `.npz` reader.
    pub fn new(reader: R) -> Result<Self, ReadNpzError> {
        Ok(Self { zip: ZipArchive::new(reader)?, decoder: NpyDecoder::new() })
    }

    /// Uses `decoder` for [`by_name`](Self::by_name) and
    /// [`by_index`](Self::by_index).
    pub fn with_decoder(mut self, decoder: NpyDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Returns `true` iff the `.npz` file doesn't contain any arrays.
    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Returns the number of arrays in the `.npz` file.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    /// Returns the names of all of the arrays in the file, as stored in the
    /// archive (usually with a `.npy` suffix).
    pub fn names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_owned).collect()
    }

    /// Reads an array by name. The `.npy` suffix is optional.
    pub fn by_name(&mut self, name: &str) -> Result<Array, ReadNpzError> {
        let bytes = match self.read_member(name) {
            Err(ReadNpzError::Zip(ZipError::FileNotFound)) if !name.ends_with(".npy") => {
                self.read_member(&format!("{name}.npy"))?
            }
            result => result?,
        };
        Ok(self.decoder.decode(&bytes)?)
    }

    /// Reads an array by its index in the archive.
    pub fn by_index(&mut self, index: usize) -> Result<Array, ReadNpzError> {
        let mut file = self.zip.by_index(index)?;
        tracing::trace!(name = file.name(), "reading npz member");
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(self.decoder.decode(&bytes)?)
    }

    /// Reads the uncompressed bytes of every member, keyed by file name.
    ///
    /// Nothing bounds the memory this uses. If a name appears more than once
    /// the last member wins. Any failure discards everything read so far.
    pub fn entries(&mut self) -> Result<BTreeMap<String, Vec<u8>>, ReadNpzError> {
        let mut entries = BTreeMap::new();
        for index in 0..self.zip.len() {
            let mut file = self.zip.by_index(index)?;
            tracing::trace!(name = file.name(), size = file.size(), "reading npz member");
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            entries.insert(file.name().to_owned(), bytes);
        }
        Ok(entries)
    }

    fn read_member(&mut self, name: &str) -> Result<Vec<u8>, ReadNpzError> {
        let mut file = self.zip.by_name(name)?;
        tracing::trace!(name, size = file.size(), "reading npz member");
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
