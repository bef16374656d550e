//! The stages of the translation pipeline. Every stage can be stored and loaded on its own in a binary format.

use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use fs_err::File;
use serde::{de::DeserializeOwned, Serialize};

pub mod chunker;
pub mod dictionary;
pub mod tagger;
pub mod transfer;

/// A serializable pipeline stage.
pub trait Component: Serialize + DeserializeOwned {
    /// A short name used in logs and file names.
    fn name() -> &'static str;

    /// Loads the component from a binary file.
    fn new<P: AsRef<Path>>(p: P) -> Result<Self, crate::Error> {
        let reader = BufReader::new(File::open(p.as_ref())?);
        Self::from_reader(reader)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, crate::Error> {
        Ok(bincode::deserialize_from(reader)?)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), crate::Error> {
        Ok(bincode::serialize_into(writer, self)?)
    }

    /// Stores the component in a binary file, creating or truncating it.
    fn save<P: AsRef<Path>>(&self, p: P) -> Result<(), crate::Error> {
        let writer = BufWriter::new(File::create(p.as_ref())?);
        self.to_writer(writer)
    }
}
