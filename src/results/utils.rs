use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::{fs, path::Path};

/// Package fingerprint: digests of the package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerPrint {
    md5: [u8; 16],
    sha1: [u8; 20],
    sha256: [u8; 32],
}

impl FingerPrint {
    /// Creates a new fingerprint.
    pub fn new<P: AsRef<Path>>(package: P) -> Result<Self> {
        let buffer = fs::read(package.as_ref()).with_context(|| {
            format!("could not read the package `{}`", package.as_ref().display())
        })?;

        let mut sha256 = [0; 32];
        sha256.copy_from_slice(&Sha256::digest(&buffer));

        Ok(Self {
            md5: md5::compute(&buffer).0,
            sha1: Sha1::from(&buffer).digest().bytes(),
            sha256,
        })
    }

    /// Gets the hexadecimal MD5 digest.
    pub fn md5(&self) -> String {
        hex::encode(self.md5)
    }

    /// Gets the hexadecimal SHA-1 digest.
    pub fn sha1(&self) -> String {
        hex::encode(self.sha1)
    }

    /// Gets the hexadecimal SHA-256 digest.
    pub fn sha256(&self) -> String {
        hex::encode(self.sha256)
    }
}

impl Serialize for FingerPrint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser_struct = serializer.serialize_struct("fingerprint", 3)?;
        ser_struct.serialize_field("md5", &self.md5())?;
        ser_struct.serialize_field("sha1", &self.sha1())?;
        ser_struct.serialize_field("sha256", &self.sha256())?;
        ser_struct.end()
    }
}
