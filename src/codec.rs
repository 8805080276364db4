//! Key codec
//!
//! Builds physical store keys from a (table, logical key) pair and strips
//! them back.
//!
//! ## Key Format
//!
//! ### Length-prefixed (default)
//! ```text
//! ┌──────────────┬────────────────────┬─────────────────────────────┐
//! │ TableLen (2) │   Table (N bytes)  │         Logical Key         │
//! └──────────────┴────────────────────┴─────────────────────────────┘
//! ```
//! The table length is big-endian, so no table's prefix can be a prefix of
//! another table's keys.
//!
//! ### Concatenated (compatibility)
//! ```text
//! ┌────────────────────┬─────────────────────────────┐
//! │   Table (N bytes)  │         Logical Key         │
//! └────────────────────┴─────────────────────────────┘
//! ```
//! Key `"1"` in table `"table"` and key `"able1"` in table `"t"` are the
//! same physical key. Only use this to read data written without a prefix.

use crate::error::{Result, SettError};

/// Size of the table length header in the length-prefixed encoding
pub const TABLE_LEN_SIZE: usize = 2;

/// Longest table name the length-prefixed encoding can carry
pub const MAX_TABLE_LEN: usize = u16::MAX as usize;

/// How table names are combined with logical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEncoding {
    /// `be_u16(len(table)) ++ table ++ key`, collision free
    #[default]
    LengthPrefixed,

    /// `table ++ key`, tables may contaminate each other
    Concatenated,
}

/// Encoder/decoder bound to a single table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    encoding: KeyEncoding,

    /// Every physical key of the table starts with this
    prefix: Vec<u8>,
}

impl KeyCodec {
    /// Create a codec for `table`
    ///
    /// Fails with `InvalidTable` if the name does not fit the length header.
    pub fn new(encoding: KeyEncoding, table: &str) -> Result<Self> {
        let name = table.as_bytes();

        let prefix = match encoding {
            KeyEncoding::LengthPrefixed => {
                if name.len() > MAX_TABLE_LEN {
                    return Err(SettError::InvalidTable(format!(
                        "name is {} bytes, limit is {}",
                        name.len(),
                        MAX_TABLE_LEN
                    )));
                }
                let mut prefix = Vec::with_capacity(TABLE_LEN_SIZE + name.len());
                prefix.extend_from_slice(&(name.len() as u16).to_be_bytes());
                prefix.extend_from_slice(name);
                prefix
            }
            KeyEncoding::Concatenated => name.to_vec(),
        };

        Ok(Self { encoding, prefix })
    }

    /// The encoding in use
    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Prefix shared by every physical key of the table
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Build the physical key for `key`
    pub fn encode(&self, key: &[u8]) -> Vec<u8> {
        let mut physical = Vec::with_capacity(self.prefix.len() + key.len());
        physical.extend_from_slice(&self.prefix);
        physical.extend_from_slice(key);
        physical
    }

    /// Scan prefix for the table, narrowed by `filter` when given
    pub fn scan_prefix(&self, filter: Option<&[u8]>) -> Vec<u8> {
        match filter {
            Some(filter) => self.encode(filter),
            None => self.prefix.clone(),
        }
    }

    /// Strip exactly the table prefix from a physical key
    ///
    /// Returns `None` if `physical` does not belong to this table.
    pub fn decode<'a>(&self, physical: &'a [u8]) -> Option<&'a [u8]> {
        physical.strip_prefix(self.prefix.as_slice())
    }
}
