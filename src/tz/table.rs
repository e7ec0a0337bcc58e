/*!
Compiled zone tables and their binary format.

A compiled zone table is the complete offset history of one time zone: an
initial record describing the offset in effect before any transition,
followed by one record per transition. Tables are produced offline (see
[`ZoneTableBuilder`]) and parsed at load time by a provider.

# Format

All integers are big endian.

```text
magic          4 bytes, "CZTF"
version        u8, currently 1
id length      u16
id             UTF-8 bytes
record count   u32, at least 1
records        repeated record count times:
    instant          i64, milliseconds since the Unix epoch
    offset           i32, milliseconds, total offset from UTC
    standard offset  i32, milliseconds, offset ignoring daylight saving
    name key length  u8
    name key         UTF-8 bytes
```

The instant of the first record is the start of the table and is usually
`i64::MIN`. The instants of every record must be strictly increasing. Each
offset must be strictly within one day of UTC.
*/

use crate::{error::tz::table::Error as TableError, Error};

const MAGIC: &[u8; 4] = b"CZTF";
const VERSION: u8 = 1;

/// The exclusive bound on the magnitude of any offset, in milliseconds.
pub(crate) const MAX_OFFSET_EXCLUSIVE: i64 = 86_400_000;

/// The compiled offset history of a single time zone.
///
/// Lookups use binary search over the transition instants, so they take
/// logarithmic time in the number of transitions.
///
/// # Example
///
/// ```
/// use calendrical::tz::{ZoneTable, ZoneTableBuilder};
///
/// let table = ZoneTableBuilder::new("Test/Zone", 0, 0, "STD")
///     .transition(1_000, 3_600_000, 0, "DST")
///     .build()?;
/// let bytes = table.to_bytes();
/// let parsed = ZoneTable::parse(Some("Test/Zone"), &bytes)?;
/// assert_eq!(parsed.offset(999), 0);
/// assert_eq!(parsed.offset(1_000), 3_600_000);
/// assert_eq!(parsed.checksum(), table.checksum());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct ZoneTable {
    id: Box<str>,
    records: Vec<Transition>,
    checksum: u32,
}

/// One record of a [`ZoneTable`].
///
/// The offsets given by a record are in effect from its instant up to (but
/// not including) the instant of the next record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    instant: i64,
    offset: i32,
    standard_offset: i32,
    name_key: Box<str>,
}

impl Transition {
    /// The instant at which this record's offsets come into effect.
    pub fn instant(&self) -> i64 {
        self.instant
    }

    /// The total offset from UTC, in milliseconds.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// The offset from UTC ignoring daylight saving time, in milliseconds.
    pub fn standard_offset(&self) -> i32 {
        self.standard_offset
    }

    /// A short key naming this period, such as `GMT` or `BST`.
    pub fn name_key(&self) -> &str {
        &self.name_key
    }
}

impl ZoneTable {
    /// Parses a compiled zone table.
    ///
    /// When `expected_id` is given, the identifier stored in the table must
    /// be equal to it.
    ///
    /// It is safe to pass arbitrary bytes to this routine. Malformed data
    /// results in an error for which
    /// [`Error::is_zone_resource`](crate::Error::is_zone_resource) returns
    /// `true`.
    pub fn parse(
        expected_id: Option<&str>,
        bytes: &[u8],
    ) -> Result<ZoneTable, Error> {
        let table = ZoneTable::parse_impl(bytes)?;
        if let Some(expected) = expected_id {
            if &*table.id != expected {
                return Err(Error::from(TableError::IdMismatch {
                    expected: expected.into(),
                    found: table.id.clone(),
                }));
            }
        }
        Ok(table)
    }

    fn parse_impl(bytes: &[u8]) -> Result<ZoneTable, TableError> {
        let checksum = crc32fast::hash(bytes);
        let (magic, rest) = try_split_at("magic", bytes, 4)?;
        if magic != MAGIC {
            return Err(TableError::MismatchMagic);
        }
        let (version, rest) = try_split_at("version", rest, 1)?;
        if version[0] != VERSION {
            return Err(TableError::UnsupportedVersion { version: version[0] });
        }
        let (len, rest) = try_split_at("identifier length", rest, 2)?;
        let len = usize::from(from_be_bytes_u16(len));
        let (id, rest) = try_split_at("identifier", rest, len)?;
        let id = std::str::from_utf8(id)
            .map_err(|_| TableError::IdInvalidUtf8)?;
        let (count, mut rest) = try_split_at("record count", rest, 4)?;
        let count = usize::try_from(from_be_bytes_u32(count))
            .map_err(|_| TableError::Truncated { what: "records" })?;
        if count == 0 {
            return Err(TableError::Empty);
        }

        // Don't trust the count for the allocation, since every record
        // takes at least 17 bytes.
        let mut records = Vec::with_capacity(rest.len() / 17);
        for index in 0..count {
            let (instant, r) = try_split_at("record instant", rest, 8)?;
            let (offset, r) = try_split_at("record offset", r, 4)?;
            let (standard, r) = try_split_at("record standard offset", r, 4)?;
            let (len, r) = try_split_at("record name key length", r, 1)?;
            let (name, r) =
                try_split_at("record name key", r, usize::from(len[0]))?;
            rest = r;

            let record = Transition {
                instant: from_be_bytes_i64(instant),
                offset: from_be_bytes_i32(offset),
                standard_offset: from_be_bytes_i32(standard),
                name_key: std::str::from_utf8(name)
                    .map_err(|_| TableError::NameInvalidUtf8 { index })?
                    .into(),
            };
            for offset in [record.offset, record.standard_offset] {
                if i64::from(offset).abs() >= MAX_OFFSET_EXCLUSIVE {
                    return Err(TableError::InvalidOffset { index, offset });
                }
            }
            let last = records.last().map(|r: &Transition| r.instant);
            if last.map_or(false, |last| last >= record.instant) {
                return Err(TableError::NotIncreasing { index });
            }
            records.push(record);
        }
        if !rest.is_empty() {
            return Err(TableError::TrailingBytes { len: rest.len() });
        }
        Ok(ZoneTable { id: id.into(), records, checksum })
    }

    /// Returns this table in its binary format.
    ///
    /// Parsing the result yields a table equal to this one.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.id, &self.records)
    }

    /// The identifier of the zone this table describes.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The CRC-32 checksum of this table's binary format.
    ///
    /// Two tables with the same checksum almost certainly describe the same
    /// offsets. Providers use this to detect content that changed between
    /// loads.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Every record in this table, the initial record first.
    pub fn transitions(&self) -> &[Transition] {
        &self.records
    }

    /// Returns the record in effect at the given instant.
    ///
    /// Instants before the first record use the first record.
    pub fn lookup(&self, instant: i64) -> &Transition {
        let i = self.records.partition_point(|r| r.instant <= instant);
        &self.records[i.saturating_sub(1)]
    }

    /// Returns the total offset in effect at the given instant.
    pub fn offset(&self, instant: i64) -> i32 {
        self.lookup(instant).offset
    }

    /// Returns the first transition strictly after `instant`, if any.
    ///
    /// The first record doesn't describe a transition and is never
    /// returned.
    pub fn next_transition(&self, instant: i64) -> Option<&Transition> {
        let i = self.records.partition_point(|r| r.instant <= instant);
        self.records.get(i.max(1))
    }

    /// Returns the last transition strictly before `instant`, if any.
    ///
    /// The first record doesn't describe a transition and is never
    /// returned.
    pub fn previous_transition(&self, instant: i64) -> Option<&Transition> {
        let i = self.records.partition_point(|r| r.instant < instant);
        if i <= 1 {
            return None;
        }
        self.records.get(i - 1)
    }
}

impl std::fmt::Debug for ZoneTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ZoneTable")
            .field("id", &self.id)
            .field("records", &self.records.len())
            .field("checksum", &format_args!("{:#010x}", self.checksum))
            .finish()
    }
}

/// Builds a [`ZoneTable`] from a list of transitions.
///
/// This is the compiler end of the table format. Offline tooling that
/// translates rule definitions into transitions, as well as tests, use it to
/// produce tables.
#[derive(Clone, Debug)]
pub struct ZoneTableBuilder {
    id: String,
    records: Vec<Transition>,
}

impl ZoneTableBuilder {
    /// Starts a table whose initial offsets apply from the beginning of
    /// time.
    pub fn new(
        id: &str,
        offset: i32,
        standard_offset: i32,
        name_key: &str,
    ) -> ZoneTableBuilder {
        let initial = Transition {
            instant: i64::MIN,
            offset,
            standard_offset,
            name_key: name_key.into(),
        };
        ZoneTableBuilder { id: id.to_string(), records: vec![initial] }
    }

    /// Adds a transition to new offsets at the given instant.
    ///
    /// Transitions must be added in strictly increasing order of instant.
    pub fn transition(
        &mut self,
        instant: i64,
        offset: i32,
        standard_offset: i32,
        name_key: &str,
    ) -> &mut ZoneTableBuilder {
        self.records.push(Transition {
            instant,
            offset,
            standard_offset,
            name_key: name_key.into(),
        });
        self
    }

    /// Validates the transitions added so far and builds the table.
    ///
    /// The table is validated by exactly the same rules that
    /// [`ZoneTable::parse`] uses.
    pub fn build(&self) -> Result<ZoneTable, Error> {
        if self.id.len() > usize::from(u16::MAX) {
            return Err(TableError::IdTooLong { len: self.id.len() }.into());
        }
        for (index, record) in self.records.iter().enumerate() {
            let len = record.name_key.len();
            if len > usize::from(u8::MAX) {
                return Err(TableError::NameTooLong { index, len }.into());
            }
        }
        ZoneTable::parse(None, &encode(&self.id, &self.records))
    }
}

/// Encodes a table in its binary format.
///
/// Callers must ensure the identifier and every name key fit in their
/// length prefixes.
fn encode(id: &str, records: &[Transition]) -> Vec<u8> {
    let mut out = Vec::with_capacity(11 + id.len() + records.len() * 20);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    // OK because callers guarantee the length fits.
    out.extend_from_slice(&(id.len() as u16).to_be_bytes());
    out.extend_from_slice(id.as_bytes());
    // OK because a table can't have anywhere near 2^32 records.
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    for record in records {
        out.extend_from_slice(&record.instant.to_be_bytes());
        out.extend_from_slice(&record.offset.to_be_bytes());
        out.extend_from_slice(&record.standard_offset.to_be_bytes());
        // OK because callers guarantee the length fits.
        out.push(record.name_key.len() as u8);
        out.extend_from_slice(record.name_key.as_bytes());
    }
    out
}

/// Splits the given bytes at `at`, or returns an error naming `what` was
/// truncated.
fn try_split_at<'b>(
    what: &'static str,
    bytes: &'b [u8],
    at: usize,
) -> Result<(&'b [u8], &'b [u8]), TableError> {
    if at > bytes.len() {
        Err(TableError::Truncated { what })
    } else {
        Ok(bytes.split_at(at))
    }
}

/// # Panics
///
/// When `bytes.len() != 2`.
fn from_be_bytes_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes(bytes.try_into().unwrap())
}

/// # Panics
///
/// When `bytes.len() != 4`.
fn from_be_bytes_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes.try_into().unwrap())
}

/// # Panics
///
/// When `bytes.len() != 4`.
fn from_be_bytes_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes(bytes.try_into().unwrap())
}

/// # Panics
///
/// When `bytes.len() != 8`.
fn from_be_bytes_i64(bytes: &[u8]) -> i64 {
    i64::from_be_bytes(bytes.try_into().unwrap())
}
