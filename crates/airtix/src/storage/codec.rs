//! Encoder/decoder for the airtix data files.
//!
//! Each collection file holds a header with a record count, that many
//! fixed-size records and a BLAKE3 checksum of everything before it. See
//! [`format`](super::format) for the exact layout.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::format::*;
use crate::model::{Flight, Ticket};

/// Errors raised while decoding a data file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The file ends before the header or counter value is complete.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// The file does not start with the expected magic bytes.
    #[error("invalid magic number: {0:02x?}")]
    InvalidMagic([u8; 4]),
    /// The file was written by an unknown format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    /// The header timestamp is out of range.
    #[error("invalid save timestamp {0}")]
    InvalidTimestamp(i64),
    /// The header declares a negative record count.
    #[error("negative record count {0}")]
    NegativeCount(i64),
    /// The file holds fewer records than its header declares.
    #[error("header declares {declared} records but only {available} are present")]
    CountMismatch {
        /// Records declared in the header.
        declared: usize,
        /// Complete records actually present.
        available: usize,
    },
    /// The file has bytes past the checksum.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    /// The checksum does not match the contents.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// A text field is not valid UTF-8.
    #[error("invalid UTF-8 in {field} field of record {record}")]
    InvalidUtf8 {
        /// Name of the field.
        field: &'static str,
        /// Index of the record.
        record: usize,
    },
    /// A record violates a data invariant.
    #[error("invalid record {record}: {reason}")]
    InvalidRecord {
        /// Index of the record.
        record: usize,
        /// Which invariant was violated.
        reason: &'static str,
    },
}

/// Errors raised while encoding a data file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// More records than the count field can express.
    #[error("too many records: {0}")]
    TooManyRecords(usize),
    /// A numeric field does not fit its on-disk width.
    #[error("{field} value {value} does not fit the record layout")]
    ValueOutOfRange {
        /// Name of the field.
        field: &'static str,
        /// The offending value.
        value: u64,
    },
}

/// A fixed-size record stored in a collection file.
pub trait Record: Sized {
    /// Magic bytes identifying the collection file.
    const MAGIC: [u8; 4];
    /// Size of one encoded record in bytes.
    const SIZE: usize;

    /// Write this record into `buf`, which is exactly [`Self::SIZE`] zeroed bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field does not fit its on-disk width.
    fn encode(&self, buf: &mut [u8]) -> Result<(), EncodeError>;

    /// Read record number `index` from `buf`, which is exactly [`Self::SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is malformed or violates an invariant.
    fn decode(buf: &[u8], index: usize) -> Result<Self, DecodeError>;
}

/// A decoded collection file.
#[derive(Debug)]
pub struct DecodedCollection<T> {
    /// When the file was written.
    pub saved_at: DateTime<Utc>,
    /// The records, in file order.
    pub records: Vec<T>,
}

/// Decode a collection file.
///
/// # Errors
///
/// Returns an error if the header is malformed, the file is shorter than its
/// record count implies, the checksum does not match or any record is invalid.
pub fn decode_collection<T: Record>(data: &[u8]) -> Result<DecodedCollection<T>, DecodeError> {
    if data.len() < HEADER_SIZE {
        return Err(DecodeError::UnexpectedEof);
    }

    let magic = read_array::<4>(data, MAGIC_OFFSET);
    if magic != T::MAGIC {
        return Err(DecodeError::InvalidMagic(magic));
    }

    let version = u32::from_le_bytes(read_array(data, VERSION_OFFSET));
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let millis = i64::from_le_bytes(read_array(data, SAVED_AT_OFFSET));
    let saved_at =
        DateTime::<Utc>::from_timestamp_millis(millis).ok_or(DecodeError::InvalidTimestamp(millis))?;

    let count = i32::from_le_bytes(read_array(data, COUNT_OFFSET));
    let count = usize::try_from(count).map_err(|_| DecodeError::NegativeCount(i64::from(count)))?;

    let body_end = count
        .checked_mul(T::SIZE)
        .and_then(|len| len.checked_add(HEADER_SIZE));
    let expected = body_end.and_then(|end| end.checked_add(CHECKSUM_SIZE));
    let (body_end, expected) = match (body_end, expected) {
        (Some(body_end), Some(expected)) if data.len() >= expected => (body_end, expected),
        _ => {
            return Err(DecodeError::CountMismatch {
                declared: count,
                available: data.len().saturating_sub(HEADER_SIZE + CHECKSUM_SIZE) / T::SIZE,
            })
        }
    };
    if data.len() > expected {
        return Err(DecodeError::TrailingBytes(data.len() - expected));
    }

    let checksum = blake3::hash(&data[..body_end]);
    if checksum.as_bytes()[..] != data[body_end..expected] {
        return Err(DecodeError::ChecksumMismatch);
    }

    let records = data[HEADER_SIZE..body_end]
        .chunks_exact(T::SIZE)
        .enumerate()
        .map(|(index, chunk)| T::decode(chunk, index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedCollection {
        saved_at,
        records,
    })
}

/// Encode a collection file.
///
/// # Errors
///
/// Returns an error if there are more records than an `i32` count can hold
/// or a record field does not fit its on-disk width.
pub fn encode_collection<'a, T, I>(records: I, saved_at: DateTime<Utc>) -> Result<Vec<u8>, EncodeError>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let len = records.len();
    let count = i32::try_from(len).map_err(|_| EncodeError::TooManyRecords(len))?;

    let mut data = Vec::with_capacity(HEADER_SIZE + len * T::SIZE + CHECKSUM_SIZE);

    // header
    data.extend_from_slice(&T::MAGIC);
    data.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    data.extend_from_slice(&saved_at.timestamp_millis().to_le_bytes());
    data.extend_from_slice(&count.to_le_bytes());

    // records
    for record in records {
        let start = data.len();
        data.resize(start + T::SIZE, 0);
        record.encode(&mut data[start..])?;
    }

    // checksum
    let checksum = blake3::hash(&data);
    data.extend_from_slice(checksum.as_bytes());

    Ok(data)
}

/// Decode the reservation counter file.
///
/// # Errors
///
/// Returns an error if the file is truncated, has the wrong magic or version,
/// or holds a non-positive value.
pub fn decode_counter(data: &[u8]) -> Result<u64, DecodeError> {
    if data.len() < COUNTER_FILE_SIZE {
        return Err(DecodeError::UnexpectedEof);
    }
    if data.len() > COUNTER_FILE_SIZE {
        return Err(DecodeError::TrailingBytes(data.len() - COUNTER_FILE_SIZE));
    }

    let magic = read_array::<4>(data, MAGIC_OFFSET);
    if magic != COUNTER_MAGIC {
        return Err(DecodeError::InvalidMagic(magic));
    }

    let version = u32::from_le_bytes(read_array(data, VERSION_OFFSET));
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let value = i64::from_le_bytes(read_array(data, COUNTER_VALUE_OFFSET));
    u64::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or(DecodeError::InvalidRecord {
            record: 0,
            reason: "reservation counter must be positive",
        })
}

/// Encode the reservation counter file.
///
/// # Errors
///
/// Returns an error if `next_code` does not fit an `i64`.
pub fn encode_counter(next_code: u64) -> Result<[u8; COUNTER_FILE_SIZE], EncodeError> {
    let value = i64::try_from(next_code).map_err(|_| EncodeError::ValueOutOfRange {
        field: "reservation counter",
        value: next_code,
    })?;

    let mut data = [0u8; COUNTER_FILE_SIZE];
    data[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&COUNTER_MAGIC);
    data[VERSION_OFFSET..VERSION_OFFSET + 4].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    data[COUNTER_VALUE_OFFSET..COUNTER_VALUE_OFFSET + 8].copy_from_slice(&value.to_le_bytes());
    Ok(data)
}

impl Record for Flight {
    const MAGIC: [u8; 4] = FLIGHT_MAGIC;
    const SIZE: usize = FLIGHT_RECORD_SIZE;

    fn encode(&self, buf: &mut [u8]) -> Result<(), EncodeError> {
        let capacity = to_i32("capacity", self.capacity)?;
        let available = to_i32("available seats", self.available_seats)?;

        write_string(buf, FLIGHT_ID_OFFSET, FLIGHT_ID_SIZE, &self.id);
        write_string(buf, SOURCE_OFFSET, LOCATION_SIZE, &self.source);
        write_string(buf, DESTINATION_OFFSET, LOCATION_SIZE, &self.destination);
        buf[CAPACITY_OFFSET..CAPACITY_OFFSET + 4].copy_from_slice(&capacity.to_le_bytes());
        buf[AVAILABLE_OFFSET..AVAILABLE_OFFSET + 4].copy_from_slice(&available.to_le_bytes());
        buf[PRICE_OFFSET..PRICE_OFFSET + 4].copy_from_slice(&self.price.to_le_bytes());
        Ok(())
    }

    fn decode(buf: &[u8], index: usize) -> Result<Self, DecodeError> {
        let invalid = |reason| DecodeError::InvalidRecord {
            record: index,
            reason,
        };

        let id = read_string(buf, FLIGHT_ID_OFFSET, FLIGHT_ID_SIZE, "flight id", index)?;
        if id.is_empty() {
            return Err(invalid("empty flight id"));
        }
        let source = read_string(buf, SOURCE_OFFSET, LOCATION_SIZE, "source", index)?;
        let destination =
            read_string(buf, DESTINATION_OFFSET, LOCATION_SIZE, "destination", index)?;

        let capacity = i32::from_le_bytes(read_array(buf, CAPACITY_OFFSET));
        let available = i32::from_le_bytes(read_array(buf, AVAILABLE_OFFSET));
        let price = f32::from_le_bytes(read_array(buf, PRICE_OFFSET));

        let capacity = u32::try_from(capacity)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| invalid("capacity must be positive"))?;
        let available_seats = u32::try_from(available)
            .ok()
            .filter(|&a| a <= capacity)
            .ok_or_else(|| invalid("available seats out of range"))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(invalid("price must be positive"));
        }

        Ok(Flight {
            id,
            source,
            destination,
            capacity,
            available_seats,
            price,
        })
    }
}

impl Record for Ticket {
    const MAGIC: [u8; 4] = TICKET_MAGIC;
    const SIZE: usize = TICKET_RECORD_SIZE;

    fn encode(&self, buf: &mut [u8]) -> Result<(), EncodeError> {
        let code = i64::try_from(self.code).map_err(|_| EncodeError::ValueOutOfRange {
            field: "reservation code",
            value: self.code,
        })?;
        let seat = to_i32("seat number", self.seat_number)?;

        buf[CODE_OFFSET..CODE_OFFSET + 8].copy_from_slice(&code.to_le_bytes());
        write_string(buf, TICKET_FLIGHT_ID_OFFSET, FLIGHT_ID_SIZE, &self.flight_id);
        write_string(
            buf,
            PASSENGER_NAME_OFFSET,
            PASSENGER_NAME_SIZE,
            &self.passenger_name,
        );
        buf[SEAT_OFFSET..SEAT_OFFSET + 4].copy_from_slice(&seat.to_le_bytes());
        Ok(())
    }

    fn decode(buf: &[u8], index: usize) -> Result<Self, DecodeError> {
        let invalid = |reason| DecodeError::InvalidRecord {
            record: index,
            reason,
        };

        let code = i64::from_le_bytes(read_array(buf, CODE_OFFSET));
        let code = u64::try_from(code)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| invalid("reservation code must be positive"))?;

        let flight_id = read_string(
            buf,
            TICKET_FLIGHT_ID_OFFSET,
            FLIGHT_ID_SIZE,
            "flight id",
            index,
        )?;
        if flight_id.is_empty() {
            return Err(invalid("empty flight id"));
        }
        let passenger_name = read_string(
            buf,
            PASSENGER_NAME_OFFSET,
            PASSENGER_NAME_SIZE,
            "passenger name",
            index,
        )?;

        let seat = i32::from_le_bytes(read_array(buf, SEAT_OFFSET));
        let seat_number = u32::try_from(seat)
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| invalid("seat number must be positive"))?;

        Ok(Ticket {
            code,
            flight_id,
            passenger_name,
            seat_number,
        })
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&data[offset..offset + N]);
    bytes
}

fn read_string(
    buf: &[u8],
    offset: usize,
    size: usize,
    field: &'static str,
    record: usize,
) -> Result<String, DecodeError> {
    let field_bytes = &buf[offset..offset + size];
    let end = field_bytes.iter().position(|&b| b == 0).unwrap_or(size);

    std::str::from_utf8(&field_bytes[..end])
        .map(ToString::to_string)
        .map_err(|_| DecodeError::InvalidUtf8 { field, record })
}

/// Copy `value` into a NUL-padded field, truncating at a character boundary
/// so that at least one NUL terminator remains.
fn write_string(buf: &mut [u8], offset: usize, size: usize, value: &str) {
    let mut end = value.len().min(size - 1);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    buf[offset..offset + end].copy_from_slice(&value.as_bytes()[..end]);
}

fn to_i32(field: &'static str, value: u32) -> Result<i32, EncodeError> {
    i32::try_from(value).map_err(|_| EncodeError::ValueOutOfRange {
        field,
        value: u64::from(value),
    })
}
