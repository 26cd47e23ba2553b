//! On-disk layout of the airtix data files.
//!
//! All integers are little-endian. Collection files are laid out as
//!
//! ```text
//! magic (4) | version u32 | saved_at i64 (ms) | count i32 | records | blake3 (32)
//! ```
//!
//! and the counter file as `magic (4) | version u32 | next_code i64`.

pub const FORMAT_VERSION: u32 = 1;

pub const FLIGHT_MAGIC: [u8; 4] = *b"ATFL";
pub const TICKET_MAGIC: [u8; 4] = *b"ATTK";
pub const COUNTER_MAGIC: [u8; 4] = *b"ATPN";

pub const MAGIC_OFFSET: usize = 0;
pub const VERSION_OFFSET: usize = 4;
pub const SAVED_AT_OFFSET: usize = 8;
pub const COUNT_OFFSET: usize = 16;
pub const HEADER_SIZE: usize = 20;
pub const CHECKSUM_SIZE: usize = 32;

pub const FLIGHT_ID_SIZE: usize = 10;
pub const LOCATION_SIZE: usize = 50;
pub const PASSENGER_NAME_SIZE: usize = 50;

pub const FLIGHT_ID_OFFSET: usize = 0;
pub const SOURCE_OFFSET: usize = FLIGHT_ID_OFFSET + FLIGHT_ID_SIZE;
pub const DESTINATION_OFFSET: usize = SOURCE_OFFSET + LOCATION_SIZE;
pub const CAPACITY_OFFSET: usize = DESTINATION_OFFSET + LOCATION_SIZE;
pub const AVAILABLE_OFFSET: usize = CAPACITY_OFFSET + 4;
pub const PRICE_OFFSET: usize = AVAILABLE_OFFSET + 4;
pub const FLIGHT_RECORD_SIZE: usize = PRICE_OFFSET + 4;

pub const CODE_OFFSET: usize = 0;
pub const TICKET_FLIGHT_ID_OFFSET: usize = CODE_OFFSET + 8;
pub const PASSENGER_NAME_OFFSET: usize = TICKET_FLIGHT_ID_OFFSET + FLIGHT_ID_SIZE;
pub const SEAT_OFFSET: usize = PASSENGER_NAME_OFFSET + PASSENGER_NAME_SIZE;
pub const TICKET_RECORD_SIZE: usize = SEAT_OFFSET + 4;

pub const COUNTER_VALUE_OFFSET: usize = 8;
pub const COUNTER_FILE_SIZE: usize = 16;
