//! Storage layer for airtix.
//!
//! Flights and tickets are persisted to two independent collection files and
//! the reservation counter to a third. Each collection is loaded and saved on
//! its own: a missing or damaged file only costs that collection, and a failed
//! write on one file does not stop the other from being written.

pub mod codec;
pub(crate) mod format;

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Collection, Error, Result};
use crate::model::{Flight, Ticket};

use codec::Record;

/// File-backed storage for the flight registry, ticket ledger and
/// reservation counter.
#[derive(Debug, Clone)]
pub struct Storage {
    flight_path: PathBuf,
    ticket_path: PathBuf,
    counter_path: PathBuf,
}

impl Storage {
    /// Create storage using explicit file paths.
    #[must_use]
    pub fn new(
        flight_path: impl Into<PathBuf>,
        ticket_path: impl Into<PathBuf>,
        counter_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            flight_path: flight_path.into(),
            ticket_path: ticket_path.into(),
            counter_path: counter_path.into(),
        }
    }

    /// Create storage using the paths from a configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.flight_path(),
            config.ticket_path(),
            config.counter_path(),
        )
    }

    /// Create storage using the default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let defaults = Config::default();
        let dir = dir.as_ref();
        Self::new(
            dir.join(&defaults.storage.flight_file),
            dir.join(&defaults.storage.ticket_file),
            dir.join(&defaults.storage.counter_file),
        )
    }

    /// Path to the flight collection file.
    #[must_use]
    pub fn flight_path(&self) -> &Path {
        &self.flight_path
    }

    /// Path to the ticket collection file.
    #[must_use]
    pub fn ticket_path(&self) -> &Path {
        &self.ticket_path
    }

    /// Path to the reservation counter file.
    #[must_use]
    pub fn counter_path(&self) -> &Path {
        &self.counter_path
    }

    /// Load every collection and the reservation counter.
    ///
    /// Never fails: a missing or unreadable file leaves that collection empty
    /// (or the counter at `base_code`) and is recorded in the returned state.
    #[must_use]
    pub fn load_all(&self, base_code: u64) -> LoadedState {
        let (flights, flights_outcome, flights_saved_at) =
            load_collection::<Flight>(Collection::Flights, &self.flight_path);
        let (tickets, tickets_outcome, tickets_saved_at) =
            load_collection::<Ticket>(Collection::Tickets, &self.ticket_path);
        let (next_code, counter_outcome) = self.load_counter(base_code);

        let state = LoadedState {
            flights,
            tickets,
            next_code,
            flights_outcome,
            tickets_outcome,
            counter_outcome,
            saved_at: flights_saved_at.max(tickets_saved_at),
        };

        match state.status() {
            LoadStatus::Loaded => info!(
                "Loaded {} flights and {} tickets",
                state.flights.len(),
                state.tickets.len()
            ),
            LoadStatus::NoExistingData => info!("No existing flight/ticket data found"),
        }
        state
    }

    fn load_counter(&self, base_code: u64) -> (u64, CollectionLoad) {
        let path = &self.counter_path;
        let result = std::fs::read(path)
            .map_err(Error::from)
            .and_then(|data| codec::decode_counter(&data).map_err(Error::from));

        match result {
            Ok(next_code) => {
                debug!("Reservation counter loaded, next PNR is {}", next_code);
                (next_code, CollectionLoad::Loaded { records: 1 })
            }
            Err(Error::Io(err)) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "No reservation counter at {}, starting at {}",
                    path.display(),
                    base_code
                );
                (base_code, CollectionLoad::Missing)
            }
            Err(err) => {
                let err = Error::persistence_read(Collection::Counter, path, err.to_string());
                warn!("{}; resetting PNR to {}", err, base_code);
                (base_code, CollectionLoad::Discarded(err))
            }
        }
    }

    /// Save both collections and the reservation counter.
    ///
    /// Each file is written independently, so one failure does not prevent
    /// the others from being attempted. Check the returned report.
    pub fn save_all<'a, I>(&self, flights: &[Flight], tickets: I, next_code: u64) -> SaveReport
    where
        I: IntoIterator<Item = &'a Ticket>,
        I::IntoIter: ExactSizeIterator,
    {
        let saved_at = Utc::now();

        let flights = save_collection(Collection::Flights, &self.flight_path, flights, saved_at);
        let tickets = save_collection(Collection::Tickets, &self.ticket_path, tickets, saved_at);
        let counter = codec::encode_counter(next_code)
            .map_err(Error::from)
            .and_then(|data| write_replacing(&self.counter_path, &data));
        if let Err(err) = &counter {
            warn!("Failed to save reservation counter: {}", err);
        }

        let report = SaveReport {
            flights,
            tickets,
            counter,
        };
        if report.is_complete() {
            info!("Flight and ticket data saved");
        } else {
            warn!(
                "Data save partially failed ({}/2 collections saved)",
                report.succeeded()
            );
        }
        report
    }
}

fn load_collection<T: Record>(
    collection: Collection,
    path: &Path,
) -> (Vec<T>, CollectionLoad, Option<DateTime<Utc>>) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("No {} file at {}", collection, path.display());
            return (Vec::new(), CollectionLoad::Missing, None);
        }
        Err(err) => {
            let err = Error::persistence_read(collection, path, err.to_string());
            warn!("{}", err);
            return (Vec::new(), CollectionLoad::Discarded(err), None);
        }
    };

    match codec::decode_collection::<T>(&data) {
        Ok(decoded) => {
            let records = decoded.records.len();
            debug!("Read {} {} from {}", records, collection, path.display());
            (
                decoded.records,
                CollectionLoad::Loaded { records },
                Some(decoded.saved_at),
            )
        }
        Err(err) => {
            let err = Error::persistence_read(collection, path, err.to_string());
            warn!("{}; starting with no {}", err, collection);
            (Vec::new(), CollectionLoad::Discarded(err), None)
        }
    }
}

fn save_collection<'a, T, I>(
    collection: Collection,
    path: &Path,
    records: I,
    saved_at: DateTime<Utc>,
) -> Result<usize>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let count = records.len();
    let result = codec::encode_collection(records, saved_at)
        .map_err(Error::from)
        .and_then(|data| write_replacing(path, &data));

    match &result {
        Ok(()) => debug!("Wrote {} {} to {}", count, collection, path.display()),
        Err(err) => warn!("Failed to write {} to {}: {}", collection, path.display(), err),
    }
    result.map(|()| count)
}

/// Write `data` to a sibling temporary file and rename it over `path`, so the
/// target is either fully replaced or left untouched.
fn write_replacing(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let mut tmp_name = path.file_name().map_or_else(OsString::new, OsString::from);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = std::fs::write(&tmp_path, data).and_then(|()| std::fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result.map_err(Error::from)
}

/// How one persisted artifact fared during [`Storage::load_all`].
#[derive(Debug)]
pub enum CollectionLoad {
    /// The file was read successfully.
    Loaded {
        /// Number of records read.
        records: usize,
    },
    /// The file does not exist.
    Missing,
    /// The file exists but was unreadable or corrupt and was ignored.
    Discarded(Error),
}

impl CollectionLoad {
    /// Check if the file was read successfully.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// The error that caused the file to be ignored, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&Error> {
        match self {
            Self::Discarded(err) => Some(err),
            _ => None,
        }
    }
}

/// Overall result of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// At least one collection was read.
    Loaded,
    /// Neither collection could be read; starting fresh.
    NoExistingData,
}

/// Everything read back by [`Storage::load_all`].
#[derive(Debug)]
pub struct LoadedState {
    /// Flights, in file order.
    pub flights: Vec<Flight>,
    /// Tickets, in file order.
    pub tickets: Vec<Ticket>,
    /// Next reservation code to issue.
    pub next_code: u64,
    /// How the flight file fared.
    pub flights_outcome: CollectionLoad,
    /// How the ticket file fared.
    pub tickets_outcome: CollectionLoad,
    /// How the counter file fared.
    pub counter_outcome: CollectionLoad,
    /// Most recent save time recorded in the collection files.
    pub saved_at: Option<DateTime<Utc>>,
}

impl LoadedState {
    /// An empty state, as on a first run.
    #[must_use]
    pub fn empty(base_code: u64) -> Self {
        Self {
            flights: Vec::new(),
            tickets: Vec::new(),
            next_code: base_code,
            flights_outcome: CollectionLoad::Missing,
            tickets_outcome: CollectionLoad::Missing,
            counter_outcome: CollectionLoad::Missing,
            saved_at: None,
        }
    }

    /// Overall status: loaded if at least one collection was read.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        if self.flights_outcome.is_loaded() || self.tickets_outcome.is_loaded() {
            LoadStatus::Loaded
        } else {
            LoadStatus::NoExistingData
        }
    }

    /// Errors for every file that existed but had to be ignored.
    pub fn warnings(&self) -> impl Iterator<Item = &Error> {
        [
            &self.flights_outcome,
            &self.tickets_outcome,
            &self.counter_outcome,
        ]
        .into_iter()
        .filter_map(CollectionLoad::warning)
    }
}

/// Result of [`Storage::save_all`], one entry per file.
#[derive(Debug)]
pub struct SaveReport {
    /// Number of flights written, or why the flight file was not written.
    pub flights: Result<usize>,
    /// Number of tickets written, or why the ticket file was not written.
    pub tickets: Result<usize>,
    /// Whether the counter file was written.
    pub counter: Result<()>,
}

impl SaveReport {
    /// Number of collections (out of 2) written successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        usize::from(self.flights.is_ok()) + usize::from(self.tickets.is_ok())
    }

    /// Check if every file, including the counter, was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed().is_empty()
    }

    /// The files that were not written.
    #[must_use]
    pub fn failed(&self) -> Vec<Collection> {
        let mut failed = Vec::new();
        if self.flights.is_err() {
            failed.push(Collection::Flights);
        }
        if self.tickets.is_err() {
            failed.push(Collection::Tickets);
        }
        if self.counter.is_err() {
            failed.push(Collection::Counter);
        }
        failed
    }

    /// Collapse the report into a single result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistencePartialWrite`] naming the files that were
    /// not written.
    pub fn into_result(self) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        Err(Error::PersistencePartialWrite {
            failed: self.failed(),
            succeeded: self.succeeded(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::DEFAULT_BASE_CODE;
    use crate::booking::BookingDesk;
    use crate::config::LimitsConfig;
    use crate::model::NewFlight;

    /// A fresh, empty directory unique to this test process.
    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("airtix_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn flight(id: &str) -> Flight {
        Flight {
            id: id.to_string(),
            source: "DEL".to_string(),
            destination: "BOM".to_string(),
            capacity: 2,
            available_seats: 1,
            price: 4500.0,
        }
    }

    fn ticket(code: u64) -> Ticket {
        Ticket {
            code,
            flight_id: "AI701".to_string(),
            passenger_name: "Asha Rao".to_string(),
            seat_number: 1,
        }
    }

    #[test]
    fn test_load_without_files() {
        let dir = test_dir("load_empty");
        let state = Storage::in_dir(&dir).load_all(DEFAULT_BASE_CODE);

        assert!(state.flights.is_empty());
        assert!(state.tickets.is_empty());
        assert_eq!(state.next_code, DEFAULT_BASE_CODE);
        assert_eq!(state.status(), LoadStatus::NoExistingData);
        assert!(state.warnings().next().is_none());
        assert!(state.saved_at.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = test_dir("save_load");
        let storage = Storage::in_dir(&dir);
        let flights = vec![flight("AI701"), flight("6E202")];
        let tickets = vec![ticket(1_000_000), ticket(1_000_001)];

        let report = storage.save_all(&flights, &tickets, 1_000_002);
        assert!(report.is_complete());
        assert_eq!(report.succeeded(), 2);
        assert_eq!(*report.flights.as_ref().unwrap(), 2);

        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.status(), LoadStatus::Loaded);
        assert_eq!(state.flights, flights);
        assert_eq!(state.tickets, tickets);
        assert_eq!(state.next_code, 1_000_002);
        assert!(state.saved_at.is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = test_dir("no_temp");
        let storage = Storage::in_dir(&dir);
        assert!(storage.save_all(&[], &Vec::<Ticket>::new(), 5).is_complete());

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["flight_data.dat", "pnr_counter.dat", "ticket_data.dat"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_one_collection_loaded_is_success() {
        let dir = test_dir("one_loaded");
        let storage = Storage::in_dir(&dir);
        storage.save_all(&[flight("AI701")], &Vec::<Ticket>::new(), 7);
        std::fs::remove_file(storage.ticket_path()).unwrap();

        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.status(), LoadStatus::Loaded);
        assert_eq!(state.flights.len(), 1);
        assert!(state.tickets.is_empty());
        assert!(matches!(state.tickets_outcome, CollectionLoad::Missing));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_truncated_collection_is_discarded() {
        let dir = test_dir("truncated");
        let storage = Storage::in_dir(&dir);
        storage.save_all(&[flight("AI701")], &[ticket(1), ticket(2)], 3);

        // Drop the last record and the checksum.
        let data = std::fs::read(storage.ticket_path()).unwrap();
        std::fs::write(storage.ticket_path(), &data[..data.len() - 40]).unwrap();

        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.status(), LoadStatus::Loaded);
        assert_eq!(state.flights.len(), 1);
        assert!(state.tickets.is_empty());

        let warning = state.tickets_outcome.warning().unwrap();
        assert!(matches!(
            warning,
            Error::PersistenceRead {
                collection: Collection::Tickets,
                ..
            }
        ));
        assert!(warning.to_string().contains("declares 2 records"));
        assert_eq!(state.warnings().count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_both_collections_corrupt_is_no_existing_data() {
        let dir = test_dir("both_corrupt");
        let storage = Storage::in_dir(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(storage.flight_path(), b"garbage").unwrap();
        std::fs::write(storage.ticket_path(), b"garbage").unwrap();

        let state = storage.load_all(42);
        assert_eq!(state.status(), LoadStatus::NoExistingData);
        assert_eq!(state.warnings().count(), 2);
        assert_eq!(state.next_code, 42);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_counter_resets_to_base() {
        let dir = test_dir("bad_counter");
        let storage = Storage::in_dir(&dir);
        storage.save_all(&[], &Vec::<Ticket>::new(), 1_000_500);
        std::fs::write(storage.counter_path(), [1, 2, 3]).unwrap();

        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.next_code, DEFAULT_BASE_CODE);
        assert!(matches!(
            state.counter_outcome.warning(),
            Some(Error::PersistenceRead {
                collection: Collection::Counter,
                ..
            })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_save_failure() {
        let dir = test_dir("partial_save");
        let storage = Storage::in_dir(&dir);
        // A directory in place of the flight file makes the rename fail.
        std::fs::create_dir_all(storage.flight_path()).unwrap();

        let report = storage.save_all(&[flight("AI701")], &[ticket(1)], 2);
        assert!(report.flights.is_err());
        assert_eq!(*report.tickets.as_ref().unwrap(), 1);
        assert!(report.counter.is_ok());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), [Collection::Flights]);

        let err = report.into_result().unwrap_err();
        assert!(matches!(
            err,
            Error::PersistencePartialWrite { succeeded: 1, .. }
        ));

        // The ticket file made it to disk regardless.
        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.tickets.len(), 1);
        assert!(!dir.join("flight_data.dat.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = test_dir("nested");
        let storage = Storage::in_dir(dir.join("a").join("b"));
        assert!(storage.save_all(&[], &Vec::<Ticket>::new(), 1).is_complete());
        assert!(storage.flight_path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_booking_round_trip() {
        let dir = test_dir("round_trip");
        let storage = Storage::in_dir(&dir);
        let limits = LimitsConfig::default();

        let mut desk = BookingDesk::new(&limits, DEFAULT_BASE_CODE);
        desk.add_flight(NewFlight {
            id: "AI701".to_string(),
            source: "DEL".to_string(),
            destination: "BOM".to_string(),
            capacity: 2,
            price: 4500.0,
        })
        .unwrap();
        let first = desk.book_ticket("AI701", "Asha Rao").unwrap();
        let second = desk.book_ticket("AI701", "Vikram Iyer").unwrap();
        desk.cancel_ticket(first.code).unwrap();
        assert!(desk.save(&storage).is_complete());

        let restored = BookingDesk::restore(storage.load_all(DEFAULT_BASE_CODE), &limits);
        assert_eq!(restored.flights().len(), 1);
        assert_eq!(restored.flight("AI701").unwrap().available_seats, 1);
        assert_eq!(restored.tickets().len(), 1);
        assert_eq!(restored.tickets().get(second.code).unwrap().seat_number, 2);
        assert_eq!(restored.next_code(), second.code + 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
