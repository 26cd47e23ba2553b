//! The booking desk: every operation that changes flights or tickets.
//!
//! [`BookingDesk`] owns the flight registry, the ticket ledger and the
//! reservation code allocator. It is built once at startup from whatever
//! [`Storage::load_all`] returned, mutated by the console session and written
//! back with [`BookingDesk::save`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocator::CodeAllocator;
use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::ledger::TicketLedger;
use crate::model::{validate_passenger_name, Flight, NewFlight, Ticket};
use crate::registry::FlightRegistry;
use crate::storage::{LoadedState, SaveReport, Storage};

/// Owner of all flight and ticket state for a session.
#[derive(Debug, Clone)]
pub struct BookingDesk {
    flights: FlightRegistry,
    tickets: TicketLedger,
    codes: CodeAllocator,
}

/// Everything the passenger needs after a successful booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmation {
    /// Reservation code (PNR).
    pub code: u64,
    /// Booked flight.
    pub flight_id: String,
    /// Departure location.
    pub source: String,
    /// Arrival location.
    pub destination: String,
    /// Passenger name.
    pub passenger_name: String,
    /// Assigned seat number.
    pub seat_number: u32,
    /// Ticket price.
    pub price: f32,
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cancellation {
    /// The removed ticket.
    pub ticket: Ticket,
    /// The flight whose seat was given back, if it could be resolved.
    pub restored: Option<SeatRestore>,
}

/// A seat returned to a flight by a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatRestore {
    /// The flight.
    pub flight_id: String,
    /// Seats available after the cancellation.
    pub available_seats: u32,
}

/// A ticket together with its flight's route, when the flight still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetails {
    /// The ticket.
    pub ticket: Ticket,
    /// Route and price of the booked flight, `None` if it cannot be found.
    pub route: Option<Route>,
}

impl BookingDetails {
    /// Check if the booked flight could be found.
    #[must_use]
    pub fn is_flight_resolved(&self) -> bool {
        self.route.is_some()
    }
}

/// Where a flight goes and what it costs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Departure location.
    pub source: String,
    /// Arrival location.
    pub destination: String,
    /// Ticket price.
    pub price: f32,
}

impl From<&Flight> for Route {
    fn from(flight: &Flight) -> Self {
        Self {
            source: flight.source.clone(),
            destination: flight.destination.clone(),
            price: flight.price,
        }
    }
}

impl BookingDesk {
    /// Create an empty desk, as on a first run.
    #[must_use]
    pub fn new(limits: &LimitsConfig, base_code: u64) -> Self {
        Self {
            flights: FlightRegistry::with_limit(limits.max_flights),
            tickets: TicketLedger::with_limit(limits.max_tickets),
            codes: CodeAllocator::starting_at(base_code),
        }
    }

    /// Rebuild a desk from loaded data.
    ///
    /// Duplicate flight identifiers or reservation codes keep their first
    /// occurrence. Collections larger than the configured limits are kept
    /// whole; only new additions are refused. The reservation counter is moved
    /// past the highest loaded code so codes are never reused.
    #[must_use]
    pub fn restore(state: LoadedState, limits: &LimitsConfig) -> Self {
        let mut desk = Self::new(limits, state.next_code);

        for flight in state.flights {
            let id = flight.id.clone();
            if !desk.flights.restore(flight) {
                warn!("Ignoring duplicate flight '{}' in saved data", id);
            }
        }
        for ticket in state.tickets {
            let code = ticket.code;
            if !desk.tickets.restore(ticket) {
                warn!("Ignoring duplicate PNR {} in saved data", code);
            }
        }

        if let Some(max_code) = desk.tickets.max_code() {
            if desk.codes.advance_past(max_code) {
                warn!(
                    "Reservation counter was behind saved tickets, next PNR moved to {}",
                    desk.codes.peek()
                );
            }
        }

        if let Some(limit) = desk.flights.limit().filter(|&l| desk.flights.len() > l) {
            warn!("{} saved flights exceed the limit of {}", desk.flights.len(), limit);
        }
        if let Some(limit) = desk.tickets.limit().filter(|&l| desk.tickets.len() > l) {
            warn!("{} saved tickets exceed the limit of {}", desk.tickets.len(), limit);
        }

        desk
    }

    /// Register a new flight with every seat available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a field is rejected,
    /// [`Error::CapacityExceeded`] if the registry is full and
    /// [`Error::DuplicateIdentifier`] if the identifier is taken.
    pub fn add_flight(&mut self, new_flight: NewFlight) -> Result<&Flight> {
        let flight = self.flights.insert(new_flight.into_flight()?)?;
        info!(
            "Added flight {} from {} to {} ({} seats)",
            flight.id, flight.source, flight.destination, flight.capacity
        );
        Ok(flight)
    }

    /// Book a seat on a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the ledger is full,
    /// [`Error::FlightNotFound`] if the flight does not exist,
    /// [`Error::FullyBooked`] if it has no seats left and
    /// [`Error::InvalidInput`] if the passenger name is rejected. Nothing
    /// changes on error.
    pub fn book_ticket(&mut self, flight_id: &str, passenger_name: &str) -> Result<BookingConfirmation> {
        self.tickets.ensure_room()?;

        let flight = self
            .flights
            .get_mut(flight_id)
            .ok_or_else(|| Error::FlightNotFound {
                id: flight_id.to_string(),
            })?;
        if flight.is_full() {
            return Err(Error::FullyBooked {
                id: flight_id.to_string(),
            });
        }
        validate_passenger_name(passenger_name)?;

        // Counts seats booked so far; not renumbered after cancellations.
        let seat_number = flight.booked_seats() + 1;
        let code = self.codes.next_code();

        self.tickets.insert(Ticket {
            code,
            flight_id: flight.id.clone(),
            passenger_name: passenger_name.to_string(),
            seat_number,
        })?;
        flight.available_seats -= 1;

        let confirmation = BookingConfirmation {
            code,
            flight_id: flight.id.clone(),
            source: flight.source.clone(),
            destination: flight.destination.clone(),
            passenger_name: passenger_name.to_string(),
            seat_number,
            price: flight.price,
        };

        info!(
            "Booked PNR {} on flight {} seat {}",
            code, confirmation.flight_id, seat_number
        );
        Ok(confirmation)
    }

    /// Cancel a booking and give its seat back to the flight.
    ///
    /// A ticket whose flight no longer resolves is still cancelled; the seat
    /// restore is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no ticket has this code.
    pub fn cancel_ticket(&mut self, code: u64) -> Result<Cancellation> {
        let ticket = self.tickets.remove(code).ok_or(Error::NotFound { code })?;

        let restored = match self.flights.get_mut(&ticket.flight_id) {
            Some(flight) if flight.available_seats < flight.capacity => {
                flight.available_seats += 1;
                Some(SeatRestore {
                    flight_id: flight.id.clone(),
                    available_seats: flight.available_seats,
                })
            }
            Some(flight) => {
                warn!(
                    "Flight {} already has all {} seats available; not restoring a seat",
                    flight.id, flight.capacity
                );
                None
            }
            None => {
                debug!(
                    "Flight {} for PNR {} not found; skipping seat restore",
                    ticket.flight_id, code
                );
                None
            }
        };

        info!("Cancelled PNR {} on flight {}", code, ticket.flight_id);
        Ok(Cancellation { ticket, restored })
    }

    /// Look up a booking by reservation code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no ticket has this code.
    pub fn view_booking(&self, code: u64) -> Result<BookingDetails> {
        let ticket = self.tickets.get(code).ok_or(Error::NotFound { code })?;
        Ok(BookingDetails {
            ticket: ticket.clone(),
            route: self.flights.get(&ticket.flight_id).map(Route::from),
        })
    }

    /// Flights matching both optional filters, in insertion order.
    pub fn search_flights<'a>(
        &'a self,
        source: Option<&'a str>,
        destination: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Flight> + 'a {
        self.flights.search(source, destination)
    }

    /// Look up a flight.
    #[must_use]
    pub fn flight(&self, id: &str) -> Option<&Flight> {
        self.flights.get(id)
    }

    /// All flights.
    #[must_use]
    pub fn flights(&self) -> &FlightRegistry {
        &self.flights
    }

    /// All tickets.
    #[must_use]
    pub fn tickets(&self) -> &TicketLedger {
        &self.tickets
    }

    /// The reservation code the next booking will receive.
    #[must_use]
    pub fn next_code(&self) -> u64 {
        self.codes.peek()
    }

    /// Write flights, tickets and the reservation counter to storage.
    pub fn save(&self, storage: &Storage) -> SaveReport {
        storage.save_all(self.flights.as_slice(), &self.tickets, self.codes.peek())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::DEFAULT_BASE_CODE;
    use crate::error::Collection;

    fn desk() -> BookingDesk {
        BookingDesk::new(&LimitsConfig::default(), DEFAULT_BASE_CODE)
    }

    fn new_flight(id: &str, capacity: i64) -> NewFlight {
        NewFlight {
            id: id.to_string(),
            source: "DEL".to_string(),
            destination: "BOM".to_string(),
            capacity,
            price: 4500.0,
        }
    }

    #[test]
    fn test_add_flight() {
        let mut desk = desk();
        let flight = desk.add_flight(new_flight("AI701", 2)).unwrap();
        assert_eq!(flight.available_seats, 2);
        assert_eq!(desk.flights().len(), 1);
    }

    #[test]
    fn test_add_flight_duplicate() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 2)).unwrap();
        let err = desk.add_flight(new_flight("AI701", 5)).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { .. }));
        assert_eq!(desk.flight("AI701").unwrap().capacity, 2);
    }

    #[test]
    fn test_add_flight_invalid_input() {
        let mut desk = desk();
        assert!(desk.add_flight(new_flight("AI701", 0)).unwrap_err().is_invalid_input());
        let mut bad_price = new_flight("AI702", 2);
        bad_price.price = 0.0;
        assert!(desk.add_flight(bad_price).unwrap_err().is_invalid_input());
        assert!(desk.flights().is_empty());
    }

    #[test]
    fn test_add_flight_limit() {
        let limits = LimitsConfig {
            max_flights: 2,
            max_tickets: 10,
        };
        let mut desk = BookingDesk::new(&limits, DEFAULT_BASE_CODE);
        desk.add_flight(new_flight("F1", 1)).unwrap();
        desk.add_flight(new_flight("F2", 1)).unwrap();

        let err = desk.add_flight(new_flight("F3", 1)).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                collection: Collection::Flights,
                limit: 2
            }
        ));
        assert_eq!(desk.flights().len(), 2);
        assert!(desk.flight("F3").is_none());
    }

    #[test]
    fn test_book_ticket() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 3)).unwrap();

        let confirmation = desk.book_ticket("AI701", "Asha Rao").unwrap();
        assert_eq!(confirmation.code, DEFAULT_BASE_CODE);
        assert_eq!(confirmation.seat_number, 1);
        assert_eq!(confirmation.source, "DEL");
        assert_eq!(confirmation.destination, "BOM");
        assert!((confirmation.price - 4500.0).abs() < f32::EPSILON);

        assert_eq!(desk.flight("AI701").unwrap().available_seats, 2);
        assert_eq!(desk.tickets().len(), 1);
        assert_eq!(desk.next_code(), DEFAULT_BASE_CODE + 1);
    }

    #[test]
    fn test_book_ticket_codes_increase() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 10)).unwrap();

        let mut last = 0;
        for k in (1..=10).rev() {
            assert_eq!(desk.flight("AI701").unwrap().available_seats, k);
            let before = desk.tickets().len();
            let code = desk.book_ticket("AI701", "P").unwrap().code;
            assert!(code > last);
            assert!(desk.tickets().iter().all(|t| t.code <= code));
            last = code;
            assert_eq!(desk.flight("AI701").unwrap().available_seats, k - 1);
            assert_eq!(desk.tickets().len(), before + 1);
        }
    }

    #[test]
    fn test_book_ticket_fully_booked() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 1)).unwrap();
        desk.book_ticket("AI701", "First").unwrap();
        let next_code = desk.next_code();

        let err = desk.book_ticket("AI701", "Second").unwrap_err();
        assert!(matches!(err, Error::FullyBooked { ref id } if id == "AI701"));
        assert_eq!(desk.flight("AI701").unwrap().available_seats, 0);
        assert_eq!(desk.tickets().len(), 1);
        assert_eq!(desk.next_code(), next_code);
    }

    #[test]
    fn test_book_ticket_unknown_flight() {
        let mut desk = desk();
        let err = desk.book_ticket("XX999", "Nobody").unwrap_err();
        assert!(matches!(err, Error::FlightNotFound { .. }));
        assert!(desk.tickets().is_empty());
        assert_eq!(desk.next_code(), DEFAULT_BASE_CODE);
    }

    #[test]
    fn test_book_ticket_blank_name_changes_nothing() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 1)).unwrap();
        assert!(desk.book_ticket("AI701", "  ").unwrap_err().is_invalid_input());
        assert_eq!(desk.flight("AI701").unwrap().available_seats, 1);
        assert_eq!(desk.next_code(), DEFAULT_BASE_CODE);
    }

    #[test]
    fn test_book_ticket_ledger_limit() {
        let limits = LimitsConfig {
            max_flights: 10,
            max_tickets: 1,
        };
        let mut desk = BookingDesk::new(&limits, DEFAULT_BASE_CODE);
        desk.add_flight(new_flight("AI701", 5)).unwrap();
        desk.book_ticket("AI701", "First").unwrap();

        let err = desk.book_ticket("AI701", "Second").unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                collection: Collection::Tickets,
                limit: 1
            }
        ));
        assert_eq!(desk.flight("AI701").unwrap().available_seats, 4);
    }

    #[test]
    fn test_cancel_ticket() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 3)).unwrap();
        desk.add_flight(new_flight("AI702", 3)).unwrap();
        let a = desk.book_ticket("AI701", "A").unwrap();
        let b = desk.book_ticket("AI701", "B").unwrap();
        let c = desk.book_ticket("AI702", "C").unwrap();

        let cancellation = desk.cancel_ticket(a.code).unwrap();
        assert_eq!(cancellation.ticket.passenger_name, "A");
        assert_eq!(
            cancellation.restored,
            Some(SeatRestore {
                flight_id: "AI701".to_string(),
                available_seats: 2
            })
        );

        assert!(desk.tickets().get(a.code).is_none());
        let codes: Vec<u64> = desk.tickets().iter().map(|t| t.code).collect();
        assert_eq!(codes, [b.code, c.code]);
        assert_eq!(desk.flight("AI702").unwrap().available_seats, 2);
        assert_eq!(desk.tickets().get(b.code).unwrap().seat_number, 2);
    }

    #[test]
    fn test_cancelled_codes_are_not_reused() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 3)).unwrap();
        let a = desk.book_ticket("AI701", "A").unwrap();
        desk.cancel_ticket(a.code).unwrap();
        let b = desk.book_ticket("AI701", "B").unwrap();
        assert!(b.code > a.code);
    }

    #[test]
    fn test_seat_numbers_are_not_renumbered() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 2)).unwrap();
        let a = desk.book_ticket("AI701", "A").unwrap();
        let b = desk.book_ticket("AI701", "B").unwrap();
        desk.cancel_ticket(a.code).unwrap();
        let c = desk.book_ticket("AI701", "C").unwrap();

        // Seat numbers count bookings, so C lands on B's number.
        assert_eq!(b.seat_number, 2);
        assert_eq!(c.seat_number, 2);
    }

    #[test]
    fn test_cancel_on_flight_with_every_seat_free() {
        let mut state = LoadedState::empty(DEFAULT_BASE_CODE);
        state.flights.push(Flight {
            id: "AI701".to_string(),
            source: "DEL".to_string(),
            destination: "BOM".to_string(),
            capacity: 2,
            available_seats: 2,
            price: 4500.0,
        });
        state.tickets.push(Ticket {
            code: 1_000_000,
            flight_id: "AI701".to_string(),
            passenger_name: "Asha Rao".to_string(),
            seat_number: 1,
        });
        let mut desk = BookingDesk::restore(state, &LimitsConfig::default());

        let cancellation = desk.cancel_ticket(1_000_000).unwrap();
        assert!(cancellation.restored.is_none());
        assert!(desk.tickets().is_empty());
        let flight = desk.flight("AI701").unwrap();
        assert_eq!(flight.available_seats, flight.capacity);
    }

    #[test]
    fn test_control_characters_never_reach_disk() {
        let dir = std::env::temp_dir().join(format!("airtix_desk_nul_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let storage = Storage::in_dir(&dir);

        let mut desk = desk();
        desk.add_flight(new_flight("AB", 2)).unwrap();
        for id in ["AB\0", "\0X"] {
            assert!(desk.add_flight(new_flight(id, 2)).unwrap_err().is_invalid_input());
        }
        assert!(desk.book_ticket("AB", "Asha\0Rao").unwrap_err().is_invalid_input());
        desk.book_ticket("AB", "Asha Rao").unwrap();
        assert!(desk.save(&storage).is_complete());

        let state = storage.load_all(DEFAULT_BASE_CODE);
        assert_eq!(state.warnings().count(), 0);
        let reloaded = BookingDesk::restore(state, &LimitsConfig::default());
        assert_eq!(reloaded.flights().len(), 1);
        assert_eq!(reloaded.tickets().len(), 1);
        assert_eq!(reloaded.flight("AB").unwrap().available_seats, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 2)).unwrap();
        desk.book_ticket("AI701", "A").unwrap();

        assert!(desk.view_booking(9_999_999).unwrap_err().is_not_found());
        assert!(desk.cancel_ticket(9_999_999).unwrap_err().is_not_found());
        assert_eq!(desk.tickets().len(), 1);
        assert_eq!(desk.flight("AI701").unwrap().available_seats, 1);
    }

    #[test]
    fn test_view_booking() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 2)).unwrap();
        let booked = desk.book_ticket("AI701", "Asha Rao").unwrap();

        let details = desk.view_booking(booked.code).unwrap();
        assert!(details.is_flight_resolved());
        assert_eq!(details.ticket.passenger_name, "Asha Rao");
        let route = details.route.unwrap();
        assert_eq!(route.source, "DEL");
        assert_eq!(route.destination, "BOM");
    }

    fn dangling_state() -> LoadedState {
        let mut state = LoadedState::empty(DEFAULT_BASE_CODE);
        state.tickets.push(Ticket {
            code: 1_000_010,
            flight_id: "GONE1".to_string(),
            passenger_name: "Orphan".to_string(),
            seat_number: 4,
        });
        state
    }

    #[test]
    fn test_dangling_ticket() {
        let mut desk = BookingDesk::restore(dangling_state(), &LimitsConfig::default());

        let details = desk.view_booking(1_000_010).unwrap();
        assert!(!details.is_flight_resolved());
        assert_eq!(details.ticket.seat_number, 4);

        let cancellation = desk.cancel_ticket(1_000_010).unwrap();
        assert!(cancellation.restored.is_none());
        assert!(desk.tickets().is_empty());
    }

    #[test]
    fn test_restore_advances_stale_counter() {
        let desk = BookingDesk::restore(dangling_state(), &LimitsConfig::default());
        assert_eq!(desk.next_code(), 1_000_011);
    }

    #[test]
    fn test_restore_keeps_counter_ahead_of_tickets() {
        let mut state = dangling_state();
        state.next_code = 2_000_000;
        let desk = BookingDesk::restore(state, &LimitsConfig::default());
        assert_eq!(desk.next_code(), 2_000_000);
    }

    #[test]
    fn test_restore_over_limit_keeps_everything() {
        let mut state = LoadedState::empty(DEFAULT_BASE_CODE);
        for i in 0..3 {
            state.flights.push(new_flight(&format!("F{i}"), 1).into_flight().unwrap());
        }
        let limits = LimitsConfig {
            max_flights: 2,
            max_tickets: 10,
        };
        let mut desk = BookingDesk::restore(state, &limits);
        assert_eq!(desk.flights().len(), 3);
        assert!(matches!(
            desk.add_flight(new_flight("F9", 1)).unwrap_err(),
            Error::CapacityExceeded { .. }
        ));
    }

    #[test]
    fn test_search_flights() {
        let mut desk = desk();
        desk.add_flight(new_flight("AI701", 2)).unwrap();
        let mut other = new_flight("6E202", 2);
        other.source = "BLR".to_string();
        desk.add_flight(other).unwrap();

        assert_eq!(desk.search_flights(None, None).count(), 2);
        let ids: Vec<&str> = desk
            .search_flights(Some("BLR"), Some("BOM"))
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, ["6E202"]);
        assert_eq!(desk.search_flights(Some("MAA"), None).count(), 0);
    }
}
