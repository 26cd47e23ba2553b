//! The interactive menu session.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use super::prompt::Console;
use super::table::{write_booking_details, write_cancellation, write_confirmation, write_flight_table};
use crate::booking::BookingDesk;
use crate::error::{Collection, Error, Result};
use crate::model::{NewFlight, MAX_PASSENGER_NAME_LEN};
use crate::storage::{SaveReport, Storage};

/// Search input meaning "match every value".
const MATCH_ANY: &str = "any";

/// `None` for the "any" sentinel, otherwise the value to match exactly.
fn search_filter(value: &str) -> Option<&str> {
    (!value.eq_ignore_ascii_case(MATCH_ANY)).then_some(value)
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The user chose "Save & Exit"; the report tells what was written.
    Saved(SaveReport),
    /// Input ran out before "Save & Exit". Nothing was saved.
    InputClosed,
}

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    AddFlight,
    ListFlights,
    SearchFlights,
    BookTicket,
    CancelTicket,
    ViewBooking,
    SaveAndExit,
}

impl MenuOption {
    fn from_choice(choice: i64) -> Option<Self> {
        Some(match choice {
            1 => Self::AddFlight,
            2 => Self::ListFlights,
            3 => Self::SearchFlights,
            4 => Self::BookTicket,
            5 => Self::CancelTicket,
            6 => Self::ViewBooking,
            7 => Self::SaveAndExit,
            _ => return None,
        })
    }
}

const MENU: &str = "
==============================================
     AIRLINE TICKET MANAGEMENT SYSTEM
==============================================
1. Add New Flight
2. Display All Flights
3. Search Flights (by source/destination)
4. Book Ticket
5. Cancel Ticket (by PNR)
6. View Booking Details (by PNR)
7. Save & Exit
----------------------------------------------";

/// An interactive session over a booking desk.
#[derive(Debug)]
pub struct Shell<'a, R, W> {
    desk: &'a mut BookingDesk,
    storage: &'a Storage,
    console: Console<R, W>,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Create a session reading commands from `input` and writing to `output`.
    pub fn new(desk: &'a mut BookingDesk, storage: &'a Storage, input: R, output: W) -> Self {
        Self {
            desk,
            storage,
            console: Console::new(input, output),
        }
    }

    /// Run the menu loop until "Save & Exit" or end of input.
    ///
    /// Booking errors are printed and the menu is shown again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the console cannot be read or written.
    pub fn run(mut self) -> Result<SessionEnd> {
        loop {
            match self.step() {
                Ok(Some(end)) => return Ok(end),
                Ok(None) => {}
                Err(Error::InputClosed) => {
                    warn!("Input closed before Save & Exit; changes were not saved");
                    return Ok(SessionEnd::InputClosed);
                }
                Err(err @ Error::Io(_)) => return Err(err),
                Err(err) => {
                    debug!("Operation failed: {:?}", err);
                    self.console.say(format!("Error: {err}."))?;
                }
            }
        }
    }

    fn step(&mut self) -> Result<Option<SessionEnd>> {
        self.console.say(MENU)?;
        let choice = self.console.prompt_integer("Enter your choice (1-7): ")?;

        match MenuOption::from_choice(choice) {
            Some(MenuOption::AddFlight) => self.add_flight()?,
            Some(MenuOption::ListFlights) => self.list_flights()?,
            Some(MenuOption::SearchFlights) => self.search_flights()?,
            Some(MenuOption::BookTicket) => self.book_ticket()?,
            Some(MenuOption::CancelTicket) => self.cancel_ticket()?,
            Some(MenuOption::ViewBooking) => self.view_booking()?,
            Some(MenuOption::SaveAndExit) => return self.save_and_exit().map(Some),
            None => self
                .console
                .say("Error: Invalid option. Please enter a number between 1 and 7.")?,
        }
        Ok(None)
    }

    fn add_flight(&mut self) -> Result<()> {
        self.console.say("\n--- Add New Flight ---")?;
        if self.desk.flights().is_full() {
            return Err(Error::CapacityExceeded {
                collection: Collection::Flights,
                limit: self.desk.flights().limit().unwrap_or_default(),
            });
        }

        let id = loop {
            let id = self.console.prompt_word("Enter Flight ID (e.g., AI701): ")?;
            if !self.desk.flights().contains(&id) {
                break id;
            }
            self.console
                .say("Error: Flight ID already exists. Please enter a unique ID.")?;
        };
        let source = self.console.prompt_word("Enter Source: ")?;
        let destination = self.console.prompt_word("Enter Destination: ")?;
        let capacity = self.console.prompt_positive_integer(
            "Enter Total Capacity (must be > 0): ",
            "Error: Capacity must be a positive number.",
        )?;
        let price = self.console.prompt_price("Enter Price (must be > 0.00): ")?;

        let flight = self.desk.add_flight(NewFlight {
            id,
            source,
            destination,
            capacity,
            price,
        })?;
        self.console.say(format!(
            "\nSUCCESS: Flight {} from {} to {} added.",
            flight.id, flight.source, flight.destination
        ))
    }

    fn list_flights(&mut self) -> Result<()> {
        write_flight_table(
            self.console.output(),
            "ALL FLIGHTS",
            self.desk.flights(),
            "No flights currently available in the system.",
        )?;
        Ok(())
    }

    fn search_flights(&mut self) -> Result<()> {
        self.console.say("\n--- Search Flights ---")?;
        let source = self
            .console
            .prompt_word("Enter Source (or type 'any' to skip): ")?;
        let destination = self
            .console
            .prompt_word("Enter Destination (or type 'any' to skip): ")?;

        let source = search_filter(&source);
        let destination = search_filter(&destination);

        write_flight_table(
            self.console.output(),
            "SEARCH RESULTS",
            self.desk.search_flights(source, destination),
            "No flights match your search criteria.",
        )?;
        Ok(())
    }

    fn book_ticket(&mut self) -> Result<()> {
        self.console.say("\n--- Book New Ticket ---")?;
        self.desk.tickets().ensure_room()?;

        let flight_id = self.console.prompt_word("Enter Flight ID to book: ")?;
        match self.desk.flight(&flight_id) {
            None => return Err(Error::FlightNotFound { id: flight_id }),
            Some(flight) if flight.is_full() => return Err(Error::FullyBooked { id: flight_id }),
            Some(_) => {}
        }

        let name = self.console.prompt_line(&format!(
            "Enter Passenger Name (Max {MAX_PASSENGER_NAME_LEN} chars): "
        ))?;
        let confirmation = self.desk.book_ticket(&flight_id, name.trim())?;
        write_confirmation(self.console.output(), &confirmation)?;
        Ok(())
    }

    fn cancel_ticket(&mut self) -> Result<()> {
        self.console.say("\n--- Cancel Ticket ---")?;
        let code = self.console.prompt_code("Enter PNR to cancel: ")?;
        let cancellation = self.desk.cancel_ticket(code)?;
        write_cancellation(self.console.output(), &cancellation)?;
        Ok(())
    }

    fn view_booking(&mut self) -> Result<()> {
        self.console.say("\n--- View Booking Details ---")?;
        let code = self.console.prompt_code("Enter PNR to view: ")?;
        let details = self.desk.view_booking(code)?;
        write_booking_details(self.console.output(), &details)?;
        Ok(())
    }

    fn save_and_exit(&mut self) -> Result<SessionEnd> {
        self.console.say("\nSaving data and exiting. Goodbye!")?;
        let report = self.desk.save(self.storage);

        if report.succeeded() == 2 {
            self.console
                .say("Status: Flight and Ticket data saved successfully.")?;
        } else {
            self.console.say(format!(
                "Status: Data save partially failed. ({}/2 saved)",
                report.succeeded()
            ))?;
        }
        for collection in report.failed() {
            self.console
                .say(format!("Error: could not save {collection}."))?;
        }
        Ok(SessionEnd::Saved(report))
    }
}
