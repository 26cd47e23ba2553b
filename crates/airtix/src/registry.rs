//! The flight registry.

use std::collections::HashMap;

use crate::error::{Collection, Error, Result};
use crate::model::Flight;

/// Flights in the order they were added, indexed by identifier.
#[derive(Debug, Clone, Default)]
pub struct FlightRegistry {
    flights: Vec<Flight>,
    index: HashMap<String, usize>,
    /// Maximum number of flights. 0 means unlimited.
    limit: usize,
}

impl FlightRegistry {
    /// Create an empty registry holding at most `limit` flights (0 for no limit).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            flights: Vec::new(),
            index: HashMap::new(),
            limit,
        }
    }

    /// The configured limit, or `None` when unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    /// Check if another flight would exceed the limit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.limit().is_some_and(|limit| self.flights.len() >= limit)
    }

    /// Add a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the registry is full and
    /// [`Error::DuplicateIdentifier`] if the identifier is taken. The registry
    /// is unchanged on error.
    pub fn insert(&mut self, flight: Flight) -> Result<&Flight> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                collection: Collection::Flights,
                limit: self.limit,
            });
        }
        if self.contains(&flight.id) {
            return Err(Error::DuplicateIdentifier { id: flight.id });
        }
        Ok(self.push(flight))
    }

    /// Add a flight read back from disk, ignoring the limit.
    ///
    /// Returns `false` and drops the flight if its identifier is taken.
    pub(crate) fn restore(&mut self, flight: Flight) -> bool {
        if self.contains(&flight.id) {
            return false;
        }
        self.push(flight);
        true
    }

    fn push(&mut self, flight: Flight) -> &Flight {
        let position = self.flights.len();
        self.index.insert(flight.id.clone(), position);
        self.flights.push(flight);
        &self.flights[position]
    }

    /// Check if a flight with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a flight.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Flight> {
        self.index.get(id).map(|&i| &self.flights[i])
    }

    /// Look up a flight for seat updates.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Flight> {
        self.index.get(id).map(|&i| &mut self.flights[i])
    }

    /// Flights matching both optional filters, in insertion order.
    pub fn search<'a>(
        &'a self,
        source: Option<&'a str>,
        destination: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Flight> + 'a {
        self.flights
            .iter()
            .filter(move |flight| flight.matches(source, destination))
    }

    /// All flights, in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Flight> {
        self.flights.iter()
    }

    /// All flights as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Flight] {
        &self.flights
    }

    /// Number of flights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Check if there are no flights.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlightRegistry {
    type Item = &'a Flight;
    type IntoIter = std::slice::Iter<'a, Flight>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
