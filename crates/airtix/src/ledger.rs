//! The ticket ledger.

use std::collections::BTreeMap;

use crate::error::{Collection, Error, Result};
use crate::model::Ticket;

/// Booked tickets keyed by reservation code.
///
/// Codes are issued in increasing order, so key order is booking order and
/// removing a ticket keeps the remaining tickets in their relative order.
#[derive(Debug, Clone, Default)]
pub struct TicketLedger {
    tickets: BTreeMap<u64, Ticket>,
    /// Maximum number of tickets. 0 means unlimited.
    limit: usize,
}

impl TicketLedger {
    /// Create an empty ledger holding at most `limit` tickets (0 for no limit).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            tickets: BTreeMap::new(),
            limit,
        }
    }

    /// The configured limit, or `None` when unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    /// Check if another ticket would exceed the limit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.limit().is_some_and(|limit| self.tickets.len() >= limit)
    }

    /// Fail with [`Error::CapacityExceeded`] if the ledger is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when no more tickets fit.
    pub fn ensure_room(&self) -> Result<()> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                collection: Collection::Tickets,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Append a freshly booked ticket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the ledger is full and
    /// [`Error::InvalidInput`] if the code is already in use.
    pub fn insert(&mut self, ticket: Ticket) -> Result<&Ticket> {
        self.ensure_room()?;
        if self.tickets.contains_key(&ticket.code) {
            return Err(Error::invalid_input(
                "reservation code",
                format!("{} is already in use", ticket.code),
            ));
        }
        let code = ticket.code;
        Ok(self.tickets.entry(code).or_insert(ticket))
    }

    /// Add a ticket read back from disk, ignoring the limit.
    ///
    /// Returns `false` and drops the ticket if its code is taken.
    pub(crate) fn restore(&mut self, ticket: Ticket) -> bool {
        if self.tickets.contains_key(&ticket.code) {
            return false;
        }
        self.tickets.insert(ticket.code, ticket);
        true
    }

    /// Look up a ticket by reservation code.
    #[must_use]
    pub fn get(&self, code: u64) -> Option<&Ticket> {
        self.tickets.get(&code)
    }

    /// Remove a ticket by reservation code.
    pub fn remove(&mut self, code: u64) -> Option<Ticket> {
        self.tickets.remove(&code)
    }

    /// Highest reservation code in the ledger.
    #[must_use]
    pub fn max_code(&self) -> Option<u64> {
        self.tickets.last_key_value().map(|(&code, _)| code)
    }

    /// All tickets, in booking order.
    pub fn iter(&self) -> std::collections::btree_map::Values<'_, u64, Ticket> {
        self.tickets.values()
    }

    /// Number of tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Check if there are no tickets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

impl<'a> IntoIterator for &'a TicketLedger {
    type Item = &'a Ticket;
    type IntoIter = std::collections::btree_map::Values<'a, u64, Ticket>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
