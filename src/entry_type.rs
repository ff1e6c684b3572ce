//! The direction of a monetary movement, shared by categories and transactions.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Whether money was spent or earned.
///
/// Both a [crate::category::Category] and a transaction carry an `EntryType`.
/// The two are not required to match: a transaction may be recorded as an
/// expense against an income category. The database stores the type as the
/// strings "Expense" and "Income".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Money spent.
    Expense,
    /// Money earned.
    Income,
}

impl EntryType {
    /// The string stored in the database for this entry type.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Expense => "Expense",
            EntryType::Income => "Income",
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Expense" => Ok(EntryType::Expense),
            "Income" => Ok(EntryType::Income),
            other => Err(Error::InvalidEntryType(other.to_string())),
        }
    }
}
