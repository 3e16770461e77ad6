//! DNS resolution core

mod lookup;
mod record;
mod resolver;

pub use lookup::{HickoryLookup, HostsLookup, Lookup, LookupResult, SystemLookup};
pub use record::{ResolutionRecord, ResultSet};
pub use resolver::Resolver;
