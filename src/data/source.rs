//! Source abstraction and the adapter that turns failures into explicit results.

use tracing::{debug, warn};

use crate::domain::{Domain, RawRecord};
use crate::error::FeedError;

/// Anything that can produce raw per-domain quote records.
///
/// Implementations must not retry: the scheduler's interval is the retry cadence.
pub trait MarketSource: Send + Sync {
    /// Short name used in logs.
    fn id(&self) -> &'static str;

    fn fetch_bonds(&self) -> Result<Vec<RawRecord>, FeedError>;

    fn fetch_futures(&self) -> Result<Vec<RawRecord>, FeedError>;

    fn fetch_currencies(&self) -> Result<Vec<RawRecord>, FeedError>;

    fn fetch(&self, domain: Domain) -> Result<Vec<RawRecord>, FeedError> {
        match domain {
            Domain::Bonds => self.fetch_bonds(),
            Domain::Futures => self.fetch_futures(),
            Domain::Currencies => self.fetch_currencies(),
        }
    }
}

impl<T: MarketSource + ?Sized> MarketSource for Box<T> {
    fn id(&self) -> &'static str {
        (**self).id()
    }

    fn fetch_bonds(&self) -> Result<Vec<RawRecord>, FeedError> {
        (**self).fetch_bonds()
    }

    fn fetch_futures(&self) -> Result<Vec<RawRecord>, FeedError> {
        (**self).fetch_futures()
    }

    fn fetch_currencies(&self) -> Result<Vec<RawRecord>, FeedError> {
        (**self).fetch_currencies()
    }
}

/// Result of one domain fetch as seen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainFetch {
    Fetched(Vec<RawRecord>),
    Failed(String),
}

impl DomainFetch {
    /// Records to normalize; empty for a failed fetch.
    pub fn records(&self) -> &[RawRecord] {
        match self {
            DomainFetch::Fetched(records) => records,
            DomainFetch::Failed(_) => &[],
        }
    }
}

/// Wraps a source so that a failed call becomes a logged `DomainFetch::Failed`
/// instead of an error.
pub struct DataAdapter<S> {
    source: S,
}

impl<S: MarketSource> DataAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn fetch_bonds(&self) -> DomainFetch {
        self.fetch(Domain::Bonds)
    }

    pub fn fetch_futures(&self) -> DomainFetch {
        self.fetch(Domain::Futures)
    }

    pub fn fetch_currencies(&self) -> DomainFetch {
        self.fetch(Domain::Currencies)
    }

    pub fn fetch(&self, domain: Domain) -> DomainFetch {
        match self.source.fetch(domain) {
            Ok(records) => {
                debug!(source = self.source.id(), %domain, records = records.len(), "fetched");
                DomainFetch::Fetched(records)
            }
            Err(err) => {
                warn!(source = self.source.id(), %domain, error = %err, "fetch failed");
                let reason = match err {
                    FeedError::SourceUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                };
                DomainFetch::Failed(reason)
            }
        }
    }
}
