use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// Receipts of one publisher in one run.
///
/// `receipts` keeps the last timestamp seen per sequence number, so
/// duplicates collapse; `received` counts every receipt so they can still be
/// measured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherStream {
    receipts: BTreeMap<u64, u64>,
    received: u64,
}

impl PublisherStream {
    pub fn record(&mut self, sequence: u64, timestamp_ms: u64) {
        self.received = self.received.saturating_add(1);
        self.receipts.insert(sequence, timestamp_ms);
    }

    /// Sequence number to timestamp, ascending by sequence.
    #[must_use]
    pub const fn receipts(&self) -> &BTreeMap<u64, u64> {
        &self.receipts
    }

    /// Raw receipt count including duplicates.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Distinct sequence numbers seen.
    #[must_use]
    pub fn distinct(&self) -> u64 {
        u64::try_from(self.receipts.len()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}

impl<const N: usize> From<[(u64, u64); N]> for PublisherStream {
    fn from(receipts: [(u64, u64); N]) -> Self {
        let mut stream = PublisherStream::default();
        for (sequence, timestamp_ms) in receipts {
            stream.record(sequence, timestamp_ms);
        }
        stream
    }
}

/// Publisher id to its receipts for the live run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedStream {
    publishers: BTreeMap<u32, PublisherStream>,
}

impl ObservedStream {
    pub fn record(&mut self, publisher_id: u32, sequence: u64, timestamp_ms: u64) {
        self.publishers
            .entry(publisher_id)
            .or_default()
            .record(sequence, timestamp_ms);
    }

    #[must_use]
    pub fn publisher(&self, publisher_id: u32) -> Option<&PublisherStream> {
        self.publishers.get(&publisher_id)
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, u32, PublisherStream> {
        self.publishers.iter()
    }

    #[must_use]
    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Distinct receipts across all publishers.
    #[must_use]
    pub fn total_distinct(&self) -> u64 {
        self.publishers
            .values()
            .fold(0u64, |acc, stream| acc.saturating_add(stream.distinct()))
    }
}

impl<'stream> IntoIterator for &'stream ObservedStream {
    type Item = (&'stream u32, &'stream PublisherStream);
    type IntoIter = Iter<'stream, u32, PublisherStream>;

    fn into_iter(self) -> Self::IntoIter {
        self.publishers.iter()
    }
}
