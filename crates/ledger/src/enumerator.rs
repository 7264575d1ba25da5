//! Enumerate-and-filter over ledger-assigned record indices.
//!
//! A listing reads the record count once, then walks indices `0..count` in
//! ascending order with one fetch per step, keeping what the filter admits.
//! Reads are serial. The first failed fetch ends the listing: the error is
//! yielded and nothing after it is. No snapshot is taken; enumerating again
//! re-reads the ledger.

use async_trait::async_trait;
use futures::Stream;

use realty_core::{Address, Estate, LedgerRecord, LedgerResult, Present, RecordFilter};

use crate::contract::ContractProxy;

/// A record family that can be counted and fetched by index.
#[async_trait]
pub trait Enumerable: LedgerRecord + Sized + Send + 'static {
    async fn count(proxy: &ContractProxy, caller: Address) -> LedgerResult<u64>;

    async fn fetch(proxy: &ContractProxy, caller: Address, index: u64) -> LedgerResult<Self>;
}

#[async_trait]
impl Enumerable for Estate {
    async fn count(proxy: &ContractProxy, caller: Address) -> LedgerResult<u64> {
        proxy.estate_count(Some(caller)).await
    }

    async fn fetch(proxy: &ContractProxy, caller: Address, index: u64) -> LedgerResult<Self> {
        proxy.get_estate(Some(caller), index).await
    }
}

#[async_trait]
impl Enumerable for Present {
    async fn count(proxy: &ContractProxy, caller: Address) -> LedgerResult<u64> {
        proxy.present_count(Some(caller)).await
    }

    async fn fetch(proxy: &ContractProxy, caller: Address, index: u64) -> LedgerResult<Self> {
        proxy.get_present(Some(caller), index).await
    }
}

/// Lazy, single-pass cursor over the records a filter admits.
#[derive(Debug)]
pub struct Enumeration<R> {
    proxy: ContractProxy,
    viewer: Address,
    filter: RecordFilter,
    count: Option<u64>,
    next_index: u64,
    exhausted: bool,
    _record: core::marker::PhantomData<fn() -> R>,
}

impl<R: Enumerable> Enumeration<R> {
    fn new(proxy: ContractProxy, viewer: Address, filter: RecordFilter) -> Self {
        Self {
            proxy,
            viewer,
            filter,
            count: None,
            next_index: 0,
            exhausted: false,
            _record: core::marker::PhantomData,
        }
    }

    /// Next admitted record, an error (after which the cursor is spent), or
    /// `None` once every index below the count has been visited.
    pub async fn next(&mut self) -> Option<LedgerResult<R>> {
        if self.exhausted {
            return None;
        }

        let count = match self.count {
            Some(count) => count,
            None => match R::count(&self.proxy, self.viewer).await {
                Ok(count) => {
                    tracing::debug!(kind = %R::KIND, count, "enumeration started");
                    self.count = Some(count);
                    count
                }
                Err(err) => return Some(self.abort(err)),
            },
        };

        while self.next_index < count {
            let index = self.next_index;
            self.next_index += 1;

            match R::fetch(&self.proxy, self.viewer, index).await {
                Ok(record) => {
                    tracing::debug!(kind = %R::KIND, index, id = *record.id(), "record fetched");
                    if self.filter.admits(&record, &self.viewer) {
                        return Some(Ok(record));
                    }
                }
                Err(err) => return Some(self.abort(err)),
            }
        }

        self.exhausted = true;
        None
    }

    fn abort(&mut self, err: realty_core::LedgerError) -> LedgerResult<R> {
        tracing::warn!(kind = %R::KIND, index = self.next_index.saturating_sub(1), error = %err, "enumeration aborted");
        self.exhausted = true;
        Err(err)
    }

    /// Drain the cursor, stopping at the first error.
    pub async fn try_collect(mut self) -> LedgerResult<Vec<R>> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    pub fn into_stream(self) -> impl Stream<Item = LedgerResult<R>> + Send {
        futures::stream::unfold(self, |mut cursor| async move {
            let item = cursor.next().await?;
            Some((item, cursor))
        })
    }
}

/// Entry point for listings.
#[derive(Debug, Clone)]
pub struct EntityEnumerator {
    proxy: ContractProxy,
}

impl EntityEnumerator {
    pub fn new(proxy: ContractProxy) -> Self {
        Self { proxy }
    }

    pub fn list<R: Enumerable>(&self, viewer: Address, filter: RecordFilter) -> Enumeration<R> {
        Enumeration::new(self.proxy.clone(), viewer, filter)
    }

    pub fn list_estates(&self, viewer: Address, filter: RecordFilter) -> Enumeration<Estate> {
        self.list(viewer, filter)
    }

    /// Finished presents are never listed, whatever the filter.
    pub fn list_presents(&self, viewer: Address, filter: RecordFilter) -> Enumeration<Present> {
        self.list(viewer, filter)
    }
}
