//! Records addressed by a stable ledger identifier.

/// A snapshot whose identifier survives re-reads.
///
/// Two snapshots of one record taken at different times share an id even when
/// their other fields differ.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;

    /// Whether `other` is a (possibly newer) snapshot of the same record.
    fn same_record(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }
}
