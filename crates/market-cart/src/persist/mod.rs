//! Ordered snapshot persistence.

mod queue;

pub(crate) use queue::{PendingWrite, WriteQueue};
