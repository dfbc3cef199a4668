//! Request and configuration model.
//!
//! A [`CqueryRequest`] names a label, the kind of answer wanted for it, and the
//! build variant ([`ConfigKey`]) it is asked for. Producers queue requests on a
//! shared [`RequestLedger`] before an invocation round; the round reads the
//! ledger once, in canonical order.

mod ledger;
mod types;

pub use ledger::RequestLedger;
pub use types::*;
