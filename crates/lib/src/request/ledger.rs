use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::types::{ConfigKey, CqueryRequest, QueryKind};

/// Deduplicating set of queued requests, safe to share between producers.
///
/// Entries are keyed by canonical string, so the snapshot order is the
/// lexicographic order of those strings no matter which thread queued what
/// first.
#[derive(Debug, Default)]
pub struct RequestLedger {
  requests: Mutex<BTreeMap<String, CqueryRequest>>,
}

impl RequestLedger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a request. Queuing the same triple again is a no-op.
  pub fn enqueue(&self, label: impl Into<String>, kind: QueryKind, config: ConfigKey) {
    let request = CqueryRequest::new(label, kind, config);
    let key = request.canonical();
    let mut requests = self.lock();
    if !requests.contains_key(&key) {
      trace!(request = %key, "queued cquery request");
      requests.insert(key, request);
    }
  }

  /// Number of distinct queued requests.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Copy of the queued requests in canonical order.
  pub fn snapshot_ordered(&self) -> Vec<CqueryRequest> {
    self.lock().values().cloned().collect()
  }

  // The map only holds plain values, so a panic in another producer cannot
  // leave it half-updated.
  fn lock(&self) -> MutexGuard<'_, BTreeMap<String, CqueryRequest>> {
    self.requests.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::OsType;

  #[test]
  fn duplicate_requests_collapse() {
    let ledger = RequestLedger::new();
    let cfg = ConfigKey::new("arm64_armv8-a", OsType::Android);

    for _ in 0..5 {
      ledger.enqueue("duplicate", QueryKind::OutputFiles, cfg.clone());
    }
    ledger.enqueue("duplicate", QueryKind::ApexInfo, cfg.clone());

    assert_eq!(ledger.len(), 2);
  }

  #[test]
  fn snapshot_is_strictly_ordered() {
    let ledger = RequestLedger::new();
    let arm64_android = ConfigKey::new("arm64_armv8-a", OsType::Android);
    let arm64_linux = ConfigKey::new("arm64_armv8-a", OsType::LinuxGlibc);
    let other_android = ConfigKey::new("otherarch", OsType::Android);

    ledger.enqueue("zzz", QueryKind::OutputFiles, arm64_android.clone());
    ledger.enqueue("ccc", QueryKind::ApexInfo, arm64_android.clone());
    ledger.enqueue("duplicate", QueryKind::OutputFiles, arm64_android.clone());
    ledger.enqueue("duplicate", QueryKind::OutputFiles, arm64_android.clone());
    ledger.enqueue("xxx", QueryKind::OutputFiles, arm64_linux);
    ledger.enqueue("aaa", QueryKind::OutputFiles, arm64_android);
    ledger.enqueue("aaa", QueryKind::OutputFiles, other_android.clone());
    ledger.enqueue("bbb", QueryKind::OutputFiles, other_android);

    let snapshot = ledger.snapshot_ordered();
    assert_eq!(snapshot.len(), 7);

    let mut last = String::new();
    for request in &snapshot {
      let this = request.canonical();
      assert!(this > last, "'{}' came before '{}'", last, this);
      last = this;
    }
  }

  #[test]
  fn snapshot_ignores_insertion_order() {
    let cfg = ConfigKey::new("x86_64", OsType::LinuxGlibc);
    let labels = ["//b:b", "//a:a", "//c:c"];

    let forward = RequestLedger::new();
    for label in labels {
      forward.enqueue(label, QueryKind::OutputFiles, cfg.clone());
    }
    let backward = RequestLedger::new();
    for label in labels.iter().rev() {
      backward.enqueue(*label, QueryKind::OutputFiles, cfg.clone());
    }

    assert_eq!(forward.snapshot_ordered(), backward.snapshot_ordered());
  }

  #[test]
  fn concurrent_producers_enqueue_safely() {
    let ledger = RequestLedger::new();
    let cfg = ConfigKey::new("arm64_armv8-a", OsType::Android);

    std::thread::scope(|scope| {
      for worker in 0..8 {
        let ledger = &ledger;
        let cfg = cfg.clone();
        scope.spawn(move || {
          for i in 0..50 {
            // Every worker queues the same 50 labels plus one of its own.
            ledger.enqueue(format!("//pkg:t{}", i), QueryKind::OutputFiles, cfg.clone());
          }
          ledger.enqueue(format!("//own:w{}", worker), QueryKind::OutputFiles, cfg);
        });
      }
    });

    assert_eq!(ledger.len(), 58);
  }
}
