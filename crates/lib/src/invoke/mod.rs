//! The invocation orchestrator.
//!
//! [`MixedBuildContext`] collects requests from producers, runs one evaluation
//! round against the evaluator and keeps the round's answers for consumers:
//!
//! 1. Write the injection files (see [`injection`]).
//! 2. Snapshot the request ledger. If anything is queued, issue the cquery
//!    call and parse its records.
//! 3. Issue the aquery call, decode the action graph and resolve it into
//!    build statements.
//!
//! Both calls carry the coverage flags. Any failure aborts the round and
//! leaves the context idle; a completed round is only replaced by the next
//! completed one.

pub mod injection;
pub mod runner;
mod types;

pub use injection::{InjectionError, InjectionFiles, write_injection_files};
pub use runner::{CommandKind, EvaluatorCommand, EvaluatorRunner, ProcessRunner, RunnerError};
pub use types::*;

use tracing::{info, warn};

use crate::aquery;
use crate::config::BridgeConfig;
use crate::consts::MAIN_BZL_FILE;
use crate::cquery::{ApexInfo, CqueryResults, LookupError};
use crate::request::{ConfigKey, QueryKind, RequestLedger};
use crate::statement::{BuildStatement, create_command};

/// Facade over one mixed build: request queue, evaluator round, results.
///
/// Producers share it by reference to queue requests. [`invoke`](Self::invoke)
/// needs exclusive access; afterwards any number of readers can query the
/// frozen results without locking.
pub struct MixedBuildContext<R> {
  config: BridgeConfig,
  runner: R,
  ledger: RequestLedger,
  state: RoundState,
}

impl<R: EvaluatorRunner> MixedBuildContext<R> {
  pub fn new(config: BridgeConfig, runner: R) -> Self {
    Self {
      config,
      runner,
      ledger: RequestLedger::new(),
      state: RoundState::Idle,
    }
  }

  pub fn config(&self) -> &BridgeConfig {
    &self.config
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  pub fn ledger(&self) -> &RequestLedger {
    &self.ledger
  }

  /// Queue a request for the next round. Duplicates collapse.
  pub fn queue_request(&self, label: impl Into<String>, kind: QueryKind, config: ConfigKey) {
    self.ledger.enqueue(label, kind, config);
  }

  /// Whether a module may be delegated to the evaluator.
  pub fn is_module_name_allowed(&self, name: &str, within_apex: bool) -> bool {
    self.config.modules.is_allowed(name, within_apex)
  }

  /// Flags added to the cquery call.
  pub fn cquery_flags(&self) -> Vec<String> {
    let starlark_file = self.config.paths.mixed_builds_dir().join(MAIN_BZL_FILE);
    let mut flags = vec![
      "--output=starlark".to_string(),
      format!("--starlark:file={}", starlark_file.display()),
    ];
    flags.extend(self.config.coverage.flags());
    flags
  }

  /// Flags added to the aquery call.
  pub fn aquery_flags(&self) -> Vec<String> {
    let mut flags = vec!["--output=proto".to_string()];
    flags.extend(self.config.coverage.flags());
    flags
  }

  /// Run one evaluation round.
  pub fn invoke(&mut self) -> Result<(), InvokeError> {
    self.state = RoundState::Idle;
    let results = self.run_round()?;
    info!(
      requests = results.requests.len(),
      statements = results.build_statements.len(),
      "mixed build round ready"
    );
    self.state = RoundState::Ready(results);
    Ok(())
  }

  fn run_round(&self) -> Result<RoundResults, InvokeError> {
    let requests = self.ledger.snapshot_ordered();
    info!(requests = requests.len(), "invoking evaluator");

    write_injection_files(&self.config.paths.injection_dir(), &requests)?;

    let cquery = if requests.is_empty() {
      warn!("no queued requests, skipping cquery");
      CqueryResults::empty(&requests)
    } else {
      let stdout = self.runner.run(&EvaluatorCommand::cquery(), &self.cquery_flags())?;
      let text = String::from_utf8(stdout)?;
      CqueryResults::parse(&text, &requests)?
    };

    let bytes = self.runner.run(&EvaluatorCommand::aquery(), &self.aquery_flags())?;
    let graph = aquery::decode(&bytes)?;
    let build_statements = aquery::build_statements(&graph)?;

    Ok(RoundResults {
      requests,
      cquery,
      build_statements,
    })
  }

  pub fn is_ready(&self) -> bool {
    matches!(self.state, RoundState::Ready(_))
  }

  /// Results of the last completed round.
  pub fn results(&self) -> Result<&RoundResults, LookupError> {
    self.state.results().ok_or(LookupError::NotInvoked)
  }

  pub fn get_output_files(&self, label: &str, config: &ConfigKey) -> Result<Vec<String>, LookupError> {
    self.results()?.cquery.output_files(label, config)
  }

  pub fn get_apex_info(&self, label: &str, config: &ConfigKey) -> Result<ApexInfo, LookupError> {
    self.results()?.cquery.apex_info(label, config)
  }

  /// Build statements of the last completed round; empty before one.
  pub fn build_statements(&self) -> &[BuildStatement] {
    self
      .state
      .results()
      .map(|results| results.build_statements.as_slice())
      .unwrap_or_default()
  }

  /// Shell commands for every build statement, under the configured roots.
  pub fn build_commands(&self) -> Vec<String> {
    let execution_root = self.config.paths.execution_root();
    let bazel_out_dir = self.config.paths.bazel_out_dir();
    let execution_root = execution_root.to_string_lossy();
    let bazel_out_dir = bazel_out_dir.to_string_lossy();
    self
      .build_statements()
      .iter()
      .map(|statement| create_command(statement, &execution_root, &bazel_out_dir))
      .collect()
  }
}
