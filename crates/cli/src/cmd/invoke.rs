//! Implementation of the `mixbuild invoke` command.
//!
//! Queues the requests listed in a JSON file, runs one evaluation round
//! against the configured evaluator and prints what the round produced.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use mixbuild_lib::config::BridgeConfig;
use mixbuild_lib::invoke::{MixedBuildContext, ProcessRunner};
use mixbuild_lib::request::{CqueryRequest, QueryKind};
use mixbuild_lib::statement::BuildStatement;

use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning, symbols};

#[derive(Serialize)]
struct RequestAnswer {
  #[serde(flatten)]
  request: CqueryRequest,
  #[serde(skip_serializing_if = "Option::is_none")]
  result: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

#[derive(Serialize)]
struct InvokeReport<'a> {
  requests: Vec<RequestAnswer>,
  build_statements: &'a [BuildStatement],
  commands: Vec<String>,
}

fn read_requests(path: &Path) -> Result<Vec<CqueryRequest>> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read requests: {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse requests: {}", path.display()))
}

fn answer(ctx: &MixedBuildContext<ProcessRunner>, request: &CqueryRequest) -> RequestAnswer {
  let result = match request.kind {
    QueryKind::OutputFiles => ctx
      .get_output_files(&request.label, &request.config)
      .map(|files| serde_json::json!(files)),
    QueryKind::ApexInfo => ctx
      .get_apex_info(&request.label, &request.config)
      .map(|info| serde_json::json!(info)),
  };
  match result {
    Ok(value) => RequestAnswer {
      request: request.clone(),
      result: Some(value),
      error: None,
    },
    Err(e) => RequestAnswer {
      request: request.clone(),
      result: None,
      error: Some(e.to_string()),
    },
  }
}

pub fn cmd_invoke(config: BridgeConfig, requests: Option<&Path>, verbose: bool, output: OutputFormat) -> Result<()> {
  let requests = match requests {
    Some(path) => read_requests(path)?,
    None => Vec::new(),
  };
  debug!(requests = requests.len(), "loaded requests");

  let runner = ProcessRunner::new(config.paths.clone());
  let mut ctx = MixedBuildContext::new(config, runner);
  for request in &requests {
    ctx.queue_request(request.label.clone(), request.kind, request.config.clone());
  }

  ctx.invoke().context("Evaluation round failed")?;

  let results = ctx.results().context("Evaluation round produced no results")?;
  let answers: Vec<RequestAnswer> = results.requests.iter().map(|r| answer(&ctx, r)).collect();
  let commands = ctx.build_commands();

  if output.is_json() {
    return print_json(&InvokeReport {
      requests: answers,
      build_statements: ctx.build_statements(),
      commands,
    });
  }

  print_success(&format!(
    "Round complete: {} request(s), {} build statement(s)",
    answers.len(),
    commands.len()
  ));

  if !answers.is_empty() {
    println!();
    println!("Requests:");
    for answer in &answers {
      let key = answer.request.result_key();
      match (&answer.result, &answer.error) {
        (Some(value), _) => println!("  {} {} {} {}", symbols::INFO, key, symbols::ARROW, value),
        (None, Some(error)) => print_warning(&format!("{}: {}", key, error)),
        (None, None) => {}
      }
    }
  }

  if !commands.is_empty() {
    println!();
    println!("Build statements:");
    for (statement, command) in ctx.build_statements().iter().zip(&commands) {
      println!("  {} {}", symbols::INFO, statement.mnemonic);
      print_stat("Output", &statement.primary_output);
      if verbose {
        print_stat("Inputs", &statement.inputs.join(" "));
      }
      print_stat("Command", command);
    }
  }

  Ok(())
}
