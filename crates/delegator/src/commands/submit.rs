//! `submit`: plan, then dispatch a payload with failover

use anyhow::{Context, Result};
use delegator_lib::{DelegationError, Delegator, DispatchReceipt};
use rand::Rng;
use serde::Serialize;
use std::path::Path;

use super::{plan_view, PlanEntryView, PlanRow};
use crate::output::{print_error, print_json, print_success, print_table, print_warning, OutputFormat};

#[derive(Serialize)]
struct SubmitView<'a> {
    plan: Vec<PlanEntryView>,
    receipt: &'a DispatchReceipt,
}

pub async fn run<R: Rng>(
    delegator: &Delegator,
    rng: &mut R,
    payload_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let payload = std::fs::read(payload_path)
        .with_context(|| format!("Failed to read payload {}", payload_path.display()))?;

    let plan = delegator.plan(rng).await?;
    let receipt = match delegator.dispatch(&plan, &payload).await {
        Ok(receipt) => receipt,
        Err(DelegationError::AllCandidatesExhausted { failures }) => {
            for failure in &failures {
                print_error(&failure.to_string());
            }
            anyhow::bail!("job could not be delegated: all {} candidates failed", failures.len());
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        OutputFormat::Json => print_json(&SubmitView {
            plan: plan_view(&plan),
            receipt: &receipt,
        })?,
        OutputFormat::Table => {
            print_table(plan_view(&plan).iter().map(PlanRow::from).collect());
            for failure in &receipt.failures {
                print_warning(&failure.to_string());
            }
            print_success(&format!(
                "Job delegated to {} ({}) with HTTP {} on attempt {}",
                receipt.url, receipt.service, receipt.status, receipt.attempt
            ));
        }
    }
    Ok(())
}
