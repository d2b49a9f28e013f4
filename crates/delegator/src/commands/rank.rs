//! `rank`: compute and print the delegation plan

use anyhow::Result;
use colored::Colorize;
use delegator_lib::Delegator;
use rand::Rng;

use super::{plan_view, PlanRow};
use crate::output::{print_json, print_table, OutputFormat};

pub async fn run<R: Rng>(delegator: &Delegator, rng: &mut R, format: OutputFormat) -> Result<()> {
    let plan = delegator.plan(rng).await?;
    let views = plan_view(&plan);

    match format {
        OutputFormat::Json => print_json(&views)?,
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Delegation plan".bold(),
                format!("({})", plan.strategy).cyan()
            );
            print_table(views.iter().map(PlanRow::from).collect());
        }
    }
    Ok(())
}
