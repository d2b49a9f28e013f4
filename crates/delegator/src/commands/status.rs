//! `status`: print each candidate's live capacity

use anyhow::Result;
use delegator_lib::{ClusterStatus, Delegator, TelemetryOutcome};
use serde::Serialize;
use tabled::Tabled;

use super::state_name;
use crate::output::{color_state, format_cpu, print_info, print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct StatusView<'a> {
    url: &'a str,
    service: &'a str,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a ClusterStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Nodes")]
    nodes: String,
    #[tabled(rename = "CPU Free")]
    cpu_free: String,
    #[tabled(rename = "CPU Max Free")]
    cpu_max_free: String,
    #[tabled(rename = "Mem Free")]
    memory_free: String,
    #[tabled(rename = "State")]
    state: String,
}

pub async fn run(delegator: &Delegator, format: OutputFormat) -> Result<()> {
    let report = delegator.status_report().await;
    let candidates = &delegator.config().candidates;

    let views: Vec<StatusView> = candidates
        .iter()
        .zip(&report)
        .map(|(candidate, outcome)| StatusView {
            url: &candidate.url,
            service: &candidate.service,
            state: state_name(Some(outcome)),
            status: outcome.status(),
            reason: outcome.demotion_reason().map(ToString::to_string),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&views)?,
        OutputFormat::Table => {
            let rows = views
                .iter()
                .map(|v| {
                    let (nodes, cpu_free, cpu_max_free, memory_free) = match v.status {
                        Some(s) => (
                            s.number_nodes.to_string(),
                            format_cpu(s.cpu_free_total),
                            format_cpu(s.cpu_max_free),
                            format!("{:.0}", s.memory_free_total),
                        ),
                        None => Default::default(),
                    };
                    StatusRow {
                        url: v.url.to_string(),
                        service: v.service.to_string(),
                        nodes,
                        cpu_free,
                        cpu_max_free,
                        memory_free,
                        state: color_state(v.state),
                    }
                })
                .collect();
            print_table(rows);

            for (view, outcome) in views.iter().zip(&report) {
                if let TelemetryOutcome::Unavailable(err) = outcome {
                    print_info(&format!("{}: {}", view.url, err));
                }
            }
        }
    }
    Ok(())
}
