//! Routes command implementation.

use crate::evacuation::EvacuationKind;
use crate::net::http::{METRICS_ROUTE, PROTOBUF_CONTENT_TYPE};
use anyhow::Result;
use clap::Args;

/// List the evacuation routes.
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Run the routes command.
pub fn run_routes(args: RoutesArgs) -> Result<()> {
    if args.json {
        let routes: Vec<_> = EvacuationKind::ALL
            .into_iter()
            .map(|kind| {
                serde_json::json!({
                    "method": "POST",
                    "path": kind.route(),
                    "operation": kind.session(),
                    "keeps_container_decision": kind.retention_policy().has_container_decision(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    println!("{:<6} {:<36} OPERATION", "METHOD", "PATH");
    for kind in EvacuationKind::ALL {
        println!("{:<6} {:<36} {}", "POST", kind.route(), kind.session());
    }
    println!("{:<6} {:<36} metrics", "GET", METRICS_ROUTE);
    println!();
    println!("request and response bodies: {PROTOBUF_CONTENT_TYPE}");
    Ok(())
}
