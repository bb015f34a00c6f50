//! `qds-cluster`: manage Qubole clusters from the command line.
//!
//! This builds the nested cluster request document from a flat option set,
//! runs exactly one lifecycle operation against the QDS API, and prints a
//! `{"changed": …, "cluster": …}` JSON object on stdout. Any remote failure
//! aborts the invocation with the service's error message.

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::debug;
use tracing_subscriber::{
    fmt::{format::FmtSpan, Subscriber},
    prelude::*,
    EnvFilter,
};

mod ec2_tag;
mod options;

use options::Opt;

fn main() -> Result<()> {
    // Configure tracing.
    let filter = EnvFilter::from_default_env();
    Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_env_filter(filter)
        .finish()
        .init();

    let opt = Opt::from_args();
    let client = opt.client()?;
    let command = opt.command.into_cluster_command();
    debug!("dispatching {:?}", command);

    // One blocking round trip per invocation.
    let runtime =
        tokio::runtime::Runtime::new().context("unable to create a runtime")?;
    let outcome = runtime.block_on(client.dispatch(&command))?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
