use clap::{command, Command};
use jersey_dataset::config::AuditConfig;
use jersey_dataset::{audit_dataset, logging};

fn cli() -> Command {
    command!()
        .name("dataset_missing")
        .about("Report classes present in train but missing from valid/test")
}

fn main() -> anyhow::Result<()> {
    cli().get_matches();
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = AuditConfig::from_env();
    let report = audit_dataset(&config)?;
    print!("{report}");
    Ok(())
}
