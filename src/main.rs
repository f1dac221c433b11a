use log::{info, warn};

use turtle_ledger::blockchain::{Account, Admission, ChainConfig, Ledger};

/// Logs the outcome of a transfer
fn report_admission(label: &str, admission: &Admission) {
    if admission.is_accepted() {
        info!("{}: {}", label, admission);
    } else {
        warn!("{}: {}", label, admission);
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ChainConfig::from_env()?;
    info!(
        "Starting ledger with difficulty {} using {} for the puzzle",
        config.difficulty, config.puzzle_hash
    );

    let ledger = Ledger::with_config(config)?;

    let agp = Account::new();
    let jz = Account::new();
    let jb = Account::new();

    let transfers = [
        ("agp -> jz", &agp, 50.0, &jz),
        ("jz -> jb", &jz, 23.0, &jb),
        ("jb -> jz", &jb, 5.0, &jz),
    ];

    for (label, payer, amount, payee) in transfers {
        let admission = payer.transfer(amount, payee.public_key(), &ledger)?;
        report_admission(label, &admission);
    }

    println!("{}", serde_json::to_string_pretty(&ledger.report())?);

    Ok(())
}
