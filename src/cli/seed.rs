//! CLI entry-point for bootstrapping an empty database from CSV exports.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args as ClapArgs;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::{
    auth::password,
    config::Settings,
    domain::{
        adr::AdrInput,
        user::{Signup, User},
    },
    inference::InferenceEngine,
    reports,
    store::{adrs, users, Store},
};

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// CSV of `username,password,first_name,last_name`.
    #[arg(long)]
    pub users: Option<PathBuf>,
    /// CSV of report rows, one column per report field.
    #[arg(long)]
    pub adrs: Option<PathBuf>,
    /// Username recorded as the author of imported reports.
    #[arg(long, requires = "adrs")]
    pub reporter: Option<String>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    if args.users.is_none() && args.adrs.is_none() {
        bail!("nothing to seed: pass --users and/or --adrs");
    }
    let (store, engine) = super::bootstrap(&settings).await?;

    if let Some(path) = &args.users {
        let imported = seed_users(&store, path, settings.password_hash_iterations)?;
        info!(imported, "users seeded");
    }
    if let Some(path) = &args.adrs {
        let reporter = args
            .reporter
            .as_deref()
            .context("--reporter is required when seeding reports")?;
        let imported = seed_adrs(&store, &engine, path, reporter)?;
        info!(imported, "reports seeded");
    }
    Ok(())
}

/// Hash and insert every user row; skipped when any user exists.
pub fn seed_users(store: &Store, path: &Path, iterations: u32) -> Result<usize> {
    if store.read(users::count_users)? > 0 {
        warn!("user table is not empty, skipping user seed");
        return Ok(0);
    }
    let rows: Vec<Signup> = read_csv(path)?;
    let accounts: Vec<User> = rows
        .iter()
        .map(|row| User::new(row, password::hash_password(&row.password, iterations)))
        .collect();
    store.write(|tx| {
        for user in &accounts {
            users::insert_user(tx, user)?;
        }
        Ok::<_, crate::store::StoreError>(())
    })?;
    Ok(accounts.len())
}

/// Assess every report row, then store them all in one transaction so a bad
/// row leaves the table empty. Skipped when any report exists.
pub fn seed_adrs(
    store: &Store,
    engine: &InferenceEngine,
    path: &Path,
    reporter: &str,
) -> Result<usize> {
    if store.read(adrs::count_adrs)? > 0 {
        warn!("adr table is not empty, skipping report seed");
        return Ok(0);
    }
    let user = store
        .read(|conn| users::find_by_username(conn, reporter))?
        .with_context(|| format!("reporter {reporter:?} does not exist"))?;
    let rows: Vec<AdrInput> = read_csv(path)?;
    let pending = rows
        .into_iter()
        .enumerate()
        .map(|(idx, input)| {
            reports::assess_new_report(engine, &user.id, input)
                .with_context(|| format!("assessing report on row {}", idx + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    store.write(|tx| {
        for (idx, report) in pending.iter().enumerate() {
            reports::insert_report(tx, report)
                .with_context(|| format!("storing report on row {}", idx + 1))?;
        }
        Ok::<_, anyhow::Error>(())
    })?;

    let total = pending.len();
    for report in pending {
        report.into_stored();
    }
    Ok(total)
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("parsing {} row {}", path.display(), idx + 1)))
        .collect()
}
