// Wallet-level libraries for bitcoin protocol by LNP/BP Association
//
// Written in 2020-2022 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// This software is distributed without any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate amplify;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use amplify::IoError;
use bitcoin::util::bip32::ExtendedPubKey;
use clap::Parser;
use colored::Colorize;
use restore::hd::{
    account_xpub_from_str, AddressGenerator, ChainIndex, DeriveError, GenerateAddresses,
    UnhardenedIndex,
};
use restore::onchain::{BackendFilter, FilterUsed, PublicNetwork, UsageFilterError};
use restore::{
    insert_tree, AccountScanner, ConfigError, InsertError, MemoryStore, ScanConfig, ScanError,
    ScanOutcome,
};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser)]
#[derive(Clone, Eq, PartialEq, Debug)]
#[clap(
    author,
    version,
    name = "hd-scan",
    about = "Command-line tool restoring HD wallet addresses from an account extended public key"
)]
pub struct Args {
    /// Command to execute
    #[clap(subcommand)]
    pub command: Command,

    /// Produce test network addresses regardless of the extended key
    /// network.
    #[clap(short, long, global = true)]
    pub testnet: bool,

    /// YAML file with scan configuration (`gapLimit`, `requestSize`).
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Command to execute
#[derive(Subcommand)]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Command {
    /// Print addresses derived from an account extended public key
    Address {
        /// Account-level extended public key (xpub or SLIP-132 variant)
        xpub: String,

        /// Derive addresses from the change chain
        #[clap(long)]
        change: bool,

        /// Number of addresses to print
        #[clap(short = 'n', long, default_value = "20")]
        count: u16,

        /// Number of addresses to skip
        #[clap(short, long, default_value = "0")]
        skip: u16,
    },

    /// Discover used addresses of an account and print the restored chains
    Scan {
        /// Account-level extended public key (xpub or SLIP-132 variant)
        xpub: String,

        /// File with used addresses, one per line
        #[clap(long, conflicts_with = "backend")]
        used_file: Option<PathBuf>,

        /// Base URL of the address indexer
        #[clap(long)]
        backend: Option<String>,

        /// Indexer request timeout, in seconds
        #[clap(long, default_value = "20")]
        timeout: u64,

        /// Maximal number of addresses the indexer accepts per request
        #[clap(long)]
        batch_limit: Option<usize>,

        /// Last known used index on the external chain
        #[clap(long)]
        last_external: Option<UnhardenedIndex>,

        /// Last known used index on the internal chain
        #[clap(long)]
        last_internal: Option<UnhardenedIndex>,

        /// Override gap limit from the configuration
        #[clap(long)]
        gap_limit: Option<u32>,

        /// Override number of addresses checked per indexer request
        #[clap(long)]
        request_size: Option<u32>,
    },
}

impl Args {
    fn account(&self, xpub: &str) -> Result<(ExtendedPubKey, PublicNetwork), Error> {
        let xpub = account_xpub_from_str(xpub)?;
        let network = if self.testnet {
            PublicNetwork::Testnet
        } else {
            PublicNetwork::from(xpub.network)
        };
        Ok((xpub, network))
    }

    fn scan_config(
        &self,
        gap_limit: Option<u32>,
        request_size: Option<u32>,
    ) -> Result<ScanConfig, Error> {
        let mut config = match &self.config {
            Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
            None => ScanConfig::default(),
        };
        if let Some(gap_limit) = gap_limit {
            config.gap_limit = gap_limit;
        }
        if let Some(request_size) = request_size {
            config.request_size = request_size;
        }
        config.validate()?;
        Ok(config)
    }

    pub async fn exec(&self) -> Result<(), Error> {
        match &self.command {
            Command::Address {
                xpub,
                change,
                count,
                skip,
            } => self.address(xpub, *change, *count, *skip),
            Command::Scan {
                xpub,
                used_file,
                backend,
                timeout,
                batch_limit,
                last_external,
                last_internal,
                gap_limit,
                request_size,
            } => {
                let config = self.scan_config(*gap_limit, *request_size)?;
                let filter: Box<dyn FilterUsed> = match (used_file, backend) {
                    (Some(path), _) => Box::new(read_used(path)?),
                    (None, Some(url)) => {
                        let mut filter = BackendFilter::with_timeout(
                            url,
                            env!("CARGO_PKG_VERSION"),
                            Duration::from_secs(*timeout),
                        )?;
                        if let Some(limit) = batch_limit {
                            filter = filter.with_batch_limit(*limit)?;
                        }
                        Box::new(filter)
                    }
                    (None, None) => return Err(Error::FilterRequired),
                };
                self.scan(xpub, filter.as_ref(), config, *last_external, *last_internal)
                    .await
            }
        }
    }

    fn address(&self, xpub: &str, change: bool, count: u16, skip: u16) -> Result<(), Error> {
        let (xpub, network) = self.account(xpub)?;
        let chain = if change {
            ChainIndex::Internal
        } else {
            ChainIndex::External
        };
        let generator = AddressGenerator::with_account(&xpub, chain, network.discrimination())?;

        println!(
            "\n{} {} ({} chain, {})\n",
            "Account:".bright_white(),
            xpub,
            chain,
            network
        );
        let indexes = (skip as u32..skip as u32 + count as u32).collect::<Vec<_>>();
        let addresses = generator.generate_addresses(&indexes)?;
        for (index, address) in indexes.iter().zip(addresses) {
            println!("{:>6} {}", format!("#{}", index).dimmed(), address);
        }
        println!();

        Ok(())
    }

    async fn scan(
        &self,
        xpub: &str,
        filter: &dyn FilterUsed,
        config: ScanConfig,
        last_external: Option<UnhardenedIndex>,
        last_internal: Option<UnhardenedIndex>,
    ) -> Result<(), Error> {
        let (xpub, network) = self.account(xpub)?;
        let scanner = AccountScanner::with_account_xpub(&xpub, network.discrimination(), config)?;

        eprintln!(
            "Scanning account {} on {} with gap limit {}",
            xpub.fingerprint().to_string().yellow(),
            network.to_string().yellow(),
            config.gap_limit.to_string().yellow()
        );
        let scan = scanner.scan(filter, last_external, last_internal).await?;

        let mut store = MemoryStore::new();
        let account = store.account();
        insert_tree(&mut store, account, &scan.tree).await?;

        for outcome in [&scan.external, &scan.internal] {
            print_outcome(outcome);
        }
        for chain in store.children(account) {
            for derivation in store.children(chain) {
                let path = store
                    .path(derivation)
                    .map(|path| path.to_string())
                    .unwrap_or_default();
                for record in store.addresses_at(derivation) {
                    println!("{:>12} {:>6} {}", path.dimmed(), record.kind, record.data);
                }
            }
        }
        eprintln!(
            "{} {} addresses restored",
            "Done:".bright_green(),
            store.addresses().len()
        );

        Ok(())
    }
}

fn print_outcome(outcome: &ScanOutcome) {
    let last_used = outcome
        .last_used
        .map(|index| index.to_string())
        .unwrap_or_else(|| s!("none"));
    println!(
        "\n{} {} {} {}",
        format!("{} chain:", outcome.chain).bright_white(),
        outcome.candidates.len(),
        "addresses, last used".dimmed(),
        last_used.bright_yellow()
    );
}

fn read_used(path: &Path) -> Result<BTreeSet<String>, Error> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

#[derive(Debug, Display, Error, From)]
#[display(inner)]
pub enum Error {
    #[from(io::Error)]
    Io(IoError),

    #[from]
    Yaml(serde_yaml::Error),

    /// error in extended key encoding: {0}
    #[from]
    #[display(doc_comments)]
    XkeyEncoding(slip132::Error),

    #[from]
    Derive(DeriveError),

    #[from]
    Config(ConfigError),

    #[from]
    UsageFilter(UsageFilterError),

    #[from]
    Scan(ScanError),

    #[from]
    Insert(InsertError),

    /// either `--used-file` or `--backend` must be provided
    #[display(doc_comments)]
    FilterRequired,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(err) = args.exec().await {
        eprintln!("{}: {}\n", "Error".bright_red(), err);
    }
}
