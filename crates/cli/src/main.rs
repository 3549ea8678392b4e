//! fip - governance proposal toolkit
//!
//! Builds proposal calldata offline and runs proposals against a forked chain.

mod logging;
mod render;
mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ethers_core::types::Address;
use fip_core::application::{
    check_signoff, construct_proposal, proposal_calldata, verify_permissions, ProposalCalldata,
    Simulator, UpgradeCoordinator, UpgradeOptions,
};
use fip_core::domain::{AddressRegistry, ProposalCategory, ProposalConfig, ProposalDescription};
use fip_core::port::{Chain, ProposalSource};
use fip_infra_evm::ForkClient;
use fip_infra_fs::{FsArtifactStore, FsProposalSource};
use serde::Serialize;
use serde_json::json;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fip")]
#[command(about = "Governance proposal calldata, fork simulation and signoff", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./fip.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fork RPC URL, overrides the config
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured proposals
    List,

    /// Show the resolved actions of a proposal
    Describe {
        /// Proposal name (file stem under proposals/description)
        name: String,
    },

    /// Print the governance calldata to submit
    Calldata { name: String },

    /// Execute a proposal through governance on the fork
    Simulate { name: String },

    /// Run deploy, setup, governance, teardown and checks on the fork
    Run {
        name: String,

        /// Use already deployed contracts from the address registry
        #[arg(long)]
        skip_deploy: bool,
    },

    /// Lint proposal configs (all proposals when no name is given)
    Signoff { name: Option<String> },

    /// Verify role holders on the core contract
    Permissions,
}

struct App {
    settings: Settings,
    source: Arc<FsProposalSource>,
    json: bool,
}

impl App {
    fn chain(&self) -> Result<Arc<ForkClient>> {
        let client = ForkClient::new(&self.settings.rpc_url)
            .with_context(|| format!("Failed to connect to {}", self.settings.rpc_url))?;
        Ok(Arc::new(client))
    }

    async fn load(&self, name: &str) -> Result<(ProposalConfig, ProposalDescription, AddressRegistry)> {
        let config = self
            .source
            .proposals_config()
            .await?
            .shift_remove(name)
            .with_context(|| format!("Proposal {} is not in proposals_config.json", name))?;
        let description = self.source.description(name).await?;
        let registry = self.source.registry().await?;
        Ok((config, description, registry))
    }

    /// Print `value` as JSON when `--json` is set; returns whether it did
    fn emit_json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if !self.json {
            return Ok(false);
        }
        let envelope = json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "result": value,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        Ok(true)
    }

    async fn list(&self) -> Result<()> {
        let config = self.source.proposals_config().await?;
        let mut rows = Vec::with_capacity(config.len());

        for (name, proposal) in &config {
            let (commands, title) = match self.source.description(name).await {
                Ok(desc) => (desc.commands.len().to_string(), desc.title),
                Err(e) => {
                    warn!(proposal = %name, error = %e, "Description unavailable");
                    ("-".to_string(), "(missing description)".to_string())
                }
            };
            rows.push(render::ProposalRow {
                name: name.clone(),
                category: proposal.category.to_string(),
                deploy: proposal.deploy,
                commands,
                title,
            });
        }

        if self.emit_json(&config)? {
            return Ok(());
        }
        render::heading(format!("{} proposals", rows.len()));
        render::proposals(rows);
        Ok(())
    }

    async fn describe(&self, name: &str) -> Result<()> {
        let (config, description, registry) = self.load(name).await?;
        let proposal = construct_proposal(&description, &registry)
            .with_context(|| format!("Failed to construct {}", name))?;

        if self.emit_json(&proposal)? {
            return Ok(());
        }
        render::heading(&proposal.title);
        render::field("Category", config.category);
        render::field("Total value", proposal.total_value());
        println!();
        render::actions(&proposal);
        Ok(())
    }

    async fn calldata(&self, name: &str) -> Result<()> {
        let (config, description, registry) = self.load(name).await?;
        let proposal = construct_proposal(&description, &registry)
            .with_context(|| format!("Failed to construct {}", name))?;
        let calldata = proposal_calldata(
            config.category,
            &proposal,
            self.settings.timelock_delay(config.category),
        )?;

        if self.emit_json(&json!({ "proposal": proposal, "calldata": calldata }))? {
            return Ok(());
        }

        render::heading(&proposal.title);
        render::actions(&proposal);
        println!();
        match calldata {
            ProposalCalldata::Dao { proposal_id, propose } => {
                render::field("Proposal id", proposal_id);
                render::field("Governor", &self.settings.governance.dao);
                println!("\n{}\n{}", "propose calldata:".bold(), propose);
            }
            ProposalCalldata::Timelock {
                operation_id,
                salt,
                delay,
                schedule,
                execute,
            } => {
                render::field("Operation id", format!("{:?}", operation_id));
                render::field("Salt", format!("{:?}", salt));
                render::field("Delay", format!("{}s", delay));
                println!("\n{}\n{}", "scheduleBatch calldata:".bold(), schedule);
                println!("\n{}\n{}", "executeBatch calldata:".bold(), execute);
            }
        }
        Ok(())
    }

    async fn simulate(&self, name: &str) -> Result<()> {
        let (config, description, registry) = self.load(name).await?;
        if config.category == ProposalCategory::None {
            bail!("{} has category NONE, nothing to simulate (use `fip run`)", name);
        }
        if config.deploy {
            warn!(proposal = %name, "Proposal deploys contracts; `fip run` deploys them first");
        }

        let proposal = construct_proposal(&description, &registry)
            .with_context(|| format!("Failed to construct {}", name))?;
        let chain = self.chain()?;
        info!(block = chain.block_number().await?, "Connected to fork");

        let report = Simulator::new(chain)
            .simulate(
                config.category,
                &proposal,
                &self.settings.governance,
                &registry,
                config.proposal_id.as_deref(),
            )
            .await?;

        if self.emit_json(&report)? {
            return Ok(());
        }
        if report.already_executed {
            render::ok(format!("{} was already executed ({})", name, report.id));
        } else {
            render::ok(format!("{} executed through {} ({})", name, report.category, report.id));
        }
        render::transactions(&report.transactions);
        Ok(())
    }

    async fn run(&self, name: &str, skip_deploy: bool) -> Result<()> {
        let deployer: Address = self
            .settings
            .deployer
            .parse()
            .with_context(|| format!("Invalid deployer address {}", self.settings.deployer))?;
        let chain: Arc<dyn Chain> = self.chain()?;
        let coordinator = UpgradeCoordinator::new(
            self.source.clone(),
            chain,
            Arc::new(FsArtifactStore::new(self.settings.artifacts_dir())),
            self.settings.governance.clone(),
            deployer,
        );

        let report = coordinator
            .apply(name, &UpgradeOptions { skip_deploy })
            .await?;

        if !self.emit_json(&report)? {
            render::heading(format!("{} ({})", report.name, report.category));
            if !report.deployed.is_empty() {
                println!("\n{}", "Deployed".bold());
                render::deployed(&report.deployed);
            }
            println!("\n{}", "Transactions".bold());
            let simulation = report
                .simulation
                .iter()
                .flat_map(|s| s.transactions.iter().cloned());
            let all: Vec<_> = report
                .setup
                .iter()
                .cloned()
                .chain(simulation)
                .chain(report.teardown.iter().cloned())
                .collect();
            render::transactions(&all);
            println!("\n{}", "Checks".bold());
            render::checks(&report.checks);
            println!();
        }

        if report.passed() {
            render::ok(format!("{} passed", name));
            Ok(())
        } else {
            let failed = report.checks.iter().filter(|c| !c.passed).count();
            bail!("{} of {} checks failed", failed, report.checks.len())
        }
    }

    async fn signoff(&self, name: Option<&str>) -> Result<()> {
        let config = self.source.proposals_config().await?;
        let registry = self.source.registry().await?;

        let names: Vec<&String> = match name {
            Some(name) => vec![config
                .get_key_value(name)
                .map(|(k, _)| k)
                .with_context(|| format!("Proposal {} is not in proposals_config.json", name))?],
            None => config.keys().collect(),
        };

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let description = self.source.description(name).await?;
            let findings = check_signoff(&config[name.as_str()], &description, &registry);
            results.push((name.clone(), findings));
        }

        let total: usize = results.iter().map(|(_, f)| f.len()).sum();
        let as_json: Vec<_> = results
            .iter()
            .map(|(name, findings)| {
                json!({
                    "proposal": name,
                    "findings": findings.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
                })
            })
            .collect();

        if !self.emit_json(&as_json)? {
            for (name, findings) in &results {
                if findings.is_empty() {
                    render::ok(name);
                } else {
                    render::fail(name);
                    for finding in findings {
                        println!("    {} {}", "•".bold(), finding);
                    }
                }
            }
        }

        if total > 0 {
            bail!("{} signoff findings", total);
        }
        Ok(())
    }

    async fn permissions(&self) -> Result<()> {
        let registry = self.source.registry().await?;
        let permissions = self.source.permissions().await?;
        if permissions.is_empty() {
            bail!("No roles configured in permissions.json");
        }
        let core = registry.resolve(&self.settings.governance.core)?;
        let chain = self.chain()?;

        let report = verify_permissions(chain.as_ref(), &registry, core, &permissions).await?;

        if !self.emit_json(&report)? {
            render::heading(format!("Roles on {}", render::address(&core)));
            render::permissions(&report);
        }

        if report.passed() {
            render::ok("All roles match");
            Ok(())
        } else {
            bail!("Role configuration does not match the chain")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(rpc_url) = cli.rpc_url {
        settings.rpc_url = rpc_url;
    }
    info!(root = %settings.root().display(), "fip v{}", fip_core::VERSION);

    let app = App {
        source: Arc::new(FsProposalSource::new(settings.root())),
        settings,
        json: cli.json,
    };

    match cli.command {
        Commands::List => app.list().await,
        Commands::Describe { name } => app.describe(&name).await,
        Commands::Calldata { name } => app.calldata(&name).await,
        Commands::Simulate { name } => app.simulate(&name).await,
        Commands::Run { name, skip_deploy } => app.run(&name, skip_deploy).await,
        Commands::Signoff { name } => app.signoff(name.as_deref()).await,
        Commands::Permissions => app.permissions().await,
    }
}
