// Proposal Lifecycle Use Case
//
// deploy → setup → simulate → teardown → validate, the way a one-off DAO
// script runs against a fork.

use crate::application::construct::{construct_proposal, encode_call, resolve_target};
use crate::application::simulate::{GovernanceConfig, SimulationReport, Simulator};
use crate::application::transact::{send_as, ExecutedTx};
use crate::application::validate::{run_checks, CheckOutcome};
use crate::domain::abi::tokenize;
use crate::domain::template::render_args;
use crate::domain::{
    AddressRegistry, ContractRecord, DomainError, ForkAction, ProposalCategory, ProposalConfig,
    ProposalDescription,
};
use crate::error::{AppError, Result};
use crate::port::{ArtifactStore, Chain, ProposalSource, TxRequest};
use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{Address, H256};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What a script step can reach
pub struct ScriptContext {
    pub chain: Arc<dyn Chain>,
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Grows as contracts are deployed
    pub registry: AddressRegistry,
    /// Sender of deployments
    pub deployer: Address,
}

/// Contract deployed by a script
#[derive(Debug, Clone, Serialize)]
pub struct DeployedContract {
    pub name: String,
    pub artifact: String,
    pub address: Address,
    pub tx_hash: H256,
}

/// Hooks of a one-off proposal script
#[async_trait]
pub trait ProposalScript: Send + Sync {
    /// Deploy new contracts and register them in `ctx.registry`
    async fn deploy(&self, ctx: &mut ScriptContext) -> Result<Vec<DeployedContract>>;

    /// Fork-only preparation before the proposal runs
    async fn setup(&self, ctx: &mut ScriptContext) -> Result<Vec<ExecutedTx>>;

    /// Fork-only cleanup after the proposal ran
    async fn teardown(&self, ctx: &mut ScriptContext) -> Result<Vec<ExecutedTx>>;

    async fn validate(&self, ctx: &ScriptContext) -> Result<Vec<CheckOutcome>>;
}

/// Script driven by the `deploy`, `setup`, `teardown` and `checks`
/// sections of a proposal description
pub struct DeclarativeScript {
    description: ProposalDescription,
}

impl DeclarativeScript {
    pub fn new(description: ProposalDescription) -> Self {
        Self { description }
    }

    async fn send_actions(
        &self,
        ctx: &ScriptContext,
        phase: &str,
        actions: &[ForkAction],
    ) -> Result<Vec<ExecutedTx>> {
        let mut transactions = Vec::with_capacity(actions.len());
        for action in actions {
            let from = resolve_target(&action.from, &ctx.registry)?;
            let call = encode_call(
                &action.target,
                &action.values,
                &action.method,
                &action.arguments,
                &ctx.registry,
            )?;
            let label = format!("{} {}.{}", phase, action.target, call.method.name());
            info!(phase = %phase, target = %action.target, "{}", action.description);

            let tx = TxRequest::call(from, call.target, call.calldata).with_value(call.value);
            transactions.push(send_as(ctx.chain.as_ref(), &label, tx).await?);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl ProposalScript for DeclarativeScript {
    async fn deploy(&self, ctx: &mut ScriptContext) -> Result<Vec<DeployedContract>> {
        let mut deployed = Vec::with_capacity(self.description.deploy.len());

        for step in &self.description.deploy {
            let artifact = ctx.artifacts.artifact(&step.artifact).await?;
            if artifact.bytecode.is_empty() {
                return Err(AppError::Validation(format!(
                    "artifact {} has no bytecode (abstract contract or interface?)",
                    step.artifact
                )));
            }

            let args = render_args(&step.args, &ctx.registry)?;
            let init_code = match &artifact.abi.constructor {
                Some(constructor) => {
                    if constructor.inputs.len() != args.len() {
                        return Err(DomainError::ArgumentCount {
                            method: format!("{} constructor", step.artifact),
                            expected: constructor.inputs.len(),
                            actual: args.len(),
                        }
                        .into());
                    }
                    let tokens = constructor
                        .inputs
                        .iter()
                        .zip(&args)
                        .map(|(param, value)| tokenize(&param.kind, value))
                        .collect::<std::result::Result<Vec<Token>, _>>()?;
                    constructor
                        .encode_input(artifact.bytecode.to_vec(), &tokens)
                        .map_err(|e| DomainError::Encoding(e.to_string()))?
                }
                None if args.is_empty() => artifact.bytecode.to_vec(),
                None => {
                    return Err(DomainError::ArgumentCount {
                        method: format!("{} constructor", step.artifact),
                        expected: 0,
                        actual: args.len(),
                    }
                    .into())
                }
            };

            let label = format!("deploy {}", step.name);
            let tx = send_as(
                ctx.chain.as_ref(),
                &label,
                TxRequest::deploy(ctx.deployer, init_code.into()),
            )
            .await?;
            let address = tx.contract_address.ok_or_else(|| {
                AppError::Simulation(format!("{} returned no contract address", label))
            })?;

            info!(name = %step.name, artifact = %step.artifact, address = ?address, "Contract deployed");
            ctx.registry.insert(
                step.name.clone(),
                ContractRecord::new(address, step.artifact.clone(), step.category),
            );
            deployed.push(DeployedContract {
                name: step.name.clone(),
                artifact: step.artifact.clone(),
                address,
                tx_hash: tx.hash,
            });
        }

        Ok(deployed)
    }

    async fn setup(&self, ctx: &mut ScriptContext) -> Result<Vec<ExecutedTx>> {
        self.send_actions(ctx, "setup", &self.description.setup).await
    }

    async fn teardown(&self, ctx: &mut ScriptContext) -> Result<Vec<ExecutedTx>> {
        self.send_actions(ctx, "teardown", &self.description.teardown)
            .await
    }

    async fn validate(&self, ctx: &ScriptContext) -> Result<Vec<CheckOutcome>> {
        Ok(run_checks(ctx.chain.as_ref(), &ctx.registry, &self.description.checks).await)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    /// Use contracts already in the registry instead of deploying
    pub skip_deploy: bool,
}

/// Everything a lifecycle run did
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub name: String,
    pub category: ProposalCategory,
    pub deployed: Vec<DeployedContract>,
    pub setup: Vec<ExecutedTx>,
    /// `None` for proposals without a governance step
    pub simulation: Option<SimulationReport>,
    pub teardown: Vec<ExecutedTx>,
    pub checks: Vec<CheckOutcome>,
}

impl UpgradeReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Runs a proposal end to end against a chain
pub struct UpgradeCoordinator {
    source: Arc<dyn ProposalSource>,
    chain: Arc<dyn Chain>,
    artifacts: Arc<dyn ArtifactStore>,
    governance: GovernanceConfig,
    deployer: Address,
}

impl UpgradeCoordinator {
    pub fn new(
        source: Arc<dyn ProposalSource>,
        chain: Arc<dyn Chain>,
        artifacts: Arc<dyn ArtifactStore>,
        governance: GovernanceConfig,
        deployer: Address,
    ) -> Self {
        Self {
            source,
            chain,
            artifacts,
            governance,
            deployer,
        }
    }

    /// Run proposal `name` with its declarative script
    pub async fn apply(&self, name: &str, options: &UpgradeOptions) -> Result<UpgradeReport> {
        let (config, description) = self.load(name).await?;
        let script = DeclarativeScript::new(description.clone());
        self.run(name, &config, &description, &script, options)
            .await
    }

    /// Run proposal `name` with a custom script
    pub async fn apply_with(
        &self,
        name: &str,
        script: &dyn ProposalScript,
        options: &UpgradeOptions,
    ) -> Result<UpgradeReport> {
        let (config, description) = self.load(name).await?;
        self.run(name, &config, &description, script, options).await
    }

    async fn load(&self, name: &str) -> Result<(ProposalConfig, ProposalDescription)> {
        let config = self
            .source
            .proposals_config()
            .await?
            .shift_remove(name)
            .ok_or_else(|| AppError::NotFound(format!("proposal {} in proposals config", name)))?;
        let description = self.source.description(name).await?;
        Ok((config, description))
    }

    async fn run(
        &self,
        name: &str,
        config: &ProposalConfig,
        description: &ProposalDescription,
        script: &dyn ProposalScript,
        options: &UpgradeOptions,
    ) -> Result<UpgradeReport> {
        info!(proposal = %name, category = %config.category, "Running proposal lifecycle");

        let mut ctx = ScriptContext {
            chain: self.chain.clone(),
            artifacts: self.artifacts.clone(),
            registry: self.source.registry().await?,
            deployer: self.deployer,
        };

        let deployed = if !config.deploy {
            Vec::new()
        } else if options.skip_deploy {
            info!(proposal = %name, "Skipping deploy, using registry addresses");
            Vec::new()
        } else {
            script.deploy(&mut ctx).await?
        };

        let setup = script.setup(&mut ctx).await?;

        let simulation = match config.category {
            ProposalCategory::None => {
                info!(proposal = %name, "No governance step for category NONE");
                None
            }
            category => {
                let proposal = construct_proposal(description, &ctx.registry)?;
                let report = Simulator::new(self.chain.clone())
                    .simulate(
                        category,
                        &proposal,
                        &self.governance,
                        &ctx.registry,
                        config.proposal_id.as_deref(),
                    )
                    .await?;
                Some(report)
            }
        };

        let teardown = script.teardown(&mut ctx).await?;
        let checks = script.validate(&ctx).await?;

        let report = UpgradeReport {
            name: name.to_string(),
            category: config.category,
            deployed,
            setup,
            simulation,
            teardown,
            checks,
        };

        if report.passed() {
            info!(proposal = %name, checks = report.checks.len(), "Proposal lifecycle passed");
        } else {
            warn!(
                proposal = %name,
                failed = report.checks.iter().filter(|c| !c.passed).count(),
                "Proposal lifecycle finished with failing checks"
            );
        }

        Ok(report)
    }
}
