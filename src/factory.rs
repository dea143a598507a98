//! DAO factory: the public entry point.
//!
//! Wires the proposal registry, the allocation calculator and the deployment
//! orchestrator behind one API. `deploy()` is the only operation that touches
//! the chain; every rejection it can produce before DEPLOYING leaves the
//! proposal untouched.

use crate::chain::ChainClient;
use crate::config::{ConfigError, FactoryConfig};
use crate::dao::address::contract_principal;
use crate::dao::{
    token_allocations, ConfigOverrides, Network, Proposal, ProposalRegistry, ProposalStatus,
    RegistryError, TokenAllocation,
};
use crate::deploy::{
    ClarityTemplates, ContractKind, ContractTemplates, DeployError, DeploymentResult,
    Orchestrator,
};
use std::sync::Arc;
use tracing::{error, info};

/// Coarse error classification for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input; retrying with the same input fails again
    Validation,
    /// Operation not allowed in the proposal's current state
    State,
    /// Chain or network failure
    Remote,
    /// Operator configuration problem
    Config,
}

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Preflight check failed: {0}")]
    Preflight(#[source] DeployError),
}

impl FactoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FactoryError::Registry(err) => match err {
                RegistryError::CapacityExceeded { .. }
                | RegistryError::Duplicate(_)
                | RegistryError::InvalidAddress { .. } => ErrorKind::Validation,
                RegistryError::NotFound(_)
                | RegistryError::InvalidState { .. }
                | RegistryError::ThresholdNotMet { .. }
                | RegistryError::AlreadyDeployed(_) => ErrorKind::State,
            },
            FactoryError::Config(err) => match err {
                ConfigError::Invalid(_)
                | ConfigError::InvalidSplits { .. }
                | ConfigError::ParticipantBounds { .. } => ErrorKind::Validation,
                ConfigError::MissingCredentials(_)
                | ConfigError::InvalidCredentials(_)
                | ConfigError::Io { .. }
                | ConfigError::Parse { .. } => ErrorKind::Config,
            },
            FactoryError::Preflight(_) => ErrorKind::Remote,
        }
    }
}

pub struct DaoFactory<C: ?Sized, T = ClarityTemplates> {
    config: FactoryConfig,
    registry: Arc<ProposalRegistry>,
    orchestrator: Arc<Orchestrator<C, T>>,
}

impl<C, T> DaoFactory<C, T>
where
    C: ChainClient + ?Sized + 'static,
    T: ContractTemplates + 'static,
{
    /// Build a factory. Fails if the deployer credentials are missing or do
    /// not match the configured network.
    pub fn new(config: FactoryConfig, chain: Arc<C>, templates: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let deployer = config.deployer_address()?.to_string();
        let policy = config.deployment_policy()?;
        let network = config.network.network;

        info!(%network, deployer = %deployer, "dao factory ready");

        Ok(Self {
            registry: Arc::new(ProposalRegistry::new(network)),
            orchestrator: Arc::new(Orchestrator::new(chain, templates, deployer, policy)),
            config,
        })
    }

    pub fn network(&self) -> Network {
        self.registry.network()
    }

    pub fn deployer(&self) -> &str {
        self.orchestrator.sender()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Create a proposal from the operator defaults plus `overrides`.
    pub async fn create_proposal(
        &self,
        discussion_ref: impl Into<String>,
        proposer: impl Into<String>,
        proposer_name: impl Into<String>,
        overrides: ConfigOverrides,
    ) -> Result<u64, FactoryError> {
        let config = self.config.dao.with_overrides(overrides)?;
        let proposer = proposer.into();

        let network = self.network();
        if !network.is_valid_address(&proposer) {
            return Err(RegistryError::InvalidAddress {
                address: proposer,
                network,
            }
            .into());
        }

        let id = self
            .registry
            .create_proposal(discussion_ref.into(), proposer, proposer_name.into(), config)
            .await;
        Ok(id)
    }

    pub async fn add_participant(
        &self,
        id: u64,
        address: impl Into<String>,
        name: impl Into<String>,
        verified: bool,
        external_ref: Option<String>,
    ) -> Result<ProposalStatus, FactoryError> {
        Ok(self
            .registry
            .add_participant(id, address.into(), name.into(), verified, external_ref)
            .await?)
    }

    pub async fn finalize_allocations(&self, id: u64) -> bool {
        self.registry.finalize_allocations(id).await
    }

    pub async fn proposal(&self, id: u64) -> Option<Proposal> {
        self.registry.get(id).await
    }

    pub async fn proposals(&self) -> Vec<Proposal> {
        self.registry.list().await
    }

    /// Allocation table for the proposal as it stands now.
    ///
    /// Before deployment the treasury recipient is the address the treasury
    /// contract will be deployed at.
    pub async fn allocations(&self, id: u64) -> Result<Vec<TokenAllocation>, FactoryError> {
        let proposal = self
            .registry
            .get(id)
            .await
            .ok_or(RegistryError::NotFound(id))?;

        let treasury = match proposal.contracts.get(&ContractKind::Treasury) {
            Some(address) => address.clone(),
            None => contract_principal(
                self.deployer(),
                &ContractKind::Treasury.contract_name(&proposal.config.contract_slug()),
            ),
        };

        Ok(token_allocations(
            &proposal,
            &treasury,
            &self.orchestrator.policy().verifier,
        ))
    }

    /// Deploy the proposal's contracts and distribute its tokens.
    ///
    /// Rejections (unknown id, wrong state, threshold, preflight) return
    /// `Err` with no state change. Once DEPLOYING is reached the outcome is
    /// always `Ok`: check `success` on the result, which is also stored on
    /// the proposal.
    ///
    /// The pipeline runs on its own task. Dropping the returned future does
    /// not stop it: the proposal still reaches DEPLOYED or FAILED, at the
    /// latest when the deployment deadline expires.
    pub async fn deploy(&self, id: u64) -> Result<DeploymentResult, FactoryError> {
        self.registry.check_deployable(id).await?;

        self.orchestrator
            .preflight()
            .await
            .map_err(FactoryError::Preflight)?;

        let plan = self.registry.begin_deployment(id).await?;

        let registry = Arc::clone(&self.registry);
        let orchestrator = Arc::clone(&self.orchestrator);
        let pipeline = tokio::spawn(async move {
            let result = orchestrator.run(&plan).await;
            registry.complete_deployment(id, &result).await.map(|_| result)
        });

        match pipeline.await {
            Ok(outcome) => Ok(outcome?),
            Err(err) => {
                error!(proposal_id = id, error = %err, "deployment task aborted");
                let result = DeploymentResult {
                    error: Some(format!("Deployment task aborted: {}", err)),
                    ..DeploymentResult::default()
                };
                self.registry.complete_deployment(id, &result).await?;
                Ok(result)
            }
        }
    }
}
