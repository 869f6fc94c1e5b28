//! # Deployment
//!
//! One-shot bootstrap: create an authority, bind it to the controller,
//! create a vault, bind it to the authority. The order matters: a vault
//! initialized against an authority with no controller would verify nothing.

use std::sync::Arc;

use thiserror::Error;
use warden_protocol::host::HostLedger;
use warden_protocol::identity::AccountId;

use crate::authority::{AuthorityError, AuthorizationAuthority};
use crate::ledger::AuthorizationLedger;
use crate::vault::{VaultCore, VaultError};

/// Errors during deployment.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("authority setup failed: {0}")]
    Authority(#[from] AuthorityError),

    #[error("vault setup failed: {0}")]
    Vault(#[from] VaultError),
}

/// A freshly deployed authority/vault pair.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Identity of the authority component, derived from the vault label.
    pub authority_identity: AccountId,
    pub authority: Arc<AuthorizationAuthority>,
    pub vault: Arc<VaultCore>,
}

/// Deploy with an in-memory replay ledger.
pub fn deploy(
    host: Arc<dyn HostLedger>,
    controller: AccountId,
    vault_label: &str,
) -> Result<Deployment, DeploymentError> {
    deploy_with_ledger(host, controller, vault_label, AuthorizationLedger::in_memory())
}

/// Deploy over a caller-supplied ledger.
pub fn deploy_with_ledger(
    host: Arc<dyn HostLedger>,
    controller: AccountId,
    vault_label: &str,
    ledger: AuthorizationLedger,
) -> Result<Deployment, DeploymentError> {
    let context = host.context_id();

    let authority = Arc::new(AuthorizationAuthority::new());
    authority.initialize(controller)?;

    let vault = Arc::new(VaultCore::with_ledger(
        vault_identity(vault_label),
        host,
        ledger,
    ));
    vault.initialize(authority.clone())?;

    let authority_identity = AccountId::from_label(&format!("authority/{}", vault_label));
    tracing::info!(
        %context,
        %controller,
        authority = %authority_identity,
        vault = %vault.identity(),
        "deployment complete"
    );

    Ok(Deployment {
        authority_identity,
        authority,
        vault,
    })
}

/// The identity a vault deployed under `label` receives.
pub fn vault_identity(label: &str) -> AccountId {
    AccountId::from_label(&format!("vault/{}", label))
}
