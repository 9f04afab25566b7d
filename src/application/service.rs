use anyhow::Context;
use sqlx::{Sqlite, Transaction};
use tracing::{error, info};

use crate::domain::{
    Account, AccountNumber, AccountRef, Client, OwnerId, OwnerKind, Service, service_number,
};
use crate::storage::{Repository, accounts};

use super::AppError;

/// Application service providing the bank's operations.
/// This is the primary interface for any client (CLI, API, etc.).
#[derive(Clone)]
pub struct BankService {
    pub(super) repo: Repository,
}

/// A newly registered service together with its first account.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    pub service: Service,
    pub account: Account,
    /// Reference customers quote when paying this service
    pub service_number: String,
}

impl BankService {
    /// Create a new bank service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Owner operations
    // ========================

    /// Register a new client. Logins and phone numbers are unique.
    pub async fn register_client(
        &self,
        login: &str,
        name: &str,
        phone: &str,
    ) -> Result<Client, AppError> {
        // The UNIQUE constraints decide, so concurrent registrations of the
        // same login cannot both pass a separate existence check.
        let client = self
            .repo
            .save_client(login, name, phone)
            .await?
            .ok_or_else(|| AppError::OwnerAlreadyExists {
                kind: OwnerKind::Client,
                key: login.to_string(),
            })?;
        info!(client_id = client.id, login = %client.login, "Registered client");
        Ok(client)
    }

    /// Register a new service and open its first account, in one transaction.
    pub async fn register_service(&self, name: &str) -> Result<ServiceRegistration, AppError> {
        let mut tx = self.repo.begin().await?;
        let result = async {
            let service = Repository::save_service(&mut *tx, name)
                .await?
                .ok_or_else(|| AppError::OwnerAlreadyExists {
                    kind: OwnerKind::Service,
                    key: name.to_string(),
                })?;
            let account =
                super::provisioning::provision_in(&mut *tx, service.id, OwnerKind::Service)
                    .await?;
            Ok::<_, AppError>((service, account))
        }
        .await;
        let (service, account) = commit_or_rollback(tx, result, "service registration").await?;

        let service_number = service_number::encode(service.id, account.account_number)?;
        info!(
            service_id = service.id,
            name = %service.name,
            service_number = %service_number,
            "Registered service"
        );
        Ok(ServiceRegistration {
            service,
            account,
            service_number,
        })
    }

    pub async fn client(&self, id: OwnerId) -> Result<Client, AppError> {
        self.repo
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::owner_not_found(OwnerKind::Client, id))
    }

    pub async fn client_by_login(&self, login: &str) -> Result<Client, AppError> {
        self.repo
            .get_client_by_login(login)
            .await?
            .ok_or_else(|| AppError::owner_not_found(OwnerKind::Client, login))
    }

    pub async fn client_by_phone(&self, phone: &str) -> Result<Client, AppError> {
        self.repo
            .get_client_by_phone(phone)
            .await?
            .ok_or_else(|| AppError::owner_not_found(OwnerKind::Client, phone))
    }

    pub async fn service(&self, id: OwnerId) -> Result<Service, AppError> {
        self.repo
            .get_service(id)
            .await?
            .ok_or_else(|| AppError::owner_not_found(OwnerKind::Service, id))
    }

    // ========================
    // Account queries
    // ========================

    /// Get a single account with its current balance.
    pub async fn account(&self, account: AccountRef) -> Result<Account, AppError> {
        let mut conn = self.repo.acquire().await?;
        accounts::get_account(&mut conn, &account)
            .await?
            .ok_or(AppError::AccountNotFound(account))
    }

    /// List an owner's accounts in account-number order.
    pub async fn list_accounts(
        &self,
        kind: OwnerKind,
        owner_id: OwnerId,
    ) -> Result<Vec<Account>, AppError> {
        let mut conn = self.repo.acquire().await?;
        if !accounts::owner_exists(&mut conn, kind, owner_id).await? {
            return Err(AppError::owner_not_found(kind, owner_id));
        }
        Ok(accounts::list_accounts(&mut conn, kind, owner_id).await?)
    }

    /// Service number of an existing service account.
    pub async fn service_number(
        &self,
        service_id: OwnerId,
        account_number: AccountNumber,
    ) -> Result<String, AppError> {
        let account = self
            .account(AccountRef::service(service_id, account_number))
            .await?;
        Ok(service_number::encode(account.owner_id, account.account_number)?)
    }

    /// Direct access to the store, for seeding and administrative tooling.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }
}

/// Commit on success, roll back on failure, and hand the result through.
pub(super) async fn commit_or_rollback<T>(
    tx: Transaction<'static, Sqlite>,
    result: Result<T, AppError>,
    operation: &str,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .with_context(|| format!("Failed to commit {}", operation))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
