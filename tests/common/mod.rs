// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankcore::application::BankService;
use bankcore::domain::{AccountRef, Cents, Client, OwnerKind};
use bankcore::storage::accounts;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BankService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BankService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Seed a balance directly in the store. The bank has no deposit operation,
/// so tests put money in place the way an administrator would.
pub async fn fund(service: &BankService, account: AccountRef, amount: Cents) -> Result<()> {
    let mut conn = service.repository().acquire().await?;
    assert!(
        accounts::set_balance(&mut conn, &account, amount).await?,
        "no account {account} to fund"
    );
    Ok(())
}

/// Current balance of an account, read straight from the store.
pub async fn balance(service: &BankService, account: AccountRef) -> Result<Cents> {
    Ok(service.account(account).await?.balance)
}

/// Register a client and open `accounts` accounts for them.
pub async fn client_with_accounts(
    service: &BankService,
    login: &str,
    phone: &str,
    accounts: usize,
) -> Result<Client> {
    let client = service.register_client(login, login, phone).await?;
    for _ in 0..accounts {
        service.provision_account(client.id, OwnerKind::Client).await?;
    }
    Ok(client)
}

/// Test fixture: two clients with one account each, 100.00 and 0.00.
pub struct TwoClients {
    pub alice: AccountRef,
    pub bob: AccountRef,
}

impl TwoClients {
    pub async fn create(service: &BankService) -> Result<Self> {
        let alice = client_with_accounts(service, "alice", "+100", 1).await?;
        let bob = client_with_accounts(service, "bob", "+200", 1).await?;
        let fixture = Self {
            alice: AccountRef::client(alice.id, 0),
            bob: AccountRef::client(bob.id, 0),
        };
        fund(service, fixture.alice, 10_000).await?;
        Ok(fixture)
    }
}
