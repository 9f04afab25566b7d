use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::application::BankService;
use crate::domain::{
    Account, AccountNumber, AccountRef, OwnerId, OwnerKind, TransferRequest, format_cents,
    parse_cents, service_number,
};

/// Bankcore - client and service accounts, transfers and bill payments
#[derive(Parser)]
#[command(name = "bankcore")]
#[command(about = "Provision bank accounts and move money between them")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BANKCORE_DATABASE", default_value = "bank.db")]
    pub database: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Client management commands
    #[command(subcommand)]
    Client(ClientCommands),

    /// Service (payee) management commands
    #[command(subcommand)]
    Service(ServiceCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two client accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Sender as CLIENT_ID:ACCOUNT_NUMBER
        #[arg(long, value_parser = parse_account_address)]
        from: (OwnerId, AccountNumber),

        /// Receiver as CLIENT_ID:ACCOUNT_NUMBER
        #[arg(long, value_parser = parse_account_address)]
        to: (OwnerId, AccountNumber),
    },

    /// Pay a bill to a service by its service number
    Pay {
        /// Service number printed on the bill
        service_number: String,

        /// Amount to pay (e.g., "50.00" or "50")
        amount: String,

        /// Payer as CLIENT_ID:ACCOUNT_NUMBER
        #[arg(long, value_parser = parse_account_address)]
        from: (OwnerId, AccountNumber),
    },

    /// Encode or decode service numbers
    #[command(subcommand)]
    ServiceNumber(ServiceNumberCommands),
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a new client
    Add {
        /// Login (must be unique)
        login: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Phone number (must be unique)
        #[arg(short, long)]
        phone: String,
    },

    /// Show a client looked up by login or phone number
    Show {
        /// Client login
        #[arg(conflicts_with = "phone", required_unless_present = "phone")]
        login: Option<String>,

        /// Look up by phone number instead
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// Register a new service and open its first account
    Add {
        /// Service name (must be unique)
        name: String,
    },

    /// Show a service with its accounts and service numbers
    Show {
        /// Service id
        id: OwnerId,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account for a client or service
    Open {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// List the accounts of a client or service
    List {
        #[command(flatten)]
        owner: OwnerArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ServiceNumberCommands {
    /// Build the service number for a service account
    Encode {
        service_id: OwnerId,
        account_number: AccountNumber,
    },

    /// Split a service number into service id and account number
    Decode { service_number: String },
}

/// Selects exactly one owner.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct OwnerArgs {
    /// Client id
    #[arg(long)]
    client: Option<OwnerId>,

    /// Service id
    #[arg(long)]
    service: Option<OwnerId>,
}

impl OwnerArgs {
    fn resolve(&self) -> Result<(OwnerKind, OwnerId)> {
        match (self.client, self.service) {
            (Some(id), None) => Ok((OwnerKind::Client, id)),
            (None, Some(id)) => Ok((OwnerKind::Service, id)),
            _ => bail!("Specify exactly one of --client or --service"),
        }
    }
}

/// Parse "OWNER:ACCOUNT" into its two integers.
fn parse_account_address(input: &str) -> Result<(OwnerId, AccountNumber), String> {
    let (owner, account) = input
        .split_once(':')
        .ok_or_else(|| format!("expected OWNER:ACCOUNT, got '{}'", input))?;
    let owner = owner
        .trim()
        .parse()
        .map_err(|_| format!("invalid owner id '{}'", owner))?;
    let account = account
        .trim()
        .parse()
        .map_err(|_| format!("invalid account number '{}'", account))?;
    Ok((owner, account))
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                BankService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Client(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_client_command(&service, cmd).await?;
            }

            Commands::Service(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_service_command(&service, cmd).await?;
            }

            Commands::Account(cmd) => {
                let service = BankService::connect(&self.database).await?;
                run_account_command(&service, cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = BankService::connect(&self.database).await?;
                let amount =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                service
                    .transfer(TransferRequest::to_client(amount, from, to))
                    .await?;

                println!(
                    "Transferred {} from {} to {}",
                    format_cents(amount),
                    AccountRef::client(from.0, from.1),
                    AccountRef::client(to.0, to.1)
                );
            }

            Commands::Pay {
                service_number,
                amount,
                from,
            } => {
                let service = BankService::connect(&self.database).await?;
                let amount =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                service
                    .pay_bill(&service_number, amount, from.0, from.1)
                    .await?;

                println!(
                    "Paid {} to service number {}",
                    format_cents(amount),
                    service_number
                );
            }

            Commands::ServiceNumber(cmd) => match cmd {
                ServiceNumberCommands::Encode {
                    service_id,
                    account_number,
                } => {
                    println!("{}", service_number::encode(service_id, account_number)?);
                }
                ServiceNumberCommands::Decode { service_number } => {
                    let (service_id, account_number) = service_number::decode(&service_number)?;
                    println!("service {} account {}", service_id, account_number);
                }
            },
        }

        Ok(())
    }
}

async fn run_client_command(service: &BankService, cmd: ClientCommands) -> Result<()> {
    match cmd {
        ClientCommands::Add { login, name, phone } => {
            let client = service.register_client(&login, &name, &phone).await?;
            println!("Registered client '{}' (id {})", client.login, client.id);
        }

        ClientCommands::Show { login, phone } => {
            let client = match (login, phone) {
                (Some(login), _) => service.client_by_login(&login).await?,
                (None, Some(phone)) => service.client_by_phone(&phone).await?,
                (None, None) => bail!("Specify a login or --phone"),
            };
            println!("Client:  {} (id {})", client.login, client.id);
            println!("Name:    {}", client.name);
            println!("Phone:   {}", client.phone);
            println!("Since:   {}", client.created_at.format("%Y-%m-%d"));

            let accounts = service.list_accounts(OwnerKind::Client, client.id).await?;
            println!();
            print_accounts(&accounts);
        }
    }
    Ok(())
}

async fn run_service_command(service: &BankService, cmd: ServiceCommands) -> Result<()> {
    match cmd {
        ServiceCommands::Add { name } => {
            let registration = service.register_service(&name).await?;
            println!(
                "Registered service '{}' (id {})",
                registration.service.name, registration.service.id
            );
            println!("Service number: {}", registration.service_number);
        }

        ServiceCommands::Show { id } => {
            let svc = service.service(id).await?;
            println!("Service: {} (id {})", svc.name, svc.id);

            let accounts = service.list_accounts(OwnerKind::Service, svc.id).await?;
            println!();
            print_accounts(&accounts);
        }
    }
    Ok(())
}

async fn run_account_command(service: &BankService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Open { owner } => {
            let (kind, owner_id) = owner.resolve()?;
            let account = service.provision_account(owner_id, kind).await?;
            println!(
                "Opened account {} for {} {}",
                account.account_number, kind, owner_id
            );
            if let Some(number) = account.service_number() {
                println!("Service number: {}", number?);
            }
        }

        AccountCommands::List { owner, json } => {
            let (kind, owner_id) = owner.resolve()?;
            let accounts = service.list_accounts(kind, owner_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else {
                print_accounts(&accounts);
            }
        }
    }
    Ok(())
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts.");
        return;
    }

    println!("{:<8} {:>15} {:<15}", "NUMBER", "BALANCE", "SERVICE NUMBER");
    println!("{}", "-".repeat(40));
    for account in accounts {
        let reference = match account.service_number() {
            Some(Ok(number)) => number,
            Some(Err(_)) | None => "-".to_string(),
        };
        println!(
            "{:<8} {:>15} {:<15}",
            account.account_number,
            format_cents(account.balance),
            reference
        );
    }
}
