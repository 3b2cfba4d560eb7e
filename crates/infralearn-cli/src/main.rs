use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use dotenvy::dotenv;
use validator::Validate;

use infralearn_auth::Role;
use infralearn_config::{AccountPolicy, AdminSeedConfig, DatabaseConfig};
use infralearn_core::hash_password;
use infralearn_db::{PgStore, SeedOutcome, Store, init_db_pool, run_migrations, seed_admin};
use infralearn_models::users::{CreateUserDto, NewIdentity};
use infralearn_models::validation::describe;

#[derive(Parser)]
#[command(name = "infralearn-cli")]
#[command(about = "InfraLearn CLI - Administrative tools for InfraLearn", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the super administrator account if it does not exist yet
    SeedAdmin {
        /// Username (defaults to ADMIN_USERNAME or "admin")
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Email address (defaults to ADMIN_EMAIL)
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Display name (defaults to ADMIN_NAME)
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Password (falls back to ADMIN_PASSWORD, then a secure prompt)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create an account with any role
    CreateUser {
        #[arg(short = 'u', long)]
        username: Option<String>,

        #[arg(short = 'n', long)]
        name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// super_admin, professor or student
        #[arg(short = 'r', long)]
        role: Option<Role>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// List accounts, optionally filtered by role
    ListUsers {
        #[arg(short = 'r', long)]
        role: Option<Role>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let store = connect().await?;

    match command {
        Commands::Migrate => {
            println!("✅ Database is up to date");
            Ok(())
        }
        Commands::SeedAdmin {
            username,
            email,
            name,
            password,
        } => handle_seed_admin(&store, username, email, name, password).await,
        Commands::CreateUser {
            username,
            name,
            email,
            role,
            password,
        } => handle_create_user(&store, username, name, email, role, password).await,
        Commands::ListUsers { role } => handle_list_users(&store, role).await,
    }
}

/// The CLI always talks to Postgres; the in-memory store would lose
/// everything on exit.
async fn connect() -> anyhow::Result<PgStore> {
    let config = DatabaseConfig::from_env();
    let Some(url) = config.url else {
        bail!("DATABASE_URL must be set");
    };

    let pool = init_db_pool(&url, config.max_connections.min(5))
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(PgStore::new(pool))
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::new().with_prompt(label).interact_text()?),
    }
}

fn prompt_password(value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?),
    }
}

async fn handle_seed_admin(
    store: &PgStore,
    username: Option<String>,
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let defaults = AdminSeedConfig::from_env();
    let password = match password.or(defaults.password) {
        Some(password) => password,
        None => prompt_password(None)?,
    };

    let config = AdminSeedConfig {
        username: username.unwrap_or(defaults.username),
        email: email.unwrap_or(defaults.email),
        name: name.unwrap_or(defaults.name),
        password: Some(password),
    };

    let policy = AccountPolicy::from_env();
    match seed_admin(store, &config, policy.bcrypt_cost).await? {
        SeedOutcome::Created(identity) => {
            println!("\n✅ Super administrator created successfully!");
            println!("   Username: {}", identity.username);
            println!("   Email: {}", identity.email);
        }
        SeedOutcome::AlreadyPresent => {
            println!("\nℹ️  Account '{}' already exists, nothing to do", config.username);
        }
        SeedOutcome::Skipped => bail!("No administrator password provided"),
    }
    Ok(())
}

async fn handle_create_user(
    store: &PgStore,
    username: Option<String>,
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let username = prompt(username, "Username")?;
    let name = prompt(name, "Full name")?;
    let email = prompt(email, "Email address")?;
    let role = match role {
        Some(role) => role,
        None => {
            let labels: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
            let index = Select::new()
                .with_prompt("Role")
                .items(&labels)
                .default(2)
                .interact()?;
            Role::ALL[index]
        }
    };
    let password = prompt_password(password)?;

    let dto = CreateUserDto {
        username,
        name,
        email,
        password,
        role,
    };
    if let Err(errors) = dto.validate() {
        bail!(describe(&errors));
    }

    let policy = AccountPolicy::from_env();
    let identity = store
        .register(NewIdentity {
            username: dto.username,
            name: dto.name,
            email: dto.email,
            role: dto.role,
            password_hash: hash_password(&dto.password, policy.bcrypt_cost)?,
        })
        .await?;

    println!("\n✅ User created successfully!");
    println!("   ID: {}", identity.id);
    println!("   Username: {}", identity.username);
    println!("   Role: {}", identity.role);
    Ok(())
}

async fn handle_list_users(store: &PgStore, role: Option<Role>) -> anyhow::Result<()> {
    let users = store.list_identities(role).await?;

    if users.is_empty() {
        println!("No users found");
        return Ok(());
    }

    println!("{:<36}  {:<20}  {:<12}  {}", "ID", "USERNAME", "ROLE", "EMAIL");
    for user in users {
        println!(
            "{:<36}  {:<20}  {:<12}  {}",
            user.id,
            user.username,
            user.role.as_str(),
            user.email
        );
    }
    Ok(())
}
