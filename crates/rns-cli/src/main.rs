mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::manifest::ManifestOp;
use commands::{EXIT_FAILURE, EXIT_GATEWAY_ERROR, EXIT_VALIDATION_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rns",
    version,
    about = "Query the Radix Name Service and preview its transaction manifests"
)]
struct Cli {
    /// Ledger configuration file [default: ~/.config/rns/ledger.toml].
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check whether a root domain is available, taken or reserved.
    Status { domain: String },
    /// Show a domain or subdomain: id, subregistry, activation and bond.
    Details { domain: String },
    /// List the records attached to a domain or subdomain.
    Records { domain: String },
    /// Print the value of one record.
    Resolve {
        domain: String,
        context: String,
        directive: String,
    },
    /// Show the bond, registrar fee and total for registering a domain.
    Price {
        domain: String,
        /// Registrar badge id.
        #[arg(long)]
        registrar: String,
        /// Payment resource to quote in.
        #[arg(long)]
        payment: Option<String>,
    },
    /// Check which accepted payment resources cover an amount.
    Afford { account: String, amount: String },
    /// List the root domains an account holds.
    AccountDomains { account: String },
    /// Print the derived local id of a domain name (offline).
    Id {
        name: String,
        /// Treat the argument as a raw local id and print its canonical form.
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Print the transaction manifest of a write operation without submitting it.
    Manifest {
        /// Account that signs and pays.
        #[arg(long)]
        account: String,
        #[command(subcommand)]
        op: ManifestOp,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RNS_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let config = cli.config.as_deref();

    let connect = || commands::connect(config, json_output);

    let result = match cli.command {
        Commands::Status { domain } => {
            connect().and_then(|e| commands::status::run(&e, &domain, json_output))
        }
        Commands::Details { domain } => {
            connect().and_then(|e| commands::details::run(&e, &domain, json_output))
        }
        Commands::Records { domain } => {
            connect().and_then(|e| commands::records::run(&e, &domain, json_output))
        }
        Commands::Resolve {
            domain,
            context,
            directive,
        } => connect().and_then(|e| {
            commands::records::resolve(&e, &domain, &context, &directive, json_output)
        }),
        Commands::Price {
            domain,
            registrar,
            payment,
        } => connect().and_then(|e| {
            commands::price::run(&e, &domain, &registrar, payment.as_deref(), json_output)
        }),
        Commands::Afford { account, amount } => {
            connect().and_then(|e| commands::price::afford(&e, &account, &amount, json_output))
        }
        Commands::AccountDomains { account } => {
            connect().and_then(|e| commands::account_domains::run(&e, &account, json_output))
        }
        Commands::Id { name, raw: false } => commands::id::run(&name, json_output),
        Commands::Id { name, raw: true } => commands::id::format(&name, json_output),
        Commands::Manifest { account, op } => {
            connect().and_then(|e| commands::manifest::run(&e, &account, op, json_output))
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("invalid parameters:") {
                EXIT_VALIDATION_ERROR
            } else if msg.starts_with("gateway error:") {
                EXIT_GATEWAY_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
