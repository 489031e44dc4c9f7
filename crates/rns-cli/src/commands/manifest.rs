use super::{fail, json_pretty, EXIT_SUCCESS};
use clap::Subcommand;
use rns_core::requests::{
    ClaimLocker, DomainAction, ImportDomain, RebondDomain, RecordAction, RecordBatch,
    RecordBatchRemoval, RecordRemoval, RegisterDomain, RequestRegistrar, SubdomainAction,
    SubregistryMetadata, TransferDomain, WithdrawRegistrarFees,
};
use rns_core::{Engine, PreparedTransaction, SdkError};
use rns_schema::{RecordDocket, RecordKey};

/// Write operations whose manifest can be previewed.
#[derive(Debug, Subcommand)]
pub enum ManifestOp {
    /// Register and bond an available root domain.
    Register {
        domain: String,
        /// Registrar badge id.
        #[arg(long)]
        registrar: String,
        /// Payment resource; defaults to the first accepted one the account can afford.
        #[arg(long)]
        payment: Option<String>,
    },
    /// Activate ownership of a held domain.
    Activate { domain: String },
    /// Swap the bond of a held domain into another payment resource.
    Rebond {
        domain: String,
        #[arg(long)]
        payment: String,
    },
    /// Return a held domain and release its bond.
    Unbond { domain: String },
    CreateSubdomain { subdomain: String },
    DeleteSubdomain { subdomain: String },
    /// Create one record.
    SetRecord {
        domain: String,
        context: String,
        directive: String,
        value: String,
    },
    /// Change the value of an existing record.
    AmendRecord {
        domain: String,
        context: String,
        directive: String,
        value: String,
    },
    DeleteRecord {
        domain: String,
        context: String,
        directive: String,
    },
    /// Create several records, each given as context:directive=value.
    SetRecords {
        domain: String,
        #[arg(required = true, value_parser = parse_docket)]
        records: Vec<RecordDocket>,
    },
    /// Amend several records, each given as context:directive=value.
    AmendRecords {
        domain: String,
        #[arg(required = true, value_parser = parse_docket)]
        records: Vec<RecordDocket>,
    },
    /// Delete several records, each given as context:directive.
    DeleteRecords {
        domain: String,
        #[arg(required = true, value_parser = parse_key)]
        keys: Vec<RecordKey>,
    },
    /// Set a metadata entry on the domain's subregistry.
    SetMetadata {
        domain: String,
        key: String,
        value: String,
    },
    ReplaceSubregistry { domain: String },
    /// Send a held domain to another account.
    Transfer {
        domain: String,
        destination: String,
        /// Replace the subregistry first so records are not carried over.
        #[arg(long, default_value_t = false)]
        clean: bool,
    },
    /// Claim from the account locker.
    ClaimLocker {
        resource: String,
        /// Non-fungible ids to claim; omit to claim a fungible amount.
        #[arg(long = "id")]
        ids: Vec<String>,
    },
    /// Import a domain from an accepted import unit.
    Import {
        domain: String,
        #[arg(long)]
        payment: Option<String>,
    },
    /// Request a registrar badge.
    RequestRegistrar {
        name: String,
        #[arg(long)]
        icon_url: String,
        #[arg(long)]
        website_url: String,
        /// Fee percentage, 0 to 100.
        #[arg(long)]
        fee: String,
    },
    WithdrawFees { registrar: String },
}

pub fn run(engine: &Engine, account: &str, op: ManifestOp, json: bool) -> Result<u8, String> {
    let prepared = prepare(engine, account.to_owned(), op).map_err(|e| fail(&e))?;
    if json {
        println!("{}", json_pretty(&prepared)?);
    } else {
        eprintln!("# {}", prepared.message);
        print!("{}", prepared.manifest);
    }
    Ok(EXIT_SUCCESS)
}

#[allow(clippy::too_many_lines)]
fn prepare(
    engine: &Engine,
    account: String,
    op: ManifestOp,
) -> Result<PreparedTransaction, SdkError> {
    let action = |account: String, domain: String| DomainAction { account, domain };
    match op {
        ManifestOp::Register {
            domain,
            registrar,
            payment,
        } => engine.prepare_register_domain(&RegisterDomain {
            account,
            domain,
            registrar_id: registrar,
            payment_resource: payment,
        }),
        ManifestOp::Activate { domain } => engine.prepare_activate_domain(&action(account, domain)),
        ManifestOp::Rebond { domain, payment } => engine.prepare_rebond_domain(&RebondDomain {
            account,
            domain,
            payment_resource: payment,
        }),
        ManifestOp::Unbond { domain } => engine.prepare_unbond_domain(&action(account, domain)),
        ManifestOp::CreateSubdomain { subdomain } => {
            engine.prepare_create_subdomain(&SubdomainAction { account, subdomain })
        }
        ManifestOp::DeleteSubdomain { subdomain } => {
            engine.prepare_delete_subdomain(&SubdomainAction { account, subdomain })
        }
        ManifestOp::SetRecord {
            domain,
            context,
            directive,
            value,
        } => engine.prepare_create_record(&RecordAction {
            account,
            domain,
            docket: RecordDocket::new(context, directive, value),
        }),
        ManifestOp::AmendRecord {
            domain,
            context,
            directive,
            value,
        } => engine.prepare_amend_record(&RecordAction {
            account,
            domain,
            docket: RecordDocket::new(context, directive, value),
        }),
        ManifestOp::DeleteRecord {
            domain,
            context,
            directive,
        } => engine.prepare_delete_record(&RecordRemoval {
            account,
            domain,
            key: RecordKey::new(context, directive),
        }),
        ManifestOp::SetRecords { domain, records } => engine.prepare_create_records(&RecordBatch {
            account,
            domain,
            dockets: records,
        }),
        ManifestOp::AmendRecords { domain, records } => engine.prepare_amend_records(&RecordBatch {
            account,
            domain,
            dockets: records,
        }),
        ManifestOp::DeleteRecords { domain, keys } => {
            engine.prepare_delete_records(&RecordBatchRemoval {
                account,
                domain,
                keys,
            })
        }
        ManifestOp::SetMetadata { domain, key, value } => {
            engine.prepare_update_subregistry_metadata(&SubregistryMetadata {
                account,
                domain,
                key,
                value,
            })
        }
        ManifestOp::ReplaceSubregistry { domain } => {
            engine.prepare_replace_subregistry(&action(account, domain))
        }
        ManifestOp::Transfer {
            domain,
            destination,
            clean,
        } => engine.prepare_transfer_domain(&TransferDomain {
            account,
            domain,
            destination,
            clean,
        }),
        ManifestOp::ClaimLocker { resource, ids } => engine.prepare_claim_locker(&ClaimLocker {
            account,
            resource,
            ids,
        }),
        ManifestOp::Import { domain, payment } => engine.prepare_import_domain(&ImportDomain {
            account,
            domain,
            payment_resource: payment,
        }),
        ManifestOp::RequestRegistrar {
            name,
            icon_url,
            website_url,
            fee,
        } => engine.prepare_request_registrar(&RequestRegistrar {
            account,
            name,
            icon_url,
            website_url,
            fee_percentage: fee,
        }),
        ManifestOp::WithdrawFees { registrar } => {
            engine.prepare_withdraw_registrar_fees(&WithdrawRegistrarFees {
                account,
                registrar_id: registrar,
            })
        }
    }
}

/// `context:directive`
fn parse_key(s: &str) -> Result<RecordKey, String> {
    match s.split_once(':') {
        Some((context, directive)) if !context.is_empty() && !directive.is_empty() => {
            Ok(RecordKey::new(context, directive))
        }
        _ => Err(format!("expected context:directive, got '{s}'")),
    }
}

/// `context:directive=value`; the value may itself contain `:` or `=`.
fn parse_docket(s: &str) -> Result<RecordDocket, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected context:directive=value, got '{s}'"))?;
    let key = parse_key(key)?;
    Ok(RecordDocket::new(key.context, key.directive, value))
}
