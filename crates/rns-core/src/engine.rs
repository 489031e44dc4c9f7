use crate::dispatch::{submit, EventCallbacks, PreparedTransaction, TransactionFeedback, Wallet};
use crate::manifest::ops::{self, RecordChange, RegistrarTerms};
use crate::manifest::TransactionManifest;
use crate::pricing::{
    affordability, cost_breakdown, fetch_price_ladder, fetch_registrar, price_for,
    AffordabilityReport, CostBreakdown,
};
use crate::requests::{
    ClaimLocker, DomainAction, ImportDomain, RebondDomain, RecordAction, RecordBatch,
    RecordBatchRemoval, RecordRemoval, RegisterDomain, RequestRegistrar, SubdomainAction,
    SubregistryMetadata, TransferDomain, WithdrawRegistrarFees,
};
use crate::resolution::{
    self, domain_status, ensure_holds, resolve_root, subdomain_exists, AccountDomain,
    DomainDetails, DomainEntity, ResolutionError, RootDomain, StatusReport,
};
use crate::validation::{param, validate, Operation, Params, ValidationIssue};
use crate::SdkError;
use rns_gateway::Gateway;
use rns_schema::{
    domain_to_non_fungible_id, DomainName, LedgerConfig, NonFungibleId, PriceLadder,
    RecordDocket, RecordKey, ResourceAddress,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Ledger facts fixed for the lifetime of a client: configuration and the
/// bond ladder. Shared read-only between engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    pub price_ladder: PriceLadder,
}

/// Entry point for every read and write operation.
///
/// Write operations come in two forms: `prepare_*` validates, resolves,
/// prices and synthesizes a manifest without touching a wallet; the
/// unprefixed form additionally submits it through [`Engine::execute`].
pub struct Engine {
    snapshot: Arc<LedgerSnapshot>,
    gateway: Box<dyn Gateway>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(snapshot: Arc<LedgerSnapshot>, gateway: Box<dyn Gateway>) -> Self {
        Self { snapshot, gateway }
    }

    /// Validate the configuration and take the ledger snapshot. The price
    /// ladder is read from the core component unless the configuration pins one.
    pub fn connect(config: LedgerConfig, gateway: Box<dyn Gateway>) -> Result<Self, SdkError> {
        config.validate()?;
        let price_ladder = if config.price_ladder.is_empty() {
            fetch_price_ladder(gateway.as_ref(), &config)?
        } else {
            debug!("using pinned price ladder");
            config.price_ladder.clone()
        };
        info!(
            "connected to {} via {} ({} ladder entries)",
            config.network,
            config.gateway_url(),
            price_ladder.len()
        );
        Ok(Self::new(
            Arc::new(LedgerSnapshot {
                config,
                price_ladder,
            }),
            gateway,
        ))
    }

    pub fn snapshot(&self) -> &Arc<LedgerSnapshot> {
        &self.snapshot
    }

    fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    fn config(&self) -> &LedgerConfig {
        &self.snapshot.config
    }

    fn check(&self, operation: Operation, params: &mut Params) -> Result<(), SdkError> {
        validate(operation, params, self.config())
    }

    fn owned_root(&self, account: &str, name: &DomainName) -> Result<RootDomain, SdkError> {
        let root = resolve_root(self.gateway(), self.config(), name)?;
        ensure_holds(
            self.gateway(),
            account,
            &self.config().components.domain_resource,
            &root.id,
            root.name.as_str(),
        )?;
        Ok(root)
    }

    /// Pick the payment resource for `required`: the requested one if it is
    /// affordable, else the first affordable accepted resource.
    fn choose_payment(
        &self,
        account: &str,
        requested: Option<&str>,
        required: Decimal,
    ) -> Result<ResourceAddress, SdkError> {
        let candidates: Vec<ResourceAddress> = match requested {
            Some(r) => vec![ResourceAddress::from(r)],
            None => self.config().payment.accepted_resources.clone(),
        };
        let balances = self.gateway().fungible_balances(account)?;
        let report = affordability(&balances, &candidates, required);
        match report.first_sufficient() {
            Some(resource) => Ok(resource.clone()),
            None => Err(SdkError::Affordability(report)),
        }
    }

    /// Run a prepared transaction through the wallet. A preparation error is
    /// reported through `on_fail` as well.
    pub fn execute(
        &self,
        wallet: &dyn Wallet,
        hooks: &EventCallbacks<'_>,
        prepared: Result<PreparedTransaction, SdkError>,
    ) -> Result<TransactionFeedback, SdkError> {
        match prepared {
            Ok(prepared) => submit(wallet, &prepared, hooks),
            Err(e) => {
                if let Some(on_fail) = &hooks.on_fail {
                    on_fail(&e);
                }
                Err(e)
            }
        }
    }

    // --- reads ---

    pub fn domain_status(&self, domain: &str) -> Result<StatusReport, SdkError> {
        let mut params = Params::new().with(param::DOMAIN, domain);
        self.check(Operation::DomainStatus, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        domain_status(self.gateway(), self.config(), &name)
    }

    pub fn domain_details(&self, domain: &str) -> Result<DomainDetails, SdkError> {
        let mut params = Params::new().with(param::DOMAIN, domain);
        self.check(Operation::DomainDetails, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        resolution::domain_details(self.gateway(), self.config(), &name)
    }

    pub fn records(&self, domain: &str) -> Result<Vec<RecordDocket>, SdkError> {
        let mut params = Params::new().with(param::DOMAIN, domain);
        self.check(Operation::Records, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let root = resolve_root(self.gateway(), self.config(), &name)?;
        let entity = DomainEntity::resolve(self.gateway(), &root, &name)?;
        resolution::records(self.gateway(), &entity)
    }

    pub fn resolve_record(
        &self,
        domain: &str,
        context: &str,
        directive: &str,
    ) -> Result<Option<String>, SdkError> {
        let mut params = Params::new()
            .with(param::DOMAIN, domain)
            .with(param::CONTEXT, context)
            .with(param::DIRECTIVE, directive);
        self.check(Operation::ResolveRecord, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let key = RecordKey::new(
            params.require(param::CONTEXT)?,
            params.require(param::DIRECTIVE)?,
        );
        let root = resolve_root(self.gateway(), self.config(), &name)?;
        let entity = DomainEntity::resolve(self.gateway(), &root, &name)?;
        resolution::resolve_record(self.gateway(), &entity, &key)
    }

    pub fn account_domains(&self, account: &str) -> Result<Vec<AccountDomain>, SdkError> {
        let mut params = Params::new().with(param::ACCOUNT, account);
        self.check(Operation::AccountDomains, &mut params)?;
        resolution::account_domains(
            self.gateway(),
            self.config(),
            params.require(param::ACCOUNT)?,
        )
    }

    /// Bond, registrar fee and total for registering `domain`. Without a
    /// payment resource the first accepted one is quoted.
    pub fn cost_breakdown(
        &self,
        domain: &str,
        registrar_id: &str,
        payment_resource: Option<&str>,
    ) -> Result<CostBreakdown, SdkError> {
        let mut params = Params::new()
            .with(param::DOMAIN, domain)
            .with(param::REGISTRAR_ID, registrar_id)
            .with_opt(param::PAYMENT_RESOURCE, payment_resource);
        self.check(Operation::CostBreakdown, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let registrar_id = NonFungibleId::parse(params.require(param::REGISTRAR_ID)?);
        let registrar = fetch_registrar(self.gateway(), self.config(), &registrar_id)?;
        let resource = match params.get(param::PAYMENT_RESOURCE) {
            Some(r) => ResourceAddress::from(r),
            None => self.default_payment_resource()?,
        };
        cost_breakdown(
            name.as_str(),
            &self.snapshot.price_ladder,
            registrar,
            resource,
        )
    }

    fn default_payment_resource(&self) -> Result<ResourceAddress, SdkError> {
        self.config()
            .payment
            .accepted_resources
            .first()
            .cloned()
            .ok_or_else(|| rns_schema::ConfigError::NoPaymentResources.into())
    }

    /// Which accepted resources the account holds at least `required` of.
    pub fn check_affordability(
        &self,
        account: &str,
        required: Decimal,
    ) -> Result<AffordabilityReport, SdkError> {
        let mut params = Params::new().with(param::ACCOUNT, account);
        self.check(Operation::CheckAffordability, &mut params)?;
        let balances = self
            .gateway()
            .fungible_balances(params.require(param::ACCOUNT)?)?;
        Ok(affordability(
            &balances,
            &self.config().payment.accepted_resources,
            required,
        ))
    }

    // --- writes ---

    pub fn prepare_register_domain(
        &self,
        req: &RegisterDomain,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::RegisterDomain;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain)
            .with(param::REGISTRAR_ID, &req.registrar_id)
            .with_opt(param::PAYMENT_RESOURCE, req.payment_resource.as_deref());
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;

        let status = domain_status(self.gateway(), self.config(), &name)?;
        if !status.status.is_available() {
            return Err(ResolutionError::Unavailable {
                domain: name.to_string(),
                status: status.status,
            }
            .into());
        }

        let registrar_id = NonFungibleId::parse(params.require(param::REGISTRAR_ID)?);
        let registrar = fetch_registrar(self.gateway(), self.config(), &registrar_id)?;
        let quote_resource = match params.get(param::PAYMENT_RESOURCE) {
            Some(r) => ResourceAddress::from(r),
            None => self.default_payment_resource()?,
        };
        let mut cost = cost_breakdown(
            name.as_str(),
            &self.snapshot.price_ladder,
            registrar,
            quote_resource,
        )?;
        cost.payment_resource = self.choose_payment(
            account,
            params.get(param::PAYMENT_RESOURCE),
            cost.total_amount,
        )?;
        info!(
            "registering {name}: bond {} + fee {} in {}",
            cost.bond_amount, cost.registrar_fee, cost.payment_resource
        );

        let manifest = ops::register_domain(&self.config().components, account, &cost)?;
        Ok(prepared(op, manifest, format!("Register {name}")))
    }

    pub fn prepare_activate_domain(
        &self,
        req: &DomainAction,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::ActivateDomain;
        let (account, name) = self.account_and_domain(op, req)?;
        let root = self.owned_root(account, &name)?;
        if root.activated_owner.as_ref().is_some_and(|o| o == account) {
            debug!("{name} is already activated for {account}");
        }
        let manifest = ops::activate_domain(&self.config().components, account, &root)?;
        Ok(prepared(op, manifest, format!("Activate {name}")))
    }

    pub fn prepare_rebond_domain(
        &self,
        req: &RebondDomain,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::RebondDomain;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain)
            .with(param::PAYMENT_RESOURCE, &req.payment_resource);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let root = self.owned_root(account, &name)?;
        let bond = price_for(name.as_str(), &self.snapshot.price_ladder);
        let resource =
            self.choose_payment(account, params.get(param::PAYMENT_RESOURCE), bond)?;
        let manifest =
            ops::rebond_domain(&self.config().components, account, &root, &resource, bond)?;
        let message = format!("Rebond {name} in {resource}");
        Ok(prepared(op, manifest, message))
    }

    pub fn prepare_unbond_domain(
        &self,
        req: &DomainAction,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::UnbondDomain;
        let (account, name) = self.account_and_domain(op, req)?;
        let root = self.owned_root(account, &name)?;
        let manifest = ops::unbond_domain(&self.config().components, account, &root)?;
        Ok(prepared(op, manifest, format!("Unbond {name}")))
    }

    pub fn prepare_create_subdomain(
        &self,
        req: &SubdomainAction,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::CreateSubdomain;
        let (account, name, root) = self.subdomain_target(op, req)?;
        if subdomain_exists(self.gateway(), &root, name.leaf_label())? {
            return Err(ResolutionError::SubdomainExists(name.to_string()).into());
        }
        let manifest = ops::create_subdomain(
            &self.config().components,
            &account,
            &root,
            name.leaf_label(),
        )?;
        Ok(prepared(op, manifest, format!("Create {name}")))
    }

    pub fn prepare_delete_subdomain(
        &self,
        req: &SubdomainAction,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::DeleteSubdomain;
        let (account, name, root) = self.subdomain_target(op, req)?;
        if !subdomain_exists(self.gateway(), &root, name.leaf_label())? {
            return Err(ResolutionError::SubdomainNotFound(name.to_string()).into());
        }
        let manifest = ops::delete_subdomain(
            &self.config().components,
            &account,
            &root,
            name.leaf_label(),
        )?;
        Ok(prepared(op, manifest, format!("Delete {name}")))
    }

    pub fn prepare_create_record(
        &self,
        req: &RecordAction,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_batch(
            Operation::CreateRecord,
            &req.account,
            &req.domain,
            std::slice::from_ref(&req.docket),
            RecordChange::Create,
        )
    }

    pub fn prepare_amend_record(
        &self,
        req: &RecordAction,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_batch(
            Operation::AmendRecord,
            &req.account,
            &req.domain,
            std::slice::from_ref(&req.docket),
            RecordChange::Amend,
        )
    }

    pub fn prepare_delete_record(
        &self,
        req: &RecordRemoval,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_removal(
            Operation::DeleteRecord,
            &req.account,
            &req.domain,
            std::slice::from_ref(&req.key),
        )
    }

    pub fn prepare_create_records(
        &self,
        req: &RecordBatch,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_batch(
            Operation::CreateRecords,
            &req.account,
            &req.domain,
            &req.dockets,
            RecordChange::Create,
        )
    }

    pub fn prepare_amend_records(
        &self,
        req: &RecordBatch,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_batch(
            Operation::AmendRecords,
            &req.account,
            &req.domain,
            &req.dockets,
            RecordChange::Amend,
        )
    }

    pub fn prepare_delete_records(
        &self,
        req: &RecordBatchRemoval,
    ) -> Result<PreparedTransaction, SdkError> {
        self.record_removal(
            Operation::DeleteRecords,
            &req.account,
            &req.domain,
            &req.keys,
        )
    }

    pub fn prepare_update_subregistry_metadata(
        &self,
        req: &SubregistryMetadata,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::UpdateSubregistryMetadata;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain)
            .with(param::METADATA_KEY, &req.key)
            .with(param::METADATA_VALUE, &req.value);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let key = params.require(param::METADATA_KEY)?;
        let root = self.owned_root(account, &name)?;
        let manifest = ops::update_subregistry_metadata(
            &self.config().components,
            account,
            &root,
            key,
            params.require(param::METADATA_VALUE)?,
        )?;
        Ok(prepared(op, manifest, format!("Set {key} on {name}")))
    }

    pub fn prepare_replace_subregistry(
        &self,
        req: &DomainAction,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::ReplaceSubregistry;
        let (account, name) = self.account_and_domain(op, req)?;
        let root = self.owned_root(account, &name)?;
        let manifest = ops::replace_subregistry(&self.config().components, account, &root)?;
        let message = format!("Replace subregistry of {name}");
        Ok(prepared(op, manifest, message))
    }

    pub fn prepare_transfer_domain(
        &self,
        req: &TransferDomain,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::TransferDomain;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain)
            .with(param::DESTINATION, &req.destination);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let destination = params.require(param::DESTINATION)?;
        if account == destination {
            return Err(SdkError::Validation(vec![ValidationIssue::Invalid {
                param: param::DESTINATION,
                reason: "destination is the sending account".to_owned(),
            }]));
        }
        let name = parsed_name(&params, param::DOMAIN)?;
        let root = self.owned_root(account, &name)?;
        let manifest = ops::transfer_domain(
            &self.config().components,
            account,
            &root,
            destination,
            req.clean,
        )?;
        let message = format!("Transfer {name} to {destination}");
        Ok(prepared(op, manifest, message))
    }

    pub fn prepare_claim_locker(&self, req: &ClaimLocker) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::ClaimLocker;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::RESOURCE, &req.resource);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let resource = params.require(param::RESOURCE)?;
        let ids: Vec<NonFungibleId> = req
            .ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(NonFungibleId::parse)
            .collect();
        let manifest = ops::claim_locker(&self.config().components, account, resource, &ids)?;
        let message = format!("Claim {resource} from locker");
        Ok(prepared(op, manifest, message))
    }

    pub fn prepare_import_domain(
        &self,
        req: &ImportDomain,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::ImportDomain;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain)
            .with_opt(param::PAYMENT_RESOURCE, req.payment_resource.as_deref());
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let components = &self.config().components;
        ensure_holds(
            self.gateway(),
            account,
            &components.import_domain_resource,
            &domain_to_non_fungible_id(name.as_str()),
            &format!("an import unit for {name}"),
        )?;
        let bond = price_for(name.as_str(), &self.snapshot.price_ladder);
        let resource =
            self.choose_payment(account, params.get(param::PAYMENT_RESOURCE), bond)?;
        let manifest = ops::import_domain(components, account, &name, &resource, bond)?;
        Ok(prepared(op, manifest, format!("Import {name}")))
    }

    pub fn prepare_request_registrar(
        &self,
        req: &RequestRegistrar,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::RequestRegistrar;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::REGISTRAR_NAME, &req.name)
            .with(param::ICON_URL, &req.icon_url)
            .with(param::WEBSITE_URL, &req.website_url)
            .with(param::FEE_PERCENTAGE, &req.fee_percentage);
        self.check(op, &mut params)?;
        let fee = params.require(param::FEE_PERCENTAGE)?;
        let terms = RegistrarTerms {
            name: params.require(param::REGISTRAR_NAME)?.to_owned(),
            icon_url: params.require(param::ICON_URL)?.to_owned(),
            website_url: params.require(param::WEBSITE_URL)?.to_owned(),
            fee_percentage: Decimal::from_str(fee).map_err(|e| {
                SdkError::Validation(vec![ValidationIssue::Invalid {
                    param: param::FEE_PERCENTAGE,
                    reason: e.to_string(),
                }])
            })?,
        };
        let manifest = ops::request_registrar(
            &self.config().components,
            params.require(param::ACCOUNT)?,
            &terms,
        )?;
        let message = format!("Request registrar badge for {}", terms.name);
        Ok(prepared(op, manifest, message))
    }

    pub fn prepare_withdraw_registrar_fees(
        &self,
        req: &WithdrawRegistrarFees,
    ) -> Result<PreparedTransaction, SdkError> {
        let op = Operation::WithdrawRegistrarFees;
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::REGISTRAR_ID, &req.registrar_id);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?;
        let id = NonFungibleId::parse(params.require(param::REGISTRAR_ID)?);
        let components = &self.config().components;
        ensure_holds(
            self.gateway(),
            account,
            &components.registrar_badge_resource,
            &id,
            &format!("registrar badge {id}"),
        )?;
        let manifest = ops::withdraw_registrar_fees(components, account, &id)?;
        let message = format!("Withdraw fees of registrar {id}");
        Ok(prepared(op, manifest, message))
    }

    // --- shared preparation steps ---

    fn account_and_domain<'p>(
        &self,
        op: Operation,
        req: &'p DomainAction,
    ) -> Result<(&'p str, DomainName), SdkError> {
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::DOMAIN, &req.domain);
        self.check(op, &mut params)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        Ok((req.account.trim(), name))
    }

    fn subdomain_target(
        &self,
        op: Operation,
        req: &SubdomainAction,
    ) -> Result<(String, DomainName, RootDomain), SdkError> {
        let mut params = Params::new()
            .with(param::ACCOUNT, &req.account)
            .with(param::SUBDOMAIN, &req.subdomain);
        self.check(op, &mut params)?;
        let account = params.require(param::ACCOUNT)?.to_owned();
        let name = parsed_name(&params, param::SUBDOMAIN)?;
        let root = self.owned_root(&account, &name)?;
        Ok((account, name, root))
    }

    fn record_target<'r>(
        &self,
        root: &'r RootDomain,
        name: &'r DomainName,
    ) -> Result<DomainEntity<'r>, SdkError> {
        DomainEntity::resolve(self.gateway(), root, name)
    }

    /// Validate every docket, collecting issues across the whole batch. A key
    /// may appear only once per batch.
    fn checked_dockets(
        &self,
        op: Operation,
        dockets: &[RecordDocket],
    ) -> Result<Vec<RecordDocket>, SdkError> {
        if dockets.is_empty() {
            return Err(SdkError::Validation(vec![ValidationIssue::Invalid {
                param: param::CONTEXT,
                reason: "at least one record is required".to_owned(),
            }]));
        }
        let mut issues = Vec::new();
        let mut checked = Vec::with_capacity(dockets.len());
        let mut seen = HashSet::new();
        for (index, docket) in dockets.iter().enumerate() {
            let mut params = Params::new()
                .with(param::CONTEXT, &docket.context)
                .with(param::DIRECTIVE, &docket.directive)
                .with(param::VALUE, &docket.value);
            match self.check(op, &mut params) {
                Ok(()) => {
                    let docket = RecordDocket::new(
                        params.require(param::CONTEXT)?,
                        params.require(param::DIRECTIVE)?,
                        params.require(param::VALUE)?,
                    );
                    if !seen.insert(docket.key()) {
                        issues.push(ValidationIssue::DuplicateRecord {
                            param: param::RECORDS,
                            index,
                            key: docket.key(),
                        });
                    }
                    checked.push(docket);
                }
                Err(SdkError::Validation(found)) => issues.extend(found),
                Err(other) => return Err(other),
            }
        }
        if issues.is_empty() {
            Ok(checked)
        } else {
            Err(SdkError::Validation(issues))
        }
    }

    fn record_batch(
        &self,
        op: Operation,
        account: &str,
        domain: &str,
        dockets: &[RecordDocket],
        change: fn(RecordDocket) -> RecordChange,
    ) -> Result<PreparedTransaction, SdkError> {
        let mut params = Params::new()
            .with(param::ACCOUNT, account)
            .with(param::DOMAIN, domain);
        let head = self.check(op, &mut params);
        let dockets = self.checked_dockets(op, dockets);
        let (dockets, ()) = merge_issues(dockets, head)?;

        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let root = self.owned_root(account, &name)?;
        let entity = self.record_target(&root, &name)?;

        let amending = matches!(op, Operation::AmendRecord | Operation::AmendRecords);
        for docket in &dockets {
            let key = docket.key();
            let present = resolution::resolve_record(self.gateway(), &entity, &key)?.is_some();
            if amending && !present {
                return Err(ResolutionError::RecordNotFound {
                    domain: name.to_string(),
                    key,
                }
                .into());
            }
            if !amending && present {
                return Err(ResolutionError::RecordExists {
                    domain: name.to_string(),
                    key,
                }
                .into());
            }
        }

        let count = dockets.len();
        let changes: Vec<RecordChange> = dockets.into_iter().map(change).collect();
        let manifest =
            ops::record_changes(&self.config().components, account, &entity, &changes)?;
        let verb = if amending { "Amend" } else { "Set" };
        let message = format!("{verb} {count} record(s) on {name}");
        Ok(prepared(op, manifest, message))
    }

    fn record_removal(
        &self,
        op: Operation,
        account: &str,
        domain: &str,
        keys: &[RecordKey],
    ) -> Result<PreparedTransaction, SdkError> {
        let as_dockets: Vec<RecordDocket> = keys
            .iter()
            .map(|k| RecordDocket::new(k.context.clone(), k.directive.clone(), "-"))
            .collect();
        let mut params = Params::new()
            .with(param::ACCOUNT, account)
            .with(param::DOMAIN, domain);
        let head = self.check(op, &mut params);
        let checked = self.checked_dockets(op, &as_dockets);
        let (checked, ()) = merge_issues(checked, head)?;

        let account = params.require(param::ACCOUNT)?;
        let name = parsed_name(&params, param::DOMAIN)?;
        let root = self.owned_root(account, &name)?;
        let entity = self.record_target(&root, &name)?;

        let mut changes = Vec::with_capacity(checked.len());
        for docket in checked {
            let key = docket.key();
            if resolution::resolve_record(self.gateway(), &entity, &key)?.is_none() {
                return Err(ResolutionError::RecordNotFound {
                    domain: name.to_string(),
                    key,
                }
                .into());
            }
            changes.push(RecordChange::Delete(key));
        }
        let count = changes.len();
        let manifest =
            ops::record_changes(&self.config().components, account, &entity, &changes)?;
        let message = format!("Delete {count} record(s) on {name}");
        Ok(prepared(op, manifest, message))
    }
}

/// Submitting counterparts of the `prepare_*` operations.
macro_rules! submitting {
    ($($name:ident => $prepare:ident($req:ty);)*) => {
        impl Engine {
            $(
                pub fn $name(
                    &self,
                    request: &$req,
                    wallet: &dyn Wallet,
                    hooks: &EventCallbacks<'_>,
                ) -> Result<TransactionFeedback, SdkError> {
                    self.execute(wallet, hooks, self.$prepare(request))
                }
            )*
        }
    };
}

submitting! {
    register_domain => prepare_register_domain(RegisterDomain);
    activate_domain => prepare_activate_domain(DomainAction);
    rebond_domain => prepare_rebond_domain(RebondDomain);
    unbond_domain => prepare_unbond_domain(DomainAction);
    create_subdomain => prepare_create_subdomain(SubdomainAction);
    delete_subdomain => prepare_delete_subdomain(SubdomainAction);
    create_record => prepare_create_record(RecordAction);
    amend_record => prepare_amend_record(RecordAction);
    delete_record => prepare_delete_record(RecordRemoval);
    create_records => prepare_create_records(RecordBatch);
    amend_records => prepare_amend_records(RecordBatch);
    delete_records => prepare_delete_records(RecordBatchRemoval);
    update_subregistry_metadata => prepare_update_subregistry_metadata(SubregistryMetadata);
    replace_subregistry => prepare_replace_subregistry(DomainAction);
    transfer_domain => prepare_transfer_domain(TransferDomain);
    claim_locker => prepare_claim_locker(ClaimLocker);
    import_domain => prepare_import_domain(ImportDomain);
    request_registrar => prepare_request_registrar(RequestRegistrar);
    withdraw_registrar_fees => prepare_withdraw_registrar_fees(WithdrawRegistrarFees);
}

fn prepared(op: Operation, manifest: TransactionManifest, message: String) -> PreparedTransaction {
    PreparedTransaction {
        operation: op,
        manifest,
        message,
    }
}

fn parsed_name(params: &Params, name: &'static str) -> Result<DomainName, SdkError> {
    DomainName::parse(params.require(name)?).map_err(|source| {
        SdkError::Validation(vec![ValidationIssue::Name {
            param: name,
            source,
        }])
    })
}

/// Combine two validation outcomes so issues from both are reported together.
fn merge_issues<T, U>(a: Result<T, SdkError>, b: Result<U, SdkError>) -> Result<(T, U), SdkError> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(SdkError::Validation(mut x)), Err(SdkError::Validation(y))) => {
            x.extend(y);
            Err(SdkError::Validation(x))
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}
