//! Parameter normalization and validation.
//!
//! Every operation runs its parameters through the same pipeline: look up the
//! rule for `(operation, parameter)`, falling back to the parameter's default
//! rule; report a missing value, or normalize then validate a present one.
//! Issues from all parameters are collected before failing, so a caller sees
//! every problem at once.

use crate::SdkError;
use rns_schema::{
    classify_id, format_id, normalize_name, validate_address, validate_entity_name,
    validate_root_name, AddressError, EntityKind, IdKind, LedgerConfig, NameError, NameKind,
    RecordKey,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Parameter names shared by the operations.
pub mod param {
    pub const DOMAIN: &str = "domain";
    pub const SUBDOMAIN: &str = "subdomain";
    pub const ACCOUNT: &str = "account";
    pub const DESTINATION: &str = "destination";
    pub const PAYMENT_RESOURCE: &str = "payment_resource";
    pub const RESOURCE: &str = "resource";
    pub const REGISTRAR_ID: &str = "registrar_id";
    pub const REGISTRAR_NAME: &str = "registrar_name";
    pub const FEE_PERCENTAGE: &str = "fee_percentage";
    pub const ICON_URL: &str = "icon_url";
    pub const WEBSITE_URL: &str = "website_url";
    pub const CONTEXT: &str = "context";
    pub const DIRECTIVE: &str = "directive";
    pub const VALUE: &str = "value";
    pub const METADATA_KEY: &str = "metadata_key";
    pub const METADATA_VALUE: &str = "metadata_value";
    pub const RECORDS: &str = "records";
}

const MAX_RECORD_FIELD_LEN: usize = 256;
const MAX_REGISTRAR_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    DomainStatus,
    DomainDetails,
    Records,
    ResolveRecord,
    AccountDomains,
    CostBreakdown,
    CheckAffordability,
    RegisterDomain,
    ActivateDomain,
    RebondDomain,
    UnbondDomain,
    CreateSubdomain,
    DeleteSubdomain,
    CreateRecord,
    AmendRecord,
    DeleteRecord,
    CreateRecords,
    AmendRecords,
    DeleteRecords,
    UpdateSubregistryMetadata,
    ReplaceSubregistry,
    TransferDomain,
    ClaimLocker,
    ImportDomain,
    RequestRegistrar,
    WithdrawRegistrarFees,
}

impl Operation {
    /// Operations whose `domain` must name a root.
    fn takes_root_domain(self) -> bool {
        matches!(
            self,
            Self::DomainStatus
                | Self::CostBreakdown
                | Self::RegisterDomain
                | Self::ActivateDomain
                | Self::RebondDomain
                | Self::UnbondDomain
                | Self::UpdateSubregistryMetadata
                | Self::ReplaceSubregistry
                | Self::TransferDomain
                | Self::ImportDomain
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("{param} is required")]
    Missing { param: &'static str },
    #[error("{param}: {source}")]
    Name {
        param: &'static str,
        source: NameError,
    },
    #[error("{param}: {source}")]
    Address {
        param: &'static str,
        source: AddressError,
    },
    #[error("{param}: {reason}")]
    Invalid { param: &'static str, reason: String },
    #[error("{param}[{index}]: duplicate record key {key}")]
    DuplicateRecord {
        param: &'static str,
        index: usize,
        key: RecordKey,
    },
}

impl ValidationIssue {
    pub fn param(&self) -> &'static str {
        match self {
            Self::Missing { param }
            | Self::Name { param, .. }
            | Self::Address { param, .. }
            | Self::Invalid { param, .. }
            | Self::DuplicateRecord { param, .. } => param,
        }
    }

    fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            param,
            reason: reason.into(),
        }
    }
}

/// What a rule may consult besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub operation: Operation,
    pub config: &'a LedgerConfig,
}

pub type NormalizeFn = fn(&str) -> String;
pub type ValidateFn = fn(&'static str, &str, &RuleContext<'_>) -> Result<(), Vec<ValidationIssue>>;
pub type MissingFn = fn(&'static str) -> ValidationIssue;

/// Per-parameter hooks. Absent hooks mean "leave as is", "accept" and the
/// generic "is required" issue respectively.
#[derive(Clone, Copy, Default)]
pub struct ParamRule {
    pub normalize: Option<NormalizeFn>,
    pub validate: Option<ValidateFn>,
    pub missing: Option<MissingFn>,
}

impl fmt::Debug for ParamRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamRule")
            .field("normalize", &self.normalize.is_some())
            .field("validate", &self.validate.is_some())
            .field("missing", &self.missing.is_some())
            .finish()
    }
}

/// Named parameter values for one call. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(&'static str, Option<String>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, name: &'static str, value: impl Into<String>) -> Self {
        self.with_opt(name, Some(value))
    }

    #[must_use]
    pub fn with_opt<S: Into<String>>(mut self, name: &'static str, value: Option<S>) -> Self {
        let value = value.map(Into::into).filter(|v| !v.trim().is_empty());
        self.values.push((name, value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// A value the pipeline already checked for presence.
    pub fn require(&self, name: &'static str) -> Result<&str, SdkError> {
        self.get(name)
            .ok_or_else(|| SdkError::Validation(vec![ValidationIssue::Missing { param: name }]))
    }
}

/// Rule for a parameter: the operation's override, else the default.
pub fn rule_for(operation: Operation, name: &str) -> Option<ParamRule> {
    method_rule(operation, name).or_else(|| default_rule(name))
}

fn method_rule(operation: Operation, name: &str) -> Option<ParamRule> {
    match name {
        param::DOMAIN if operation.takes_root_domain() => Some(ParamRule {
            normalize: Some(normalize_name),
            validate: Some(check_root_domain),
            missing: Some(missing_domain),
        }),
        _ => None,
    }
}

fn rule(normalize: NormalizeFn, validate: ValidateFn) -> ParamRule {
    ParamRule {
        normalize: Some(normalize),
        validate: Some(validate),
        missing: None,
    }
}

fn trim(s: &str) -> String {
    s.trim().to_owned()
}

fn normalize_id(s: &str) -> String {
    format_id(s.trim())
}

fn default_rule(name: &str) -> Option<ParamRule> {
    Some(match name {
        param::DOMAIN => ParamRule {
            missing: Some(missing_domain),
            ..rule(normalize_name, check_entity)
        },
        param::SUBDOMAIN => rule(normalize_name, check_subdomain),
        param::ACCOUNT | param::DESTINATION => rule(trim, check_account),
        param::PAYMENT_RESOURCE => rule(trim, check_payment_resource),
        param::RESOURCE => rule(trim, check_resource),
        param::REGISTRAR_ID => rule(normalize_id, check_registrar_id),
        param::FEE_PERCENTAGE => rule(trim, check_fee_percentage),
        param::REGISTRAR_NAME => rule(trim, check_registrar_name),
        param::ICON_URL | param::WEBSITE_URL => rule(trim, check_url),
        param::CONTEXT | param::DIRECTIVE | param::METADATA_KEY => rule(trim, check_record_field),
        param::VALUE | param::METADATA_VALUE => ParamRule {
            validate: Some(check_record_field),
            ..ParamRule::default()
        },
        _ => return None,
    })
}

/// Normalize and validate every parameter, collecting all issues.
pub fn validate(
    operation: Operation,
    params: &mut Params,
    config: &LedgerConfig,
) -> Result<(), SdkError> {
    let ctx = RuleContext { operation, config };
    let mut issues = Vec::new();
    for (name, value) in &mut params.values {
        let name: &'static str = *name;
        let Some(rule) = rule_for(operation, name) else {
            continue;
        };
        match value {
            None => issues.push(
                rule.missing
                    .map_or(ValidationIssue::Missing { param: name }, |m| m(name)),
            ),
            Some(v) => {
                if let Some(normalize) = rule.normalize {
                    *v = normalize(v);
                }
                if let Some(check) = rule.validate {
                    if let Err(found) = check(name, v, &ctx) {
                        issues.extend(found);
                    }
                }
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        debug!("{operation}: {} validation issue(s)", issues.len());
        Err(SdkError::Validation(issues))
    }
}

fn missing_domain(param: &'static str) -> ValidationIssue {
    ValidationIssue::invalid(param, "a domain name such as example.xrd is required")
}

fn name_issue(param: &'static str, source: NameError) -> Vec<ValidationIssue> {
    vec![ValidationIssue::Name { param, source }]
}

fn check_root_domain(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    validate_root_name(v).map_err(|e| name_issue(param, e))
}

fn check_entity(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    validate_entity_name(v)
        .map(|_| ())
        .map_err(|e| name_issue(param, e))
}

fn check_subdomain(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    match validate_entity_name(v) {
        Ok(NameKind::Sub) => Ok(()),
        Ok(NameKind::Root) => Err(vec![ValidationIssue::invalid(
            param,
            format!("'{v}' is a root domain, expected label.root.xrd"),
        )]),
        Err(e) => Err(name_issue(param, e)),
    }
}

fn check_address(
    param: &'static str,
    v: &str,
    kind: EntityKind,
    ctx: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    validate_address(v, kind, ctx.config.network)
        .map_err(|source| vec![ValidationIssue::Address { param, source }])
}

fn check_account(
    param: &'static str,
    v: &str,
    ctx: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    check_address(param, v, EntityKind::Account, ctx)
}

fn check_resource(
    param: &'static str,
    v: &str,
    ctx: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    check_address(param, v, EntityKind::Resource, ctx)
}

fn check_payment_resource(
    param: &'static str,
    v: &str,
    ctx: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    check_resource(param, v, ctx)?;
    if ctx.config.is_accepted_payment(v) {
        Ok(())
    } else {
        Err(vec![ValidationIssue::invalid(
            param,
            format!("{v} is not an accepted payment resource"),
        )])
    }
}

fn check_registrar_id(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    if classify_id(v) == IdKind::Integer {
        Ok(())
    } else {
        Err(vec![ValidationIssue::invalid(
            param,
            format!("registrar ids are integers, got {v}"),
        )])
    }
}

fn check_fee_percentage(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    match Decimal::from_str(v) {
        Ok(fee) if fee >= Decimal::ZERO && fee <= Decimal::ONE_HUNDRED => Ok(()),
        Ok(fee) => Err(vec![ValidationIssue::invalid(
            param,
            format!("{fee} is outside 0..=100"),
        )]),
        Err(_) => Err(vec![ValidationIssue::invalid(
            param,
            format!("'{v}' is not a decimal"),
        )]),
    }
}

fn check_registrar_name(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    if v.chars().count() > MAX_REGISTRAR_NAME_LEN {
        return Err(vec![ValidationIssue::invalid(
            param,
            format!("longer than {MAX_REGISTRAR_NAME_LEN} characters"),
        )]);
    }
    Ok(())
}

fn check_url(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    if v.starts_with("https://") && v.len() > "https://".len() {
        Ok(())
    } else {
        Err(vec![ValidationIssue::invalid(
            param,
            "must be an https:// URL",
        )])
    }
}

fn check_record_field(
    param: &'static str,
    v: &str,
    _: &RuleContext<'_>,
) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if v.chars().count() > MAX_RECORD_FIELD_LEN {
        issues.push(ValidationIssue::invalid(
            param,
            format!("longer than {MAX_RECORD_FIELD_LEN} characters"),
        ));
    }
    if v.chars().any(char::is_control) {
        issues.push(ValidationIssue::invalid(
            param,
            "contains control characters",
        ));
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
