use rns_core::dispatch::CommittedDetails;
use rns_core::requests::{
    ClaimLocker, DomainAction, RecordBatch, RegisterDomain, RequestRegistrar, TransferDomain,
};
use rns_core::resolution::SkippedCheck;
use rns_core::{
    DomainStatus, Engine, EventCallbacks, LedgerStatus, Operation, ResolutionError, SdkError,
    SubmissionCategory, Wallet, WalletError,
};
use rns_gateway::{value, MemoryGateway, ResourceBalance};
use rns_schema::{domain_to_non_fungible_id, parse_config_str, IntentHash, RecordDocket};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::sync::Mutex;

const ALICE: &str = "account_tdx_2_1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "account_tdx_2_1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";
const RNS: &str = "component_tdx_2_1cccccccccccccccccccccccccccccccccccccccccccccccccccccc";
const LOCKER: &str = "locker_tdx_2_1dddddddddddddddddddddddddddddddddddddddddddddddddddddd";
const DOMAINS: &str = "resource_tdx_2_1eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
const BADGES: &str = "resource_tdx_2_1ffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const IMPORTS: &str = "resource_tdx_2_1gggggggggggggggggggggggggggggggggggggggggggggggggggggg";
const XRD: &str = "resource_tdx_2_1hhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhhh";
const REGISTRY: &str =
    "internal_keyvaluestore_tdx_2_1kkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkkk";
const RESERVED: &str =
    "internal_keyvaluestore_tdx_2_1llllllllllllllllllllllllllllllllllllllllllllllllllllll";
const SUBREGISTRY: &str =
    "component_tdx_2_1mmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmm";
const RECORDS: &str =
    "internal_keyvaluestore_tdx_2_1nnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnnn";
const SUBDOMAINS: &str =
    "internal_keyvaluestore_tdx_2_1pppppppppppppppppppppppppppppppppppppppppppppppppppppp";

fn config_toml(ladder: bool) -> String {
    let mut toml = format!(
        r#"
network = "stokenet"

[components]
rns = "{RNS}"
domain_resource = "{DOMAINS}"
registrar_badge_resource = "{BADGES}"
import_domain_resource = "{IMPORTS}"
registry_store = "{REGISTRY}"
reserved_claims_store = "{RESERVED}"
locker = "{LOCKER}"

[payment]
accepted_resources = ["{XRD}"]
"#
    );
    if ladder {
        toml.push_str("\n[price_ladder]\n\"2\" = \"120\"\n\"3\" = \"60\"\n");
    }
    toml
}

/// `owned.xrd` held by Alice with one root record, registrar #7 at 2.5%.
fn ledger() -> MemoryGateway {
    let mut gw = MemoryGateway::new();
    let id = domain_to_non_fungible_id("owned.xrd");
    gw.insert_kv(
        REGISTRY,
        value::string("owned.xrd"),
        value::string(id.as_str()),
    );
    gw.insert_non_fungible(
        DOMAINS,
        id.as_str(),
        value::tuple(vec![
            value::named("name", value::string("owned.xrd")),
            value::named(
                "subregistry_component_address",
                value::reference(SUBREGISTRY),
            ),
            value::named("current_activated_owner", value::none()),
            value::named("bond", value::none()),
        ]),
    );
    gw.set_component_state(
        SUBREGISTRY,
        value::tuple(vec![
            value::named("records", value::reference(RECORDS)),
            value::named("subdomains", value::reference(SUBDOMAINS)),
        ]),
    );
    gw.insert_kv(
        RECORDS,
        value::tuple(vec![
            value::none(),
            value::string("receivers"),
            value::string("*"),
        ]),
        value::string(ALICE),
    );
    gw.set_holdings(ALICE, DOMAINS, vec![id.as_str().to_owned()]);
    gw.insert_non_fungible(
        BADGES,
        "#7#",
        value::tuple(vec![
            value::named("name", value::string("Seven")),
            value::named("fee_percentage", value::decimal(Decimal::new(25, 1))),
        ]),
    );
    gw.set_balances(
        ALICE,
        vec![ResourceBalance {
            resource: XRD.into(),
            amount: Decimal::from(1_000),
        }],
    );
    gw
}

fn engine_with(gw: MemoryGateway) -> Engine {
    let config = parse_config_str(&config_toml(true)).unwrap();
    Engine::connect(config, Box::new(gw)).unwrap()
}

struct RecordingWallet {
    outcome: Result<LedgerStatus, WalletError>,
    manifests: Mutex<Vec<String>>,
}

impl RecordingWallet {
    fn with(outcome: Result<LedgerStatus, WalletError>) -> Self {
        Self {
            outcome,
            manifests: Mutex::new(Vec::new()),
        }
    }
}

impl Wallet for RecordingWallet {
    fn send_transaction(&self, manifest: &str, _message: &str) -> Result<IntentHash, WalletError> {
        self.manifests.lock().unwrap().push(manifest.to_owned());
        match &self.outcome {
            Ok(_) => Ok(IntentHash::from("txid_tdx_2_1xyz")),
            Err(e) => Err(e.clone()),
        }
    }

    fn transaction_status(&self, _: &IntentHash) -> Result<LedgerStatus, WalletError> {
        self.outcome.clone()
    }

    fn committed_details(&self, intent_hash: &IntentHash) -> Result<CommittedDetails, WalletError> {
        Ok(CommittedDetails {
            intent_hash: intent_hash.clone(),
            fee_paid: None,
            receipt: serde_json::Value::Null,
        })
    }
}

#[test]
fn register_available_name_end_to_end() {
    let engine = engine_with(ledger());
    let req = RegisterDomain {
        account: ALICE.into(),
        domain: "  NEW.xrd ".into(),
        registrar_id: "7".into(),
        payment_resource: None,
    };

    let status = engine.domain_status("new.xrd").unwrap();
    assert_eq!(status.status, DomainStatus::Available);

    let events = RefCell::new(Vec::new());
    let hooks = EventCallbacks::new()
        .on_init(|p| events.borrow_mut().push(format!("init:{}", p.message)))
        .on_app_approved(|h| events.borrow_mut().push(format!("approved:{h}")))
        .on_success(|_| events.borrow_mut().push("success".to_owned()));
    let wallet = RecordingWallet::with(Ok(LedgerStatus::CommittedSuccess));
    let feedback = engine.register_domain(&req, &wallet, &hooks).unwrap();

    assert_eq!(feedback.operation, Operation::RegisterDomain);
    assert_eq!(
        *events.borrow(),
        vec![
            "init:Register new.xrd",
            "approved:txid_tdx_2_1xyz",
            "success"
        ]
    );
    let sent = wallet.manifests.lock().unwrap();
    assert!(sent[0].contains("String(\"new.xrd\")"));
    assert!(
        sent[0].contains("Decimal(\"61.5\")"),
        "60 bond plus 2.5% fee"
    );
    assert!(sent[0].contains("NonFungibleLocalId(\"#7#\")"));
}

#[test]
fn ladder_is_fetched_when_config_omits_it() {
    let mut gw = ledger();
    gw.set_component_state(
        RNS,
        value::tuple(vec![serde_json::json!({
            "kind": "Map",
            "field_name": "price_ladder",
            "entries": [
                {"key": value::string("2"), "value": value::decimal(Decimal::from(900))}
            ]
        })]),
    );
    let config = parse_config_str(&config_toml(false)).unwrap();
    let engine = Engine::connect(config, Box::new(gw)).unwrap();
    let cost = engine.cost_breakdown("ab.xrd", "7", None).unwrap();
    assert_eq!(cost.bond_amount, Decimal::from(900));
    // Lengths missing from the ladder fall back to the minimum quantum.
    let cost = engine.cost_breakdown("abcdef.xrd", "7", None).unwrap();
    assert_eq!(cost.bond_amount, Decimal::from(4));
}

#[test]
fn unreachable_reserved_store_degrades_to_available() {
    let mut gw = ledger();
    gw.fail_on(RESERVED);
    let report = engine_with(gw).domain_status("free.xrd").unwrap();
    assert_eq!(report.status, DomainStatus::Available);
    assert_eq!(report.skipped, vec![SkippedCheck::ReservedClaims]);
}

#[test]
fn unreachable_registry_is_fatal() {
    let mut gw = ledger();
    gw.fail_on(REGISTRY);
    assert!(matches!(
        engine_with(gw).domain_status("free.xrd"),
        Err(SdkError::Gateway(_))
    ));
}

#[test]
fn reserved_name_cannot_be_registered() {
    let mut gw = ledger();
    gw.insert_kv(RESERVED, value::string("kept.xrd"), value::reference(BOB));
    let engine = engine_with(gw);
    let req = RegisterDomain {
        account: ALICE.into(),
        domain: "kept.xrd".into(),
        registrar_id: "7".into(),
        payment_resource: None,
    };
    let err = engine.prepare_register_domain(&req).unwrap_err();
    let SdkError::Resolution(ResolutionError::Unavailable { status, .. }) = err else {
        panic!("expected unavailable, got {err}");
    };
    assert_eq!(
        status,
        DomainStatus::Reserved {
            claimant: Some(BOB.into())
        }
    );
}

#[test]
fn batch_records_use_one_proof_per_call() {
    let engine = engine_with(ledger());
    let req = RecordBatch {
        account: ALICE.into(),
        domain: "owned.xrd".into(),
        dockets: vec![
            RecordDocket::new("social", "x", "@owned"),
            RecordDocket::new("social", "github", "owned"),
        ],
    };
    let prepared = engine.prepare_create_records(&req).unwrap();
    let text = prepared.manifest.to_text();
    let proofs = text.matches("CREATE_PROOF_FROM_AUTH_ZONE_OF_NON_FUNGIBLES");
    assert_eq!(proofs.count(), 2);
    assert_eq!(text.matches("\"set_record\"").count(), 2);
    assert!(text.trim_end().ends_with("DROP_ALL_PROOFS;"));
}

#[test]
fn wallet_rejection_is_classified() {
    let engine = engine_with(ledger());
    let wallet = RecordingWallet::with(Err(WalletError("User rejected the request".into())));
    let req = DomainAction {
        account: ALICE.into(),
        domain: "owned.xrd".into(),
    };
    let err = engine
        .activate_domain(&req, &wallet, &EventCallbacks::new())
        .unwrap_err();
    let SdkError::Submission(e) = err else {
        panic!("expected submission error, got {err}");
    };
    assert_eq!(e.category, SubmissionCategory::RejectedByUser);
}

#[test]
fn committed_failure_surfaces_ledger_reason() {
    let engine = engine_with(ledger());
    let wallet = RecordingWallet::with(Ok(LedgerStatus::CommittedFailure {
        reason: "subregistry locked".into(),
    }));
    let req = TransferDomain {
        account: ALICE.into(),
        domain: "owned.xrd".into(),
        destination: BOB.into(),
        clean: true,
    };
    let err = engine
        .transfer_domain(&req, &wallet, &EventCallbacks::new())
        .unwrap_err();
    let SdkError::Ledger { reason, .. } = &err else {
        panic!("expected a ledger error, got {err}");
    };
    assert_eq!(reason, "subregistry locked");
    assert!(wallet.manifests.lock().unwrap()[0].contains("\"replace_subregistry\""));
}

#[test]
fn non_owner_never_reaches_wallet() {
    let engine = engine_with(ledger());
    let wallet = RecordingWallet::with(Ok(LedgerStatus::CommittedSuccess));
    let req = DomainAction {
        account: BOB.into(),
        domain: "owned.xrd".into(),
    };
    assert!(engine
        .unbond_domain(&req, &wallet, &EventCallbacks::new())
        .is_err());
    assert!(wallet.manifests.lock().unwrap().is_empty());
}

#[test]
fn locker_and_registrar_requests_need_no_ownership() {
    let engine = engine_with(ledger());
    let claim = engine
        .prepare_claim_locker(&ClaimLocker {
            account: BOB.into(),
            resource: XRD.into(),
            ids: Vec::new(),
        })
        .unwrap();
    assert!(claim.manifest.to_text().contains("Decimal(\"100\")"));

    let request = engine
        .prepare_request_registrar(&RequestRegistrar {
            account: BOB.into(),
            name: "Bob's Names".into(),
            icon_url: "https://example.com/icon.png".into(),
            website_url: "https://example.com".into(),
            fee_percentage: "1.25".into(),
        })
        .unwrap();
    assert!(request.manifest.to_text().contains("Decimal(\"1.25\")"));
}

#[test]
fn account_domains_lists_holdings() {
    let engine = engine_with(ledger());
    let domains = engine.account_domains(ALICE).unwrap();
    assert_eq!(domains.len(), 1);
    assert_eq!(domains[0].name, "owned.xrd");
    assert!(engine.account_domains(BOB).unwrap().is_empty());
}
