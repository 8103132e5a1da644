#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use carewallet_auth::{AuthResult, CodeNotifier};
use carewallet_core::{
    CareWallet, CheckoutRequest, CoreConfig, CreateWallet, GatewayVerification, PaymentGateway,
};
use carewallet_db::MemoryStore;
use carewallet_types::{
    CallerIdentity, ContributorInfo, NewPharmacy, OtpPurpose, PaymentSession, Pharmacy,
    PharmacyStatus, UserId, Wallet, WalletResult,
};
use rust_decimal::Decimal;

/// Remembers the latest code sent to each address
#[derive(Default)]
pub struct Inbox {
    codes: Mutex<HashMap<String, String>>,
}

impl Inbox {
    pub fn code_for(&self, email: &str) -> String {
        self.codes.lock().unwrap().get(email).cloned().unwrap()
    }
}

#[async_trait]
impl CodeNotifier for Inbox {
    async fn deliver(&self, email: &str, _purpose: OtpPurpose, code: &str) -> AuthResult<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }
}

/// Gateway that settles whatever was initialized, unless told to decline
#[derive(Default)]
pub struct StubGateway {
    checkouts: Mutex<HashMap<String, i64>>,
    decline: AtomicBool,
    reported_minor: Mutex<Option<i64>>,
}

impl StubGateway {
    pub fn decline(&self) {
        self.decline.store(true, Ordering::SeqCst);
    }

    pub fn report_amount(&self, minor: i64) {
        *self.reported_minor.lock().unwrap() = Some(minor);
    }

    pub fn checkout_count(&self) -> usize {
        self.checkouts.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize(&self, request: &CheckoutRequest) -> WalletResult<PaymentSession> {
        self.checkouts
            .lock()
            .unwrap()
            .insert(request.reference.clone(), request.amount_minor);
        Ok(PaymentSession {
            reference: request.reference.clone(),
            access_code: "stub-access".to_string(),
            authorization_url: format!("https://checkout.test/{}", request.reference),
        })
    }

    async fn verify(&self, reference: &str) -> WalletResult<GatewayVerification> {
        let initialized = self.checkouts.lock().unwrap().get(reference).copied();
        let amount_minor = self.reported_minor.lock().unwrap().or(initialized).unwrap_or(0);
        Ok(GatewayVerification {
            successful: !self.decline.load(Ordering::SeqCst) && initialized.is_some(),
            amount_minor,
            gateway_reference: Some("4099260516".to_string()),
        })
    }
}

pub struct Harness {
    pub care: CareWallet,
    pub store: MemoryStore,
    pub inbox: Arc<Inbox>,
    pub gateway: Arc<StubGateway>,
    pub owner: CallerIdentity,
    pub beneficiary: CallerIdentity,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let inbox = Arc::new(Inbox::default());
        let gateway = Arc::new(StubGateway::default());
        let care = CareWallet::new(
            Arc::new(store.clone()),
            gateway.clone(),
            inbox.clone(),
            CoreConfig::default(),
        )
        .unwrap();

        Self {
            care,
            store,
            inbox,
            gateway,
            owner: CallerIdentity::new(UserId::new(), "thandi@example.co.za"),
            beneficiary: CallerIdentity::new(UserId::new(), "gogo@example.co.za"),
        }
    }

    /// Wallet owned by `owner`, benefiting `beneficiary`, funded with `balance`
    pub async fn funded_wallet(&self, balance: Decimal) -> Wallet {
        let wallet = self
            .care
            .create_wallet(
                &self.owner,
                CreateWallet {
                    name: "Gogo's chronic meds".to_string(),
                    description: Some("Monthly prescriptions".to_string()),
                    funding_goal: Decimal::from(1000),
                    beneficiary_id: Some(self.beneficiary.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        if balance > Decimal::ZERO {
            self.care
                .deposit(wallet.id, balance, Some(ContributorInfo::default()))
                .await
                .unwrap();
        }
        self.care.wallet(&self.owner, wallet.id).await.unwrap()
    }

    pub async fn active_pharmacy(&self, short_code: &str) -> Pharmacy {
        let pharmacy = self
            .care
            .register_pharmacy(NewPharmacy {
                name: format!("{} Pharmacy", short_code),
                short_code: short_code.to_string(),
                registration_number: format!("REG-{}", short_code),
                address: None,
                phone: None,
                email: None,
            })
            .await
            .unwrap();
        self.care
            .set_pharmacy_status(pharmacy.id, PharmacyStatus::Active)
            .await
            .unwrap()
    }

    /// Issue a withdrawal code to `caller` and read it back from the inbox
    pub async fn withdrawal_code(&self, caller: &CallerIdentity) -> String {
        self.care
            .issue_one_time_code(&caller.email, OtpPurpose::Withdrawal)
            .await
            .unwrap();
        self.inbox.code_for(&caller.email)
    }

    pub async fn balance(&self, wallet: &Wallet) -> Decimal {
        self.care.wallet(&self.owner, wallet.id).await.unwrap().balance
    }

    /// Σ net(deposits) − Σ amount(withdrawals) over the stored rows
    pub async fn ledger_sum(&self, wallet: &Wallet) -> Decimal {
        self.store
            .transactions_for(wallet.id)
            .await
            .iter()
            .map(|t| t.balance_effect())
            .sum()
    }
}
