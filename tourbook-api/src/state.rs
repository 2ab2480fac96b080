use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tourbook_catalog::{PricingConfig, PricingEngine};
use tourbook_core::payment::PaymentGateway;
use tourbook_core::supplier::SupplierGateway;
use tourbook_core::voucher::VoucherGateway;
use tourbook_core::DraftStore;
use tourbook_order::{ConfirmationCoordinator, MockSupplier, VoucherService};
use tourbook_store::app_config::{BusinessRules, TimeoutConfig};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DraftStore>,
    pub supplier: Arc<dyn SupplierGateway>,
    pub vouchers: Arc<dyn VoucherGateway>,
    pub payments: Arc<dyn PaymentGateway>,
    pub engine: PricingEngine,
    pub business_rules: BusinessRules,
    pub timeouts: TimeoutConfig,
    submitting: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DraftStore>,
        supplier: Arc<dyn SupplierGateway>,
        vouchers: Arc<dyn VoucherGateway>,
        payments: Arc<dyn PaymentGateway>,
        business_rules: BusinessRules,
        timeouts: TimeoutConfig,
    ) -> Self {
        let engine = PricingEngine::new(PricingConfig {
            markup_rate: business_rules.markup_rate,
        });
        Self {
            store,
            supplier,
            vouchers,
            payments,
            engine,
            business_rules,
            timeouts,
            submitting: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// All three gateways served by one mock supplier
    pub fn with_mock(store: Arc<dyn DraftStore>, mock: Arc<MockSupplier>) -> Self {
        Self::new(
            store,
            mock.clone(),
            mock.clone(),
            mock,
            BusinessRules::default(),
            TimeoutConfig::default(),
        )
    }

    /// Records of one client-held draft
    pub fn draft_store(&self, key: &str) -> Arc<dyn DraftStore> {
        self.store.scoped(key)
    }

    pub fn voucher_service(&self, key: &str) -> VoucherService {
        VoucherService::new(self.vouchers.clone(), self.draft_store(key), self.engine.clone())
            .with_deadline(self.timeouts.voucher())
    }

    pub fn coordinator(&self, key: &str) -> ConfirmationCoordinator {
        ConfirmationCoordinator::new(
            self.supplier.clone(),
            self.payments.clone(),
            self.draft_store(key),
            self.engine.clone(),
            self.business_rules.default_pickup_location.clone(),
        )
        .with_deadline(self.timeouts.supplier())
    }

    /// Marks the draft as busy until the guard drops.
    /// `None` when another request already holds it.
    pub fn begin_submission(&self, key: &str) -> Option<SubmissionGuard> {
        let mut keys = self.submitting.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(SubmissionGuard {
            keys: self.submitting.clone(),
            key: key.to_string(),
        })
    }
}

pub struct SubmissionGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}
