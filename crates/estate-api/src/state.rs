//! Shared handler state

use std::sync::Arc;
use std::time::Duration;

use estate_core::repositories::IdentityProvider;
use estate_core::services::{
    AccountService, ChatService, IdentityService, LedgerService, MockPaymentGateway, PropertyService,
    VerificationService,
};
use estate_infrastructure::{
    RealtimeStore, TreeAccountRepository, TreeChatRepository, TreePropertyRepository,
    TreeTransactionRepository,
};
use estate_shared::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RealtimeStore>,
    pub identity: Arc<IdentityService>,
    pub accounts: Arc<AccountService>,
    pub properties: Arc<PropertyService>,
    pub verification: Arc<VerificationService>,
    pub chats: Arc<ChatService>,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    /// Wires the tree repositories and services over `store`.
    pub fn new(config: AppConfig, store: Arc<RealtimeStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        let property_repo = Arc::new(TreePropertyRepository::new(store.clone()));
        let account_repo = Arc::new(TreeAccountRepository::new(store.clone()));
        let chat_repo = Arc::new(TreeChatRepository::new(store.clone()));
        let transaction_repo = Arc::new(TreeTransactionRepository::new(store.clone()));

        let payments = Arc::new(MockPaymentGateway::new(config.ledger.currency.clone()));
        let ledger = Arc::new(LedgerService::new(
            transaction_repo,
            property_repo.clone(),
            payments.clone(),
        ));
        let identity = Arc::new(
            IdentityService::new(
                provider,
                account_repo.clone(),
                Duration::from_millis(config.store.op_timeout_ms),
            )
            .with_cache_capacity(config.auth.identity_cache_capacity),
        );
        let properties = Arc::new(PropertyService::new(
            property_repo.clone(),
            ledger.clone(),
            payments,
            config.ledger.platform_fee,
            config.store.max_inline_image_bytes,
        ));

        Self {
            identity,
            accounts: Arc::new(AccountService::new(account_repo.clone())),
            properties,
            verification: Arc::new(VerificationService::new(property_repo.clone())),
            chats: Arc::new(ChatService::new(chat_repo, account_repo, property_repo)),
            ledger,
            store,
            config: Arc::new(config),
        }
    }
}
