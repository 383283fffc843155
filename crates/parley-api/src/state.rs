//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The engine and services are generic over their ports; AppState pins them to
//! the SQLite, Dify and webhook implementations.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::conversation::{ConversationEngine, InMemorySessionStore};
use parley_core::service::feedback::FeedbackService;
use parley_core::service::topic::TopicService;
use parley_core::service::user::UserService;
use parley_infra::ai::DifyBackend;
use parley_infra::config::{Secrets, load_bot_config, resolve_data_dir};
use parley_infra::sqlite::feedback::SqliteFeedbackRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::topic::SqliteTopicRepository;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_infra::transport::WebhookSender;
use parley_types::config::BotConfig;
use secrecy::{ExposeSecret, SecretString};

pub type ConcreteEngine = ConversationEngine<
    InMemorySessionStore,
    SqliteUserRepository,
    SqliteFeedbackRepository,
    DifyBackend,
    WebhookSender,
>;

pub type ConcreteUserService = UserService<SqliteUserRepository>;

pub type ConcreteFeedbackService = FeedbackService<SqliteFeedbackRepository>;

pub type ConcreteTopicService = TopicService<SqliteTopicRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub user_service: Arc<ConcreteUserService>,
    pub feedback_service: Arc<ConcreteFeedbackService>,
    pub topic_service: Arc<ConcreteTopicService>,
    pub config: Arc<BotConfig>,
    /// Shared secret the chat gateway must present on `/inbound`.
    pub gateway_token: Option<Arc<SecretString>>,
    pub ai_configured: bool,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state in the configured data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::open(resolve_data_dir()).await
    }

    /// Load config, connect to the database in `data_dir` and wire services.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_bot_config(&data_dir).await;
        let secrets = Secrets::from_env();

        let db_pool = DatabasePool::open(&data_dir).await?;

        // The gateway token authenticates both directions.
        let outbound_token = secrets
            .gateway_token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret()));
        let sender = WebhookSender::new(&config.transport, outbound_token)?;
        let gateway_token = secrets.gateway_token.map(Arc::new);

        let ai_configured = secrets.ai_api_key.is_some();
        let ai_key = secrets
            .ai_api_key
            .unwrap_or_else(|| SecretString::from(String::new()));
        let ai = DifyBackend::new(&config.ai, ai_key)?;

        let engine = ConversationEngine::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(SqliteUserRepository::new(db_pool.clone())),
            Arc::new(SqliteFeedbackRepository::new(db_pool.clone())),
            Arc::new(ai),
            Arc::new(sender),
            &config,
        );

        let user_service = UserService::new(SqliteUserRepository::new(db_pool.clone()));
        let feedback_service = FeedbackService::new(SqliteFeedbackRepository::new(db_pool.clone()));
        let topic_service = TopicService::new(SqliteTopicRepository::new(db_pool.clone()));

        Ok(Self {
            engine: Arc::new(engine),
            user_service: Arc::new(user_service),
            feedback_service: Arc::new(feedback_service),
            topic_service: Arc::new(topic_service),
            config: Arc::new(config),
            gateway_token,
            ai_configured,
            data_dir,
            db_pool,
        })
    }
}
