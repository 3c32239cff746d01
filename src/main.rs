use anyhow::anyhow;
use redis::aio::ConnectionManager;
use sqlx::MySqlPool;
use std::process::ExitCode;
use std::sync::Arc;
use tokensession::application_impl::RealSessionManager;
use tokensession::application_port::SessionManager;
use tokensession::domain_port::TokenStore;
use tokensession::infra_memory::MemoryTokenStore;
use tokensession::infra_mysql::MySqlTokenStore;
use tokensession::infra_redis::RedisTokenStore;
use tokensession::logger::*;
use tokensession::settings::*;

async fn build_store(store: &Store) -> anyhow::Result<Arc<dyn TokenStore>> {
    match store.backend {
        StoreBackend::Memory => {
            warn!("memory backend: sessions do not outlive this process");
            Ok(Arc::new(MemoryTokenStore::new()))
        }
        StoreBackend::Mysql => {
            let url = store
                .mysql_url
                .as_deref()
                .ok_or_else(|| anyhow!("store.mysql_url is required for the mysql backend"))?;
            let pool = MySqlPool::connect(url).await?;
            Ok(Arc::new(MySqlTokenStore::new(pool)))
        }
        StoreBackend::Redis => {
            let url = store
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow!("store.redis_url is required for the redis backend"))?;
            let conn = ConnectionManager::new(redis::Client::open(url)?).await?;
            Ok(Arc::new(RedisTokenStore::new(conn, store.redis_prefix.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(backend = ?project_settings.store.backend, "settings loaded");
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let policy = project_settings.session.expiration_policy()?;
    let store = build_store(&project_settings.store).await?;
    let manager = RealSessionManager::new(store, policy);

    match cli.command {
        Command::Generate { user_id, details } => {
            let token = manager.generate(&user_id, &details).await?;
            println!("{token}");
        }
        Command::Verify { token } => {
            if !manager.verify(&token).await? {
                println!("invalid");
                return Ok(ExitCode::FAILURE);
            }
            println!("valid");
        }
        Command::List { user_id } => {
            let sessions = manager.list(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        Command::Revoke { identifier } => {
            manager.revoke(&identifier).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
