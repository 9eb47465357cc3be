use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::PublicEndpoints;
use crate::domain_port::{IdentityTransport, SessionStorage};
use crate::infra_http::ReqwestIdentityTransport;
use crate::infra_local::{FileSessionStorage, MemorySessionStorage};
use crate::infra_redis::RedisSessionStorage;
use crate::settings::{Settings, Storage};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a front end needs, wired from settings.
pub struct Client {
    pub auth_service: Arc<dyn AuthService>,
    pub user_admin_service: Arc<dyn UserAdminService>,
    /// Present with the real identity backend. Use it for application calls
    /// that should carry the session's credentials.
    pub authorizer: Option<Arc<RequestAuthorizer>>,
    real_auth_service: Option<Arc<RealAuthService>>,
}

impl Client {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let client = match settings.identity.backend.as_str() {
            "fake" => Client {
                auth_service: Arc::new(FakeAuthService::new()),
                user_admin_service: Arc::new(FakeUserAdminService::new()),
                authorizer: None,
                real_auth_service: None,
            },
            "real" => Self::try_new_real(settings).await?,
            other => return Err(anyhow::anyhow!("Unknown identity backend: {}", other)),
        };
        info!(
            identity = %settings.identity.backend,
            storage = %settings.storage.backend,
            "client ready"
        );
        Ok(client)
    }

    async fn try_new_real(settings: &Settings) -> anyhow::Result<Self> {
        let paths = settings.identity.paths.clone();

        let storage = build_storage(&settings.storage).await?;
        let store = Arc::new(SessionStore::new(
            storage,
            StorageKeys::new(
                settings.storage.key.clone(),
                settings.storage.legacy_keys.clone(),
            ),
        ));

        let transport: Arc<dyn IdentityTransport> = Arc::new(ReqwestIdentityTransport::new(
            settings.identity.base_url.clone(),
            Duration::from_secs(settings.identity.timeout_secs),
        )?);

        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            transport.clone(),
            paths.refresh.clone(),
        ));
        let public = PublicEndpoints::for_paths(
            &paths,
            settings.authorizer.public_paths.clone(),
            settings.authorizer.public_prefixes.clone(),
        );
        let authorizer = Arc::new(RequestAuthorizer::new(
            store.clone(),
            coordinator,
            transport,
            public,
        ));
        let gateway = Arc::new(ProfileGateway::new(
            authorizer.clone(),
            paths.profile.clone(),
        ));

        let real_auth_service = Arc::new(RealAuthService::new(
            store,
            authorizer.clone(),
            gateway,
            paths.clone(),
        ));
        let user_admin_service = Arc::new(RealUserAdminService::new(authorizer.clone(), paths));

        Ok(Client {
            auth_service: real_auth_service.clone(),
            user_admin_service,
            authorizer: Some(authorizer),
            real_auth_service: Some(real_auth_service),
        })
    }

    /// Waits for the background profile check started by rehydration.
    pub async fn wait_for_revalidation(&self) {
        if let Some(service) = &self.real_auth_service {
            service.wait_for_revalidation().await;
        }
    }
}

async fn build_storage(settings: &Storage) -> anyhow::Result<Arc<dyn SessionStorage>> {
    let storage: Arc<dyn SessionStorage> = match settings.backend.as_str() {
        "memory" => Arc::new(MemorySessionStorage::new()),
        "file" => {
            let dir = settings
                .dir
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.dir is required for the file backend"))?;
            Arc::new(FileSessionStorage::new(dir))
        }
        "redis" => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.redis_url is required for the redis backend"))?;
            Arc::new(RedisSessionStorage::connect(url, &settings.prefix).await?)
        }
        other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
    };
    Ok(storage)
}
