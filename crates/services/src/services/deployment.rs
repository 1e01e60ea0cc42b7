use std::sync::Arc;

use db::{DBService, DbErr};
use thiserror::Error;
use tokio::sync::RwLock;
use utils::assets::config_path;

use super::{
    auth::AuthService,
    config::{Config, ConfigError, load_config_from_file, save_config_to_file},
    performance::PerformanceService,
    resume::ResumeService,
    submission::SubmissionService,
};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Request-scoped shared state: config plus the connection pool and the
/// stateless services. Cloning is cheap; handlers get it via
/// `State<Deployment>`.
#[derive(Clone)]
pub struct Deployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    auth: AuthService,
    submissions: SubmissionService,
    performance: PerformanceService,
    resumes: ResumeService,
}

impl Deployment {
    pub async fn new() -> Result<Self, DeploymentError> {
        let config_path = config_path();
        let config = load_config_from_file(&config_path).await;
        // Persist so a generated JWT secret survives restarts.
        save_config_to_file(&config, &config_path).await?;

        let db = DBService::new().await?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            db,
            auth: AuthService::new(),
            submissions: SubmissionService::new(),
            performance: PerformanceService::new(),
            resumes: ResumeService::new(),
        })
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.submissions
    }

    pub fn performance(&self) -> &PerformanceService {
        &self.performance
    }

    pub fn resumes(&self) -> &ResumeService {
        &self.resumes
    }
}
