pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

pub type DeploymentImpl = services::services::deployment::Deployment;
