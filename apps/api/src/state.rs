use std::sync::Arc;

use crate::analysis::service::AnalysisService;
use crate::auth::IdentityVerifier;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub service: AnalysisService,
    /// Pluggable credential check. Default: RemoteSessionVerifier.
    pub verifier: Arc<dyn IdentityVerifier>,
    pub config: Config,
}
