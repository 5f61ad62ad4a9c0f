use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealSessionService {
    validator: Arc<TokenValidator>,
    coordinator: Arc<RotationCoordinator>,
    revocation: Arc<RevocationManager>,
    reset: Arc<PasswordResetFlow>,
    telemetry: Arc<dyn TokenTelemetry>,
}

impl RealSessionService {
    pub fn new(
        validator: Arc<TokenValidator>,
        coordinator: Arc<RotationCoordinator>,
        revocation: Arc<RevocationManager>,
        reset: Arc<PasswordResetFlow>,
        telemetry: Arc<dyn TokenTelemetry>,
    ) -> Self {
        Self {
            validator,
            coordinator,
            revocation,
            reset,
            telemetry,
        }
    }

    /// Wires every component around one set of collaborators.
    pub fn assemble(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn TokenStore>,
        lock: Arc<dyn DistributedLock>,
        cache: Arc<dyn ReplayCache>,
        clock: Arc<dyn Clock>,
        telemetry: Arc<dyn TokenTelemetry>,
        config: SessionConfig,
    ) -> Self {
        let validator = Arc::new(TokenValidator::new(
            codec.clone(),
            store.clone(),
            clock.clone(),
        ));
        let revocation = Arc::new(RevocationManager::new(store.clone()));
        let reset = Arc::new(PasswordResetFlow::new(
            codec.clone(),
            store.clone(),
            clock.clone(),
            validator.clone(),
            revocation.clone(),
            config.reset_ttl,
        ));
        let coordinator = Arc::new(RotationCoordinator::new(
            codec,
            store,
            lock,
            cache,
            clock,
            validator.clone(),
            config,
        ));

        Self::new(validator, coordinator, revocation, reset, telemetry)
    }

    /// Housekeeping for the reset grants; run periodically by the server.
    pub async fn purge_expired_grants(&self) -> Result<usize, TokenError> {
        self.reset.purge_expired().await
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn issue(&self, subject: Subject) -> Result<TokenPair, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::Issue,
            self.coordinator.issue(subject),
        )
        .await
    }

    async fn validate(&self, token: &str, expected: TokenType) -> Result<Claim, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::Validate,
            self.validator.validate(token, expected),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::Rotate,
            self.coordinator.rotate(refresh_token),
        )
        .await
    }

    async fn logout(&self, subject: Subject) -> Result<usize, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::Revoke,
            self.revocation.revoke_all(subject),
        )
        .await
    }

    async fn issue_reset(&self, subject: Subject) -> Result<ResetToken, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::IssueReset,
            self.reset.issue_reset(subject),
        )
        .await
    }

    async fn complete_reset(&self, reset_token: &str) -> Result<Subject, TokenError> {
        instrumented(
            self.telemetry.as_ref(),
            Operation::CompleteReset,
            self.reset.complete_reset(reset_token),
        )
        .await
    }
}
