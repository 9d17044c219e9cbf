use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::types::{
    DeprovisionInput, ProvisionInput, ProvisionedRelay, Provisioner, ProvisionerError,
    TRANSIENT_CODES,
};

const MAX_ATTEMPTS: u32 = 4;
const BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(2);

/// Wraps a `Provisioner` with the retry-and-backoff policy from `spec.md`
/// §4.6. Grounded on `kftray-portforward/src/kube/start.rs`'s
/// try-then-fallback structure, generalized from a single retry to a bounded
/// attempt loop.
pub struct RetryingProvisioner<P> {
    inner: Arc<P>,
}

impl<P> RetryingProvisioner<P> {
    pub fn new(inner: Arc<P>) -> Self {
        Self { inner }
    }
}

/// `250ms * 2^(attempt-1)` clamped to 2s, with jitter in `[10%, 100%)` of
/// that delay drawn from a cryptographic RNG. Falls back to 55% of the
/// computed delay if the OS RNG cannot be read.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY.saturating_mul(1u32 << (attempt.saturating_sub(1)));
    let base = exp.min(MAX_DELAY);

    let mut buf = [0u8; 8];
    let fraction = match OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => {
            let value = u64::from_le_bytes(buf);
            0.10 + (value as f64 / u64::MAX as f64) * 0.90
        }
        Err(e) => {
            tracing::warn!(cause = %e, "backoff jitter RNG read failed, using fixed midpoint");
            0.55
        }
    };

    Duration::from_secs_f64(base.as_secs_f64() * fraction)
}

fn is_transient(error: &ProvisionerError) -> bool {
    TRANSIENT_CODES.contains(&error.code.as_str())
}

impl<P: Provisioner> RetryingProvisioner<P> {
    /// Cancellation is observed implicitly: the caller wraps the whole
    /// request in `tokio::time::timeout` (`spec.md` §5's 3-minute bound), and
    /// dropping this future mid-`tokio::time::sleep` is how that timeout — or
    /// any other cancellation of the enclosing task — takes effect here.
    async fn run_with_retry<T, F, Fut>(
        &self,
        op_name: &'static str,
        mut op: F,
    ) -> Result<T, ProvisionerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProvisionerError>>,
    {
        let mut attempt = 1;
        loop {
            let result = op().await;
            match result {
                Ok(value) => return Ok(value),
                Err(error) if attempt < MAX_ATTEMPTS && is_transient(&error) => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        op = op_name,
                        attempt,
                        code = %error.code,
                        delay_ms = delay.as_millis() as u64,
                        "provisioner call failed transiently, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl<P: Provisioner> Provisioner for RetryingProvisioner<P> {
    async fn provision(&self, input: ProvisionInput) -> Result<ProvisionedRelay, ProvisionerError> {
        let ProvisionInput {
            session_id,
            user_id,
            region,
        } = input;
        self.run_with_retry("provision", || {
            let input = ProvisionInput {
                session_id: session_id.clone(),
                user_id: user_id.clone(),
                region: region.clone(),
            };
            let inner = self.inner.clone();
            async move { inner.provision(input).await }
        })
        .await
    }

    async fn deprovision(&self, input: DeprovisionInput) -> Result<(), ProvisionerError> {
        let DeprovisionInput {
            session_id,
            user_id,
            region,
            aws_instance_id,
        } = input;
        let result = self
            .run_with_retry("deprovision", || {
                let input = DeprovisionInput {
                    session_id: session_id.clone(),
                    user_id: user_id.clone(),
                    region: region.clone(),
                    aws_instance_id: aws_instance_id.clone(),
                };
                let inner = self.inner.clone();
                async move { inner.deprovision(input).await }
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(error) if crate::types::DEPROVISION_TOLERATED_CODES.contains(&error.code.as_str()) => {
                tracing::debug!(
                    code = %error.code,
                    aws_instance_id = %aws_instance_id,
                    "deprovision treated as success: instance already gone or terminating"
                );
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::types::ProvisionInput;

    struct FlakyThenOk {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl Provisioner for FlakyThenOk {
        async fn provision(
            &self,
            input: ProvisionInput,
        ) -> Result<ProvisionedRelay, ProvisionerError> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(ProvisionerError::new("ServiceUnavailable", "try again"));
            }
            Ok(ProvisionedRelay {
                aws_instance_id: format!("i-{}", input.session_id),
                ami_id: "ami-1".into(),
                instance_type: "t3.small".into(),
                public_ip: "203.0.113.1".into(),
                srt_port: 9000,
                ws_url: "wss://relay.example/ws".into(),
            })
        }

        async fn deprovision(&self, _input: DeprovisionInput) -> Result<(), ProvisionerError> {
            Ok(())
        }
    }

    struct AlwaysFails(&'static str);

    #[async_trait]
    impl Provisioner for AlwaysFails {
        async fn provision(
            &self,
            _input: ProvisionInput,
        ) -> Result<ProvisionedRelay, ProvisionerError> {
            Err(ProvisionerError::new(self.0, "nope"))
        }

        async fn deprovision(&self, _input: DeprovisionInput) -> Result<(), ProvisionerError> {
            Err(ProvisionerError::new(self.0, "nope"))
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let inner = Arc::new(FlakyThenOk {
            failures_left: AtomicU32::new(2),
        });
        let retrying = RetryingProvisioner::new(inner);

        let result = retrying
            .provision(ProvisionInput {
                session_id: "ses_1".into(),
                user_id: "usr_1".into(),
                region: "us-east-1".into(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_transient_error_fails_immediately() {
        let inner = Arc::new(AlwaysFails("InvalidParameterValue"));
        let retrying = RetryingProvisioner::new(inner);

        let result = retrying
            .provision(ProvisionInput {
                session_id: "ses_1".into(),
                user_id: "usr_1".into(),
                region: "us-east-1".into(),
            })
            .await;

        assert_eq!(result.unwrap_err().code, "InvalidParameterValue");
    }

    #[tokio::test]
    async fn deprovision_tolerates_already_gone_instance() {
        let inner = Arc::new(AlwaysFails("InvalidInstanceID.NotFound"));
        let retrying = RetryingProvisioner::new(inner);

        let result = retrying
            .deprovision(DeprovisionInput {
                session_id: "ses_1".into(),
                user_id: "usr_1".into(),
                region: "us-east-1".into(),
                aws_instance_id: "i-123".into(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn backoff_delay_is_clamped() {
        for attempt in 1..=MAX_ATTEMPTS {
            let delay = backoff_delay(attempt);
            assert!(delay <= MAX_DELAY);
            assert!(delay.as_millis() > 0);
        }
    }
}
