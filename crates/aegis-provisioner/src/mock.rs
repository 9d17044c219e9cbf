use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{
    DeprovisionInput, ProvisionInput, ProvisionedRelay, Provisioner, ProvisionerError,
};

/// Scripted `Provisioner` for coordinator tests: records calls and returns
/// pre-programmed results in order.
pub struct MockProvisioner {
    provision_results: Mutex<Vec<Result<ProvisionedRelay, ProvisionerError>>>,
    deprovision_results: Mutex<Vec<Result<(), ProvisionerError>>>,
    provision_calls: Mutex<Vec<ProvisionInput>>,
    deprovision_calls: Mutex<Vec<DeprovisionInput>>,
}

impl Default for MockProvisioner {
    fn default() -> Self {
        Self {
            provision_results: Mutex::new(Vec::new()),
            deprovision_results: Mutex::new(Vec::new()),
            provision_calls: Mutex::new(Vec::new()),
            deprovision_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockProvisioner {
    pub fn push_provision_result(&self, result: Result<ProvisionedRelay, ProvisionerError>) {
        self.provision_results.lock().unwrap().push(result);
    }

    pub fn push_deprovision_result(&self, result: Result<(), ProvisionerError>) {
        self.deprovision_results.lock().unwrap().push(result);
    }

    pub fn provision_call_count(&self) -> usize {
        self.provision_calls.lock().unwrap().len()
    }

    pub fn deprovision_calls(&self) -> Vec<DeprovisionInput> {
        self.deprovision_calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| DeprovisionInput {
                session_id: c.session_id.clone(),
                user_id: c.user_id.clone(),
                region: c.region.clone(),
                aws_instance_id: c.aws_instance_id.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    async fn provision(&self, input: ProvisionInput) -> Result<ProvisionedRelay, ProvisionerError> {
        self.provision_calls.lock().unwrap().push(ProvisionInput {
            session_id: input.session_id,
            user_id: input.user_id,
            region: input.region,
        });
        self.provision_results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ProvisionerError::new("InternalError", "no scripted result")))
    }

    async fn deprovision(&self, input: DeprovisionInput) -> Result<(), ProvisionerError> {
        self.deprovision_calls.lock().unwrap().push(DeprovisionInput {
            session_id: input.session_id,
            user_id: input.user_id,
            region: input.region,
            aws_instance_id: input.aws_instance_id,
        });
        self.deprovision_results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Ok(()))
    }
}
