use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{
    DeprovisionInput, ProvisionInput, ProvisionedRelay, Provisioner, ProvisionerError,
};

/// Talks to the external cloud provisioner over a small JSON convention of
/// our own choosing (`spec.md` §6 specifies only the two-operation contract
/// and the error-code taxonomy, not a wire format). Not meant to be the
/// final word on that format; swapping it out never touches `Provisioner`
/// callers.
pub struct HttpProvisioner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProvisioner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct ProvisionRequest<'a> {
    session_id: &'a str,
    user_id: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct ProvisionResponse {
    aws_instance_id: String,
    ami_id: String,
    instance_type: String,
    public_ip: String,
    srt_port: i32,
    ws_url: String,
}

#[derive(Serialize)]
struct DeprovisionRequest<'a> {
    session_id: &'a str,
    user_id: &'a str,
    region: &'a str,
    aws_instance_id: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

async fn classify_error(response: reqwest::Response) -> ProvisionerError {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => ProvisionerError::new(body.code, body.message),
        Err(_) => ProvisionerError::new("InternalError", format!("provisioner returned {status}")),
    }
}

#[async_trait]
impl Provisioner for HttpProvisioner {
    async fn provision(&self, input: ProvisionInput) -> Result<ProvisionedRelay, ProvisionerError> {
        let response = self
            .client
            .post(format!("{}/provision", self.base_url))
            .json(&ProvisionRequest {
                session_id: &input.session_id,
                user_id: &input.user_id,
                region: &input.region,
            })
            .send()
            .await
            .map_err(|e| ProvisionerError::new("InternalError", e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_error(response).await);
        }

        let body: ProvisionResponse = response
            .json()
            .await
            .map_err(|e| ProvisionerError::new("InternalError", e.to_string()))?;

        Ok(ProvisionedRelay {
            aws_instance_id: body.aws_instance_id,
            ami_id: body.ami_id,
            instance_type: body.instance_type,
            public_ip: body.public_ip,
            srt_port: body.srt_port,
            ws_url: body.ws_url,
        })
    }

    async fn deprovision(&self, input: DeprovisionInput) -> Result<(), ProvisionerError> {
        let response = self
            .client
            .post(format!("{}/deprovision", self.base_url))
            .json(&DeprovisionRequest {
                session_id: &input.session_id,
                user_id: &input.user_id,
                region: &input.region,
                aws_instance_id: &input.aws_instance_id,
            })
            .send()
            .await
            .map_err(|e| ProvisionerError::new("InternalError", e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_error(response).await);
        }

        Ok(())
    }
}
