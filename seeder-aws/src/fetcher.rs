//! Blocking [`Fetch`] implementation over the AWS SDK.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::runtime::Handle;

use seeder_core::{Address, AwsSettings};
use seeder_sync::{Fetch, FetchError, RemoteKey, Snapshot};

use crate::classify::{classify, to_utc};
use crate::endpoint::ObjectEndpoint;

/// One set of clients shared by every seed. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AwsFetcher {
    config: SdkConfig,
    ssm: aws_sdk_ssm::Client,
    secrets: aws_sdk_secretsmanager::Client,
    handle: Handle,
}

impl AwsFetcher {
    /// Load the shared SDK config (environment, profile, IMDS) with the
    /// optional region and profile overrides, and capture the current runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub async fn load(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        tracing::debug!(region = ?config.region(), "loaded aws config");
        Self::new(config, Handle::current())
    }

    pub fn new(config: SdkConfig, handle: Handle) -> Self {
        Self {
            ssm: aws_sdk_ssm::Client::new(&config),
            secrets: aws_sdk_secretsmanager::Client::new(&config),
            config,
            handle,
        }
    }

    async fn parameter(&self, name: &str) -> Result<Snapshot, FetchError> {
        let out = self
            .ssm
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| classify(&format!("GetParameter {name}"), e))?;
        let parameter = out
            .parameter()
            .ok_or_else(|| FetchError::NotFound(format!("parameter {name}")))?;
        Ok(Snapshot::new(
            parameter.value().unwrap_or_default(),
            to_utc(parameter.last_modified_date()),
        ))
    }

    async fn secret(&self, id: &str) -> Result<Snapshot, FetchError> {
        let out = self
            .secrets
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .map_err(|e| classify(&format!("GetSecretValue {id}"), e))?;
        let value: Vec<u8> = match (out.secret_string(), out.secret_binary()) {
            (Some(text), _) => text.as_bytes().to_vec(),
            (None, Some(blob)) => blob.as_ref().to_vec(),
            (None, None) => Vec::new(),
        };
        Ok(Snapshot::new(value, to_utc(out.created_date())))
    }

    async fn object(&self, address: &Address) -> Result<Snapshot, FetchError> {
        let key = address
            .key()
            .ok_or_else(|| FetchError::Other(format!("{address} names a bucket, not an object")))?;
        let client = self.object_client(&ObjectEndpoint::for_address(address));
        let out = client
            .get_object()
            .bucket(address.bucket())
            .key(key)
            .set_version_id(address.version_id().map(str::to_owned))
            .send()
            .await
            .map_err(|e| classify(&format!("GetObject {address}"), e))?;
        let modified_at = to_utc(out.last_modified());
        let body = out
            .body
            .collect()
            .await
            .map_err(|e| FetchError::Transient(format!("GetObject {address}: body: {e}")))?;
        Ok(Snapshot::new(body.into_bytes().to_vec(), modified_at))
    }

    fn object_client(&self, endpoint: &ObjectEndpoint) -> aws_sdk_s3::Client {
        let mut builder = aws_sdk_s3::config::Builder::from(&self.config)
            .force_path_style(endpoint.force_path_style)
            .accelerate(endpoint.accelerate)
            .use_dual_stack(endpoint.dual_stack);
        if let Some(region) = &endpoint.region {
            builder = builder.region(aws_sdk_s3::config::Region::new(region.clone()));
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }
}

impl Fetch for AwsFetcher {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, FetchError> {
        tracing::debug!(key = %key, "fetching");
        let result = self.handle.block_on(async {
            match key {
                RemoteKey::Parameter { name } => self.parameter(name).await,
                RemoteKey::Secret { id } => self.secret(id).await,
                RemoteKey::Object(address) => self.object(address).await,
            }
        });
        match &result {
            Ok(snapshot) => tracing::debug!(
                key = %key,
                bytes = snapshot.len(),
                modified_at = %snapshot.modified_at(),
                "fetched"
            ),
            Err(err) => tracing::debug!(key = %key, error = %err, "fetch failed"),
        }
        result
    }
}
