//! S3 client wrapper for s3push

use anyhow::Result;
use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_s3::config::{BehaviorVersion, Builder as S3ConfigBuilder};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use s3push_core::{Acl, Credentials, Error, ObjectEntry, ObjectStore};
use tokio::fs::File;
use tracing::debug;

/// Create an S3 client from credentials
pub fn create_client(creds: &Credentials, region: &str, endpoint: Option<&str>) -> Result<Client> {
    creds.validate()?;

    let credentials = AwsCredentials::new(&creds.access_key, &creds.secret_key, None, None, "s3push");

    let mut builder = S3ConfigBuilder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials);

    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    Ok(Client::from_conf(builder.build()))
}

/// [`ObjectStore`] backed by one bucket of an S3 service
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        body: &mut File,
        size: u64,
        content_type: &str,
        acl: Acl,
    ) -> s3push_core::Result<()> {
        // The clone shares the read position the caller rewound
        let file = body.try_clone().await?;
        let stream = ByteStream::read_from()
            .file(file)
            .length(Length::Exact(size))
            .build()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .body(stream)
            .send()
            .await
            .map_err(|e| Error::Upload(DisplayErrorContext(&e).to_string()))?;

        debug!("PUT s3://{}/{} ({} bytes)", self.bucket, key, size);
        Ok(())
    }

    async fn list(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        marker: Option<&str>,
        max_keys: i32,
    ) -> s3push_core::Result<Vec<ObjectEntry>> {
        let mut req = self
            .client
            .list_objects()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(max_keys);

        if let Some(delimiter) = delimiter {
            req = req.delimiter(delimiter);
        }
        if let Some(marker) = marker {
            req = req.marker(marker);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::Upload(DisplayErrorContext(&e).to_string()))?;

        Ok(resp
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectEntry {
                    key: obj.key()?.to_string(),
                    size: obj.size().unwrap_or(0),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_requires_credentials() {
        let err = create_client(&Credentials::default(), "eu-west-1", None).unwrap_err();
        assert!(err.to_string().contains("access_key"));
    }

    #[tokio::test]
    async fn test_put_streams_large_file() {
        use aws_sdk_s3::config::retry::RetryConfig;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("huge.bin");
        // sparse, never fits in memory
        let size: u64 = 1 << 40;
        std::fs::File::create(&path).unwrap().set_len(size).unwrap();

        let config = S3ConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(AwsCredentials::new("AKID", "secret", None, None, "test"))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        let store = S3Store::new(Client::from_conf(config), "bucket");

        let mut file = File::open(&path).await.unwrap();
        let err = store
            .put("huge.bin", &mut file, size, "application/octet-stream", Acl::PublicRead)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
    }

    #[test]
    fn test_acl_maps_to_canned_acl() {
        assert_eq!(
            ObjectCannedAcl::from(Acl::PublicRead.as_str()),
            ObjectCannedAcl::PublicRead
        );
        assert_eq!(ObjectCannedAcl::from(Acl::Private.as_str()), ObjectCannedAcl::Private);
    }
}
