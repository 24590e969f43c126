use crate::{error::RuntimeError, ssm::SsmClient};
use aws_sdk_s3::{model::ServerSideEncryption, types::ByteStream, Client, Error};
use aws_smithy_types::date_time::Format;
use std::path::{Path, PathBuf};

/// S3 client implementation.
///
/// Resolves the well-known data lake bucket names from SSM at
/// construction time and wraps the object operations the pipeline stages
/// need.
pub struct S3Client {
    inner: Client,
    raw_bucket: String,
    stage_bucket: String,
    analytics_bucket: String,
    artifacts_bucket: String,
}

impl S3Client {
    /// Initialize the S3 client and resolve the bucket names.
    #[tracing::instrument(skip(config, ssm))]
    pub async fn new(config: &aws_types::SdkConfig, ssm: &SsmClient) -> Result<S3Client, RuntimeError> {
        tracing::info!("Initializing S3 client");
        // The analytics parameter may hold an ARN; keep the bucket name only.
        let analytics_bucket = ssm.get_parameter("/SDLF2/S3/AnalyticsBucket").await?;
        let analytics_bucket = analytics_bucket
            .rsplit(':')
            .next()
            .unwrap_or(analytics_bucket.as_str())
            .to_string();

        Ok(S3Client {
            inner: Client::new(config),
            raw_bucket: ssm.get_parameter("/SDLF2/S3/RawBucket").await?,
            stage_bucket: ssm.get_parameter("/SDLF2/S3/StageBucket").await?,
            analytics_bucket,
            artifacts_bucket: ssm.get_parameter("/SDLF2/S3/ArtifactsBucket").await?,
        })
    }

    /// Landing bucket for raw objects
    pub fn raw_bucket(&self) -> &str {
        &self.raw_bucket
    }

    /// Bucket holding transformed stage output
    pub fn stage_bucket(&self) -> &str {
        &self.stage_bucket
    }

    /// Bucket holding analytics-ready output
    pub fn analytics_bucket(&self) -> &str {
        &self.analytics_bucket
    }

    /// Bucket holding pipeline artifacts
    pub fn artifacts_bucket(&self) -> &str {
        &self.artifacts_bucket
    }

    /// Download an object into `/tmp/{bucket}/`, recreating the directory,
    /// and return the local path.
    #[tracing::instrument(skip(self))]
    pub async fn download_object(&self, bucket: &str, key: &str) -> Result<PathBuf, RuntimeError> {
        let dir_path = Path::new("/tmp").join(bucket);
        // A previous invocation of the same execution environment may have
        // left files behind.
        let _ = tokio::fs::remove_dir_all(&dir_path).await;
        tokio::fs::create_dir_all(&dir_path).await?;

        let object_path = dir_path.join(key.rsplit('/').next().unwrap_or(key));
        let key = unquote_plus(key)?;

        let object = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(&key)
            .send()
            .await
            .map_err(Error::from)?;
        let data = object.body.collect().await?;
        tokio::fs::write(&object_path, data.into_bytes()).await?;

        Ok(object_path)
    }

    /// Upload a local file, optionally under SSE-KMS with the given key.
    #[tracing::instrument(skip(self))]
    pub async fn upload_object(
        &self,
        object_path: &Path,
        bucket: &str,
        key: &str,
        kms_key: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let body = ByteStream::from_path(object_path).await?;
        let mut request = self.inner.put_object().bucket(bucket).key(key).body(body);
        if let Some(kms_key) = kms_key {
            request = request
                .server_side_encryption(ServerSideEncryption::AwsKms)
                .ssekms_key_id(kms_key);
        }
        request.send().await.map_err(Error::from)?;

        Ok(())
    }

    /// Server-side copy of an object, optionally re-encrypting under the
    /// given KMS key. The destination key defaults to the source key.
    #[tracing::instrument(skip(self))]
    pub async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: Option<&str>,
        kms_key: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let source_key = unquote_plus(source_key)?;
        let dest_key = dest_key.unwrap_or(&source_key);
        // x-amz-copy-source wants the key percent-encoded, slashes kept.
        let copy_source = format!(
            "{}/{}",
            source_bucket,
            urlencoding::encode(&source_key).replace("%2F", "/")
        );

        let mut request = self
            .inner
            .copy_object()
            .copy_source(copy_source)
            .bucket(dest_bucket)
            .key(dest_key);
        if let Some(kms_key) = kms_key {
            request = request
                .server_side_encryption(ServerSideEncryption::AwsKms)
                .ssekms_key_id(kms_key);
        }
        request.send().await.map_err(Error::from)?;

        Ok(())
    }

    /// Object size in bytes and its last-modified time in ISO-8601.
    #[tracing::instrument(skip(self))]
    pub async fn get_size_and_last_modified(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<(i64, String), RuntimeError> {
        let metadata = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(Error::from)?;

        let last_modified = metadata
            .last_modified
            .ok_or_else(|| RuntimeError::MissingField("LastModified".into()))?
            .fmt(Format::DateTime)?;

        Ok((metadata.content_length, last_modified))
    }
}

/// Decode an S3-notification object key: '+' means space, the rest is
/// percent-encoded.
fn unquote_plus(key: &str) -> Result<String, RuntimeError> {
    let key = key.replace('+', " ");
    Ok(urlencoding::decode(&key)?.into_owned())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use aws_sdk_s3::{Client, Config};
    use aws_smithy_client::{erase::DynConnector, test_connection::TestConnection};
    use aws_smithy_http::body::SdkBody;

    fn client_with(conn: TestConnection<SdkBody>, config: &aws_types::SdkConfig) -> S3Client {
        let config = Config::new(config);
        S3Client {
            inner: Client::from_conf_conn(config, DynConnector::new(conn)),
            raw_bucket: "raw".into(),
            stage_bucket: "stage".into(),
            analytics_bucket: "analytics".into(),
            artifacts_bucket: "artifacts".into(),
        }
    }

    #[test]
    fn test_unquote_plus() {
        assert_eq!(
            "engineering/legislators/my file.json",
            unquote_plus("engineering/legislators/my+file%2Ejson").unwrap()
        );
    }

    #[tokio::test]
    async fn test_get_size_and_last_modified() -> Result<(), RuntimeError> {
        // GIVEN an object with known metadata
        let conn = TestConnection::new(vec![(
            get_request_builder("s3")
                .body(SdkBody::empty())
                .unwrap(),
            http::Response::builder()
                .status(200)
                .header("content-length", "1024")
                .header("last-modified", "Sat, 01 Jan 2022 00:00:00 GMT")
                .body(SdkBody::empty())
                .unwrap(),
        )]);
        let store = client_with(conn, &get_mock_config().await);

        // WHEN heading the object
        let (size, last_modified) = store
            .get_size_and_last_modified("raw", "engineering/legislators/persons.json")
            .await?;

        // THEN size and timestamp come back formatted
        assert_eq!(1024, size);
        assert_eq!("2022-01-01T00:00:00Z", last_modified);

        Ok(())
    }

    #[tokio::test]
    async fn test_download_object() -> Result<(), RuntimeError> {
        let conn = TestConnection::new(vec![(
            get_request_builder("s3").body(SdkBody::empty()).unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(r#"[{"name":"value"}]"#))
                .unwrap(),
        )]);
        let store = client_with(conn, &get_mock_config().await);

        let path = store
            .download_object("raw-bucket-test", "engineering/legislators/persons.json")
            .await?;

        assert_eq!(
            Path::new("/tmp/raw-bucket-test/persons.json"),
            path.as_path()
        );
        let contents = tokio::fs::read_to_string(&path).await?;
        assert_eq!(r#"[{"name":"value"}]"#, contents);

        Ok(())
    }

    #[tokio::test]
    async fn test_upload_object_with_kms_key() -> Result<(), RuntimeError> {
        let conn = TestConnection::new(vec![(
            get_request_builder("s3").body(SdkBody::empty()).unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::empty())
                .unwrap(),
        )]);
        let store = client_with(conn.clone(), &get_mock_config().await);

        let local = Path::new("/tmp/upload_object_with_kms_key.json");
        tokio::fs::write(local, r#"[{"name":"value"}]"#).await?;
        store
            .upload_object(local, "stage", "pre-stage/engineering/legislators/persons_parsed.json", Some("key-arn"))
            .await?;

        // the encryption headers ride along with the PUT
        let requests = conn.requests();
        let request = &requests[0].actual;
        assert_eq!(
            "aws:kms",
            request.headers()["x-amz-server-side-encryption"].to_str().unwrap()
        );
        assert_eq!(
            "key-arn",
            request.headers()["x-amz-server-side-encryption-aws-kms-key-id"]
                .to_str()
                .unwrap()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_copy_object() -> Result<(), RuntimeError> {
        let conn = TestConnection::new(vec![(
            get_request_builder("s3").body(SdkBody::empty()).unwrap(),
            http::Response::builder()
                .status(200)
                .body(SdkBody::from(
                    "<CopyObjectResult><ETag>\"etag\"</ETag></CopyObjectResult>",
                ))
                .unwrap(),
        )]);
        let store = client_with(conn.clone(), &get_mock_config().await);

        store
            .copy_object("raw", "engineering/legislators/persons.json", "stage", None, None)
            .await?;

        let requests = conn.requests();
        let request = &requests[0].actual;
        assert_eq!(
            "raw/engineering/legislators/persons.json",
            request.headers()["x-amz-copy-source"].to_str().unwrap()
        );

        Ok(())
    }
}
