use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, Config};
use std::env;
use tracing::{error, info};
use uuid::Uuid;

use crate::TARGET_STORAGE;

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Upload an image to S3-compatible storage, returning its public URL.
/// Returns None when the bucket is not configured or the upload fails.
pub async fn upload_image(bytes: Vec<u8>, folder: &str, content_type: &str) -> Option<String> {
    let bucket_name = env::var("S3_BUCKET").ok()?;
    let endpoint_url = env::var("S3_ENDPOINT_URL").ok()?;
    let public_url = env::var("S3_PUBLIC_URL").ok()?;
    let access_key = env::var("S3_ACCESS_KEY_ID").ok()?;
    let secret_key = env::var("S3_SECRET_ACCESS_KEY").ok()?;

    let creds = Credentials::new(access_key, secret_key, None, None, "custom");
    let config = Config::builder()
        .region(Region::new("us-east-1"))
        .endpoint_url(&endpoint_url)
        .credentials_provider(creds)
        .behavior_version(BehaviorVersion::latest())
        .build();

    let client = Client::from_conf(config);

    let file_name = format!("{}/{}.{}", folder, Uuid::new_v4(), extension_for(content_type));

    match client
        .put_object()
        .bucket(&bucket_name)
        .key(&file_name)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
    {
        Ok(_) => {
            let file_url = format!("{}/{}", public_url, file_name);
            info!(target: TARGET_STORAGE, "Uploaded image: {}", file_url);
            Some(file_url)
        }
        Err(e) => {
            error!(target: TARGET_STORAGE, "Image upload failed: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "jpg");
    }
}
