//! Object storage (Cloudflare R2)
//!
//! Two public buckets: community post images and profile avatars,
//! each served through its own custom domain.

mod media;

pub use media::MediaStorage;

/// Shared rustls-backed HTTP client for the S3 SDK.
///
/// R2 rejects plain HTTP, so the connector is https-only.
pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(connector)
}
