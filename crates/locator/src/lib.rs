//! Object locator parsing.
//!
//! A [`Locator`] identifies one object inside a storage provider:
//! a bucket/container plus an object path. Parsing is purely
//! syntactic and never touches the network.
//!
//! Supported forms:
//! - `s3://bucket/key`
//! - `gs://bucket/object`
//! - `azure://container/blob`
//! - `azure://account@container/blob`
//! - `https://account.blob.core.windows.net/container/blob`
//! - `file:///abs/path`, `file://rel/path`, or a bare filesystem path

use std::fmt;

/// Errors produced while parsing a locator.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("unsupported URL format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed {scheme} URL, expected {expected}: {url}")]
    Malformed {
        scheme: &'static str,
        expected: &'static str,
        url: String,
    },
}

/// A parsed object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// AWS S3 object: `s3://bucket/key`.
    S3 { bucket: String, key: String },

    /// Google Cloud Storage object: `gs://bucket/object`.
    Gcs { bucket: String, object: String },

    /// Azure Blob Storage object. The account may be omitted in the
    /// `azure://` scheme and resolved later from the environment.
    Azure {
        account: Option<String>,
        container: String,
        blob: String,
    },

    /// Local filesystem path.
    File { path: String },
}

impl Locator {
    /// Parses a locator from its URL form.
    ///
    /// Strings without a recognized `scheme://` prefix are treated as
    /// local filesystem paths.
    pub fn parse(url: &str) -> Result<Self, LocatorError> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = split_bucket_path(rest).ok_or(LocatorError::Malformed {
                scheme: "s3",
                expected: "s3://bucket/key",
                url: url.to_string(),
            })?;
            return Ok(Locator::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, object) = split_bucket_path(rest).ok_or(LocatorError::Malformed {
                scheme: "gs",
                expected: "gs://bucket/object",
                url: url.to_string(),
            })?;
            return Ok(Locator::Gcs {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }

        if let Some(rest) = url.strip_prefix("azure://") {
            let (authority, blob) = split_bucket_path(rest).ok_or(LocatorError::Malformed {
                scheme: "azure",
                expected: "azure://[account@]container/blob",
                url: url.to_string(),
            })?;
            let (account, container) = match authority.split_once('@') {
                Some((account, container)) if !account.is_empty() && !container.is_empty() => {
                    (Some(account.to_string()), container.to_string())
                }
                Some(_) => {
                    return Err(LocatorError::Malformed {
                        scheme: "azure",
                        expected: "azure://[account@]container/blob",
                        url: url.to_string(),
                    });
                }
                None => (None, authority.to_string()),
            };
            return Ok(Locator::Azure {
                account,
                container,
                blob: blob.to_string(),
            });
        }

        // Azure HTTPS form: https://account.blob.core.windows.net/container/blob
        if let Some(rest) = url.strip_prefix("https://") {
            if let Some((host, path)) = rest.split_once('/') {
                if let Some(account) = host.strip_suffix(".blob.core.windows.net") {
                    let (container, blob) =
                        split_bucket_path(path).ok_or(LocatorError::Malformed {
                            scheme: "azure",
                            expected: "https://account.blob.core.windows.net/container/blob",
                            url: url.to_string(),
                        })?;
                    if account.is_empty() {
                        return Err(LocatorError::Malformed {
                            scheme: "azure",
                            expected: "https://account.blob.core.windows.net/container/blob",
                            url: url.to_string(),
                        });
                    }
                    return Ok(Locator::Azure {
                        account: Some(account.to_string()),
                        container: container.to_string(),
                        blob: blob.to_string(),
                    });
                }
            }
            return Err(LocatorError::UnsupportedFormat(url.to_string()));
        }

        if let Some(rest) = url.strip_prefix("file://") {
            if rest.is_empty() {
                return Err(LocatorError::Malformed {
                    scheme: "file",
                    expected: "file:///path",
                    url: url.to_string(),
                });
            }
            return Ok(Locator::File {
                path: rest.to_string(),
            });
        }

        // Reject anything that looks like an unknown scheme.
        if let Some((scheme, _)) = url.split_once("://") {
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(LocatorError::UnsupportedFormat(url.to_string()));
            }
        }

        if url.is_empty() {
            return Err(LocatorError::UnsupportedFormat(url.to_string()));
        }

        // Bare path.
        Ok(Locator::File {
            path: url.to_string(),
        })
    }

    /// The scheme this locator was parsed from.
    pub fn scheme(&self) -> &'static str {
        match self {
            Locator::S3 { .. } => "s3",
            Locator::Gcs { .. } => "gs",
            Locator::Azure { .. } => "azure",
            Locator::File { .. } => "file",
        }
    }
}

/// Splits `bucket/rest-of-path`, requiring both sides non-empty.
fn split_bucket_path(s: &str) -> Option<(&str, &str)> {
    let (bucket, path) = s.split_once('/')?;
    if bucket.is_empty() || path.is_empty() {
        return None;
    }
    Some((bucket, path))
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            Locator::Gcs { bucket, object } => write!(f, "gs://{bucket}/{object}"),
            Locator::Azure {
                account: Some(account),
                container,
                blob,
            } => write!(f, "azure://{account}@{container}/{blob}"),
            Locator::Azure {
                account: None,
                container,
                blob,
            } => write!(f, "azure://{container}/{blob}"),
            Locator::File { path } => write!(f, "file://{path}"),
        }
    }
}
