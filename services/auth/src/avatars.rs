//! Generated avatar images

use common::{BackendClient, ServiceError, ServiceResult};
use url::Url;

/// Builds URLs of avatar images rendered by the service
#[derive(Clone)]
pub struct Avatars {
    client: BackendClient,
}

impl Avatars {
    /// Create a new avatar URL builder
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// URL of an image showing the initials of `name`
    pub fn initials_url(&self, name: &str) -> ServiceResult<Url> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidUrl(
                "Cannot derive initials from an empty name".to_string(),
            ));
        }

        self.client
            .public_url("avatars/initials", &[("name", name.to_string())])
    }
}
