//! Absolute URLs for REST resources.

use folio_kernel::settings::ServerSettings;

/// Builds links of the form `{public_url}/{api_root}/{route}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestUrl {
    origin: String,
    api_root: String,
}

impl RestUrl {
    pub fn new(public_url: &str, api_root: &str) -> Self {
        Self {
            origin: public_url.trim_end_matches('/').to_string(),
            api_root: api_root.trim_matches('/').to_string(),
        }
    }

    pub fn from_settings(server: &ServerSettings) -> Self {
        Self::new(&server.public_url, &server.api_root)
    }

    /// Server-relative mount path of a namespace, e.g. `/api/vendor/v1`.
    pub fn mount_path(&self, namespace: &str) -> String {
        mount_path(&self.api_root, namespace)
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.origin, self.mount_path(route))
    }
}

pub(crate) fn mount_path(api_root: &str, route: &str) -> String {
    let api_root = api_root.trim_matches('/');
    let route = route.trim_start_matches('/');
    if api_root.is_empty() {
        format!("/{route}")
    } else {
        format!("/{api_root}/{route}")
    }
}
