//! Blocking REST client for `rbac.authorization.k8s.io/v1` role bindings.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use rbac_core::{CollaboratorError, Lister, MutationSink, RoleBinding};

use crate::config::ClusterConfig;
use crate::error::KubeClientError;

const ROLE_BINDINGS_PATH: &str = "apis/rbac.authorization.k8s.io/v1";

#[derive(Debug, Deserialize)]
struct RoleBindingListResponse {
    #[serde(default)]
    items: Vec<RoleBinding>,
}

/// Cluster API client.
pub struct KubeClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    server_dry_run: bool,
}

impl KubeClient {
    pub fn new(config: &ClusterConfig) -> Result<Self, KubeClientError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout);

        if let Some(path) = &config.certificate_authority {
            let pem = std::fs::read(path).map_err(|source| KubeClientError::Certificate {
                path: path.clone(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        if config.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.server.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            server_dry_run: config.server_dry_run(),
        })
    }

    /// Build headers for requests.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // Tokens with non-visible ASCII are skipped rather than sent mangled
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn collection_url(&self, namespace: &str) -> String {
        format!(
            "{}/{}/namespaces/{}/rolebindings",
            self.base_url,
            ROLE_BINDINGS_PATH,
            urlencoding::encode(namespace)
        )
    }

    fn item_url(&self, namespace: &str, name: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(namespace),
            urlencoding::encode(name)
        )
    }

    fn with_dry_run(&self, request: RequestBuilder) -> RequestBuilder {
        if self.server_dry_run {
            request.query(&[("dryRun", "All")])
        } else {
            request
        }
    }

    fn check(resp: Response) -> Result<Response, KubeClientError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let text = resp.text().unwrap_or_default();
        Err(KubeClientError::from_status(status, &text))
    }

    /// List all role bindings of a namespace. Items missing `apiVersion` /
    /// `kind` (as list responses usually are) get them filled in.
    pub fn list_role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, KubeClientError> {
        let url = self.collection_url(namespace);
        debug!("GET {}", url);

        let resp = Self::check(self.client.get(&url).headers(self.headers()).send()?)?;
        let body = resp.text()?;
        let list: RoleBindingListResponse = serde_json::from_str(&body)?;

        Ok(list
            .items
            .into_iter()
            .map(|mut binding| {
                binding.ensure_type_meta();
                binding
            })
            .collect())
    }

    /// Replace a role binding. The binding's `resourceVersion` is sent as
    /// is, so a concurrent change surfaces as [`KubeClientError::Conflict`].
    pub fn replace_role_binding(&self, binding: &RoleBinding) -> Result<RoleBinding, KubeClientError> {
        let url = self.item_url(binding.namespace(), binding.name());
        debug!("PUT {} (server dry run: {})", url, self.server_dry_run);

        let request = self.with_dry_run(self.client.put(&url).headers(self.headers()).json(binding));
        let resp = Self::check(request.send()?)?;
        let body = resp.text()?;
        serde_json::from_str(&body).map_err(|e| {
            KubeClientError::InvalidResponse(format!("updated role binding: {}", e))
        })
    }

    pub fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<(), KubeClientError> {
        let url = self.item_url(namespace, name);
        debug!("DELETE {} (server dry run: {})", url, self.server_dry_run);

        let request = self.with_dry_run(self.client.delete(&url).headers(self.headers()));
        Self::check(request.send()?)?;
        Ok(())
    }
}

impl Lister for KubeClient {
    fn list(&self, namespace: &str) -> Result<Vec<RoleBinding>, CollaboratorError> {
        Ok(self.list_role_bindings(namespace)?)
    }
}

impl MutationSink for KubeClient {
    fn update(&self, binding: &RoleBinding) -> Result<(), CollaboratorError> {
        self.replace_role_binding(binding)?;
        Ok(())
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), CollaboratorError> {
        Ok(self.delete_role_binding(namespace, name)?)
    }
}
