use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{PlanDataSource, PlanNodeMutations};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::model::{
    current_scenario, AuthResponse, CreatePlanNodeDto, CreateScenarioDto, CreateServiceDto,
    LoginRequest, NodeId, PlanNode, RolloverScenarioDto, Scenario, ScenarioId, Service,
    UpdatePlanNodeDto, UpdateScenarioDto, User,
};

/// JSON-over-HTTP client for the planning backend
#[derive(Clone)]
pub struct HttpApi {
    base_url: Url,
    client: Client,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self, ApiError> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(Self {
            base_url,
            client,
            token,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(builder.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        self.send_json(self.request(Method::POST, url).json(body)).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post(&["auth", "login"], request).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get(&["users", "me"]).await
    }

    pub async fn list_scenarios(&self) -> Result<Vec<Scenario>, ApiError> {
        self.get(&["scenarios"]).await
    }

    pub async fn create_scenario(&self, dto: &CreateScenarioDto) -> Result<Scenario, ApiError> {
        self.post(&["scenarios"], dto).await
    }

    pub async fn update_scenario(
        &self,
        id: &ScenarioId,
        dto: &UpdateScenarioDto,
    ) -> Result<Scenario, ApiError> {
        let url = self.endpoint(&["scenarios", id.as_str()])?;
        self.send_json(self.request(Method::PATCH, url).json(dto)).await
    }

    pub async fn delete_scenario(&self, id: &ScenarioId) -> Result<(), ApiError> {
        let url = self.endpoint(&["scenarios", id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }

    pub async fn activate_scenario(&self, id: &ScenarioId) -> Result<(), ApiError> {
        let url = self.endpoint(&["scenarios", id.as_str(), "activate"])?;
        self.send_empty(self.request(Method::POST, url)).await
    }

    pub async fn rollover_scenario(
        &self,
        source: &ScenarioId,
        dto: &RolloverScenarioDto,
    ) -> Result<Scenario, ApiError> {
        self.post(&["scenarios", source.as_str(), "rollover"], dto)
            .await
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        self.get(&["services"]).await
    }

    pub async fn create_service(&self, dto: &CreateServiceDto) -> Result<Service, ApiError> {
        self.post(&["services"], dto).await
    }
}

#[async_trait]
impl PlanDataSource for HttpApi {
    async fn fetch_plan_nodes(
        &self,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Vec<PlanNode>, ApiError> {
        let Some(scenario_id) = scenario_id else {
            debug!("No scenario selected, skipping plan node fetch");
            return Ok(Vec::new());
        };
        let mut url = self.endpoint(&["plan-nodes"])?;
        url.query_pairs_mut()
            .append_pair("scenario_id", scenario_id.as_str());
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn fetch_current_scenario(&self) -> Result<Option<Scenario>, ApiError> {
        let scenarios = self.list_scenarios().await?;
        Ok(current_scenario(&scenarios).cloned())
    }
}

#[async_trait]
impl PlanNodeMutations for HttpApi {
    async fn create_plan_node(&self, dto: &CreatePlanNodeDto) -> Result<PlanNode, ApiError> {
        self.post(&["plan-nodes"], dto).await
    }

    async fn update_plan_node(
        &self,
        id: &NodeId,
        _dto: &UpdatePlanNodeDto,
    ) -> Result<PlanNode, ApiError> {
        warn!("Update requested for plan node {} but no update route exists", id);
        Err(ApiError::NotImplemented("Editing plan nodes"))
    }

    async fn delete_plan_node(&self, id: &NodeId) -> Result<(), ApiError> {
        let url = self.endpoint(&["plan-nodes", id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("Request failed with {}: {}", status, body);
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message: extract_message(&body),
    })
}

/// Human-readable text from an error body: plain text, or the `message` /
/// `error` field of a JSON object
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                if !text.trim().is_empty() {
                    return Some(text.trim().to_string());
                }
            }
        }
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> HttpApi {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            timeout_sec: 5,
        };
        HttpApi::new(&config, Some("token".to_string())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = api("http://localhost:8080");
        assert_eq!(
            api.endpoint(&["plan-nodes", "abc"]).unwrap().as_str(),
            "http://localhost:8080/plan-nodes/abc"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_ids() {
        let api = api("https://plan.example.com/api");
        assert_eq!(
            api.endpoint(&["scenarios", "a b/c", "activate"])
                .unwrap()
                .as_str(),
            "https://plan.example.com/api/scenarios/a%20b%2Fc/activate"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = ApiConfig {
            base_url: "mailto:ops@example.com".to_string(),
            timeout_sec: 5,
        };
        assert!(matches!(
            HttpApi::new(&config, None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(extract_message("  "), None);
        assert_eq!(
            extract_message("Cannot delete node with children"),
            Some("Cannot delete node with children".to_string())
        );
        assert_eq!(
            extract_message(r#"{"message": "Scenario is locked"}"#),
            Some("Scenario is locked".to_string())
        );
        assert_eq!(extract_message(r#"{"code": 3}"#), None);
    }

    #[tokio::test]
    async fn test_no_scenario_means_no_nodes() {
        let api = api("http://127.0.0.1:9");
        assert!(api.fetch_plan_nodes(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_is_not_implemented() {
        let api = api("http://127.0.0.1:9");
        let err = api
            .update_plan_node(&NodeId::from("n"), &UpdatePlanNodeDto::default())
            .await
            .unwrap_err();
        assert!(err.is_not_implemented());
        assert_eq!(err.to_string(), "Editing plan nodes is not supported yet");
    }
}
