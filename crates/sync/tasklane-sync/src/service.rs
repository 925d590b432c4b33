use tasklane_http::{ApiClient, ApiRequest, ApiResult};
use tasklane_types::{Task, TaskDraft, TaskId, TaskQuery};
use tracing::debug;

const TASKS_PATH: &str = "/tasks";

fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}

/// Typed access to the task endpoints. No caching, no retries.
#[derive(Clone)]
pub struct TaskService {
    api: ApiClient,
}

impl TaskService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Sorting, searching and limiting happen on the server.
    pub async fn list(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        debug!(?query, "Listing tasks");
        self.api
            .request(ApiRequest::get(TASKS_PATH).query(query.to_params()))
            .await
    }

    pub async fn create(&self, draft: &TaskDraft) -> ApiResult<Task> {
        self.api
            .request(ApiRequest::post(TASKS_PATH).json(draft)?)
            .await
    }

    /// Full replacement of the task's mutable fields.
    pub async fn update(&self, id: TaskId, draft: &TaskDraft) -> ApiResult<Task> {
        self.api
            .request(ApiRequest::put(task_path(id)).json(draft)?)
            .await
    }

    pub async fn delete(&self, id: TaskId) -> ApiResult<()> {
        self.api.execute(ApiRequest::delete(task_path(id))).await
    }
}
