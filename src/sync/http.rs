//! HTTP task provider
//!
//! Talks to a Google-Tasks-shaped REST API:
//!
//! ```text
//! GET    {base}/lists/{list}/tasks          list (paged via nextPageToken)
//! POST   {base}/lists/{list}/tasks          create
//! PATCH  {base}/lists/{list}/tasks/{id}     update
//! DELETE {base}/lists/{list}/tasks/{id}     delete
//! ```
//!
//! The client is blocking (`ureq`), so every call runs on the blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::provider::{NewRemoteTask, ProviderError, RemoteTask, RemoteTaskPatch, TaskProvider};
use crate::config::SyncSettings;

/// Upper bound on list pages, in case the server keeps handing out tokens
const MAX_LIST_PAGES: usize = 50;

const STATUS_COMPLETED: &str = "completed";
const STATUS_OPEN: &str = "needsAction";

fn encode_url_path_segment(segment: &str) -> String {
    // RFC3986 unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
    let mut out = String::with_capacity(segment.len());
    for &b in segment.as_bytes() {
        let is_unreserved =
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~');
        if is_unreserved {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", b));
        }
    }
    out
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTaskPage {
    #[serde(default)]
    items: Vec<WireTask>,
    #[serde(default)]
    next_page_token: Option<String>,
}

fn status_of(completed: bool) -> String {
    if completed { STATUS_COMPLETED } else { STATUS_OPEN }.to_string()
}

/// Dates travel as RFC 3339 midnight UTC; only the date part matters
fn due_to_wire(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

fn due_from_wire(due: &str) -> Option<NaiveDate> {
    due.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl WireTask {
    fn into_remote(self) -> Result<RemoteTask, ProviderError> {
        let id = self
            .id
            .ok_or_else(|| ProviderError::Protocol("task without id".to_string()))?;
        Ok(RemoteTask {
            id,
            title: self.title.unwrap_or_default(),
            notes: self.notes,
            completed: self.status.as_deref() == Some(STATUS_COMPLETED),
            due: self.due.as_deref().and_then(due_from_wire),
        })
    }
}

/// Map a ureq failure onto the provider error taxonomy
fn map_error(err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(401, _) => ProviderError::AuthExpired,
        ureq::Error::Status(403 | 429, _) => ProviderError::Quota,
        ureq::Error::Status(code, response) => {
            ProviderError::Protocol(format!("HTTP {} {}", code, response.status_text()))
        }
        ureq::Error::Transport(transport) => ProviderError::Network(transport.to_string()),
    }
}

fn decode_error(err: std::io::Error) -> ProviderError {
    ProviderError::Protocol(format!("failed to decode response: {err}"))
}

/// Run blocking HTTP work off the async executor
async fn blocking<T, F>(f: F) -> Result<T, ProviderError>
where
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProviderError::Network(format!("provider call aborted: {e}")))?
}

/// REST task provider authenticated with a bearer token
#[derive(Clone)]
pub struct HttpTaskProvider {
    base_url: String,
    task_list: String,
    auth_header: String,
    client: ureq::Agent,
}

impl HttpTaskProvider {
    pub fn new(
        base_url: impl Into<String>,
        task_list: impl Into<String>,
        access_token: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            task_list: task_list.into(),
            auth_header: format!("Bearer {access_token}"),
            client,
        }
    }

    /// Build from settings; `None` unless sync is enabled and authorized
    pub fn from_settings(settings: &SyncSettings) -> Option<Self> {
        if !settings.is_authorized() {
            return None;
        }
        let token = settings.access_token.as_deref()?;
        Some(Self::new(
            settings.base_url.clone(),
            settings.task_list.clone(),
            token.trim(),
            Duration::from_secs(settings.connect_timeout_secs),
            Duration::from_secs(settings.read_timeout_secs),
        ))
    }

    fn tasks_url(&self) -> String {
        format!(
            "{}/lists/{}/tasks",
            self.base_url,
            encode_url_path_segment(&self.task_list)
        )
    }

    fn task_url(&self, remote_id: &str) -> String {
        format!("{}/{}", self.tasks_url(), encode_url_path_segment(remote_id))
    }

    fn list_blocking(&self) -> Result<Vec<RemoteTask>, ProviderError> {
        let url = self.tasks_url();
        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut request = self
                .client
                .get(&url)
                .set("Authorization", &self.auth_header)
                .query("showCompleted", "true")
                .query("showHidden", "true")
                .query("maxResults", "100");
            if let Some(token) = &page_token {
                request = request.query("pageToken", token);
            }

            let page: WireTaskPage = request
                .call()
                .map_err(map_error)?
                .into_json()
                .map_err(decode_error)?;

            for item in page.items {
                tasks.push(item.into_remote()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(tasks),
            }
        }

        tracing::warn!("Task list still paging after {} pages, giving up", MAX_LIST_PAGES);
        Err(ProviderError::Protocol(format!(
            "task list exceeded {MAX_LIST_PAGES} pages"
        )))
    }

    fn create_blocking(&self, task: &NewRemoteTask) -> Result<String, ProviderError> {
        let body = WireTask {
            title: Some(task.title.clone()),
            notes: task.notes.clone(),
            status: Some(status_of(task.completed)),
            due: Some(due_to_wire(task.due)),
            ..WireTask::default()
        };
        let created: WireTask = self
            .client
            .post(&self.tasks_url())
            .set("Authorization", &self.auth_header)
            .send_json(&body)
            .map_err(map_error)?
            .into_json()
            .map_err(decode_error)?;
        created
            .id
            .ok_or_else(|| ProviderError::Protocol("created task has no id".to_string()))
    }

    fn update_blocking(&self, remote_id: &str, patch: &RemoteTaskPatch) -> Result<(), ProviderError> {
        let body = WireTask {
            title: patch.title.clone(),
            status: patch.completed.map(status_of),
            ..WireTask::default()
        };
        self.client
            .patch(&self.task_url(remote_id))
            .set("Authorization", &self.auth_header)
            .send_json(&body)
            .map_err(map_error)?;
        Ok(())
    }

    fn delete_blocking(&self, remote_id: &str) -> Result<(), ProviderError> {
        match self
            .client
            .delete(&self.task_url(remote_id))
            .set("Authorization", &self.auth_header)
            .call()
        {
            Ok(_) => Ok(()),
            // Already gone
            Err(ureq::Error::Status(404 | 410, _)) => Ok(()),
            Err(e) => Err(map_error(e)),
        }
    }
}

#[async_trait]
impl TaskProvider for HttpTaskProvider {
    async fn create_task(&self, task: &NewRemoteTask) -> Result<String, ProviderError> {
        let this = self.clone();
        let task = task.clone();
        blocking(move || this.create_blocking(&task)).await
    }

    async fn update_task(&self, remote_id: &str, patch: &RemoteTaskPatch) -> Result<(), ProviderError> {
        let this = self.clone();
        let remote_id = remote_id.to_string();
        let patch = patch.clone();
        blocking(move || this.update_blocking(&remote_id, &patch)).await
    }

    async fn delete_task(&self, remote_id: &str) -> Result<(), ProviderError> {
        let this = self.clone();
        let remote_id = remote_id.to_string();
        blocking(move || this.delete_blocking(&remote_id)).await
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, ProviderError> {
        let this = self.clone();
        blocking(move || this.list_blocking()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_url_path_segment() {
        assert_eq!(encode_url_path_segment("@default"), "%40default");
        assert_eq!(encode_url_path_segment("abc-1_2.3~"), "abc-1_2.3~");
        assert_eq!(encode_url_path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_due_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
        assert_eq!(due_to_wire(date), "2024-11-05T00:00:00.000Z");
        assert_eq!(due_from_wire("2024-11-05T00:00:00.000Z"), Some(date));
        assert_eq!(due_from_wire("garbage"), None);
    }

    #[test]
    fn test_wire_task_parsing() {
        let json = r#"{"id":"t1","title":"[Prova] P1","status":"completed","due":"2024-11-05T00:00:00.000Z","etag":"x"}"#;
        let task: WireTask = serde_json::from_str(json).unwrap();
        let remote = task.into_remote().unwrap();
        assert_eq!(remote.id, "t1");
        assert!(remote.completed);
        assert_eq!(remote.due, NaiveDate::from_ymd_opt(2024, 11, 5));

        let no_id: WireTask = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(matches!(no_id.into_remote(), Err(ProviderError::Protocol(_))));
    }

    #[test]
    fn test_patch_body_only_carries_set_fields() {
        let body = WireTask {
            status: Some(status_of(true)),
            ..WireTask::default()
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"status":"completed"}"#);
    }

    #[test]
    fn test_from_settings_requires_authorization() {
        let mut settings = SyncSettings::default();
        assert!(HttpTaskProvider::from_settings(&settings).is_none());
        settings.enabled = true;
        settings.access_token = Some("  ".to_string());
        assert!(HttpTaskProvider::from_settings(&settings).is_none());
        settings.access_token = Some("tok".to_string());
        let provider = HttpTaskProvider::from_settings(&settings).unwrap();
        assert_eq!(
            provider.tasks_url(),
            "https://tasks.googleapis.com/tasks/v1/lists/%40default/tasks"
        );
    }
}
