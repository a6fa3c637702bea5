//! Remote persistence adapter over the task HTTP API.
//!
//! # Responsibility
//! - Map store mutations onto `GET/POST/PUT/DELETE {base}/tasks[/{id}]`.
//! - Surface network failures and non-success statuses as `Transport`.
//!
//! # Invariants
//! - Each hook issues its requests once; there is no retry or backoff.
//! - A failed request leaves the in-memory collection untouched; the next
//!   successful `load_tasks` is the only resynchronization point.
//! - The server owns ids and creation timestamps of records it creates.

use crate::model::task::{Priority, Task, TaskId, TaskPatch, TaskRecord};
use crate::persist::{PersistError, PersistResult, TaskPersistence};
use log::{debug, error, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

const ERROR_BODY_MAX_CHARS: usize = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskBody<'a> {
    text: &'a str,
    due_date: Option<&'a str>,
    priority: Priority,
}

impl<'a> From<&'a Task> for CreateTaskBody<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            text: task.text.as_str(),
            due_date: task.due_date.as_deref(),
            priority: task.priority,
        }
    }
}

/// Adapter talking to the remote task service with a blocking client.
pub struct RemoteTaskPersistence {
    base_url: Url,
    client: Client,
}

impl RemoteTaskPersistence {
    /// Builds an adapter for `base_url` (for example `http://host:5000/api`).
    ///
    /// `timeout = None` waits indefinitely for each request.
    ///
    /// # Errors
    /// - `Transport` when the URL cannot be parsed or cannot carry a path.
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn try_new(base_url: &str, timeout: Option<Duration>) -> PersistResult<Self> {
        let trimmed = base_url.trim();
        let parsed = Url::parse(trimmed).map_err(|err| PersistError::Transport {
            endpoint: trimmed.to_string(),
            status: None,
            message: format!("invalid base url: {err}"),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(PersistError::Transport {
                endpoint: trimmed.to_string(),
                status: None,
                message: "base url cannot carry a path".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PersistError::Transport {
                endpoint: trimmed.to_string(),
                status: None,
                message: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            base_url: parsed,
            client,
        })
    }

    fn collection_url(&self) -> Url {
        self.url_with_segments(&["tasks"])
    }

    fn task_url(&self, id: &TaskId) -> Url {
        self.url_with_segments(&["tasks", id.as_str()])
    }

    fn url_with_segments(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `try_new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(extra);
        }
        url
    }

    fn send(
        &self,
        method: &'static str,
        url: &Url,
        request: RequestBuilder,
    ) -> PersistResult<Response> {
        let started_at = Instant::now();
        match request.send() {
            Ok(response) => {
                debug!(
                    "event=remote_request module=persist status=ok method={method} endpoint={url} http_status={} duration_ms={}",
                    response.status().as_u16(),
                    started_at.elapsed().as_millis()
                );
                Ok(response)
            }
            Err(err) => {
                error!(
                    "event=remote_request module=persist status=error method={method} endpoint={url} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(PersistError::Transport {
                    endpoint: url.to_string(),
                    status: None,
                    message: err.to_string(),
                })
            }
        }
    }

    fn fetch_all(&self) -> PersistResult<Vec<TaskRecord>> {
        let url = self.collection_url();
        let response = self.send("GET", &url, self.client.get(url.clone()))?;
        decode_json(ensure_success(response, &url)?, &url)
    }

    fn create_one(&self, task: &Task) -> PersistResult<Task> {
        let url = self.collection_url();
        let request = self
            .client
            .post(url.clone())
            .json(&CreateTaskBody::from(task));
        let response = self.send("POST", &url, request)?;
        let record = decode_json(ensure_success(response, &url)?, &url)?;
        complete_record(record, task, &url)
    }

    /// `task` is the local copy; its fields stand in for any the server omits.
    fn update_one(&self, task: &Task, patch: &TaskPatch) -> PersistResult<Task> {
        let url = self.task_url(&task.id);
        let response = self.send("PUT", &url, self.client.put(url.clone()).json(patch))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PersistError::NotFound(task.id.clone()));
        }
        let record = decode_json(ensure_success(response, &url)?, &url)?;
        complete_record(record, task, &url)
    }

    fn delete_one(&self, id: &TaskId) -> PersistResult<()> {
        let url = self.task_url(id);
        let response = self.send("DELETE", &url, self.client.delete(url.clone()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PersistError::NotFound(id.clone()));
        }
        ensure_success(response, &url)?;
        Ok(())
    }
}

impl TaskPersistence for RemoteTaskPersistence {
    fn backend(&self) -> &'static str {
        "remote"
    }

    fn load_tasks(&self) -> PersistResult<Vec<TaskRecord>> {
        let tasks = self.fetch_all()?;
        info!(
            "event=tasks_load module=persist status=ok backend=remote count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn task_created(&self, task: &Task, _snapshot: &[Task]) -> PersistResult<Task> {
        self.create_one(task)
    }

    fn task_updated(
        &self,
        task: &Task,
        patch: &TaskPatch,
        _snapshot: &[Task],
    ) -> PersistResult<Task> {
        self.update_one(task, patch)
    }

    fn task_removed(&self, id: &TaskId, _snapshot: &[Task]) -> PersistResult<()> {
        self.delete_one(id)
    }

    fn tasks_reordered(&self, _snapshot: &[Task]) -> PersistResult<()> {
        // The API has no ordering endpoint; order is kept client-side only.
        debug!("event=tasks_reorder module=persist status=skipped backend=remote");
        Ok(())
    }

    fn tasks_cleared(&self, removed: &[Task]) -> PersistResult<()> {
        for task in removed {
            match self.delete_one(&task.id) {
                Ok(()) | Err(PersistError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn tasks_imported(&self, added: &[Task], _snapshot: &[Task]) -> PersistResult<Vec<Task>> {
        let mut created = Vec::with_capacity(added.len());
        for task in added {
            let mut canonical = self.create_one(task)?;
            // POST only carries text, due date and priority.
            if task.completed && !canonical.completed {
                canonical = self.update_one(&canonical, &TaskPatch::completed(true))?;
            }
            created.push(canonical);
        }
        Ok(created)
    }
}

fn ensure_success(response: Response, url: &Url) -> PersistResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    error!(
        "event=remote_request module=persist status=error endpoint={url} http_status={}",
        status.as_u16()
    );
    Err(PersistError::Transport {
        endpoint: url.to_string(),
        status: Some(status.as_u16()),
        message: excerpt(&body, ERROR_BODY_MAX_CHARS),
    })
}

fn complete_record(record: TaskRecord, local: &Task, url: &Url) -> PersistResult<Task> {
    record
        .into_task(|| local.id.clone(), || local.created_at)
        .map_err(|err| PersistError::InvalidData(format!("{url}: {err}")))
}

fn decode_json<T: DeserializeOwned>(response: Response, url: &Url) -> PersistResult<T> {
    response.json::<T>().map_err(|err| {
        if err.is_decode() {
            PersistError::InvalidData(format!("{url}: {err}"))
        } else {
            PersistError::Transport {
                endpoint: url.to_string(),
                status: None,
                message: err.to_string(),
            }
        }
    })
}

fn excerpt(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
