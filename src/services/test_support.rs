//! In-memory gateway for exercising the refresh pipeline.
//!
//! Responses are configured per project / merge request; anything not
//! configured answers with an empty success. Every call is counted.

use crate::error::AppError;
use crate::models::{ApprovalState, Discussion, MergeRequestSummary, PipelineRef};
use crate::services::gateway::{MergeRequestGateway, MergeRequestsQuery};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Key = (i64, i64);

#[derive(Default)]
pub struct FakeGateway {
    lists: Mutex<HashMap<i64, Result<Vec<MergeRequestSummary>, AppError>>>,
    approvals: Mutex<HashMap<Key, Result<ApprovalState, AppError>>>,
    discussions: Mutex<HashMap<Key, Result<Vec<Discussion>, AppError>>>,
    pipelines: Mutex<HashMap<Key, Result<Vec<PipelineRef>, AppError>>>,
    list_delay: Mutex<Option<Duration>>,
    detail_delay: Mutex<Option<Duration>>,
    // Call tracking
    list_queries: Mutex<Vec<(i64, MergeRequestsQuery)>>,
    detail_calls: Mutex<Vec<Key>>,
    approval_calls: AtomicUsize,
    discussion_calls: AtomicUsize,
    pipeline_calls: AtomicUsize,
    in_flight_lists: AtomicUsize,
    max_in_flight_lists: AtomicUsize,
    in_flight_details: AtomicUsize,
    max_in_flight_details: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_list(&self, project_id: i64, result: Result<Vec<MergeRequestSummary>, AppError>) {
        self.lists.lock().unwrap().insert(project_id, result);
    }

    pub fn set_approval(&self, project_id: i64, iid: i64, result: Result<ApprovalState, AppError>) {
        self.approvals.lock().unwrap().insert((project_id, iid), result);
    }

    pub fn set_discussions(
        &self,
        project_id: i64,
        iid: i64,
        result: Result<Vec<Discussion>, AppError>,
    ) {
        self.discussions
            .lock()
            .unwrap()
            .insert((project_id, iid), result);
    }

    pub fn set_pipelines(&self, project_id: i64, iid: i64, result: Result<Vec<PipelineRef>, AppError>) {
        self.pipelines.lock().unwrap().insert((project_id, iid), result);
    }

    /// Make every list call sleep before answering.
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    /// Make every detail call sleep before answering.
    pub fn set_detail_delay(&self, delay: Duration) {
        *self.detail_delay.lock().unwrap() = Some(delay);
    }

    pub fn list_calls(&self) -> usize {
        self.list_queries.lock().unwrap().len()
    }

    pub fn list_queries(&self) -> Vec<(i64, MergeRequestsQuery)> {
        self.list_queries.lock().unwrap().clone()
    }

    /// Total detail requests (approval + discussions + pipelines).
    pub fn detail_calls(&self) -> usize {
        self.approval_calls.load(Ordering::SeqCst)
            + self.discussion_calls.load(Ordering::SeqCst)
            + self.pipeline_calls.load(Ordering::SeqCst)
    }

    /// Whether any detail request was made for this merge request.
    pub fn was_enriched(&self, project_id: i64, iid: i64) -> bool {
        self.detail_calls
            .lock()
            .unwrap()
            .contains(&(project_id, iid))
    }

    /// Highest number of list calls observed running at the same time.
    pub fn max_in_flight_lists(&self) -> usize {
        self.max_in_flight_lists.load(Ordering::SeqCst)
    }

    /// Highest number of detail calls observed running at the same time.
    pub fn max_in_flight_details(&self) -> usize {
        self.max_in_flight_details.load(Ordering::SeqCst)
    }

    async fn record_detail(&self, counter: &AtomicUsize, key: Key) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.detail_calls.lock().unwrap().push(key);

        let in_flight = self.in_flight_details.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_details
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.detail_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight_details.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MergeRequestGateway for FakeGateway {
    async fn list_merge_requests(
        &self,
        project_id: i64,
        query: &MergeRequestsQuery,
    ) -> Result<Vec<MergeRequestSummary>, AppError> {
        self.list_queries
            .lock()
            .unwrap()
            .push((project_id, query.clone()));

        let in_flight = self.in_flight_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_lists
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight_lists.fetch_sub(1, Ordering::SeqCst);

        self.lists
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_approval_state(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<ApprovalState, AppError> {
        self.record_detail(&self.approval_calls, (project_id, mr_iid))
            .await;
        self.approvals
            .lock()
            .unwrap()
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_else(|| Ok(ApprovalState::default()))
    }

    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<Discussion>, AppError> {
        self.record_detail(&self.discussion_calls, (project_id, mr_iid))
            .await;
        self.discussions
            .lock()
            .unwrap()
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_pipelines(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<PipelineRef>, AppError> {
        self.record_detail(&self.pipeline_calls, (project_id, mr_iid))
            .await;
        self.pipelines
            .lock()
            .unwrap()
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
