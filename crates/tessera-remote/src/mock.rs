use crate::api::{ResolutionRequest, ResolutionResponse};
use crate::{PackageClient, RemoteError, ResolutionClient};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory registry implementing both client traits.
///
/// Resolution responses are scripted in FIFO order; archives are stored per
/// exact package coordinate. Call counters let tests assert the idempotence
/// properties of the restore engine (no resolution on a second run, no
/// re-download of installed packages).
pub struct MockRegistry {
    responses: Mutex<VecDeque<ResolutionResponse>>,
    archives: Mutex<HashMap<String, Vec<u8>>>,
    resolution_calls: AtomicUsize,
    download_log: Mutex<Vec<String>>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            archives: Mutex::new(HashMap::new()),
            resolution_calls: AtomicUsize::new(0),
            download_log: Mutex::new(Vec::new()),
        }
    }
}

fn coordinate(language: &str, owner: Option<&str>, name: &str, version: &str) -> String {
    match owner {
        Some(owner) => format!("[{language}]{owner}|{name}@{version}"),
        None => format!("[{language}]{name}@{version}"),
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response returned by the next [`ResolutionClient::resolve`] call.
    pub fn push_response(&self, response: ResolutionResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Store the archive served for one exact package version.
    pub fn insert_archive(
        &self,
        language: &str,
        owner: Option<&str>,
        name: &str,
        version: &str,
        data: Vec<u8>,
    ) {
        if let Ok(mut archives) = self.archives.lock() {
            archives.insert(coordinate(language, owner, name, version), data);
        }
    }

    /// Number of resolution calls served so far.
    pub fn resolution_calls(&self) -> usize {
        self.resolution_calls.load(Ordering::SeqCst)
    }

    /// Coordinates of every archive download served, in call order.
    pub fn download_log(&self) -> Vec<String> {
        self.download_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl ResolutionClient for MockRegistry {
    fn resolve(&self, _request: &ResolutionRequest) -> Result<ResolutionResponse, RemoteError> {
        self.resolution_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self
            .responses
            .lock()
            .map_err(|e| RemoteError::Http(format!("mutex poisoned: {e}")))?;
        queue
            .pop_front()
            .ok_or_else(|| RemoteError::Http("no scripted resolution response".to_owned()))
    }
}

impl PackageClient for MockRegistry {
    fn download(
        &self,
        language: &str,
        owner: Option<&str>,
        name: &str,
        version: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        let key = coordinate(language, owner, name, version);
        if let Ok(mut log) = self.download_log.lock() {
            log.push(key.clone());
        }
        let archives = self
            .archives
            .lock()
            .map_err(|e| RemoteError::Http(format!("mutex poisoned: {e}")))?;
        archives
            .get(&key)
            .cloned()
            .ok_or(RemoteError::PackageNotFound(key))
    }
}
