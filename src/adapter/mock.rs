//! Scripted session for testing adapters without a database server.
//!
//! Responses are keyed by [`QueryPurpose`]: every query of that purpose
//! returns the same rows until replaced. One-shot failures can be queued to
//! simulate a broken tick.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::session::{Query, QueryPurpose, Row, Session};

#[derive(Default)]
struct MockState {
    responses: HashMap<QueryPurpose, Vec<Row>>,
    failures: HashMap<QueryPurpose, VecDeque<String>>,
    executed: Vec<Query>,
    ping_error: Option<String>,
}

/// Mock session with shared state.
///
/// Clones share the same script, so a test can keep a handle after moving
/// the session into a scheduler thread.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rows returned for `purpose`.
    pub fn respond(self, purpose: QueryPurpose, rows: Vec<Row>) -> Self {
        self.set_rows(purpose, rows);
        self
    }

    /// Replaces the rows returned for `purpose` on an existing handle.
    pub fn set_rows(&self, purpose: QueryPurpose, rows: Vec<Row>) {
        if let Ok(mut state) = self.state.lock() {
            state.responses.insert(purpose, rows);
        }
    }

    /// Makes the next query of `purpose` fail with `message`.
    pub fn fail_next(&self, purpose: QueryPurpose, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state
                .failures
                .entry(purpose)
                .or_default()
                .push_back(message.into());
        }
    }

    /// Makes every ping fail with `message`.
    pub fn fail_ping(self, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.ping_error = Some(message.into());
        }
        self
    }

    /// All queries executed so far, in order.
    pub fn executed(&self) -> Vec<Query> {
        self.state
            .lock()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    /// Executed queries of one purpose.
    pub fn executed_for(&self, purpose: QueryPurpose) -> Vec<Query> {
        self.executed()
            .into_iter()
            .filter(|q| q.purpose == purpose)
            .collect()
    }
}

impl Session for MockSession {
    fn query(&mut self, query: &Query) -> Result<Vec<Row>, String> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "mock state poisoned".to_string())?;
        state.executed.push(query.clone());

        if let Some(message) = state
            .failures
            .get_mut(&query.purpose)
            .and_then(|queue| queue.pop_front())
        {
            return Err(message);
        }

        state
            .responses
            .get(&query.purpose)
            .cloned()
            .ok_or_else(|| format!("no mock response for {}", query.purpose))
    }

    fn ping(&mut self) -> Result<(), String> {
        let state = self
            .state
            .lock()
            .map_err(|_| "mock state poisoned".to_string())?;
        match &state.ping_error {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_mock_returns_scripted_rows() {
        let mut session =
            MockSession::new().respond(QueryPurpose::Uptime, vec![row![3600i64]]);
        let rows = session
            .query(&Query::new(QueryPurpose::Uptime, "SELECT uptime"))
            .unwrap();
        assert_eq!(rows, vec![row![3600i64]]);
    }

    #[test]
    fn test_mock_missing_response_is_error() {
        let mut session = MockSession::new();
        assert!(session
            .query(&Query::new(QueryPurpose::TableSizes, "SELECT"))
            .is_err());
    }

    #[test]
    fn test_mock_fail_next_is_one_shot() {
        let handle = MockSession::new().respond(QueryPurpose::Uptime, vec![row![1i64]]);
        let mut session = handle.clone();
        handle.fail_next(QueryPurpose::Uptime, "boom");

        let q = Query::new(QueryPurpose::Uptime, "SELECT");
        assert_eq!(session.query(&q).unwrap_err(), "boom");
        assert!(session.query(&q).is_ok());
        assert_eq!(handle.executed_for(QueryPurpose::Uptime).len(), 2);
    }

    #[test]
    fn test_mock_ping() {
        let mut ok = MockSession::new();
        assert!(ok.ping().is_ok());
        let mut bad = MockSession::new().fail_ping("refused");
        assert_eq!(bad.ping().unwrap_err(), "refused");
    }
}
