//! In-memory stores
//!
//! Same contracts as the PostgreSQL stores, with a mutex standing in for the
//! database's row-level atomicity. Process-local, so only fit for tests and tools.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tessera_core::models::{FileRecord, NewUploadTicket, UploadTicket};
use tessera_core::AppError;
use validator::Validate;

use super::{FileRecordStore, TicketStore};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: Mutex<HashMap<String, UploadTicket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(&self, ticket: NewUploadTicket) -> Result<UploadTicket, AppError> {
        ticket.validate()?;

        let mut tickets = lock(&self.tickets)?;
        if tickets.contains_key(&ticket.id) {
            return Err(AppError::DuplicateTicket(format!(
                "Ticket {} already exists",
                ticket.id
            )));
        }

        let stored = ticket.into_ticket();
        tickets.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn claim(&self, id: &str, now: DateTime<Utc>) -> Result<Option<UploadTicket>, AppError> {
        let mut tickets = lock(&self.tickets)?;
        match tickets.get_mut(id) {
            Some(ticket) if ticket.is_redeemable_at(now) => {
                ticket.used = true;
                ticket.used_at = Some(now);
                Ok(Some(ticket.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tickets = lock(&self.tickets)?;
        let before = tickets.len();
        tickets.retain(|_, ticket| ticket.expires_at >= now);
        Ok((before - tickets.len()) as u64)
    }

    async fn get(&self, id: &str) -> Result<Option<UploadTicket>, AppError> {
        Ok(lock(&self.tickets)?.get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryFileRecordStore {
    records: Mutex<HashMap<String, FileRecord>>,
}

impl InMemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<FileRecord> {
        match self.records.lock() {
            Ok(records) => records.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileRecordStore {
    async fn insert(&self, path: &str) -> Result<FileRecord, AppError> {
        let mut records = lock(&self.records)?;
        if records.contains_key(path) {
            return Err(AppError::InvalidInput(format!(
                "A file record already exists for {}",
                path
            )));
        }

        let record = FileRecord::new(path);
        records.insert(path.to_string(), record.clone());
        Ok(record)
    }

    async fn exists_for_path(&self, path: &str) -> Result<bool, AppError> {
        Ok(lock(&self.records)?.contains_key(path))
    }
}
