//! In-memory stores with the same contract as the PostgreSQL ones.
//!
//! Used by the test suites so the HTTP layer can be driven without a
//! database.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    error::{AppError, Result},
    models::{gallery::Gallery, user::User},
    repositories::{gallery::GalleryStore, user::UserStore},
};

struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

fn lock<T>(table: &Mutex<Table<T>>) -> Result<MutexGuard<'_, Table<T>>> {
    table
        .lock()
        .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Table<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Result<Option<User>> {
        Ok(lock(&self.users)?.rows.iter().find(|u| pred(u)).cloned())
    }
}

/// Mirrors the unique indexes on `users.email` and `users.remember_hash`.
fn check_unique(rows: &[User], user: &User) -> Result<()> {
    for other in rows.iter().filter(|u| u.id != user.id) {
        if other.email == user.email {
            return Err(AppError::EmailTaken);
        }
        if other.remember_hash == user.remember_hash {
            return Err(AppError::Internal("duplicate remember_hash".to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn by_id(&self, id: i64) -> Result<Option<User>> {
        self.find(|u| u.id == id)
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>> {
        self.find(|u| u.email == email)
    }

    async fn by_remember_hash(&self, remember_hash: &str) -> Result<Option<User>> {
        self.find(|u| u.remember_hash == remember_hash)
    }

    async fn create(&self, mut user: User) -> Result<User> {
        let mut table = lock(&self.users)?;
        user.id = 0;
        check_unique(&table.rows, &user)?;
        user.id = table.next_id;
        table.next_id += 1;
        user.password = None;
        user.remember = None;
        user.created_at = Some(Utc::now());
        user.updated_at = user.created_at;
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: User) -> Result<User> {
        let mut table = lock(&self.users)?;
        check_unique(&table.rows, &user)?;
        let row = table
            .rows
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::NotFound)?;
        user.password = None;
        user.remember = None;
        user.created_at = row.created_at;
        user.updated_at = Some(Utc::now());
        *row = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut table = lock(&self.users)?;
        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        if table.rows.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryGalleryStore {
    galleries: Arc<Mutex<Table<Gallery>>>,
}

impl MemoryGalleryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GalleryStore for MemoryGalleryStore {
    async fn by_id(&self, id: i64) -> Result<Option<Gallery>> {
        Ok(lock(&self.galleries)?
            .rows
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn by_user_id(&self, user_id: i64) -> Result<Vec<Gallery>> {
        Ok(lock(&self.galleries)?
            .rows
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut gallery: Gallery) -> Result<Gallery> {
        let mut table = lock(&self.galleries)?;
        gallery.id = table.next_id;
        table.next_id += 1;
        gallery.created_at = Some(Utc::now());
        gallery.updated_at = gallery.created_at;
        table.rows.push(gallery.clone());
        Ok(gallery)
    }

    async fn update(&self, mut gallery: Gallery) -> Result<Gallery> {
        let mut table = lock(&self.galleries)?;
        let row = table
            .rows
            .iter_mut()
            .find(|g| g.id == gallery.id)
            .ok_or(AppError::NotFound)?;
        gallery.user_id = row.user_id;
        gallery.created_at = row.created_at;
        gallery.updated_at = Some(Utc::now());
        *row = gallery.clone();
        Ok(gallery)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut table = lock(&self.galleries)?;
        let before = table.rows.len();
        table.rows.retain(|g| g.id != id);
        if table.rows.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
