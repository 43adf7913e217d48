//! In-memory stores behind the same traits as the Postgres repos.
//!
//! Used by unit and router tests. Versioned writes use the same
//! `compare_and_bump` rule as the SQL guard.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repos::{
    error::{RepoError, RepoResult},
    paging::{Metadata, SortColumn},
    permission_repo::{PermissionStore, Permissions},
    school_repo::{NewSchool, SchoolFilters, SchoolRow, SchoolStore},
    token_repo::{NewToken, TokenStore},
    user_repo::{NewUser, UserRow, UserStore},
    versioned::compare_and_bump,
};

#[derive(Debug, Clone)]
struct TokenEntry {
    hash: Vec<u8>,
    user_id: i64,
    expiry: DateTime<Utc>,
    scope: String,
}

#[derive(Default)]
struct Inner {
    next_user_id: i64,
    next_school_id: i64,
    users: BTreeMap<i64, UserRow>,
    tokens: Vec<TokenEntry>,
    grants: HashMap<i64, BTreeSet<String>>,
    schools: BTreeMap<i64, SchoolRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    token_lookups: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the store deadline elapsed.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn token_lookups(&self) -> usize {
        self.token_lookups.load(Ordering::SeqCst)
    }

    pub fn stored_hashes(&self) -> Vec<Vec<u8>> {
        self.lock().tokens.iter().map(|t| t.hash.clone()).collect()
    }

    pub fn user(&self, id: i64) -> Option<UserRow> {
        self.lock().users.get(&id).cloned()
    }

    /// Insert a user directly, bypassing registration.
    pub fn seed_user(&self, email: &str, activated: bool) -> UserRow {
        let mut inner = self.lock();
        inner.next_user_id += 1;
        let row = UserRow {
            id: inner.next_user_id,
            created_at: Utc::now(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            activated,
            version: 1,
        };
        inner.users.insert(row.id, row.clone());
        row
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn register(
        &self,
        user: NewUser,
        grants: &[&str],
        activation: NewToken,
    ) -> RepoResult<UserRow> {
        self.check()?;
        let mut inner = self.lock();
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepoError::DuplicateEmail);
        }
        inner.next_user_id += 1;
        let row = UserRow {
            id: inner.next_user_id,
            created_at: Utc::now(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            activated: false,
            version: 1,
        };
        inner.users.insert(row.id, row.clone());
        inner
            .grants
            .entry(row.id)
            .or_default()
            .extend(grants.iter().map(|c| c.to_string()));
        inner.tokens.push(TokenEntry {
            hash: activation.hash,
            user_id: row.id,
            expiry: activation.expiry,
            scope: activation.scope.to_string(),
        });
        Ok(row)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: &mut UserRow) -> RepoResult<()> {
        self.check()?;
        let mut inner = self.lock();
        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or(RepoError::EditConflict)?;
        let version = compare_and_bump(&mut stored.version, user.version)?;
        user.version = version;
        *stored = user.clone();
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(
        &self,
        hash: Vec<u8>,
        user_id: i64,
        expiry: DateTime<Utc>,
        scope: &str,
    ) -> RepoResult<()> {
        self.check()?;
        self.lock().tokens.push(TokenEntry {
            hash,
            user_id,
            expiry,
            scope: scope.to_string(),
        });
        Ok(())
    }

    async fn find_user_for_token(
        &self,
        hash: Vec<u8>,
        scope: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<UserRow>> {
        self.token_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let inner = self.lock();
        let user = inner
            .tokens
            .iter()
            .find(|t| t.hash == hash && t.scope == scope && t.expiry > now)
            .and_then(|t| inner.users.get(&t.user_id))
            .cloned();
        Ok(user)
    }

    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> RepoResult<u64> {
        self.check()?;
        let mut inner = self.lock();
        let before = inner.tokens.len();
        inner
            .tokens
            .retain(|t| !(t.scope == scope && t.user_id == user_id));
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn all_for_user(&self, user_id: i64) -> RepoResult<Permissions> {
        self.check()?;
        Ok(self
            .lock()
            .grants
            .get(&user_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant(&self, user_id: i64, codes: &[&str]) -> RepoResult<()> {
        self.check()?;
        self.lock()
            .grants
            .entry(user_id)
            .or_default()
            .extend(codes.iter().map(|c| c.to_string()));
        Ok(())
    }
}

fn matches_words(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    needle
        .split_whitespace()
        .all(|w| haystack.split_whitespace().any(|h| h == w.to_lowercase()))
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn insert(&self, school: NewSchool) -> RepoResult<SchoolRow> {
        self.check()?;
        let mut inner = self.lock();
        inner.next_school_id += 1;
        let row = SchoolRow {
            id: inner.next_school_id,
            created_at: Utc::now(),
            name: school.name,
            level: school.level,
            contact: school.contact,
            phone: school.phone,
            email: school.email,
            website: school.website,
            address: school.address,
            mode: school.mode,
            version: 1,
        };
        inner.schools.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> RepoResult<SchoolRow> {
        self.check()?;
        self.lock()
            .schools
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn update(&self, school: &mut SchoolRow) -> RepoResult<()> {
        self.check()?;
        let mut inner = self.lock();
        let stored = inner
            .schools
            .get_mut(&school.id)
            .ok_or(RepoError::EditConflict)?;
        let version = compare_and_bump(&mut stored.version, school.version)?;
        school.version = version;
        *stored = school.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.check()?;
        self.lock()
            .schools
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, filters: &SchoolFilters) -> RepoResult<(Vec<SchoolRow>, Metadata)> {
        self.check()?;
        let inner = self.lock();
        let mut rows: Vec<SchoolRow> = inner
            .schools
            .values()
            .filter(|s| matches_words(&s.name, &filters.name))
            .filter(|s| matches_words(&s.level, &filters.level))
            .filter(|s| filters.mode.iter().all(|m| s.mode.contains(m)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = match filters.sort.column {
                SortColumn::Id => a.id.cmp(&b.id),
                SortColumn::Name => a.name.cmp(&b.name),
                SortColumn::Level => a.level.cmp(&b.level),
            };
            let ord = if filters.sort.descending { ord.reverse() } else { ord };
            ord.then(a.id.cmp(&b.id))
        });

        let total = rows.len() as i64;
        let page: Vec<SchoolRow> = rows
            .into_iter()
            .skip(filters.page.offset() as usize)
            .take(filters.page.limit() as usize)
            .collect();

        Ok((page, Metadata::calculate(total, filters.page)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;

    use super::*;

    fn school() -> NewSchool {
        NewSchool {
            name: "Belize High School".to_string(),
            level: "High School".to_string(),
            contact: "Anna Smith".to_string(),
            phone: "601-4111".to_string(),
            email: "office@bhs.edu.bz".to_string(),
            website: "https://bhs.edu.bz".to_string(),
            address: "1 Marine Parade".to_string(),
            mode: vec!["face-to-face".to_string()],
        }
    }

    fn activation() -> NewToken {
        NewToken {
            hash: vec![7; 32],
            expiry: Utc::now() + ChronoDuration::days(3),
            scope: "activation",
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Anna".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn concurrent_school_updates_from_one_read_let_exactly_one_win() {
        let store = Arc::new(MemoryStore::new());
        let row = SchoolStore::insert(store.as_ref(), school()).await.unwrap();

        let mut a = SchoolStore::get(store.as_ref(), row.id).await.unwrap();
        let mut b = SchoolStore::get(store.as_ref(), row.id).await.unwrap();
        a.name = "Writer A".to_string();
        b.name = "Writer B".to_string();

        let (ra, rb) = tokio::join!(
            SchoolStore::update(store.as_ref(), &mut a),
            SchoolStore::update(store.as_ref(), &mut b),
        );

        let wins = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        let conflicts = [&ra, &rb]
            .iter()
            .filter(|r| matches!(r, Err(RepoError::EditConflict)))
            .count();
        assert_eq!((wins, conflicts), (1, 1));

        let stored = SchoolStore::get(store.as_ref(), row.id).await.unwrap();
        assert_eq!(stored.version, 2);
        let winner = if ra.is_ok() { &a } else { &b };
        assert_eq!(stored.name, winner.name);
    }

    #[tokio::test]
    async fn concurrent_user_updates_from_one_read_let_exactly_one_win() {
        let store = Arc::new(MemoryStore::new());
        let seeded = store.seed_user("anna@example.com", false);

        let mut a = seeded.clone();
        let mut b = seeded.clone();
        a.activated = true;
        b.name = "Renamed".to_string();

        let (ra, rb) = tokio::join!(
            UserStore::update(store.as_ref(), &mut a),
            UserStore::update(store.as_ref(), &mut b),
        );

        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        assert!(
            matches!(ra, Err(RepoError::EditConflict)) || matches!(rb, Err(RepoError::EditConflict))
        );
        assert_eq!(store.user(seeded.id).unwrap().version, 2);
    }

    #[tokio::test]
    async fn sequential_updates_advance_the_version_by_one_each() {
        let store = MemoryStore::new();
        let mut row = SchoolStore::insert(&store, school()).await.unwrap();

        for n in 1..=5 {
            row.contact = format!("Contact {n}");
            SchoolStore::update(&store, &mut row).await.unwrap();
            assert_eq!(row.version, 1 + n);
        }

        let stored = SchoolStore::get(&store, row.id).await.unwrap();
        assert_eq!(stored.version, 6);
        assert_eq!(stored.contact, "Contact 5");
    }

    #[tokio::test]
    async fn register_writes_user_grants_and_token_together() {
        let store = MemoryStore::new();

        let user = store
            .register(new_user("anna@example.com"), &["schools:read"], activation())
            .await
            .unwrap();

        assert!(!user.activated);
        let perms = store.all_for_user(user.id).await.unwrap();
        assert!(perms.includes("schools:read"));
        assert_eq!(store.stored_hashes(), vec![vec![7; 32]]);
    }

    #[tokio::test]
    async fn rejected_registration_leaves_no_grants_or_tokens() {
        let store = MemoryStore::new();
        let existing = store.seed_user("anna@example.com", true);

        let err = store
            .register(new_user("ANNA@example.com"), &["schools:write"], activation())
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::DuplicateEmail));
        assert!(store.stored_hashes().is_empty());
        assert!(
            !store
                .all_for_user(existing.id)
                .await
                .unwrap()
                .includes("schools:write")
        );
        assert_eq!(store.lock().users.len(), 1);
    }
}
