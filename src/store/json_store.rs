use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::Utc;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    expense::record::{ExpenseRecord, NewExpense},
    session::{UserId, UserProfile},
    tracker::week::WeekLog,
};

use super::{ExpenseStore, WeekStore};

/// The main realization of [WeekStore] and [ExpenseStore]: per-user JSON
/// documents on the local disk.
///
/// Layout under the application directory:
/// `users/<id>/weeks/<monday>.json`, `users/<id>/expenses/<uuid>.json`,
/// `users/<id>/profile.json`, `users/<id>/settings.json`.
pub struct JsonDocumentStore {
    users_dir: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(app_dir: &Path) -> Result<Self, std::io::Error> {
        let users_dir = app_dir.join("users");
        std::fs::create_dir_all(&users_dir)?;

        Ok(Self { users_dir })
    }

    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.users_dir.join(user.as_str())
    }

    fn week_path(&self, user: &UserId, week_key: &str) -> PathBuf {
        self.user_dir(user)
            .join("weeks")
            .join(format!("{week_key}.json"))
    }

    fn expenses_dir(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join("expenses")
    }

    /// First login creates the profile, a returning user only gets a fresh
    /// `last_login` stamp.
    pub async fn record_login(&self, user: &UserId) -> Result<UserProfile> {
        let path = self.user_dir(user).join("profile.json");
        let now = Utc::now();

        let profile = match read_document::<UserProfile>(&path).await? {
            Some(mut profile) => {
                profile.last_login = now;
                profile
            }
            None => UserProfile {
                user_id: user.clone(),
                created_at: now,
                last_login: now,
            },
        };

        write_document(&path, &profile).await?;
        Ok(profile)
    }

    pub async fn monthly_budget(&self, user: &UserId) -> Result<f64> {
        let path = self.user_dir(user).join("settings.json");
        let settings = read_document::<UserSettings>(&path).await?.unwrap_or_default();
        Ok(settings.monthly_budget)
    }

    pub async fn set_monthly_budget(&self, user: &UserId, monthly_budget: f64) -> Result<()> {
        let path = self.user_dir(user).join("settings.json");
        write_document(&path, &UserSettings { monthly_budget }).await
    }
}

impl WeekStore for JsonDocumentStore {
    async fn load_week(&self, user: &UserId, week_key: &str) -> Result<WeekLog> {
        let log = read_document::<WeekLog>(&self.week_path(user, week_key))
            .await?
            .unwrap_or_default();
        Ok(log)
    }

    async fn save_week(&self, user: &UserId, week_key: &str, log: WeekLog) -> Result<()> {
        write_document(&self.week_path(user, week_key), &log).await
    }
}

impl ExpenseStore for JsonDocumentStore {
    async fn list_expenses(&self, user: &UserId) -> Result<Vec<ExpenseRecord>> {
        let dir = self.expenses_dir(user);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_document::<ExpenseRecord>(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    // ignore illegal documents. Might happen after shutdowns
                    warn!("Skipping unreadable expense document {path:?}: {e}");
                }
            }
        }

        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    async fn add_expense(&self, user: &UserId, expense: NewExpense) -> Result<ExpenseRecord> {
        let record = ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            description: expense.description,
            amount: expense.amount,
            category: expense.category,
            kind: expense.kind,
            date: expense.date,
            is_imported: expense.is_imported,
            created_at: Utc::now(),
        };

        let path = self.expenses_dir(user).join(format!("{}.json", record.id));
        write_document(&path, &record).await?;
        debug!("Stored expense {} for {user}", record.id);
        Ok(record)
    }

    async fn delete_expense(&self, user: &UserId, id: &str) -> Result<()> {
        let path = self.expenses_dir(user).join(format!("{id}.json"));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(anyhow!("no expense with id {id}"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    monthly_budget: f64,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            monthly_budget: 2500.0,
        }
    }
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    file.lock_shared()?;
    let mut file = file;
    let mut data = String::new();
    let read_result = file.read_to_string(&mut data).await;
    file.unlock_async().await?;
    read_result?;

    Ok(Some(serde_json::from_str(&data)?))
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(path).await?;
    file.lock_exclusive()?;
    let write_result = async {
        file.write_all(serde_json::to_string_pretty(value)?.as_bytes())
            .await?;
        file.flush().await?;
        Ok::<_, anyhow::Error>(())
    }
    .await;
    file.unlock_async().await?;
    write_result
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use futures::future::try_join_all;
    use tempfile::tempdir;

    use crate::{
        expense::record::{NewExpense, RecordKind},
        session::UserId,
        store::{ExpenseStore, WeekStore},
        tracker::{
            category::Category,
            week::{HourEntry, WeekLog},
        },
    };

    use super::JsonDocumentStore;

    fn new_expense(description: &str, amount: f64, date: &str) -> NewExpense {
        NewExpense {
            description: description.into(),
            amount,
            category: "Food".into(),
            kind: RecordKind::Expense,
            date: date.into(),
            is_imported: false,
        }
    }

    #[tokio::test]
    async fn missing_week_loads_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        let log = store.load_week(&user, "2024-03-04").await?;
        assert!(log.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn week_round_trips_and_is_replaced_wholesale() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        let mut log = WeekLog::default();
        log.set_entry("Monday", "9-10", HourEntry::new(Category::Work, "standup"));
        log.set_entry("Monday", "22-23", HourEntry::Legacy("Sleep".into()));
        store.save_week(&user, "2024-03-04", log.clone()).await?;

        assert_eq!(store.load_week(&user, "2024-03-04").await?, log);

        // Saving a smaller log replaces the document, nothing is merged
        let mut replacement = WeekLog::default();
        replacement.set_entry("Tuesday", "7-8", HourEntry::new(Category::Health, ""));
        store
            .save_week(&user, "2024-03-04", replacement.clone())
            .await?;
        assert_eq!(store.load_week(&user, "2024-03-04").await?, replacement);
        Ok(())
    }

    #[tokio::test]
    async fn expenses_list_sorted_by_date_descending() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        store
            .add_expense(&user, new_expense("older", 10.0, "2024-02-01"))
            .await?;
        store
            .add_expense(&user, new_expense("newest", 20.0, "2024-03-05"))
            .await?;
        store
            .add_expense(&user, new_expense("middle", 30.0, "2024-02-20"))
            .await?;

        let listed = store.list_expenses(&user).await?;
        let descriptions: Vec<_> = listed.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["newest", "middle", "older"]);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_never_clobber_each_other() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        let batch: Vec<_> = (0..8)
            .map(|i| new_expense(&format!("row {i}"), i as f64 + 1.0, "2024-03-01"))
            .collect();
        try_join_all(
            batch
                .into_iter()
                .map(|expense| store.add_expense(&user, expense)),
        )
        .await?;

        assert_eq!(store.list_expenses(&user).await?.len(), 8);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_one_record_and_rejects_unknown_ids() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        let kept = store
            .add_expense(&user, new_expense("keep", 10.0, "2024-03-01"))
            .await?;
        let dropped = store
            .add_expense(&user, new_expense("drop", 20.0, "2024-03-01"))
            .await?;

        store.delete_expense(&user, &dropped.id).await?;
        let listed = store.list_expenses(&user).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);

        assert!(store.delete_expense(&user, "missing").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn login_creates_then_refreshes_profile() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        let first = store.record_login(&user).await?;
        assert_eq!(first.created_at, first.last_login);

        let second = store.record_login(&user).await?;
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_login >= first.last_login);
        Ok(())
    }

    #[tokio::test]
    async fn budget_defaults_until_set() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonDocumentStore::new(dir.path())?;
        let user = UserId::new("ada")?;

        assert_eq!(store.monthly_budget(&user).await?, 2500.0);
        store.set_monthly_budget(&user, 1800.0).await?;
        assert_eq!(store.monthly_budget(&user).await?, 1800.0);
        Ok(())
    }
}
