use std::{future::Future, ops::Deref};

use anyhow::Result;

use crate::{
    expense::record::{ExpenseRecord, NewExpense},
    session::UserId,
    tracker::week::WeekLog,
};

pub mod json_store;

pub use json_store::JsonDocumentStore;

/// Interface for abstracting storage of week logs. A week is one document,
/// fetched and replaced wholesale; there are no partial updates.
pub trait WeekStore: Send + Sync {
    /// Returns the stored log for the key, or an empty one when the user has
    /// never logged anything that week.
    fn load_week(
        &self,
        user: &UserId,
        week_key: &str,
    ) -> impl Future<Output = Result<WeekLog>> + Send;

    fn save_week(
        &self,
        user: &UserId,
        week_key: &str,
        log: WeekLog,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref + Send + Sync> WeekStore for T
where
    T::Target: WeekStore,
{
    fn load_week(
        &self,
        user: &UserId,
        week_key: &str,
    ) -> impl Future<Output = Result<WeekLog>> + Send {
        self.deref().load_week(user, week_key)
    }

    fn save_week(
        &self,
        user: &UserId,
        week_key: &str,
        log: WeekLog,
    ) -> impl Future<Output = Result<()>> + Send {
        self.deref().save_week(user, week_key, log)
    }
}

/// Interface for abstracting storage of expense records. Every record is its
/// own document, so a batch of concurrent adds never clobbers siblings.
pub trait ExpenseStore: Send + Sync {
    /// Full list for the user, ordered by date descending.
    fn list_expenses(&self, user: &UserId)
        -> impl Future<Output = Result<Vec<ExpenseRecord>>> + Send;

    /// Assigns an id and creation stamp and returns the stored record.
    fn add_expense(
        &self,
        user: &UserId,
        expense: NewExpense,
    ) -> impl Future<Output = Result<ExpenseRecord>> + Send;

    fn delete_expense(&self, user: &UserId, id: &str) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref + Send + Sync> ExpenseStore for T
where
    T::Target: ExpenseStore,
{
    fn list_expenses(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<ExpenseRecord>>> + Send {
        self.deref().list_expenses(user)
    }

    fn add_expense(
        &self,
        user: &UserId,
        expense: NewExpense,
    ) -> impl Future<Output = Result<ExpenseRecord>> + Send {
        self.deref().add_expense(user, expense)
    }

    fn delete_expense(&self, user: &UserId, id: &str) -> impl Future<Output = Result<()>> + Send {
        self.deref().delete_expense(user, id)
    }
}
