pub mod aggregate;
pub mod autosave;
pub mod category;
pub mod insights;
pub mod week;
