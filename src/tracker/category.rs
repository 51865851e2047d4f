use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Closed set of time-use categories. "Not logged" is represented as absence,
/// never as a variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum Category {
    Rest,
    Work,
    Health,
    Personal,
    Learning,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Category::Rest,
        Category::Work,
        Category::Health,
        Category::Personal,
        Category::Learning,
    ];

    /// Resolves a stored label to a category. This is the only place in the
    /// crate where labels from the previous schema version are mapped onto
    /// the current set, so aggregated totals always carry canonical ids.
    ///
    /// Empty strings, `"None"` and labels outside the set resolve to `None`,
    /// meaning the hour was not logged.
    pub fn resolve(label: &str) -> Option<Category> {
        match label {
            "Rest" | "Sleep" => Some(Category::Rest),
            "Work" | "Projects" => Some(Category::Work),
            "Health" | "Exercise" => Some(Category::Health),
            "Personal" | "Leisure" => Some(Category::Personal),
            "Learning" | "Study" => Some(Category::Learning),
            _ => None,
        }
    }

    /// Fixed display color of the category, as RGB channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Category::Rest => (0x02, 0x84, 0xC7),
            Category::Work => (0x6A, 0x1B, 0x9A),
            Category::Health => (0x15, 0x80, 0x3D),
            Category::Personal => (0xEA, 0x58, 0x0C),
            Category::Learning => (0x43, 0x38, 0xCA),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Rest => write!(f, "Rest"),
            Category::Work => write!(f, "Work"),
            Category::Health => write!(f, "Health"),
            Category::Personal => write!(f, "Personal"),
            Category::Learning => write!(f, "Learning"),
        }
    }
}
