//! Demographic categories reported for every metric row.
//!
//! The set is closed and its declaration order is the column order used by
//! the compact index. `Total` is expected to be at least the sum of the
//! others, but that is never enforced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// A race/demographic breakdown column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Total,
    White,
    Black,
    Hispanic,
    #[serde(rename = "Native American")]
    NativeAmerican,
    Asian,
    Other,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 7;

    /// All categories in fixed column order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Total,
        Category::White,
        Category::Black,
        Category::Hispanic,
        Category::NativeAmerican,
        Category::Asian,
        Category::Other,
    ];

    /// Every category except `Total`.
    pub fn breakdowns() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| *c != Category::Total)
    }

    /// Name as it appears in source documents and output files.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Total => "Total",
            Category::White => "White",
            Category::Black => "Black",
            Category::Hispanic => "Hispanic",
            Category::NativeAmerican => "Native American",
            Category::Asian => "Asian",
            Category::Other => "Other",
        }
    }

    /// Zero-based column position.
    pub fn column(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// A fixed-size table holding one `T` per category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMap<T>([T; Category::COUNT]);

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self(Category::ALL.map(&mut f))
    }

    /// Iterate `(category, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T: Default> Default for CategoryMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.0[category.column()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.0[category.column()]
    }
}
