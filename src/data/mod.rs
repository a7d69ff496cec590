/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐     ┌───────┐
///   │  loader   │ ◄── │ cache │  memoised by (path, sheet, mtime, size)
///   └──────────┘     └───────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<ProjectRecord>, present columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  category selections → DatasetView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KPIs, status counts, budget by type, yearly trend
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod notice;
