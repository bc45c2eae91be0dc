/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .pdf
///        │
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  loader   │◄────│ document │  PDF page text → table rows
///   └──────────┘     └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  columns + rows of CellValue
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  preference values → rows sorted by Rank
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  S.N + filtered rows → .csv / .xlsx
///   └──────────┘
/// ```

pub mod document;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
