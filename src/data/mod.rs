/// Data layer: isotherm record, loading, and trimming.
///
/// Architecture:
/// ```text
///  trough export (.txt, tab-delimited)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawSample rows → IsothermRecord
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ IsothermRecord  │  time / area per molecule / pressure
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   trim    │  cut the post-hold plateau → shorter record
///   └──────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod trim;
