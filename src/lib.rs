pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod display;
pub mod error;
pub mod events;
pub mod gateway;
pub mod sort;
pub mod types;
pub mod view;

pub use collection::{CollectionController, CollectionSettings, CollectionState, Phase};
pub use config::Config;
pub use controller::RelatedLists;
pub use error::{FailureKind, RelatedListsError, Result};
pub use events::{ControllerEvent, EventBus};
pub use gateway::{CacheNotifier, CollectionGateway, Dataset, MemoryStore, NoopNotifier};
pub use types::{CollectionKind, DraftEdit, ParentId, Row, RowId, SortDirection, SortSpec};
pub use view::CollectionView;
