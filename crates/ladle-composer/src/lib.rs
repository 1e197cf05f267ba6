//! ladle-composer: the async half of the mention composer.
//!
//! - `ProfileCache` - shared identifier → profile cache with follow-list preload
//! - `SuggestionPipeline` - cache + network search, merged and ranked
//! - `ComposerController` - input state machine over a `SurfaceDocument`
//! - `ComposerState` - what the dropdown renders

pub mod cache;
pub mod controller;
pub mod publish;
pub mod state;
pub mod suggest;

pub use cache::{PreloadOutcome, ProfileCache};
pub use controller::{ComposerController, reference_syntax};
pub use publish::draft_from_tree;
pub use state::ComposerState;
pub use suggest::{SuggestionPipeline, rank};

pub use ladle_common::{
    ComposerConfig, ComposerError, ProfileRecord, ProfileResolver, ProviderError, PublishDraft,
    Publisher, SearchProvider, SuggestionEntry,
};
pub use ladle_editor_core::{Key, KeydownResult};
