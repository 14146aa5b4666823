//! Configuration: translation limits, index budget and store location.

mod settings;

pub use settings::{
    expand_env_vars, IndexSettings, QuerySettings, Settings, SettingsError, StoreSettings,
};
