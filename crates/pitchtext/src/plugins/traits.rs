//! Base trait shared by every plugin.

use crate::Result;

/// Lifecycle and identity of a plugin.
///
/// Plugins are stored as `Arc<dyn Trait>` and called from many tasks at once, so
/// implementations must be `Send + Sync` and use interior mutability for any state.
pub trait Plugin: Send + Sync {
    /// Unique, kebab-case name used for registration and removal.
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Called once when the plugin is registered.
    fn initialize(&self) -> Result<()>;

    /// Called when the plugin is removed or the registry shuts down.
    fn shutdown(&self) -> Result<()>;

    fn description(&self) -> &str {
        ""
    }

    fn author(&self) -> &str {
        ""
    }
}
