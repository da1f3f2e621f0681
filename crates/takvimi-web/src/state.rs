use std::sync::Arc;

use takvimi_core::{DataManager, PdfBackend};
use takvimi_parsing::ParsingConfig;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub manager: DataManager,
    /// Used directly for page exports; year extraction goes through `manager`.
    pub backend: Arc<dyn PdfBackend>,
    pub parsing: ParsingConfig,
}
