use tracing::info;

use crate::command::Command;
use crate::data::{paths, profile};
use crate::display::DisplayBackend;
use crate::error::SwitchError;
use crate::reconcile::{self, ApplyOptions};
use crate::summary::format_summary;
use crate::types::config::SwitcherSettings;
use crate::types::response::Response;


/// Central runtime for monswitch. Dispatches profile commands against one
/// display backend.
pub struct Sys {
    settings: SwitcherSettings,
    backend: Box<dyn DisplayBackend>,
}


impl Sys {
    pub fn new(settings: SwitcherSettings, backend: Box<dyn DisplayBackend>) -> Sys {
        Sys { settings, backend }
    }

    /// Return a reference to the current settings.
    pub fn settings(&self) -> &SwitcherSettings {
        &self.settings
    }

    /// The single dispatch method.
    pub fn execute(&mut self, cmd: Command) -> Response {
        let result = match cmd {
            Command::ProfileSave { path } => self.cmd_profile_save(&path),
            Command::ProfileLoad {
                path,
                no_id_match,
                virtual_inject,
            } => self.cmd_profile_load(&path, no_id_match, virtual_inject),
            Command::ProfilePrint => self.cmd_profile_print(),
            Command::Help { topic } => Ok(crate::help::help_text(topic.as_deref())),
        };
        match result {
            Ok(output) => Response::Ok { output },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Profile commands
    // -----------------------------------------------------------------------

    fn cmd_profile_save(&mut self, input: &str) -> Result<String, SwitchError> {
        let path = paths::resolve_profile_path(input, &self.settings, true)?;
        let snapshot = reconcile::capture(self.backend.as_mut())?;
        profile::save(&path, &snapshot)?;
        info!(path = %path.display(), paths = snapshot.paths.len(), "profile saved");
        Ok(format!("Profile saved: {}", path.display()))
    }

    fn cmd_profile_load(
        &mut self,
        input: &str,
        no_id_match: bool,
        virtual_inject: bool,
    ) -> Result<String, SwitchError> {
        let path = paths::resolve_profile_path(input, &self.settings, false)?;
        let saved = profile::load(&path)?;
        let options = ApplyOptions {
            match_adapter_ids: self.settings.match_adapter_ids && !no_id_match,
            inject_desktop_images: self.settings.inject_desktop_images || virtual_inject,
        };
        let outcome = reconcile::apply_profile(self.backend.as_mut(), &saved, options)?;
        Ok(format!(
            "Profile applied: {} ({} paths, {} stage)",
            path.display(),
            outcome.applied.paths.len(),
            outcome.stage
        ))
    }

    fn cmd_profile_print(&mut self) -> Result<String, SwitchError> {
        let snapshot = reconcile::capture(self.backend.as_mut())?;
        Ok(format_summary(&snapshot))
    }
}
