//! Command: the typed interface for all monitor-profile operations.
//!
//! Profile arguments are passed as typed by the user; `Sys` resolves them
//! against the configured profile directory.

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command")]
pub enum Command {
    // -----------------------------------------------------------------
    // Profile commands
    // -----------------------------------------------------------------

    #[serde(rename = "profile.save")]
    ProfileSave {
        path: String,
    },

    #[serde(rename = "profile.load")]
    ProfileLoad {
        path: String,
        /// Skip adapter-id correction for this load.
        #[serde(default)]
        no_id_match: bool,
        /// Borrow live desktop-image modes for this load.
        #[serde(default)]
        virtual_inject: bool,
    },

    #[serde(rename = "profile.print")]
    ProfilePrint,

    // -----------------------------------------------------------------
    // Help
    // -----------------------------------------------------------------

    #[serde(rename = "help")]
    Help {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
}
