//! Help system for monswitch commands.

pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        None => overview(),
        Some(t) => {
            if let Some(text) = command_help(t) {
                return text;
            }
            if let Some(text) = group_help(t) {
                return text;
            }
            format!("Unknown help topic: '{}'. Run 'monswitch --help' for a list of options.", t)
        }
    }
}


fn overview() -> String {
    "\
monswitch - save and restore monitor layouts

Usage: monswitch [options] [profile...]

Operations (run in the order given, stopping at the first failure):
  -s, --save <profile>       Capture the active layout into a profile
  -l, --load <profile>       Apply a saved profile
  -p, --print                Print a summary of the active layout
  <profile>                  Same as --load <profile>

Options:
  --no-id-match              Apply adapter ids exactly as saved
  -v, --virtual-inject       Borrow live desktop-image modes for old profiles
  --debug                    Verbose logging
  --config-dir <dir>         Read config.yaml from <dir>
  --topology <file>          Dry run against a saved topology instead of the
                             real display configuration

Profiles without an extension get '.monitorprofile'. Bare names are stored
in the profile directory (default: '<home>/Monitor Profiles').

Run 'monswitch --help-topic <topic>' for details on 'profile', 'load' or 'config'."
        .into()
}


fn group_help(group: &str) -> Option<String> {
    let text = match group {
        "profile" => "\
Profile commands - capture, apply and inspect display layouts

  profile.save <profile>
    Query the active paths and write them to the profile file.

  profile.load <profile> [--no-id-match] [--virtual-inject]
    Apply the profile, repairing drifted adapter ids and skipping virtual
    displays that are not currently present.

  profile.print
    Print the active paths with their target, refresh rate and geometry.",

        "load" => "\
Loading a profile escalates through up to three attempts:

  1. direct             Saved layout with adapter ids matched to the live ones
  2. alternate identity Saved layout re-pointed by exact monitor name
  3. virtual merge      Live layout with saved modes and rotation overlaid
                        (profiles that use virtual displays only)

Missing virtual displays are dropped with a warning. Missing physical
monitors are warned about and the layout is applied anyway.",

        "config" => "\
Configuration - optional config.yaml in the config directory

  Directory: $MONSWITCH_CONFIG_DIR, else the platform config dir + 'monswitch'

  profile_dir: <path>            Where bare profile names are stored
  profile_extension: <ext>       Appended to names without one
  match_adapter_ids: true|false  Correct drifted adapter ids (default true)
  inject_desktop_images: bool    Same as --virtual-inject (default false)",

        _ => return None,
    };
    Some(text.into())
}


fn command_help(command: &str) -> Option<String> {
    let text = match command {
        "profile.save" => "monswitch --save - capture a profile\n\nUsage: monswitch --save <profile>",
        "profile.load" => "monswitch --load - apply a profile\n\nUsage: monswitch [--no-id-match] [-v] --load <profile>",
        "profile.print" => "monswitch --print - summarize the active layout\n\nUsage: monswitch --print",
        "help" => "monswitch --help-topic - show help\n\nUsage: monswitch --help-topic <topic>",
        _ => return None,
    };
    Some(text.into())
}
