//! Fixed operation catalog: names, descriptions and parameter tables.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::capture::CaptureFormat;

const DEVICE_DESCRIPTION: &str = "Specific device ID to target (if multiple devices are connected)";
const FORMAT_DESCRIPTION: &str = "Image format (png, jpg, jpeg, webp, bmp, gif). Default is png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    /// One of the capture formats.
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub kind: ParamKind,
}

const fn required(name: &'static str, description: &'static str) -> Param {
    Param {
        name,
        description,
        required: true,
        kind: ParamKind::Text,
    }
}

const fn optional(name: &'static str, description: &'static str) -> Param {
    Param {
        name,
        description,
        required: false,
        kind: ParamKind::Text,
    }
}

const DEVICE: Param = optional("device", DEVICE_DESCRIPTION);
const DEVICE_REQUIRED: Param = required("device", DEVICE_DESCRIPTION);
const FORMAT: Param = Param {
    name: "format",
    description: FORMAT_DESCRIPTION,
    required: false,
    kind: ParamKind::Format,
};

const RUN_SHELL: &[Param] = &[required("command", "The shell command to execute"), DEVICE];
const INSTALL: &[Param] = &[
    required(
        "path",
        "Path to an APK file, a directory of APK files or a wildcard pattern",
    ),
    DEVICE,
];
const LIST_PACKAGES: &[Param] = &[
    DEVICE,
    optional(
        "filter",
        "Optional case-insensitive filter to search for specific packages",
    ),
];
const PULL: &[Param] = &[
    required("remote_path", "Path to the file or directory on the device"),
    required("local_path", "Path where to save the file locally"),
    DEVICE,
];
const PUSH: &[Param] = &[
    required("local_path", "Path to the local file or directory"),
    required("remote_path", "Path on the device where to push the file"),
    DEVICE,
];
const CAPTURE_TO_FILE: &[Param] = &[
    required("output_path", "Path where to save the screenshot"),
    DEVICE,
    FORMAT,
];
const CAPTURE_TO_CLIPBOARD: &[Param] = &[DEVICE, FORMAT];
const DEVICE_ONLY: &[Param] = &[DEVICE_REQUIRED];
const PACKAGE_OPS: &[Param] = &[
    required("package_name", "Package name of the application"),
    DEVICE,
];

/// Every operation exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListDevices,
    RunShell,
    InstallPackage,
    UninstallPackage,
    ListPackages,
    PullFile,
    PushFile,
    LaunchApp,
    CaptureScreenToFile,
    CaptureScreenToClipboard,
    ClearAppData,
    ForceStopApp,
    GoHome,
    OpenSettings,
    ClearAndRestart,
    ForceRestart,
}

impl Operation {
    /// Catalog order.
    pub const ALL: [Operation; 16] = [
        Operation::ListDevices,
        Operation::RunShell,
        Operation::InstallPackage,
        Operation::UninstallPackage,
        Operation::ListPackages,
        Operation::PullFile,
        Operation::PushFile,
        Operation::LaunchApp,
        Operation::CaptureScreenToFile,
        Operation::CaptureScreenToClipboard,
        Operation::ClearAppData,
        Operation::ForceStopApp,
        Operation::GoHome,
        Operation::OpenSettings,
        Operation::ClearAndRestart,
        Operation::ForceRestart,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Operation::ListDevices => "list_devices",
            Operation::RunShell => "run_shell",
            Operation::InstallPackage => "install_package",
            Operation::UninstallPackage => "uninstall_package",
            Operation::ListPackages => "list_packages",
            Operation::PullFile => "pull_file",
            Operation::PushFile => "push_file",
            Operation::LaunchApp => "launch_app",
            Operation::CaptureScreenToFile => "capture_screen_to_file",
            Operation::CaptureScreenToClipboard => "capture_screen_to_clipboard",
            Operation::ClearAppData => "clear_app_data",
            Operation::ForceStopApp => "force_stop_app",
            Operation::GoHome => "go_home",
            Operation::OpenSettings => "open_settings",
            Operation::ClearAndRestart => "clear_and_restart",
            Operation::ForceRestart => "force_restart",
        }
    }

    /// Exact (protocol) name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Case-insensitive lookup for the command line.
    pub fn from_name_ci(name: &str) -> Option<Self> {
        let norm = name.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(norm))
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Operation::ListDevices => {
                "Lists all connected Android devices and their connection status"
            }
            Operation::RunShell => "Executes a shell command on a connected Android device",
            Operation::InstallPackage => {
                "Installs APK files on a connected Android device (single file, directory or wildcard)"
            }
            Operation::UninstallPackage => {
                "Uninstalls an application from a connected Android device"
            }
            Operation::ListPackages => "Lists installed packages on a connected Android device",
            Operation::PullFile => {
                "Pulls a file from a connected Android device to the local system"
            }
            Operation::PushFile => {
                "Pushes a file from the local system to a connected Android device"
            }
            Operation::LaunchApp => "Launches an application on a connected Android device",
            Operation::CaptureScreenToFile => {
                "Takes a screenshot and saves it to the local system"
            }
            Operation::CaptureScreenToClipboard => {
                "Takes a screenshot and copies it to the clipboard"
            }
            Operation::ClearAppData => "Clears all data for an application",
            Operation::ForceStopApp => "Force stops a running application",
            Operation::GoHome => "Navigates to the home screen",
            Operation::OpenSettings => "Opens the Android Settings app",
            Operation::ClearAndRestart => {
                "Clears app data and automatically restarts the application"
            }
            Operation::ForceRestart => "Force stops and then restarts an application",
        }
    }

    pub fn params(&self) -> &'static [Param] {
        match self {
            Operation::ListDevices => &[],
            Operation::RunShell => RUN_SHELL,
            Operation::InstallPackage => INSTALL,
            Operation::ListPackages => LIST_PACKAGES,
            Operation::PullFile => PULL,
            Operation::PushFile => PUSH,
            Operation::CaptureScreenToFile => CAPTURE_TO_FILE,
            Operation::CaptureScreenToClipboard => CAPTURE_TO_CLIPBOARD,
            Operation::GoHome | Operation::OpenSettings => DEVICE_ONLY,
            Operation::UninstallPackage
            | Operation::LaunchApp
            | Operation::ClearAppData
            | Operation::ForceStopApp
            | Operation::ClearAndRestart
            | Operation::ForceRestart => PACKAGE_OPS,
        }
    }

    pub fn required_params(&self) -> impl Iterator<Item = &'static str> {
        self.params().iter().filter(|p| p.required).map(|p| p.name)
    }

    /// JSON-Schema object describing the argument bag.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for param in self.params() {
            let mut prop = json!({
                "type": "string",
                "description": param.description,
            });
            if param.kind == ParamKind::Format {
                prop["enum"] = CaptureFormat::ALL.iter().map(|f| f.as_str()).collect();
            }
            properties.insert(param.name.to_string(), prop);
        }
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert(
            "required".into(),
            self.required_params().collect::<Vec<_>>().into(),
        );
        schema
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
