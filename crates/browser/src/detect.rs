//! Startup probe for a usable Chromium-based executable.

use std::path::PathBuf;

/// Executable names looked up on `PATH`, most common first.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "microsoft-edge",
    "microsoft-edge-stable",
    "brave-browser",
];

/// Fixed install locations checked before `PATH`.
#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Where the executable was found, or why not.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub found: bool,
    pub path: Option<PathBuf>,
    /// Install guidance, empty when found.
    pub install_hint: String,
}

impl DetectionResult {
    fn found(path: PathBuf) -> Self {
        Self {
            found: true,
            path: Some(path),
            install_hint: String::new(),
        }
    }
}

/// Locate a Chromium-based browser.
///
/// Order: configured path, `CHROME` env var, platform install paths, then
/// known executable names on `PATH`. A configured path that does not exist
/// falls through to the remaining sources.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    let mut explicit = custom_path
        .map(PathBuf::from)
        .into_iter()
        .chain(std::env::var("CHROME").ok().map(PathBuf::from))
        .chain(PLATFORM_PATHS.iter().map(PathBuf::from));

    if let Some(path) = explicit.find(|p| p.exists()) {
        return DetectionResult::found(path);
    }

    if let Some(path) = CHROMIUM_EXECUTABLES
        .iter()
        .find_map(|name| which::which(name).ok())
    {
        return DetectionResult::found(path);
    }

    DetectionResult {
        found: false,
        path: None,
        install_hint: install_instructions(),
    }
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let install = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium\n  \
         Fedora:        sudo dnf install chromium\n  \
         Arch:          sudo pacman -S chromium"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found; script-driven redirects will not be followed.\n\n\
         {install}\n\n\
         Or point at an existing binary:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/chrome\"\n\n\
         or set CHROME_PATH in the environment."
    )
}
