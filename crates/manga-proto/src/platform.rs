use std::path::PathBuf;

const APP_DIR: &str = "anymanga";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/anymanga/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        // Portable installs keep their data beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let portable_data = exe_dir.join("data");
                if portable_data.exists() {
                    return portable_data;
                }
            }
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                if exe_dir.join("config.toml").exists() {
                    return exe_dir.to_path_buf();
                }
            }
        }
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Where the TUI writes its tracing output.
pub fn log_path() -> PathBuf {
    data_dir().join("anymanga.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(data_dir().ends_with(APP_DIR) || data_dir().ends_with("data"));
        assert!(log_path().ends_with("anymanga.log"));
    }
}
