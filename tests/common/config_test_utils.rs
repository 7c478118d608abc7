use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    xdg_config_home: Option<std::ffi::OsString>,
    server_url: Option<std::ffi::OsString>,
    batch_limit: Option<std::ffi::OsString>,
    output_dir: Option<std::ffi::OsString>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        if let Some(value) = self.xdg_config_home.take() {
            std::env::set_var("XDG_CONFIG_HOME", value);
        } else {
            std::env::remove_var("XDG_CONFIG_HOME");
        }

        if let Some(value) = self.server_url.take() {
            std::env::set_var("ANONSEND_SERVER_URL", value);
        } else {
            std::env::remove_var("ANONSEND_SERVER_URL");
        }

        if let Some(value) = self.batch_limit.take() {
            std::env::set_var("ANONSEND_BATCH_LIMIT", value);
        } else {
            std::env::remove_var("ANONSEND_BATCH_LIMIT");
        }

        if let Some(value) = self.output_dir.take() {
            std::env::set_var("ANONSEND_OUTPUT_DIR", value);
        } else {
            std::env::remove_var("ANONSEND_OUTPUT_DIR");
        }
    }
}

fn write_config(temp_dir: &TempDir, contents: &str) {
    let app_config_dir = temp_dir.path().join("anonsend");
    std::fs::create_dir_all(&app_config_dir).expect("create config dir");
    std::fs::write(app_config_dir.join("config.toml"), contents).expect("write config");
}

/// Run `f` with the config file redirected to a temp dir (via
/// XDG_CONFIG_HOME) and a clean ANONSEND_* environment, restoring both after.
pub fn with_config_env<T>(config_toml: &str, f: impl FnOnce() -> T) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");

    write_config(&temp_dir, config_toml);

    let restore = EnvRestore {
        xdg_config_home: std::env::var_os("XDG_CONFIG_HOME"),
        server_url: std::env::var_os("ANONSEND_SERVER_URL"),
        batch_limit: std::env::var_os("ANONSEND_BATCH_LIMIT"),
        output_dir: std::env::var_os("ANONSEND_OUTPUT_DIR"),
    };

    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    std::env::remove_var("ANONSEND_SERVER_URL");
    std::env::remove_var("ANONSEND_BATCH_LIMIT");
    std::env::remove_var("ANONSEND_OUTPUT_DIR");

    let result = f();
    drop(restore);
    result
}
