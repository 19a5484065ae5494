use std::path::PathBuf;
use std::process::ExitCode;

use shortcut_icons::catalog::CommandLauncher;
use shortcut_icons::store;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

enum Action {
    List(Option<PathBuf>),
    Open(PathBuf),
    Reset,
}

fn parse_args() -> Option<Action> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        None => Some(Action::List(None)),
        Some(flag) if flag == "--open" => args.next().map(|p| Action::Open(PathBuf::from(p))),
        Some(flag) if flag == "--reset" => Some(Action::Reset),
        Some(flag) if flag.starts_with("--") => None,
        Some(dir) => Some(Action::List(Some(PathBuf::from(dir)))),
    }
}

fn desktop_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(|home| PathBuf::from(home).join("Desktop"))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(action) = parse_args() else {
        eprintln!("usage: shortcut-icons [DIR] | --open PATH | --reset");
        return ExitCode::FAILURE;
    };

    match action {
        Action::Open(target) => open(&target),
        Action::Reset => match store::reset_store(store::find_store()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!("Failed to reset app store: {}", err);
                ExitCode::FAILURE
            }
        },
        Action::List(dir) => {
            let Some(dir) = dir.or_else(desktop_dir) else {
                tracing::error!("No directory given and no desktop found");
                return ExitCode::FAILURE;
            };
            list(&dir)
        }
    }
}

fn open(target: &std::path::Path) -> ExitCode {
    let store_path = store::find_store();
    let mut apps = store::load_store(&store_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load app store from {:?}: {}", store_path, e);
        store::AppStore::default()
    });

    match apps.open(&CommandLauncher, target) {
        Ok(true) => {
            if let Err(err) = store::save_store(&store_path, &apps) {
                tracing::warn!("Failed to save app store to {:?}: {}", store_path, err);
            }
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Failed to launch {}: {}", target.display(), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(windows)]
fn list(dir: &std::path::Path) -> ExitCode {
    use shortcut_icons::IconPipeline;
    use shortcut_icons::catalog::Catalog;
    use shortcut_icons::config;
    use shortcut_icons::pal::{ProcessEnvironment, Win32};

    let config_path = config::find_config();
    let config = config::load_config(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from {:?}: {}", config_path, e);
        config::Config::default()
    });
    tracing::info!("Config loaded: {} categories", config.categories.len());

    let win32 = Win32::new();
    let env = ProcessEnvironment;
    let icons = IconPipeline::new(&win32);
    let classifier = config.classifier();
    let catalog = Catalog::new(&win32, &env, &icons, &classifier);

    let entries = match catalog.scan(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!("Failed to scan {}: {}", dir.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let store_path = store::find_store();
    let mut apps = store::load_store(&store_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load app store from {:?}: {}", store_path, e);
        store::AppStore::default()
    });
    apps.save_apps(entries, chrono::Utc::now());
    if let Err(err) = store::save_store(&store_path, &apps) {
        tracing::warn!("Failed to save app store to {:?}: {}", store_path, err);
    }

    match serde_json::to_string_pretty(&apps.apps) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("Failed to serialize entries: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(windows))]
fn list(dir: &std::path::Path) -> ExitCode {
    tracing::error!(
        "Cannot list {}: {}",
        dir.display(),
        shortcut_icons::pal::PlatformError::Unsupported
    );
    ExitCode::FAILURE
}
