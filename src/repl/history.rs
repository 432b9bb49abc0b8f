use crate::repl::highlighter::ReplHelper;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const HISTORY_FILE_NAME: &str = "history.txt";

pub(crate) type ReplEditor = Editor<ReplHelper, DefaultHistory>;

/// `<data dir>/kusmala/history.txt`, falling back to the config dir.
pub(crate) fn get_history_path() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::config_dir)
        .map(|base| history_path_under(&base))
}

fn history_path_under(base: &Path) -> PathBuf {
    base.join(env!("CARGO_PKG_NAME")).join(HISTORY_FILE_NAME)
}

pub(crate) fn load_history_from_path(rl: &mut ReplEditor, history_path: &Path) {
    if let Some(parent_dir) = history_path.parent() {
        if !parent_dir.exists() {
            if let Err(e) = fs::create_dir_all(parent_dir) {
                warn!(
                    "Failed to create history directory {}: {}",
                    parent_dir.display(),
                    e
                );
            }
        }
    }
    if !history_path.exists() {
        info!(
            "History file {} does not exist yet, it is written on exit",
            history_path.display()
        );
        return;
    }
    match rl.load_history(history_path) {
        Ok(()) => info!("Loaded history from {}", history_path.display()),
        Err(err) => warn!(
            "Could not load history from {}: {}",
            history_path.display(),
            err
        ),
    }
}

pub(crate) fn save_history_to_path(rl: &mut ReplEditor, history_path: &Path) {
    match rl.save_history(history_path) {
        Ok(()) => info!("Saved history to {}", history_path.display()),
        Err(err) => error!(
            "Could not save history to {}: {}",
            history_path.display(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use rustyline::history::History;
    use tempfile::tempdir;

    #[test]
    fn history_lives_in_a_crate_named_directory() {
        init_test_logging();
        let path = history_path_under(Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data/kusmala/history.txt"));
    }

    #[test]
    fn history_survives_a_save_and_load() {
        init_test_logging();
        let dir = tempdir().expect("temp dir");
        let path = history_path_under(dir.path());

        let mut rl = ReplEditor::new().expect("editor");
        load_history_from_path(&mut rl, &path);
        assert!(path.parent().expect("parent").exists());
        rl.add_history_entry("buat x = 1;").expect("add entry");
        save_history_to_path(&mut rl, &path);

        let mut reloaded = ReplEditor::new().expect("editor");
        load_history_from_path(&mut reloaded, &path);
        assert_eq!(reloaded.history().len(), 1);
    }
}
