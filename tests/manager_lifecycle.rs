use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotreload::engine::{ManagerOptions, WatchSetManager, WatchState};
use hotreload::fs::mock::MockFileSystem;
use hotreload_test_utils::{fake_collaborators, init_tracing, FakeReloader, FakeWatcher, StaticLocator};

struct Harness {
    fs: MockFileSystem,
    locator: StaticLocator,
    watcher: FakeWatcher,
    reloader: FakeReloader,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let fs = MockFileSystem::new();
        fs.add_file("/site/pkgA/__init__.py", "");
        fs.add_file("/site/pkgA/a.py", "x = 1\n");
        fs.add_file("/site/pkgA/sub/__init__.py", "");
        fs.add_file("/site/pkgA/sub/b.py", "y = 2\n");
        fs.add_file("/site/pkgA/theme.qss", "QWidget {}\n");
        fs.add_file("/site/pkgB/__init__.py", "");
        fs.add_file("/site/pkgB/c.py", "");

        let locator = StaticLocator::new()
            .with("pkgA", "/site/pkgA")
            .with("pkgB", "/site/pkgB");

        Self {
            fs,
            locator,
            watcher: FakeWatcher::new(),
            reloader: FakeReloader::new(),
        }
    }

    fn manager(&self, modules: &[&str]) -> WatchSetManager {
        self.manager_with(modules, ManagerOptions::default())
    }

    fn manager_with(&self, modules: &[&str], options: ManagerOptions) -> WatchSetManager {
        let collab = fake_collaborators(
            Arc::new(self.fs.clone()),
            &self.locator,
            &self.watcher,
            &self.reloader,
        );
        WatchSetManager::new(modules.iter().copied(), options, collab)
    }
}

fn last_log(manager: &WatchSetManager) -> String {
    manager.log().last().unwrap_or_default()
}

fn logged(manager: &WatchSetManager, needle: &str) -> bool {
    manager.log().history().iter().any(|l| l.ends_with(needle))
}

#[test]
fn construct_watches_located_module() {
    let h = Harness::new();
    let manager = h.manager(&["pkgA"]);

    assert_eq!(manager.state(), WatchState::Watching);
    assert_eq!(manager.module_names(), vec!["pkgA"]);
    assert!(logged(&manager, "Watching for changes in '/site/pkgA'"));
    assert!(manager.is_subscribed());
    assert_eq!(h.watcher.subscriptions(), 1);

    let mut watched = h.watcher.watched();
    watched.sort();
    assert_eq!(
        watched,
        vec![
            PathBuf::from("/site/pkgA/a.py"),
            PathBuf::from("/site/pkgA/sub/b.py"),
            PathBuf::from("/site/pkgA/theme.qss"),
        ]
    );
}

#[test]
fn construct_drops_unknown_and_duplicate_modules() {
    let h = Harness::new();
    let manager = h.manager(&["pkgA", "ghost", "pkgA", " "]);

    assert_eq!(manager.module_names(), vec!["pkgA"]);
    assert!(logged(&manager, "Could not find path for the module 'ghost'"));
}

#[test]
fn construct_with_nothing_located_stays_empty_and_unsubscribed() {
    let h = Harness::new();
    let manager = h.manager(&["ghost"]);

    assert_eq!(manager.state(), WatchState::Empty);
    assert!(manager.table().is_empty());
    assert_eq!(h.watcher.subscriptions(), 0);
    assert_eq!(h.watcher.add_calls(), 0);
}

#[test]
fn auto_connect_off_defers_everything() {
    let h = Harness::new();
    let options = ManagerOptions {
        auto_connect: false,
        ..ManagerOptions::default()
    };
    let manager = h.manager_with(&["pkgA"], options);

    assert_eq!(manager.state(), WatchState::Watching);
    assert!(h.watcher.watched().is_empty());
    assert!(!manager.is_subscribed());
}

#[test]
fn duplicate_add_is_rejected() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);
    let table_before = manager.table().clone();

    assert!(!manager.add("pkgA"));
    assert!(last_log(&manager).ends_with("The module 'pkgA' is already in the list."));
    assert_eq!(manager.table(), &table_before);
}

#[test]
fn empty_and_unknown_add_are_rejected() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);

    assert!(!manager.add(""));
    assert!(last_log(&manager).ends_with("The specified module '' does not exist."));

    assert!(!manager.add("ghost"));
    assert!(last_log(&manager).ends_with("Could not find path for the module 'ghost'"));
    assert_eq!(manager.module_names(), vec!["pkgA"]);
}

#[test]
fn add_second_module_extends_table_in_order() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);

    assert!(manager.add("pkgB"));
    assert_eq!(manager.module_names(), vec!["pkgA", "pkgB"]);
    assert_eq!(manager.table().index_of(&"/site/pkgB/c.py".into()), Some(1));
    assert_eq!(manager.table().index_of(&"/site/pkgA/a.py".into()), Some(0));
    assert!(h.watcher.watched().contains(&PathBuf::from("/site/pkgB/c.py")));
    assert_eq!(h.watcher.subscriptions(), 1);
}

#[test]
fn remove_last_module_empties_everything() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);

    assert_eq!(manager.remove(&["pkgA"]), 1);
    assert_eq!(manager.state(), WatchState::Empty);
    assert!(manager.table().is_empty());
    assert!(h.watcher.watched().is_empty());
    assert!(logged(&manager, "Stopped watching 'pkgA'"));
    assert!(logged(&manager, "Removed 3 files and 0 directories from watcher."));
}

#[test]
fn remove_reindexes_survivors() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA", "pkgB"]);

    manager.remove(&["pkgA"]);
    assert_eq!(manager.module_names(), vec!["pkgB"]);
    assert_eq!(manager.table().index_of(&"/site/pkgB/c.py".into()), Some(0));
    assert!(!manager.table().contains(&"/site/pkgA/a.py".into()));
}

#[test]
fn remove_with_nothing_to_do_is_logged() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);
    let add_calls = h.watcher.add_calls();

    assert_eq!(manager.remove::<&str>(&[]), 0);
    assert!(last_log(&manager).ends_with("No modules selected."));

    assert_eq!(manager.remove(&["pkgB"]), 0);
    assert!(last_log(&manager).ends_with("None of the selected modules are being watched."));

    assert_eq!(h.watcher.add_calls(), add_calls);
    assert_eq!(manager.module_names(), vec!["pkgA"]);
}

#[test]
fn refresh_is_idempotent() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA", "pkgB"]);
    let table = manager.table().clone();
    let mut watched = h.watcher.watched();
    watched.sort();

    manager.refresh();
    manager.refresh();

    let mut after = h.watcher.watched();
    after.sort();
    assert_eq!(manager.table(), &table);
    assert_eq!(after, watched);
    assert_eq!(h.watcher.subscriptions(), 1);
}

#[test]
fn subscription_happens_once_across_empty_transitions() {
    let h = Harness::new();
    let mut manager = h.manager(&[]);
    assert_eq!(h.watcher.subscriptions(), 0);

    assert!(manager.add("pkgA"));
    assert_eq!(h.watcher.subscriptions(), 1);

    manager.remove(&["pkgA"]);
    assert_eq!(manager.state(), WatchState::Empty);

    assert!(manager.add("pkgB"));
    assert!(manager.add("pkgA"));
    assert_eq!(h.watcher.subscriptions(), 1);
}

#[test]
fn refresh_relocates_roots() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA", "pkgB"]);

    h.locator.remove("pkgA");
    manager.refresh();

    // The module keeps its place in the list but contributes no files.
    assert_eq!(manager.module_names(), vec!["pkgA", "pkgB"]);
    assert_eq!(manager.modules()[0].root, None);
    assert_eq!(manager.table().len(), 1);
    assert_eq!(manager.table().index_of(&"/site/pkgB/c.py".into()), Some(1));
}

#[test]
fn unwatchable_paths_are_logged() {
    let h = Harness::new();
    h.watcher.refuse("/site/pkgA/a.py");
    let manager = h.manager(&["pkgA"]);

    assert!(logged(&manager, "Could not watch '/site/pkgA/a.py'"));
    assert!(logged(&manager, "Added 3 paths to watcher"));
}

#[test]
fn pattern_text_updates_rebuild_the_table() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);

    manager.set_source_patterns_text("**/*.py", "**/__init__.py, sub/**");
    assert!(manager.table().contains(&"/site/pkgA/a.py".into()));
    assert!(!manager.table().contains(&"/site/pkgA/sub/b.py".into()));
    assert!(!h.watcher.watched().contains(&PathBuf::from("/site/pkgA/sub/b.py")));

    manager.set_stylesheet_patterns_text("");
    assert!(!manager.table().contains(&"/site/pkgA/theme.qss".into()));
    assert_eq!(manager.patterns().ignore_source, vec!["**/__init__.py", "sub/**"]);
}

#[test]
fn invalid_pattern_is_skipped_with_message() {
    let h = Harness::new();
    let mut manager = h.manager(&["pkgA"]);

    manager.set_source_patterns_text("**/*.py, a[", "");
    assert!(logged(&manager, "Pattern 'a[' is not valid."));
    assert!(manager.table().contains(&"/site/pkgA/a.py".into()));
}

#[test]
fn module_root_for_path_uses_table_owner() {
    let h = Harness::new();
    let manager = h.manager(&["pkgA", "pkgB"]);

    assert_eq!(
        manager.module_root_for_path(Path::new("/site/pkgB/c.py")),
        Some(Path::new("/site/pkgB"))
    );
    assert_eq!(manager.module_root_for_path(Path::new("/site/other.py")), None);
}
