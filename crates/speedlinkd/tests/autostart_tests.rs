//! Autostart entry lifecycle, against a temp directory.

use speedlinkd::autostart;
use tempfile::TempDir;

/// One sequential test: enable/status/disable share the env override, and
/// parallel env mutation would race.
#[test]
fn autostart_entry_round_trips() {
    let dir = TempDir::new().unwrap();
    std::env::set_var(autostart::AUTOSTART_ENV, dir.path());

    assert!(!autostart::is_enabled());

    autostart::enable().unwrap();
    assert!(autostart::is_enabled());

    let entry = std::fs::read_to_string(dir.path().join(autostart::ENTRY_NAME)).unwrap();
    assert!(entry.starts_with("[Desktop Entry]"));
    assert!(entry.contains("Exec="));

    // Disabling twice is fine.
    autostart::disable().unwrap();
    autostart::disable().unwrap();
    assert!(!autostart::is_enabled());

    std::env::remove_var(autostart::AUTOSTART_ENV);
}
