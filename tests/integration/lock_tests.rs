use file_cleaner::lock::{LockError, ProcessLock};

use super::common::Workspace;

#[test]
fn test_lock_is_exclusive_until_dropped() {
    let ws = Workspace::new();

    let first = ProcessLock::acquire(&ws.lock_path()).unwrap();
    assert!(matches!(
        ProcessLock::acquire(&ws.lock_path()),
        Err(LockError::AlreadyHeld(_))
    ));

    drop(first);
    let again = ProcessLock::acquire(&ws.lock_path()).unwrap();
    assert_eq!(again.permit().lock_path(), ws.lock_path());
}

#[test]
fn test_lock_released_when_panicking() {
    let ws = Workspace::new();
    let path = ws.lock_path();

    let result = std::panic::catch_unwind(|| {
        let _lock = ProcessLock::acquire(&path).unwrap();
        panic!("strategy blew up");
    });

    assert!(result.is_err());
    assert!(ProcessLock::acquire(&ws.lock_path()).is_ok());
}

#[test]
fn test_lock_file_survives_release() {
    let ws = Workspace::new();
    drop(ProcessLock::acquire(&ws.lock_path()).unwrap());
    assert!(ws.lock_path().exists());
}
