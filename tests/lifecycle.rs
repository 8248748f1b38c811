mod common;

use std::path::{Path, PathBuf};

use common::{Call, recording_volume};
use rax_fs::access::{AccessMode, OpenMode};
use rax_fs::collision::CollisionPolicy;
use rax_fs::entry::EntryState;
use rax_fs::error::EntryError;
use rax_fs::storage::StorageProvider;
use tokio_util::sync::CancellationToken;

#[test]
fn illegal_mode_pair_never_reaches_the_provider() {
    let (storage, volume) = recording_volume(&[("/a.txt", "data")]);
    let mut file = volume.file(Path::new("/a.txt")).unwrap();
    storage.clear();

    let err = file.open(AccessMode::Read, OpenMode::Append).unwrap_err();

    assert!(matches!(
        err,
        EntryError::InvalidModeCombination {
            access: AccessMode::Read,
            open: OpenMode::Append
        }
    ));
    assert_eq!(storage.opened_streams(), 0);
    assert_eq!(file.state(), EntryState::Closed);
}

#[test]
fn open_handle_refuses_structural_changes() {
    let (storage, volume) = recording_volume(&[("/a.txt", "data")]);
    storage.inner.create_directory(Path::new("/out")).unwrap();
    let mut file = volume.file(Path::new("/a.txt")).unwrap();
    file.open(AccessMode::ReadWrite, OpenMode::Open).unwrap();
    storage.clear();

    assert!(matches!(
        file.rename("b.txt", CollisionPolicy::ReplaceExisting),
        Err(EntryError::InvalidState(_))
    ));
    assert!(matches!(
        file.move_to(Path::new("/out"), CollisionPolicy::ReplaceExisting),
        Err(EntryError::InvalidState(_))
    ));
    assert!(matches!(
        file.change_extension("md", CollisionPolicy::ReplaceExisting),
        Err(EntryError::InvalidState(_))
    ));
    assert!(matches!(file.delete(), Err(EntryError::InvalidState(_))));

    assert!(storage.calls().is_empty());
    assert!(file.is_open());

    file.close().unwrap();
    file.rename("b.txt", CollisionPolicy::FailIfExists).unwrap();
    assert_eq!(file.path(), Path::new("/b.txt"));
}

#[test]
fn close_is_idempotent_and_flushes() {
    let (storage, volume) = recording_volume(&[]);
    let mut file = volume
        .create_file(Path::new("/log.txt"), CollisionPolicy::FailIfExists)
        .unwrap();

    file.open(AccessMode::Write, OpenMode::Append).unwrap();
    file.write_all(b"one").unwrap();
    file.close().unwrap();
    file.close().unwrap();

    assert_eq!(storage.text("/log.txt"), "one");
    assert_eq!(file.state(), EntryState::Closed);
}

#[test]
fn reopen_replaces_the_previous_stream() {
    let (storage, volume) = recording_volume(&[("/a.txt", "abc")]);
    let mut file = volume.file(Path::new("/a.txt")).unwrap();

    file.open(AccessMode::Read, OpenMode::Open).unwrap();
    file.open(AccessMode::Write, OpenMode::Truncate).unwrap();
    assert_eq!(file.access_mode(), Some(AccessMode::Write));
    file.write_all(b"z").unwrap();
    file.close().unwrap();

    assert_eq!(storage.text("/a.txt"), "z");
    assert_eq!(storage.opened_streams(), 2);
}

#[test]
fn copy_with_open_stream_flushes_first() {
    let (storage, volume) = recording_volume(&[("/a.txt", "")]);
    storage.inner.create_directory(Path::new("/out")).unwrap();
    let mut file = volume.file(Path::new("/a.txt")).unwrap();

    file.open(AccessMode::Write, OpenMode::Open).unwrap();
    file.write_all(b"pending").unwrap();
    let copy = file.copy_to(Path::new("/out"), CollisionPolicy::FailIfExists).unwrap();

    assert!(file.is_open());
    assert_eq!(copy.path(), Path::new("/out/a.txt"));
    assert_eq!(storage.text("/out/a.txt"), "pending");
}

#[test]
fn directory_copy_keeps_going_after_a_failure() {
    let (storage, volume) = recording_volume(&[
        ("/src/a.txt", "a"),
        ("/src/nested/b.txt", "b"),
        ("/src/nested/c.txt", "c"),
        ("/dst/src/nested/b.txt", "taken"),
    ]);
    let dir = volume.directory(Path::new("/src")).unwrap();

    let report = dir
        .copy_to(Path::new("/dst"), CollisionPolicy::OpenIfExists, CollisionPolicy::FailIfExists)
        .unwrap();

    assert_eq!(report.files_copied, 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].path, PathBuf::from("/src/nested/b.txt"));
    assert_eq!(storage.text("/dst/src/a.txt"), "a");
    assert_eq!(storage.text("/dst/src/nested/c.txt"), "c");
    assert_eq!(storage.text("/dst/src/nested/b.txt"), "taken");
    assert!(
        !storage
            .mutations()
            .contains(&Call::Copy("/src/nested/b.txt".into(), "/dst/src/nested/b.txt".into()))
    );
}

#[tokio::test]
async fn async_entry_points() {
    let (storage, volume) = recording_volume(&[("/src/a.txt", "a")]);
    let cancel = CancellationToken::new();

    let out = volume
        .create_directory_async("/out".into(), CollisionPolicy::FailIfExists, &cancel)
        .await
        .unwrap();
    assert!(out.exists());

    let src = volume.directory(Path::new("/src")).unwrap();
    let report = src
        .copy_to_async("/out".into(), CollisionPolicy::FailIfExists, CollisionPolicy::FailIfExists, &cancel)
        .await
        .unwrap();
    assert!(report.is_success());
    assert_eq!(storage.text("/out/src/a.txt"), "a");

    let mut file = volume.file(Path::new("/src/a.txt")).unwrap();
    let copy = file
        .copy_to_async("/out".into(), CollisionPolicy::GenerateUniqueName, &cancel)
        .await
        .unwrap();
    assert_eq!(copy.path(), Path::new("/out/a.txt"));

    src.delete_async(&cancel).await.unwrap();
    assert!(!src.exists());
}

#[tokio::test]
async fn cancelled_token_skips_the_work() {
    let (storage, volume) = recording_volume(&[]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = volume
        .create_file_async("/a.txt".into(), CollisionPolicy::FailIfExists, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, EntryError::Cancelled));
    assert!(storage.calls().is_empty());
}
