// [tests/mirror/libs/infra/blob_store/local_blob_store.test.rs]
//! El backend local es el único que los daemons de prueba tocan de extremo a
//! extremo; estas pruebas cubren el contrato completo `BlobStore` contra un
//! directorio temporal, incluyendo las dos formas de handle inválido.

use narrata_domain_models::BlobHandle;
use narrata_infra_blob_store::{BlobStore, LocalBlobStore};
use std::time::Duration;

#[tokio::test]
async fn put_object_is_retrievable_under_a_fresh_handle() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path()).await.unwrap();

    let handle = store
        .put_object("source.mp4", b"source-bytes".to_vec(), "video/mp4")
        .await
        .unwrap();

    let fetched = store.get_object(&handle).await.unwrap();
    assert_eq!(fetched, b"source-bytes");
}

#[tokio::test]
async fn two_puts_with_the_same_key_hint_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path()).await.unwrap();

    let first = store.put_object("clip.mp4", b"a".to_vec(), "video/mp4").await.unwrap();
    let second = store.put_object("clip.mp4", b"b".to_vec(), "video/mp4").await.unwrap();

    assert_ne!(first.0, second.0);
    assert_eq!(store.get_object(&first).await.unwrap(), b"a");
    assert_eq!(store.get_object(&second).await.unwrap(), b"b");
}

#[tokio::test]
async fn presign_get_produces_a_fresh_url_each_call() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path()).await.unwrap();
    let handle = store.put_object("recap.mp4", b"rendered".to_vec(), "video/mp4").await.unwrap();

    let first_url = store.presign_get(&handle, Duration::from_secs(300)).await.unwrap();
    let second_url = store.presign_get(&handle, Duration::from_secs(300)).await.unwrap();

    assert_ne!(first_url, second_url, "each presign call must carry its own expiry");
}

#[tokio::test]
async fn delete_then_get_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path()).await.unwrap();
    let handle = store.put_object("throwaway.bin", b"x".to_vec(), "application/octet-stream").await.unwrap();

    store.delete(&handle).await.unwrap();

    let err = store.get_object(&handle).await.unwrap_err();
    assert!(err.to_string().contains("L3_BLOB_NOT_FOUND"));
}

#[tokio::test]
async fn malformed_handle_is_rejected_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path()).await.unwrap();
    let foreign_handle = BlobHandle("blob://remote/not-ours".to_string());

    let err = store.get_object(&foreign_handle).await.unwrap_err();
    assert!(err.to_string().contains("L3_BLOB_INVALID_HANDLE"));
}
