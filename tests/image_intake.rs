//! Tests for image intake, both called directly and triggered by uploads.

mod common;

use std::time::Duration;

use axum::{body::Body, http::Method, http::StatusCode};
use common::{create_todo, failing_app, get_todo, memory_app, send, FailingTable};
use todo_backend::{
    intake::BlobCreated,
    storage::{memory::MemoryTable, StorageError, TableStore},
    todo::{TodoEntity, PARTITION_KEY},
};

/// How long to wait for background image intake before giving up.
const INTAKE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn image_completes_matching_todo_and_is_copied() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    state
        .table
        .insert(&TodoEntity::new("abc123", "take a photo"))
        .await?;
    state
        .blobs
        .write(&state.containers.images, "abc123.png", b"\x89PNG image")
        .await?;

    state.image_intake().handle("abc123.png").await;

    let todo = get_todo(&router, "abc123").await?;
    assert_eq!(
        todo.map(|todo| (todo.task_description, todo.is_completed)),
        Some(("take a photo".to_owned(), true)),
    );
    assert_eq!(
        state
            .blobs
            .read(&state.containers.images_copy, "abc123.png")
            .await?,
        b"\x89PNG image",
    );

    Ok(())
}

#[tokio::test]
async fn image_without_todo_changes_nothing() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    let bystander = create_todo(&router, "unrelated").await?;
    state
        .blobs
        .write(&state.containers.images, "nobody.png", b"bytes")
        .await?;

    state.image_intake().handle("nobody.png").await;

    assert_eq!(get_todo(&router, &bystander.id).await?, Some(bystander));
    assert!(
        matches!(
            state
                .blobs
                .read(&state.containers.images_copy, "nobody.png")
                .await,
            Err(StorageError::NotFound)
        ),
        "image shouldn't be copied",
    );

    Ok(())
}

#[tokio::test]
async fn copy_failure_is_swallowed() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    state
        .table
        .insert(&TodoEntity::new("abc123", "take a photo"))
        .await?;

    // The image was never stored, so reading it for the copy fails.
    state.image_intake().handle("abc123.png").await;

    let todo = get_todo(&router, "abc123").await?;
    assert_eq!(todo.map(|todo| todo.is_completed), Some(true));

    Ok(())
}

#[tokio::test]
async fn completion_failure_is_swallowed_and_skips_copy() -> anyhow::Result<()> {
    let table = MemoryTable::new();
    table.insert(&TodoEntity::new("abc123", "take a photo")).await?;
    let (_, state) = failing_app(FailingTable::read_only(table));
    state
        .blobs
        .write(&state.containers.images, "abc123.png", b"\x89PNG image")
        .await?;

    state.image_intake().handle("abc123.png").await;

    let stored = state.table.retrieve(PARTITION_KEY, "abc123").await?;
    assert_eq!(stored.map(|entity| entity.is_completed), Some(false));
    assert!(
        matches!(
            state
                .blobs
                .read(&state.containers.images_copy, "abc123.png")
                .await,
            Err(StorageError::NotFound)
        ),
        "image shouldn't be copied if completing the todo item failed",
    );

    Ok(())
}

#[tokio::test]
async fn upload_triggers_intake() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    let todo = create_todo(&router, "take a photo").await?;
    let name = format!("{}.jpg", todo.id);

    let (status, _) = send(
        &router,
        Method::PUT,
        &format!("/api/images/{name}"),
        &b"jpeg bytes"[..],
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let copy = tokio::time::timeout(INTAKE_TIMEOUT, async {
        loop {
            match state
                .blobs
                .read(&state.containers.images_copy, &name)
                .await
            {
                Err(StorageError::NotFound) => tokio::time::sleep(Duration::from_millis(10)).await,
                result => break result,
            }
        }
    })
    .await??;

    assert_eq!(copy, b"jpeg bytes");
    assert_eq!(
        get_todo(&router, &todo.id).await?.map(|todo| todo.is_completed),
        Some(true),
    );

    Ok(())
}

#[tokio::test]
async fn empty_upload_is_rejected() -> anyhow::Result<()> {
    let (router, _) = memory_app();

    let (status, body) = send(&router, Method::PUT, "/api/images/abc.png", Body::empty()).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Image is empty");

    Ok(())
}

#[tokio::test]
async fn events_from_other_containers_are_ignored() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    let todo = create_todo(&router, "take a photo").await?;
    let name = format!("{}.png", todo.id);
    state
        .blobs
        .write(&state.containers.images_copy, &name, b"bytes")
        .await?;

    state
        .blob_events
        .send(BlobCreated {
            container: state.containers.images_copy.clone(),
            name: name.clone(),
        })
        .await?;

    // Events are handled in order, so once a later event is handled, the earlier one was too.
    let marker = create_todo(&router, "marker").await?;
    let marker_name = format!("{}.png", marker.id);
    state
        .blobs
        .write(&state.containers.images, &marker_name, b"marker")
        .await?;
    state
        .blob_events
        .send(BlobCreated {
            container: state.containers.images.clone(),
            name: marker_name,
        })
        .await?;

    tokio::time::timeout(INTAKE_TIMEOUT, async {
        while get_todo(&router, &marker.id)
            .await
            .ok()
            .flatten()
            .is_some_and(|marker| !marker.is_completed)
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    assert_eq!(
        get_todo(&router, &todo.id).await?.map(|todo| todo.is_completed),
        Some(false),
    );

    Ok(())
}

#[tokio::test]
async fn large_upload_is_accepted() -> anyhow::Result<()> {
    let (router, state) = memory_app();
    let image = vec![0xAB_u8; 3 << 20];

    let (status, _) = send(&router, Method::PUT, "/api/images/big.jpg", image.clone()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        state.blobs.read(&state.containers.images, "big.jpg").await?,
        image,
    );

    Ok(())
}
