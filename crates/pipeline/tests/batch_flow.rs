//! End-to-end pipeline tests against a real database and a local blob
//! store: render fan-out, cache dedup, zip packaging, batch lifecycle.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use tempfile::TempDir;

use dialbatch_core::render::RenderConfig;
use dialbatch_db::models::batch::CreateBatch;
use dialbatch_db::models::image::CreateImage;
use dialbatch_db::models::status::BatchStatus;
use dialbatch_db::repositories::{BatchRepo, ImageRepo};
use dialbatch_pipeline::{BatchProcessor, BatchRunner, ImageRenderer, Rasterizer};
use dialbatch_storage::{image_key, BlobStore, LocalStore};

const CHANNEL: &str = "in.state";
const PUBLISHER: &str = "pub-1";

struct Harness {
    _tmp: TempDir,
    store: Arc<LocalStore>,
    processor: BatchProcessor,
    renderer: ImageRenderer,
    work_dir: std::path::PathBuf,
}

fn harness(pool: &PgPool) -> Harness {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(tmp.path().join("blobs"), "https://blobs.test"));
    let work_dir = tmp.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();

    let renderer = ImageRenderer::new(
        pool.clone(),
        store.clone() as Arc<dyn BlobStore>,
        Rasterizer::new(None),
    );
    let processor = BatchProcessor::new(
        pool.clone(),
        store.clone() as Arc<dyn BlobStore>,
        ImageRenderer::new(
            pool.clone(),
            store.clone() as Arc<dyn BlobStore>,
            Rasterizer::new(None),
        ),
        &work_dir,
    );

    Harness {
        _tmp: tmp,
        store,
        processor,
        renderer,
        work_dir,
    }
}

fn create_batch(process_id: &str, dialcodes: &[&str], config: serde_json::Value) -> CreateBatch {
    CreateBatch {
        process_id: process_id.to_string(),
        dialcodes: dialcodes.iter().map(|s| s.to_string()).collect(),
        config,
        channel: CHANNEL.into(),
        publisher: PUBLISHER.into(),
    }
}

// ---------------------------------------------------------------------------
// Full batch flow
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_of_three_new_codes_completes_with_archive(pool: PgPool) {
    let h = harness(&pool);
    let cfg = RenderConfig::default();
    let codes = ["A1B2C3", "D4E5F6", "G7H8J9"];
    BatchRepo::create(&pool, &create_batch("p-1", &codes, cfg.to_config_value()))
        .await
        .unwrap();

    h.processor.process("p-1").await.unwrap();

    // Batch row moved to Completed with an archive URL.
    let batch = BatchRepo::find_by_process_id(&pool, "p-1").await.unwrap().unwrap();
    assert_eq!(batch.status_id, BatchStatus::Completed.id());
    let archive_url = batch.archive_url.expect("completed batch must carry a URL");
    assert!(archive_url.ends_with("/p-1.zip"));

    // One Completed image row per code.
    for code in codes {
        let rows = ImageRepo::find_completed(&pool, code, CHANNEL, PUBLISHER).await.unwrap();
        assert_eq!(rows.len(), 1, "expected one completed row for {code}");
        assert_eq!(rows[0].config, cfg.to_config_value());
    }

    // The uploaded archive holds the three PNGs.
    let archive = h.store.path_for(&format!("{CHANNEL}/{PUBLISHER}/p-1.zip"));
    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 3);
    for i in 0..zip.len() {
        assert!(zip.by_index(i).unwrap().name().ends_with(".png"));
    }

    // Local scratch state is gone.
    assert!(!h.work_dir.join("p-1").exists());
    assert!(!h.work_dir.join("p-1.zip").exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_process_id_is_dropped_without_error(pool: PgPool) {
    let h = harness(&pool);
    h.processor.process("no-such-batch").await.unwrap();
    assert!(BatchRepo::find_by_process_id(&pool, "no-such-batch")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_upload_leaves_batch_in_processing(pool: PgPool) {
    let tmp = TempDir::new().unwrap();
    // A store rooted at a regular file: every upload fails on mkdir.
    let bad_root = tmp.path().join("blobs");
    std::fs::write(&bad_root, b"not a directory").unwrap();
    let store = Arc::new(LocalStore::new(&bad_root, "https://blobs.test"));

    let work_dir = tmp.path().join("work");
    std::fs::create_dir_all(&work_dir).unwrap();
    let processor = BatchProcessor::new(
        pool.clone(),
        store.clone() as Arc<dyn BlobStore>,
        ImageRenderer::new(pool.clone(), store as Arc<dyn BlobStore>, Rasterizer::new(None)),
        &work_dir,
    );

    let cfg = RenderConfig::default();
    BatchRepo::create(&pool, &create_batch("p-fail", &["A1B2C3"], cfg.to_config_value()))
        .await
        .unwrap();

    processor.process("p-fail").await.unwrap_err();

    let batch = BatchRepo::find_by_process_id(&pool, "p-fail").await.unwrap().unwrap();
    assert_eq!(batch.status_id, BatchStatus::Processing.id());
    assert_eq!(batch.archive_url, None);
    // Scratch state is still cleaned up on failure.
    assert!(!work_dir.join("p-fail").exists());
}

// ---------------------------------------------------------------------------
// Cache behaviour
// ---------------------------------------------------------------------------

/// Seed a Completed image row plus its backing blob, as a finished earlier
/// batch would have left them.
async fn seed_completed_image(
    pool: &PgPool,
    store: &LocalStore,
    scratch: &Path,
    dialcode: &str,
    cfg: &RenderConfig,
) -> String {
    let filename = format!("{dialcode}_1700000000000");
    let row = ImageRepo::insert_pending(
        pool,
        &CreateImage {
            dialcode: dialcode.to_string(),
            channel: CHANNEL.into(),
            publisher: PUBLISHER.into(),
            config: cfg.to_config_value(),
            filename: filename.clone(),
        },
    )
    .await
    .unwrap();

    let local = scratch.join(format!("{filename}.png"));
    std::fs::write(&local, b"seeded-png").unwrap();
    let url = store
        .upload(&local, &image_key(CHANNEL, PUBLISHER, &filename))
        .await
        .unwrap();
    ImageRepo::mark_completed(pool, row.id, &url).await.unwrap();
    url
}

#[sqlx::test(migrations = "../db/migrations")]
async fn identical_config_is_a_cache_hit(pool: PgPool) {
    let h = harness(&pool);
    let cfg = RenderConfig::default();
    let seeded_url =
        seed_completed_image(&pool, &h.store, &h.work_dir, "A1B2C3", &cfg).await;

    let out_dir = h.work_dir.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let outcome = h
        .renderer
        .get_image("A1B2C3", CHANNEL, PUBLISHER, &cfg, &out_dir)
        .await
        .unwrap();

    assert!(!outcome.created, "structurally equal config must reuse the row");
    assert_eq!(outcome.url, seeded_url);

    // No second row for the key, and the cached blob landed in out_dir.
    let total = ImageRepo::count_for_key(&pool, "A1B2C3", CHANNEL, PUBLISHER).await.unwrap();
    assert_eq!(total, 1);
    assert!(out_dir.join("A1B2C3_1700000000000.png").is_file());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn different_config_renders_a_new_row(pool: PgPool) {
    let h = harness(&pool);
    let seeded_cfg = RenderConfig::from_value(&json!({"borderPx": 3}));
    seed_completed_image(&pool, &h.store, &h.work_dir, "A1B2C3", &seeded_cfg).await;

    let out_dir = h.work_dir.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let requested = RenderConfig::default();
    let outcome = h
        .renderer
        .get_image("A1B2C3", CHANNEL, PUBLISHER, &requested, &out_dir)
        .await
        .unwrap();

    assert!(outcome.created, "different config must render fresh");
    let total = ImageRepo::count_for_key(&pool, "A1B2C3", CHANNEL, PUBLISHER).await.unwrap();
    assert_eq!(total, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_with_cached_code_reuses_it_in_the_archive(pool: PgPool) {
    let h = harness(&pool);
    let cfg = RenderConfig::default();
    seed_completed_image(&pool, &h.store, &h.work_dir, "A1B2C3", &cfg).await;

    BatchRepo::create(
        &pool,
        &create_batch("p-2", &["A1B2C3", "D4E5F6"], cfg.to_config_value()),
    )
    .await
    .unwrap();

    h.processor.process("p-2").await.unwrap();

    // The cached code still has exactly one row; the new code got one.
    assert_eq!(
        ImageRepo::count_for_key(&pool, "A1B2C3", CHANNEL, PUBLISHER).await.unwrap(),
        1
    );
    assert_eq!(
        ImageRepo::count_for_key(&pool, "D4E5F6", CHANNEL, PUBLISHER).await.unwrap(),
        1
    );

    // Both images are in the archive regardless of cache hits.
    let archive = h.store.path_for(&format!("{CHANNEL}/{PUBLISHER}/p-2.zip"));
    let zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 2);
}
