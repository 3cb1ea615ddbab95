// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use loan_desk::config::Config;
use loan_desk::db::{FirestoreStore, MemoryStore};
use loan_desk::models::Fields;
use loan_desk::services::{FileResourcePicker, MemoryAuth};
use loan_desk::AppContext;
use std::path::PathBuf;
use std::sync::Arc;

/// Smallest valid PNG (1x1, RGBA).
#[allow(dead_code)]
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xF8, 0xCF, 0xC0, 0xF0,
    0x1F, 0x00, 0x05, 0x00, 0x01, 0xFF, 0x56, 0xC7, 0x2F, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Encode a blank RGB picture of the given size.
#[allow(dead_code)]
pub fn create_test_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img: image::RgbImage = image::ImageBuffer::new(width, height);
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_store() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// In-memory collaborators behind an [`AppContext`].
#[allow(dead_code)]
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub store: MemoryStore,
    pub auth: Arc<MemoryAuth>,
    pub picker: Arc<FileResourcePicker>,
}

/// Create a test app with `uid` signed in (or nobody, for `None`).
#[allow(dead_code)]
pub fn create_test_app(uid: Option<&str>) -> TestApp {
    let store = MemoryStore::new();
    let auth = Arc::new(match uid {
        Some(uid) => MemoryAuth::signed_in(uid, &format!("{}@example.com", uid)),
        None => MemoryAuth::new(),
    });
    let picker = Arc::new(FileResourcePicker::new());

    let ctx = Arc::new(AppContext {
        config: Config::default(),
        store: Arc::new(store.clone()),
        auth: auth.clone(),
        picker: picker.clone(),
    });

    TestApp {
        ctx,
        store,
        auth,
        picker,
    }
}

/// Seed the equipment catalogue and a student profile for `u1`.
#[allow(dead_code)]
pub fn seed_catalogue(store: &MemoryStore) {
    store.seed(
        "equipment",
        "eq1",
        Fields::new()
            .with("name", "Projector")
            .with("description", "HDMI, 3000 lumen"),
    );
    store.seed("equipment", "eq2", Fields::new().with("name", "Camera"));
    store.seed(
        "users",
        "u1",
        Fields::new()
            .with("name", "Ana")
            .with("studentId", "2021-001")
            .with("program", "Physics")
            .with("role", "student")
            .with("photo", "aGk="),
    );
}

/// Write `bytes` to a unique temporary file.
#[allow(dead_code)]
pub async fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "loan-desk-{}-{}-{}",
        std::process::id(),
        unique_suffix(),
        name
    ));
    tokio::fs::write(&path, bytes)
        .await
        .expect("Failed to write temp file");
    path
}

/// Nanosecond suffix for test isolation.
#[allow(dead_code)]
pub fn unique_suffix() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}
