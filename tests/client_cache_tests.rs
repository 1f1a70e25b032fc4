/// Tests for the client caches
///
/// Most tests use an in-memory fake server; the last ones run the real
/// routers on ephemeral ports and talk to them over HTTP.
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use triple_fun_api::{
    client::{
        CacheState, ClientError, ClientResult, HttpPersistenceClient, LocalStorage, MemoryStorage,
        PersistenceClient, SiteDataCache, SiteDataSource, TranslationCache, SITE_DATA_KEY,
    },
    json_store::{
        default_site_data, json_path::get_string, BulkUpdateResponse, Language,
        LanguageWriteResult, TranslationSet,
    },
    server::{build_translation_router, build_upload_router},
    upload_store::IncomingFile,
    AppContext, ServerConfig,
};

/// Fake server holding documents in memory
#[derive(Default)]
struct FakeServer {
    translations: Mutex<Option<TranslationSet>>,
    site_data: Mutex<Option<Value>>,
    saved_translations: Mutex<Vec<TranslationSet>>,
    saved_site_data: Mutex<Vec<Value>>,
    reject_saves: Mutex<bool>,
}

impl FakeServer {
    fn offline() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_translations(translations: TranslationSet) -> Arc<Self> {
        let server = Self::default();
        *server.translations.lock().unwrap() = Some(translations);
        Arc::new(server)
    }

    fn with_site_data(doc: Value) -> Arc<Self> {
        let server = Self::default();
        *server.site_data.lock().unwrap() = Some(doc);
        Arc::new(server)
    }

    fn unavailable() -> ClientError {
        ClientError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }
}

#[async_trait]
impl PersistenceClient for FakeServer {
    async fn fetch_translations(&self) -> ClientResult<TranslationSet> {
        self.translations
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(Self::unavailable)
    }

    async fn save_translations(
        &self,
        translations: &TranslationSet,
    ) -> ClientResult<BulkUpdateResponse> {
        if *self.reject_saves.lock().unwrap() {
            return Err(Self::unavailable());
        }
        self.saved_translations
            .lock()
            .unwrap()
            .push(translations.clone());

        Ok(BulkUpdateResponse {
            success: true,
            error: None,
            message: "saved".to_string(),
            results: translations
                .keys()
                .map(|lang| (*lang, LanguageWriteResult::written()))
                .collect(),
            ignored: Vec::new(),
        })
    }

    async fn fetch_site_data(&self) -> ClientResult<Value> {
        self.site_data
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(Self::unavailable)
    }

    async fn save_site_data(&self, doc: &Value) -> ClientResult<()> {
        if *self.reject_saves.lock().unwrap() {
            return Err(Self::unavailable());
        }
        self.saved_site_data.lock().unwrap().push(doc.clone());
        Ok(())
    }
}

// ========== Translation cache ==========

#[tokio::test]
async fn test_placeholder_and_missing_languages_fall_back() {
    let server = FakeServer::with_translations(BTreeMap::from([
        (Language::En, json!({"language": "en", "nav": {"menu": "Server Menu"}})),
        (Language::Ro, json!({"language": "ro"})),
    ]));
    let cache = TranslationCache::new(server, Arc::new(MemoryStorage::new()));

    let state = cache.load().await;

    assert_eq!(
        state,
        CacheState::ReadyWithFallback {
            failed: vec![Language::Ro, Language::Hu]
        }
    );
    assert_eq!(cache.lookup("nav.menu"), "Meniu");
    cache.set_language(Language::En);
    assert_eq!(cache.lookup("nav.menu"), "Server Menu");
}

#[tokio::test]
async fn test_ready_when_every_language_loads() {
    let server = FakeServer::with_translations(BTreeMap::from([
        (Language::Ro, json!({"nav": {"menu": "M-ro"}})),
        (Language::En, json!({"nav": {"menu": "M-en"}})),
        (Language::Hu, json!({"nav": {"menu": "M-hu"}})),
    ]));
    let cache = TranslationCache::new(server, Arc::new(MemoryStorage::new()));

    assert_eq!(cache.load().await, CacheState::Ready);
    assert_eq!(cache.state(), CacheState::Ready);
    assert_eq!(cache.lookup("nav.menu"), "M-ro");
}

#[tokio::test]
async fn test_lookup_fallback_chain() {
    let server = FakeServer::with_translations(BTreeMap::from([
        (Language::Ro, json!({"only": {"ro": "doar ro"}, "shared": "ro", "nested": {"obj": {}}})),
        (Language::En, json!({"shared": "en"})),
        (Language::Hu, json!({"shared": "hu"})),
    ]));
    let cache = TranslationCache::new(server, Arc::new(MemoryStorage::new()));
    cache.load().await;
    cache.set_language(Language::En);

    assert_eq!(cache.lookup("shared"), "en");
    assert_eq!(cache.lookup("only.ro"), "doar ro");
    assert_eq!(cache.lookup("missing.key"), "missing.key");
    // Objects are not translations
    assert_eq!(cache.lookup("nested.obj"), "nested.obj");
}

#[tokio::test]
async fn test_local_edit_is_idempotent() {
    let cache = TranslationCache::new(FakeServer::offline(), Arc::new(MemoryStorage::new()));

    cache.local_edit("hero.title", Language::Hu, "Helló").unwrap();
    let once = cache.snapshot();
    cache.local_edit("hero.title", Language::Hu, "Helló").unwrap();
    let twice = cache.snapshot();

    assert_eq!(*once, *twice);
    assert_eq!(get_string(&twice[&Language::Hu], "hero.title"), Some("Helló"));
}

#[tokio::test]
async fn test_flush_keeps_edits_on_failure_and_clears_on_success() {
    let server = FakeServer::with_translations(BTreeMap::new());
    *server.reject_saves.lock().unwrap() = true;
    let cache = TranslationCache::new(server.clone(), Arc::new(MemoryStorage::new()));
    cache.load().await;

    cache.local_edit("nav.menu", Language::En, "Food").unwrap();
    assert!(cache.flush().await.is_err());
    assert!(cache.has_unsaved_changes());

    *server.reject_saves.lock().unwrap() = false;
    cache.flush().await.unwrap();
    assert!(!cache.has_unsaved_changes());

    let saved = server.saved_translations.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(get_string(&saved[0][&Language::En], "nav.menu"), Some("Food"));
    assert_eq!(saved[0].len(), 3);
}

// ========== Site data cache ==========

#[tokio::test]
async fn test_snapshot_is_merged_with_server_defaults() {
    let mut server_doc = default_site_data();
    server_doc["contact"]["email"] = json!("server@triplefun.ro");
    server_doc["hero"]["title"] = json!("Server hero");
    let server = FakeServer::with_site_data(server_doc);

    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(
            SITE_DATA_KEY,
            &json!({"siteName": "Local Name", "contact": {"phone": "0700"}}).to_string(),
        )
        .unwrap();

    let cache = SiteDataCache::new(server, storage.clone());
    assert_eq!(cache.load().await, SiteDataSource::LocalSnapshot);

    let doc = cache.document();
    assert_eq!(doc["siteName"], "Local Name");
    assert_eq!(doc["contact"]["phone"], "0700");
    assert_eq!(doc["contact"]["email"], "server@triplefun.ro");
    assert_eq!(doc["hero"]["title"], "Server hero");
    assert!(doc["services"].is_array());

    let stored: Value =
        serde_json::from_str(&storage.get_item(SITE_DATA_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, *doc);
}

#[tokio::test]
async fn test_snapshot_merge_uses_built_in_default_when_offline() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(SITE_DATA_KEY, &json!({"siteName": "Offline"}).to_string())
        .unwrap();

    let cache = SiteDataCache::new(FakeServer::offline(), storage);
    assert_eq!(cache.load().await, SiteDataSource::LocalSnapshot);
    assert_eq!(cache.document()["siteName"], "Offline");
    assert!(cache.document()["regulationTexts"].is_object());
}

#[tokio::test]
async fn test_server_document_used_without_snapshot() {
    let mut server_doc = default_site_data();
    server_doc["siteName"] = json!("From Server");
    let cache = SiteDataCache::new(
        FakeServer::with_site_data(server_doc),
        Arc::new(MemoryStorage::new()),
    );

    assert_eq!(cache.source(), None);
    assert_eq!(cache.load().await, SiteDataSource::Server);
    assert_eq!(cache.source(), Some(SiteDataSource::Server));
    assert_eq!(cache.document()["siteName"], "From Server");
}

#[tokio::test]
async fn test_mutations_write_through_and_flush() {
    let server = FakeServer::with_site_data(default_site_data());
    let storage = Arc::new(MemoryStorage::new());
    let cache = SiteDataCache::new(server.clone(), storage.clone());
    cache.load().await;

    let id = cache
        .upsert_record("gallery", json!({"src": "/uploads/a.jpg", "alt": "Tort"}))
        .unwrap();
    cache.update_multilingual_content("hero.cta", Language::Hu, "Foglalj");

    let stored: Value =
        serde_json::from_str(&storage.get_item(SITE_DATA_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored["gallery"][0]["id"], id.as_str());
    assert_eq!(stored["multilingualContent"]["hero.cta"]["hu"], "Foglalj");
    assert!(cache.has_unsaved_changes());

    cache.flush().await.unwrap();
    assert!(!cache.has_unsaved_changes());
    assert_eq!(server.saved_site_data.lock().unwrap()[0]["gallery"][0]["alt"], "Tort");
}

// ========== Against a running server ==========

struct RunningServer {
    _dir: tempfile::TempDir,
    client: HttpPersistenceClient,
}

async fn start_server() -> RunningServer {
    let dir = tempdir().unwrap();
    let config = ServerConfig::rooted_at(dir.path().join("public"));
    let ctx = AppContext::new(config).await.unwrap();

    let translation_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upload_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api_base = format!("http://{}", translation_listener.local_addr().unwrap());
    let upload_base = format!("http://{}", upload_listener.local_addr().unwrap());

    let translations = build_translation_router(ctx.clone());
    let uploads = build_upload_router(ctx);
    tokio::spawn(async move { axum::serve(translation_listener, translations).await });
    tokio::spawn(async move { axum::serve(upload_listener, uploads).await });

    RunningServer {
        _dir: dir,
        client: HttpPersistenceClient::new(api_base, upload_base).unwrap(),
    }
}

#[tokio::test]
async fn test_translation_cache_against_server() {
    let server = start_server().await;
    let client = Arc::new(server.client.clone());

    let cache = TranslationCache::new(client.clone(), Arc::new(MemoryStorage::new()));
    assert_eq!(
        cache.load().await,
        CacheState::ReadyWithFallback {
            failed: Language::ALL.to_vec()
        }
    );

    cache.local_edit("hero.title", Language::En, "Best party").unwrap();
    cache.flush().await.unwrap();

    let fresh = TranslationCache::new(client, Arc::new(MemoryStorage::new()));
    assert_eq!(fresh.load().await, CacheState::Ready);
    fresh.set_language(Language::En);
    assert_eq!(fresh.lookup("hero.title"), "Best party");
}

#[tokio::test]
async fn test_site_data_cache_against_server() {
    let server = start_server().await;
    let client = Arc::new(server.client.clone());

    let cache = SiteDataCache::new(client.clone(), Arc::new(MemoryStorage::new()));
    assert_eq!(cache.load().await, SiteDataSource::Server);

    cache.set_field("siteName", json!("Triple Fun Oradea"));
    cache.flush().await.unwrap();
    assert_eq!(client.fetch_site_data().await.unwrap()["siteName"], "Triple Fun Oradea");

    // Server-side validation failures surface as status errors and keep local state
    cache.set_field("services", json!([{"title": "no id"}]));
    match cache.flush().await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 400),
        other => panic!("unexpected flush result: {:?}", other),
    }
    assert!(cache.has_unsaved_changes());
}

#[tokio::test]
async fn test_upload_helpers_against_server() {
    let server = start_server().await;
    let client = &server.client;

    assert!(client.upload_server_available().await);

    let file = IncomingFile::new("Balloons.png", "image/png", b"png bytes".to_vec());
    let uploaded = client.upload_image(&file).await.unwrap();
    assert!(uploaded.success);
    let filename = uploaded.filename.unwrap();

    let batch = client
        .upload_images(&[
            IncomingFile::new("a.jpg", "image/jpeg", b"a".to_vec()),
            IncomingFile::new("b.txt", "text/plain", b"b".to_vec()),
        ])
        .await
        .unwrap();
    assert_eq!(batch.count, 1);
    assert_eq!(batch.files.len(), 2);

    let listed = client.list_uploads().await.unwrap();
    assert_eq!(listed.len(), 2);

    client.delete_upload(&filename).await.unwrap();
    match client.delete_upload(&filename).await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected delete result: {:?}", other),
    }
    match client.delete_upload("../secret").await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 400),
        other => panic!("unexpected delete result: {:?}", other),
    }

    let invalid = IncomingFile::new("doc.pdf", "application/pdf", b"%PDF".to_vec());
    assert!(matches!(
        client.upload_image(&invalid).await,
        Err(ClientError::Validation(_))
    ));
}
