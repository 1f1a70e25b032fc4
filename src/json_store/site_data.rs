/// Site data document store
///
/// A single JSON document describing the venue: contact details, schedule,
/// services, pricing, offers, galleries and regulations. Always replaced
/// wholesale.
use super::file::{read_json, write_json};
use crate::{
    error::{ApiError, ApiResult},
    metrics,
    validation,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Minimal site data used to seed a missing file and as the client's last resort
pub fn default_site_data() -> Value {
    let empty_text = json!({ "ro": "", "en": "", "hu": "" });

    json!({
        "logo": "TF",
        "siteName": "Triple Fun",
        "contact": {
            "phone": "0748 55 99 79",
            "whatsapp": "40748559979",
            "email": "contact@triplefun.ro",
            "address": "Strada Jocului Nr. 15, București"
        },
        "whatsappMessages": {
            "booking": {
                "ro": "🎉 Salut! Vreau să rezerv o petrecere la Triple Fun!",
                "en": "🎉 Hello! I want to book a party at Triple Fun!",
                "hu": "🎉 Szia! Szeretnék bulit foglalni a Triple Fun-ban!"
            },
            "contact": {
                "ro": "📞 Salut! Am o întrebare despre Triple Fun.",
                "en": "📞 Hello! I have a question about Triple Fun.",
                "hu": "📞 Szia! Kérdésem van a Triple Fun-nal kapcsolatban."
            }
        },
        "schedule": {},
        "hero": { "title": "", "subtitle": "" },
        "services": [],
        "menu": {},
        "pricing": [],
        "offers": [],
        "gallery": [],
        "fullWidthGallery": [],
        "regulations": [],
        "regulationTexts": {
            "warningTitle": empty_text,
            "warningText": empty_text,
            "refusalTitle": empty_text,
            "refusalText": empty_text,
            "acceptanceText": empty_text,
            "thankYouTitle": empty_text,
            "thankYouText": empty_text
        },
        "multilingualContent": {}
    })
}

/// Singleton site data file with serialized writes
pub struct SiteDataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SiteDataStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the built-in default when no site data file exists yet
    ///
    /// Returns true when a file was created.
    pub async fn seed_if_missing(&self) -> ApiResult<bool> {
        let _guard = self.lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }

        write_json(&self.path, &default_site_data()).await?;
        tracing::info!(path = %self.path.display(), "seeded default site data");
        Ok(true)
    }

    /// Read the document; there is no safe fallback for a whole-document read
    pub async fn get(&self) -> ApiResult<Value> {
        read_json(&self.path).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to load site data");
            ApiError::Storage("Failed to load site data".to_string())
        })
    }

    /// Validate and replace the document
    pub async fn put(&self, doc: &Value) -> ApiResult<()> {
        validation::validate_site_data(doc)
            .map_err(|errors| ApiError::Validation(validation::describe(&errors)))?;

        let _guard = self.lock.lock().await;
        let result = write_json(&self.path, doc).await;
        metrics::record_document_write("site_data", result.is_ok());
        result.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write site data");
            ApiError::Storage("Failed to update site data".to_string())
        })?;

        tracing::info!("site data updated");
        Ok(())
    }
}
