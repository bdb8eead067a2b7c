//! Extension pour intégrer la configuration du générateur dans pmoconfig
//!
//! Ce module fournit le trait `AltPlaylistConfigExt` qui ajoute à
//! `pmoconfig::Config` les paramètres des deux passerelles (plateforme de
//! streaming et service de recommandation) et du cache des IDs validés,
//! ainsi que les constructeurs `from_config` des composants du pipeline.

use crate::batcher::{
    BatchSettings, DEFAULT_BASE_BATCH_SIZE, DEFAULT_CREATIVITY, DEFAULT_NOISE,
};
use crate::builder::PlaylistBuilder;
use crate::cache::{ValidatedIdCache, DEFAULT_MAX_ENTRIES};
use crate::error::Result as PipelineResult;
use crate::gateway::{MetadataGateway, RecommendationGateway};
use crate::platform::{self, PlatformClient};
use crate::recommender::{self, RecommenderClient};
use crate::store::FileStore;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SEARCH_LIMIT: u64 = 10;
const DEFAULT_VALIDATED_IDS_DIR: &str = "cache";

/// Trait d'extension pour la configuration du générateur de playlists
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmoaltplaylist::AltPlaylistConfigExt;
///
/// let config = get_config();
/// let settings = config.get_batch_settings()?;
/// println!("Batch size: {}", settings.base_batch_size);
/// ```
pub trait AltPlaylistConfigExt {
    /// URL de base de l'API de la plateforme de streaming
    fn get_platform_api_base(&self) -> Result<String>;

    /// Définit l'URL de base de l'API de la plateforme
    fn set_platform_api_base(&self, url: &str) -> Result<()>;

    /// Récupère le token d'accès à la plateforme
    ///
    /// # Returns
    ///
    /// Le token, ou None s'il n'est pas configuré
    fn get_platform_access_token(&self) -> Result<Option<String>>;

    /// Définit le token d'accès à la plateforme
    fn set_platform_access_token(&self, token: &str) -> Result<()>;

    /// Schéma des URIs de pistes (`spotify` par défaut)
    fn get_platform_uri_scheme(&self) -> Result<String>;

    /// Timeout des requêtes vers la plateforme
    fn get_platform_timeout(&self) -> Result<Duration>;

    /// Nombre de pistes récemment écoutées à récupérer (1 à 50)
    fn get_recently_played_limit(&self) -> Result<u32>;

    /// URL de base du service de recommandation
    fn get_recommender_api_base(&self) -> Result<String>;

    /// Définit l'URL de base du service de recommandation
    fn set_recommender_api_base(&self, url: &str) -> Result<()>;

    /// Timeout des requêtes vers le service de recommandation
    fn get_recommender_timeout(&self) -> Result<Duration>;

    /// Nombre maximum de candidats par recherche
    ///
    /// # Returns
    ///
    /// None si la valeur configurée est 0 (le service applique sa propre limite)
    fn get_search_limit(&self) -> Result<Option<u32>>;

    /// Paramètres des requêtes de suggestions (taille de lot, créativité, bruit)
    fn get_batch_settings(&self) -> Result<BatchSettings>;

    /// Récupère le répertoire du cache des IDs validés
    ///
    /// # Returns
    ///
    /// Le chemin absolu du répertoire, créé s'il n'existe pas
    fn get_validated_ids_dir(&self) -> Result<String>;

    /// Définit le répertoire du cache des IDs validés
    fn set_validated_ids_dir(&self, directory: String) -> Result<()>;
}

fn seconds(value: u64) -> Duration {
    Duration::from_secs(value.max(1))
}

impl AltPlaylistConfigExt for Config {
    fn get_platform_api_base(&self) -> Result<String> {
        Ok(self.get_string_or(&["platform", "api_base"], platform::DEFAULT_API_BASE))
    }

    fn set_platform_api_base(&self, url: &str) -> Result<()> {
        self.set_value(&["platform", "api_base"], Value::String(url.to_string()))
    }

    fn get_platform_access_token(&self) -> Result<Option<String>> {
        match self.get_value(&["platform", "access_token"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
            _ => Ok(None),
        }
    }

    fn set_platform_access_token(&self, token: &str) -> Result<()> {
        self.set_value(
            &["platform", "access_token"],
            Value::String(token.to_string()),
        )
    }

    fn get_platform_uri_scheme(&self) -> Result<String> {
        Ok(self.get_string_or(&["platform", "uri_scheme"], platform::DEFAULT_URI_SCHEME))
    }

    fn get_platform_timeout(&self) -> Result<Duration> {
        Ok(seconds(self.get_u64_or(
            &["platform", "timeout_secs"],
            platform::DEFAULT_REQUEST_TIMEOUT_SECS,
        )))
    }

    fn get_recently_played_limit(&self) -> Result<u32> {
        let limit = self.get_u64_or(
            &["platform", "recently_played_limit"],
            u64::from(platform::DEFAULT_RECENTLY_PLAYED_LIMIT),
        );
        Ok(limit.clamp(1, 50) as u32)
    }

    fn get_recommender_api_base(&self) -> Result<String> {
        Ok(self.get_string_or(&["recommender", "api_base"], recommender::DEFAULT_API_BASE))
    }

    fn set_recommender_api_base(&self, url: &str) -> Result<()> {
        self.set_value(&["recommender", "api_base"], Value::String(url.to_string()))
    }

    fn get_recommender_timeout(&self) -> Result<Duration> {
        Ok(seconds(self.get_u64_or(
            &["recommender", "timeout_secs"],
            recommender::DEFAULT_REQUEST_TIMEOUT_SECS,
        )))
    }

    fn get_search_limit(&self) -> Result<Option<u32>> {
        match self.get_u64_or(&["recommender", "search_limit"], DEFAULT_SEARCH_LIMIT) {
            0 => Ok(None),
            n => Ok(Some(n.min(u64::from(u32::MAX)) as u32)),
        }
    }

    fn get_batch_settings(&self) -> Result<BatchSettings> {
        let base = self.get_u64_or(
            &["recommender", "base_batch_size"],
            DEFAULT_BASE_BATCH_SIZE as u64,
        );
        Ok(BatchSettings {
            base_batch_size: (base as usize).max(1),
            creativity: self.get_f64_or(&["recommender", "creativity"], DEFAULT_CREATIVITY),
            noise: self.get_f64_or(&["recommender", "noise"], DEFAULT_NOISE),
        })
    }

    fn get_validated_ids_dir(&self) -> Result<String> {
        self.get_managed_dir(
            &["cache", "validated_ids", "directory"],
            DEFAULT_VALIDATED_IDS_DIR,
        )
    }

    fn set_validated_ids_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["cache", "validated_ids", "directory"], directory)
    }
}

impl PlatformClient {
    /// Crée un client depuis la configuration globale
    pub fn from_config() -> PipelineResult<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: &Config) -> PipelineResult<Self> {
        let mut builder = PlatformClient::builder()
            .api_base(config.get_platform_api_base()?)
            .uri_scheme(config.get_platform_uri_scheme()?)
            .timeout(config.get_platform_timeout()?)
            .recently_played_limit(config.get_recently_played_limit()?);

        if let Some(token) = config.get_platform_access_token()? {
            builder = builder.access_token(token);
        }

        builder.build()
    }
}

impl RecommenderClient {
    /// Crée un client depuis la configuration globale
    pub fn from_config() -> PipelineResult<Self> {
        let config = pmoconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: &Config) -> PipelineResult<Self> {
        RecommenderClient::builder()
            .api_base(config.get_recommender_api_base()?)
            .timeout(config.get_recommender_timeout()?)
            .build()
    }
}

impl FileStore {
    /// Ouvre le store dans le répertoire configuré du cache des IDs validés
    pub fn from_config(config: &Config) -> Result<Self> {
        FileStore::new(config.get_validated_ids_dir()?)
    }
}

impl ValidatedIdCache {
    /// Ouvre le cache persistant avec la borne configurée
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = FileStore::from_config(config)?;
        let max_entries = config
            .get_validated_ids_max_entries()
            .unwrap_or(DEFAULT_MAX_ENTRIES);
        Ok(ValidatedIdCache::open(Arc::new(store), max_entries))
    }
}

impl<M, R> PlaylistBuilder<M, R>
where
    M: MetadataGateway,
    R: RecommendationGateway,
{
    /// Crée un builder complet : cache persistant, taille des lots, limite de recherche
    pub fn from_config(metadata: Arc<M>, recommender: Arc<R>, config: &Config) -> Result<Self> {
        let cache = ValidatedIdCache::from_config(config)?.shared();

        Ok(PlaylistBuilder::new(metadata, recommender, cache)
            .with_batch_settings(config.get_batch_settings()?)
            .with_search_limit(config.get_search_limit()?)
            .with_uri_scheme(config.get_platform_uri_scheme()?))
    }
}
