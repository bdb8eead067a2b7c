//! # pmoaltplaylist - Générateur de playlists alternatives
//!
//! Cette crate construit une playlist "alternative" (ou "étendue") à partir
//! de la file d'attente d'une plateforme de streaming, en passant par un
//! service de recommandation externe.
//!
//! ## Vue d'ensemble
//!
//! Le pipeline enchaîne les étapes suivantes :
//! - récupération des pistes récemment écoutées (plateforme)
//! - résolution de chaque piste source vers un ID du service de recommandation
//!   (recherche floue, avec un cache persistant des IDs validés)
//! - requêtes de suggestions par lots, puis récupération des métadonnées
//! - exclusion des pistes déjà écoutées ou déjà présentes, dédoublonnage
//!
//! Chaque build rapporte sa progression et peut être annulé à tout moment.
//!
//! ## Structure des modules
//!
//! ```text
//! pmoaltplaylist/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── models.rs           # Structures de données
//! │   ├── gateway.rs          # Traits des passerelles
//! │   ├── platform/           # Client de la plateforme de streaming
//! │   │   ├── mod.rs
//! │   │   ├── catalog.rs      # Pistes et playlists
//! │   │   └── player.rs       # Historique et file d'attente
//! │   ├── recommender.rs      # Client du service de recommandation
//! │   ├── store.rs            # Stockage clé/valeur persistant
//! │   ├── cache.rs            # Cache des IDs validés
//! │   ├── resolver.rs         # Résolution des pistes
//! │   ├── batcher.rs          # Requêtes de suggestions par lots
//! │   ├── filter.rs           # Filtre d'exclusion
//! │   ├── builder.rs          # Orchestration d'un build
//! │   ├── session.rs          # Session de builds successifs
//! │   ├── config_ext.rs       # Intégration pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmoaltplaylist::{
//!     BuildMode, BuildSession, LengthMultiplier, MetadataGateway, PlatformClient,
//!     PlaylistBuilder, RecommenderClient,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = pmoconfig::get_config();
//!     let platform = Arc::new(PlatformClient::from_config()?);
//!     let recommender = Arc::new(RecommenderClient::from_config()?);
//!
//!     let builder = PlaylistBuilder::from_config(platform.clone(), recommender, &config)?;
//!     let session = BuildSession::new(Arc::new(builder));
//!
//!     let seeds = platform.queue_snapshot().await?.source_tracks();
//!     let outcome = session
//!         .request(seeds, LengthMultiplier::try_from(2)?, BuildMode::Alternative, |p| {
//!             println!("{} ({}%)", p.phase, p.percentage)
//!         })
//!         .await?;
//!
//!     for track in outcome.tracks() {
//!         println!("{}", track.label());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Gestion des erreurs
//!
//! ```rust,ignore
//! use pmoaltplaylist::AltPlaylistError;
//!
//! match builder.build(&request, &token, |_| {}).await {
//!     Ok(tracks) => println!("{} tracks", tracks.len()),
//!     Err(AltPlaylistError::Cancelled) => {}
//!     Err(e) if e.is_auth_error() => println!("Access token rejected"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod batcher;
pub mod builder;
pub mod cache;
mod cancel;
pub mod config_ext;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod models;
pub mod platform;
pub mod recommender;
pub mod resolver;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use batcher::{BatchSettings, RecommendationBatcher};
pub use builder::{BuildRequest, BuildState, PlaylistBuilder};
pub use cache::{CacheStats, SharedIdCache, ValidatedIdCache, ValidatedIdEntry};
pub use config_ext::AltPlaylistConfigExt;
pub use error::{AltPlaylistError, Result};
pub use gateway::{MetadataGateway, RecommendationGateway};
pub use models::{
    BuildMode, LengthMultiplier, ProgressReport, QueueSnapshot, RecentlyPlayed, SearchCandidate,
    SuggestRequest, SuggestResponse, Track,
};
pub use platform::PlatformClient;
pub use recommender::RecommenderClient;
pub use resolver::TrackResolver;
pub use session::{BuildFingerprint, BuildSession, SessionOutcome};
pub use store::{FileStore, KeyValueStore, MemoryStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent sent by both HTTP clients
pub const DEFAULT_USER_AGENT: &str = concat!("pmoaltplaylist/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(DEFAULT_USER_AGENT.ends_with(VERSION));
    }
}
